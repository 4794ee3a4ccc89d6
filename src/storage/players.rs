use rusqlite::types::Value;
use rusqlite::Row;

use crate::error::StorageResult;
use crate::model::PlayerInfo;

use super::records::{attachment_from_row, attachment_values, Record};
use super::schema::Collection;

impl Record for PlayerInfo {
    const COLLECTION: Collection = Collection::Players;

    fn to_values(&self) -> StorageResult<Vec<Value>> {
        let [image, image_meta] = attachment_values(self.image.as_ref())?;
        Ok(vec![
            Value::Integer(self.game),
            Value::Integer(self.player_number.into()),
            Value::Text(self.name.clone()),
            Value::Integer(self.current_stress.into()),
            Value::Integer(self.max_stress.into()),
            Value::Text(self.pips.clone()),
            Value::Text(self.border_color.clone()),
            image,
            image_meta,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(PlayerInfo {
            id: row.get(0)?,
            game: row.get(1)?,
            player_number: row.get(2)?,
            name: row.get(3)?,
            current_stress: row.get(4)?,
            max_stress: row.get(5)?,
            pips: row.get(6)?,
            border_color: row.get(7)?,
            image: attachment_from_row(row, 8, 9)?,
        })
    }
}
