use rusqlite::types::Value;
use rusqlite::Row;

use crate::error::StorageResult;
use crate::model::GameInfo;

use super::records::{attachment_from_row, attachment_values, Record};
use super::schema::Collection;

/// Fixed key of the single `games` row.
pub const GAME_KEY: i64 = 1;

impl Record for GameInfo {
    const COLLECTION: Collection = Collection::Games;

    fn to_values(&self) -> StorageResult<Vec<Value>> {
        let [model, model_meta] = attachment_values(self.ship_model.as_ref())?;
        Ok(vec![
            Value::Text(self.name.clone()),
            Value::Text(self.ship_name.clone()),
            Value::Integer(self.momentum.into()),
            Value::Integer(self.threat.into()),
            Value::Text(self.active_alert.clone()),
            Value::Text(self.theme.clone()),
            Value::Text(self.edition.clone()),
            Value::Integer(self.alt_font.into()),
            Value::Integer(self.legacy_trackers.into()),
            model,
            model_meta,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(GameInfo {
            id: row.get(0)?,
            name: row.get(1)?,
            ship_name: row.get(2)?,
            momentum: row.get(3)?,
            threat: row.get(4)?,
            active_alert: row.get(5)?,
            theme: row.get(6)?,
            edition: row.get(7)?,
            alt_font: row.get(8)?,
            legacy_trackers: row.get(9)?,
            ship_model: attachment_from_row(row, 10, 11)?,
        })
    }
}
