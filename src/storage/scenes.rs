use rusqlite::types::Value;
use rusqlite::Row;

use crate::error::StorageResult;
use crate::model::SceneInfo;

use super::records::{json_column, json_value, Record};
use super::schema::Collection;

impl Record for SceneInfo {
    const COLLECTION: Collection = Collection::Scenes;

    fn to_values(&self) -> StorageResult<Vec<Value>> {
        Ok(vec![
            Value::Integer(self.game),
            Value::Text(self.name.clone()),
            Value::Text(self.description.clone()),
            json_value(&self.mission_track)?,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SceneInfo {
            id: row.get(0)?,
            game: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            mission_track: json_column(row, 4)?,
        })
    }
}
