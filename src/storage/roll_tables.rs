use rusqlite::types::Value;
use rusqlite::Row;

use crate::error::StorageResult;
use crate::model::RollTableInfo;

use super::records::{json_column, json_value, Record};
use super::schema::Collection;

impl Record for RollTableInfo {
    const COLLECTION: Collection = Collection::RollTables;

    fn to_values(&self) -> StorageResult<Vec<Value>> {
        Ok(vec![
            Value::Integer(self.game),
            Value::Text(self.name.clone()),
            json_value(&self.entries)?,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RollTableInfo {
            id: row.get(0)?,
            game: row.get(1)?,
            name: row.get(2)?,
            entries: json_column(row, 3)?,
        })
    }
}
