use rusqlite::types::Value;
use rusqlite::Row;

use crate::error::StorageResult;
use crate::model::TraitInfo;

use super::records::Record;
use super::schema::Collection;

impl Record for TraitInfo {
    const COLLECTION: Collection = Collection::Traits;

    fn to_values(&self) -> StorageResult<Vec<Value>> {
        Ok(vec![
            Value::Integer(self.scene),
            Value::Text(self.name.clone()),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(TraitInfo {
            id: row.get(0)?,
            scene: row.get(1)?,
            name: row.get(2)?,
        })
    }
}
