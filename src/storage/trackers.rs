use rusqlite::types::Value;
use rusqlite::Row;

use crate::error::StorageResult;
use crate::model::TrackerInfo;

use super::records::Record;
use super::schema::Collection;

impl Record for TrackerInfo {
    const COLLECTION: Collection = Collection::Trackers;

    fn to_values(&self) -> StorageResult<Vec<Value>> {
        Ok(vec![
            Value::Integer(self.game),
            Value::Text(self.name.clone()),
            Value::Text(self.attribute.clone()),
            Value::Text(self.department.clone()),
            Value::Text(self.ship_system.clone()),
            Value::Text(self.ship_department.clone()),
            Value::Integer(self.progress_track.into()),
            Value::Integer(self.max_progress_track.into()),
            Value::Integer(self.resistance.into()),
            Value::Integer(self.complication_range.into()),
            Value::Integer(self.breakthroughs.into()),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(TrackerInfo {
            id: row.get(0)?,
            game: row.get(1)?,
            name: row.get(2)?,
            attribute: row.get(3)?,
            department: row.get(4)?,
            ship_system: row.get(5)?,
            ship_department: row.get(6)?,
            progress_track: row.get(7)?,
            max_progress_track: row.get(8)?,
            resistance: row.get(9)?,
            complication_range: row.get(10)?,
            breakthroughs: row.get(11)?,
        })
    }
}
