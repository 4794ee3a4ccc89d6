//! Generic object-store operations over any [`Record`] type.

use bytes::Bytes;
use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, OptionalExtension, Row, ToSql};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StorageResult;
use crate::model::{Attachment, Named};

use super::schema::{Collection, Index};
use super::Database;

/// A record type stored in one [`Collection`].
pub trait Record: Named + Sized {
    const COLLECTION: Collection;

    /// Values for `COLLECTION.columns()`, in order.
    fn to_values(&self) -> StorageResult<Vec<Value>>;

    /// Build a record from a row selected as `id, <columns...>`.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

fn select_sql(collection: Collection) -> String {
    format!(
        "SELECT id, {} FROM {}",
        collection.columns().join(", "),
        collection.table()
    )
}

impl Database {
    /// Fetch one record by key.
    pub fn get<R: Record>(&self, key: i64) -> StorageResult<Option<R>> {
        let sql = format!("{} WHERE id = ?1", select_sql(R::COLLECTION));
        let record = self
            .conn
            .query_row(&sql, [key], |row| R::from_row(row))
            .optional()?;
        Ok(record)
    }

    /// Fetch every record in the collection.
    pub fn get_all<R: Record>(&self) -> StorageResult<Vec<R>> {
        let sql = format!(
            "{} ORDER BY {}",
            select_sql(R::COLLECTION),
            R::COLLECTION.order_by()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([], |row| R::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Fetch every record whose `index` equals `value`.
    pub fn get_all_by_index<R: Record>(
        &self,
        index: Index,
        value: impl ToSql,
    ) -> StorageResult<Vec<R>> {
        let collection = R::COLLECTION;
        debug_assert!(collection.has_index(index), "{collection} has no {index:?} index");

        let sql = format!(
            "{} WHERE {} = ?1 ORDER BY {}",
            select_sql(collection),
            index.column(),
            collection.order_by()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([value], |row| R::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn count(&self, collection: Collection) -> StorageResult<i64> {
        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", collection.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Whether a record with `key` exists in the collection.
    pub fn contains(&self, collection: Collection, key: i64) -> StorageResult<bool> {
        let found = self
            .conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE id = ?1", collection.table()),
                [key],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Insert a record. A record without an id gets a generated one.
    ///
    /// Fails if a record with the same id already exists.
    pub fn add<R: Record>(&self, record: &R) -> StorageResult<i64> {
        self.write(record, "INSERT")
    }

    /// Insert or overwrite a record, returning its key.
    pub fn put<R: Record>(&self, record: &R) -> StorageResult<i64> {
        self.write(record, "INSERT OR REPLACE")
    }

    fn write<R: Record>(&self, record: &R, verb: &str) -> StorageResult<i64> {
        let collection = R::COLLECTION;
        let mut columns: Vec<&str> = Vec::with_capacity(collection.columns().len() + 1);
        let mut values = record.to_values()?;

        if let Some(id) = record.id() {
            columns.push("id");
            values.insert(0, Value::Integer(id));
        }
        columns.extend_from_slice(collection.columns());

        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "{verb} INTO {} ({}) VALUES ({})",
            collection.table(),
            columns.join(", "),
            placeholders.join(", ")
        );
        self.conn.execute(&sql, params_from_iter(values))?;

        let key = record.id().unwrap_or_else(|| self.conn.last_insert_rowid());
        debug!("Wrote {} {key} to {collection}", R::KIND);
        Ok(key)
    }

    /// Delete one record by key. Returns whether a row was removed.
    pub fn delete(&self, collection: Collection, key: i64) -> StorageResult<bool> {
        let removed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", collection.table()),
            [key],
        )?;
        Ok(removed > 0)
    }

    /// Walk `index` for `value` and delete every matching record.
    pub fn delete_by_index(
        &self,
        collection: Collection,
        index: Index,
        value: impl ToSql,
    ) -> StorageResult<usize> {
        debug_assert!(collection.has_index(index), "{collection} has no {index:?} index");

        let mut stmt = self.conn.prepare(&format!(
            "SELECT id FROM {} WHERE {} = ?1",
            collection.table(),
            index.column()
        ))?;
        let keys: Vec<i64> = stmt
            .query_map([value], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        for key in &keys {
            self.delete(collection, *key)?;
        }
        debug!("Deleted {} rows from {collection} by {:?}", keys.len(), index);
        Ok(keys.len())
    }

    /// Delete every record in the collection.
    pub fn clear_collection(&self, collection: Collection) -> StorageResult<usize> {
        let removed = self
            .conn
            .execute(&format!("DELETE FROM {}", collection.table()), [])?;
        Ok(removed)
    }
}

/// Attachment metadata kept beside the BLOB column.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachmentMeta {
    name: String,
    #[serde(rename = "type")]
    mime_type: String,
    last_modified: i64,
    #[serde(default)]
    webkit_relative_path: String,
}

/// Encode an optional attachment as `(blob, meta)` column values.
pub(super) fn attachment_values(file: Option<&Attachment>) -> StorageResult<[Value; 2]> {
    let Some(file) = file else {
        return Ok([Value::Null, Value::Null]);
    };
    let meta = AttachmentMeta {
        name: file.name.clone(),
        mime_type: file.mime_type.clone(),
        last_modified: file.last_modified,
        webkit_relative_path: file.webkit_relative_path.clone(),
    };
    Ok([
        Value::Blob(file.data.to_vec()),
        Value::Text(serde_json::to_string(&meta)?),
    ])
}

/// Decode the `(blob, meta)` column pair written by [`attachment_values`].
pub(super) fn attachment_from_row(
    row: &Row<'_>,
    data_idx: usize,
    meta_idx: usize,
) -> rusqlite::Result<Option<Attachment>> {
    let data: Option<Vec<u8>> = row.get(data_idx)?;
    let Some(data) = data else {
        return Ok(None);
    };
    let meta: AttachmentMeta = json_column(row, meta_idx)?;
    Ok(Some(Attachment {
        name: meta.name,
        mime_type: meta.mime_type,
        last_modified: meta.last_modified,
        webkit_relative_path: meta.webkit_relative_path,
        data: Bytes::from(data),
    }))
}

pub(super) fn json_value<T: Serialize>(value: &T) -> StorageResult<Value> {
    Ok(Value::Text(serde_json::to_string(value)?))
}

pub(super) fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
