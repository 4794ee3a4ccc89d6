//! Out-of-band attachment references.
//!
//! While a snapshot is serialized, every attachment is swapped for a
//! [`ReferenceDescriptor`] in the JSON document and its payload is staged in
//! an [`AttachmentTable`] under the same reference id. Reading reverses this:
//! the descriptor supplies the metadata, the container entry the bytes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::error::{BackupError, BackupResult};
use crate::model::Attachment;

/// Placeholder written into `info.json` in place of an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceDescriptor {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    pub last_modified: i64,
    #[serde(default)]
    pub webkit_relative_path: String,
    pub is_referenced_file: bool,
    pub reference: String,
}

impl ReferenceDescriptor {
    pub fn into_attachment(self, data: Bytes) -> Attachment {
        if data.len() as u64 != self.size {
            warn!(
                "Attachment {} declares {} bytes but entry {} holds {}",
                self.name,
                self.size,
                self.reference,
                data.len()
            );
        }
        Attachment {
            name: self.name,
            mime_type: self.mime_type,
            last_modified: self.last_modified,
            webkit_relative_path: self.webkit_relative_path,
            data,
        }
    }
}

/// Attachments staged for the container, in the order they were referenced.
#[derive(Debug, Default)]
pub struct AttachmentTable {
    entries: Vec<(String, Bytes)>,
}

impl AttachmentTable {
    /// Stage a payload under a fresh reference id and describe it.
    pub fn stage(&mut self, file: &Attachment) -> ReferenceDescriptor {
        let reference = Uuid::new_v4().to_string();
        self.entries.push((reference.clone(), file.data.clone()));
        ReferenceDescriptor {
            name: file.name.clone(),
            size: file.size() as u64,
            mime_type: file.mime_type.clone(),
            last_modified: file.last_modified,
            webkit_relative_path: file.webkit_relative_path.clone(),
            is_referenced_file: true,
            reference,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bytes)> {
        self.entries.iter().map(|(r, data)| (r.as_str(), data))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serialize `entity`, putting a descriptor for `file` under `key`.
pub fn embed<T: Serialize>(
    entity: &T,
    key: &str,
    file: Option<&Attachment>,
    table: &mut AttachmentTable,
) -> BackupResult<Value> {
    let mut value = serde_json::to_value(entity)?;
    if let (Some(file), Value::Object(map)) = (file, &mut value) {
        map.insert(key.to_string(), serde_json::to_value(table.stage(file))?);
    }
    Ok(value)
}

/// Remove the descriptor under `key` from `value` and resolve its payload.
///
/// Absent or null fields yield `None`. A value that is present but not a
/// referenced file (an attachment that was never staged) is dropped with a
/// warning.
pub fn extract<F>(value: &mut Value, key: &str, resolve: &mut F) -> BackupResult<Option<Attachment>>
where
    F: FnMut(&str) -> BackupResult<Bytes>,
{
    let Some(raw) = value.as_object_mut().and_then(|map| map.remove(key)) else {
        return Ok(None);
    };
    if raw.is_null() {
        return Ok(None);
    }

    let is_reference = raw
        .get("isReferencedFile")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !is_reference {
        warn!("Ignoring {key} that is not a referenced file");
        return Ok(None);
    }

    let descriptor: ReferenceDescriptor = serde_json::from_value(raw)
        .map_err(|e| BackupError::MalformedInfo(format!("{key} descriptor: {e}")))?;
    let data = resolve(&descriptor.reference)?;
    Ok(Some(descriptor.into_attachment(data)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::PlayerInfo;

    fn portrait() -> Attachment {
        Attachment::new("kirk.png", "image/png", vec![0x89u8, b'P', b'N', b'G'])
    }

    #[test]
    fn stage_assigns_unique_references() {
        let mut table = AttachmentTable::default();
        let a = table.stage(&portrait());
        let b = table.stage(&portrait());

        assert_ne!(a.reference, b.reference);
        assert!(Uuid::parse_str(&a.reference).is_ok());
        assert_eq!(a.size, 4);
        assert!(a.is_referenced_file);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn descriptor_uses_browser_file_keys() {
        let mut table = AttachmentTable::default();
        let value = serde_json::to_value(table.stage(&portrait())).unwrap();
        assert_eq!(value["type"], "image/png");
        assert_eq!(value["isReferencedFile"], true);
        assert!(value.get("lastModified").is_some());
    }

    #[test]
    fn embed_then_extract_restores_attachment() {
        let mut player = PlayerInfo::new(1, 0, "Kirk").unwrap();
        player.image = Some(portrait());

        let mut table = AttachmentTable::default();
        let mut value = embed(&player, "image", player.image.as_ref(), &mut table).unwrap();
        assert_eq!(value["image"]["name"], "kirk.png");

        let staged: Vec<(String, Bytes)> =
            table.iter().map(|(r, d)| (r.to_string(), d.clone())).collect();
        let mut resolve = |reference: &str| {
            staged
                .iter()
                .find(|(r, _)| r == reference)
                .map(|(_, d)| d.clone())
                .ok_or_else(|| BackupError::MissingReference(reference.to_string()))
        };
        let file = extract(&mut value, "image", &mut resolve).unwrap();

        assert_eq!(file, player.image);
        assert!(value.get("image").is_none());
    }

    #[test]
    fn embed_without_attachment_adds_nothing() {
        let player = PlayerInfo::new(1, 0, "Spock").unwrap();
        let mut table = AttachmentTable::default();
        let value = embed(&player, "image", None, &mut table).unwrap();
        assert!(value.get("image").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn extract_absent_and_unstaged_values() {
        let mut resolve = |r: &str| -> BackupResult<Bytes> {
            Err(BackupError::MissingReference(r.to_string()))
        };

        let mut absent = json!({ "name": "Spock" });
        assert!(extract(&mut absent, "image", &mut resolve).unwrap().is_none());

        let mut null = json!({ "name": "Spock", "image": null });
        assert!(extract(&mut null, "image", &mut resolve).unwrap().is_none());

        let mut unstaged = json!({ "name": "Spock", "image": {} });
        assert!(extract(&mut unstaged, "image", &mut resolve).unwrap().is_none());
    }

    #[test]
    fn extract_missing_entry_fails() {
        let mut value = json!({
            "name": "Kirk",
            "image": {
                "name": "kirk.png",
                "size": 4,
                "type": "image/png",
                "lastModified": 1,
                "isReferencedFile": true,
                "reference": "gone",
            }
        });
        let mut resolve = |r: &str| -> BackupResult<Bytes> {
            Err(BackupError::MissingReference(r.to_string()))
        };
        let err = extract(&mut value, "image", &mut resolve).unwrap_err();
        assert!(matches!(err, BackupError::MissingReference(r) if r == "gone"));
    }
}
