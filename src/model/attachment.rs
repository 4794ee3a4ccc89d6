use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

/// A binary file carried by a record (ship model, player portrait).
///
/// Attachments are immutable values: the content is a shared [`Bytes`]
/// buffer, so cloning a record never copies the payload. Replace the whole
/// attachment to change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    /// MIME type, empty when unknown.
    pub mime_type: String,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
    pub webkit_relative_path: String,
    pub data: Bytes,
}

impl Attachment {
    /// Create an attachment stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            last_modified: current_time_millis(),
            webkit_relative_path: String::new(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

pub(crate) fn current_time_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
