//! Plain data records for a tabletop session.
//!
//! Every record type has a constructor that rejects empty names, an
//! [`Entity::assign`] factory that rebuilds a typed value from untyped JSON
//! (archive documents), and a non-throwing [`Entity::validate`] gate used
//! before writes.
//!
//! Binary attachments ([`Attachment`]) are never part of a record's serde
//! representation; they travel out-of-band through the storage BLOB columns
//! and the archive side table.

/// Implements [`Named`] for a record with `id` and `name` fields.
macro_rules! impl_named {
    ($ty:ty, $kind:literal) => {
        impl $crate::model::Named for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> Option<i64> {
                self.id
            }

            fn set_id(&mut self, id: Option<i64>) {
                self.id = id;
            }

            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

mod attachment;
mod game;
pub(crate) mod lenient;
mod player;
mod roll_table;
mod scene;
mod tracker;
mod trait_info;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AssignError, EmptyNameError};

pub use attachment::Attachment;
pub use game::{Edition, GameInfo, ALERT_CONDITIONS, DEFAULT_THEME};
pub use player::PlayerInfo;
pub use roll_table::{RollTableEntry, RollTableInfo, NO_ENTRIES};
pub use scene::{SceneInfo, MISSION_TRACKS, TRACK_LENGTH};
pub use tracker::{TrackerInfo, ATTRIBUTES, DEPARTMENTS, SHIP_SYSTEMS};
pub use trait_info::TraitInfo;

/// Accessors shared by every record that carries a storage id and a name.
pub trait Named {
    /// Human-readable record kind, used in errors and logs.
    const KIND: &'static str;

    fn id(&self) -> Option<i64>;
    fn set_id(&mut self, id: Option<i64>);
    fn name(&self) -> &str;
}

/// A record that can be validated and rebuilt from untyped JSON.
pub trait Entity: Named + Serialize + DeserializeOwned {
    /// Pre-save gate. Never panics; `false` means the record is skipped.
    fn validate(&self) -> bool;

    /// Fix-ups applied after decoding (defaults that depend on other fields).
    fn normalize(self) -> Self {
        self
    }

    /// Rebuild a typed record from a plain JSON object.
    ///
    /// Missing optional properties take their defaults and integers given as
    /// numeric strings are accepted.
    fn assign(value: serde_json::Value) -> Result<Self, AssignError> {
        let entity: Self = serde_json::from_value(value)?;
        ensure_name(Self::KIND, entity.name())?;
        Ok(entity.normalize())
    }
}

pub(crate) fn ensure_name(kind: &'static str, name: &str) -> Result<(), EmptyNameError> {
    if name.is_empty() {
        Err(EmptyNameError { kind })
    } else {
        Ok(())
    }
}

/// The minimal named record: an optional storage id plus a non-empty name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedInfo {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_int"
    )]
    pub id: Option<i64>,
    pub name: String,
}

impl NamedInfo {
    pub fn new(name: impl Into<String>) -> Result<Self, EmptyNameError> {
        let name = name.into();
        ensure_name(Self::KIND, &name)?;
        Ok(Self { id: None, name })
    }
}

impl Named for NamedInfo {
    const KIND: &'static str = "record";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for NamedInfo {
    fn validate(&self) -> bool {
        !self.name.is_empty()
    }
}
