use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{ensure_name, lenient, Entity, Named};
use crate::error::EmptyNameError;

/// Result text returned when rolling a table without entries.
pub const NO_ENTRIES: &str = "No entries";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollTableEntry {
    #[serde(default, deserialize_with = "lenient::int")]
    pub min: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub max: i64,
    pub result: String,
}

impl RollTableEntry {
    pub fn new(min: i64, max: i64, result: impl Into<String>) -> Self {
        Self {
            min,
            max,
            result: result.into(),
        }
    }
}

/// A random table the game master can roll on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollTableInfo {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_int"
    )]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub game: i64,
    pub name: String,
    #[serde(default)]
    pub entries: Vec<RollTableEntry>,
}

impl_named!(RollTableInfo, "roll table");

impl RollTableInfo {
    pub fn new(
        game: i64,
        name: impl Into<String>,
        entries: Vec<RollTableEntry>,
    ) -> Result<Self, EmptyNameError> {
        let name = name.into();
        ensure_name(Self::KIND, &name)?;
        Ok(Self {
            id: None,
            game,
            name,
            entries,
        })
    }

    /// Pick a uniformly random entry and return its result text.
    pub fn roll(&self) -> &str {
        self.roll_with(&mut rand::thread_rng())
    }

    pub fn roll_with<R: Rng>(&self, rng: &mut R) -> &str {
        if self.entries.is_empty() {
            return NO_ENTRIES;
        }
        let index = rng.gen_range(0..self.entries.len());
        &self.entries[index].result
    }
}

impl Entity for RollTableInfo {
    fn validate(&self) -> bool {
        !self.name.is_empty()
            && !self.entries.is_empty()
            && self.entries.iter().all(|e| !e.result.is_empty())
    }
}
