use serde::{Deserialize, Serialize};

use super::{ensure_name, lenient, Attachment, Entity, Named};
use crate::error::EmptyNameError;

/// A player character card.
///
/// `id` is the storage row id; `player_number` is the display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default = "PlayerInfo::blank")]
pub struct PlayerInfo {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_int")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient::int")]
    pub game: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub player_number: u32,
    pub name: String,
    #[serde(deserialize_with = "lenient::int")]
    pub current_stress: u32,
    #[serde(deserialize_with = "lenient::int")]
    pub max_stress: u32,
    /// Serialized rank insignia (symbol + group).
    pub pips: String,
    /// Department color name.
    pub border_color: String,
    /// Portrait. Carried out-of-band by storage and archives.
    #[serde(skip)]
    pub image: Option<Attachment>,
}

impl_named!(PlayerInfo, "player");

impl PlayerInfo {
    pub fn new(
        game: i64,
        player_number: u32,
        name: impl Into<String>,
    ) -> Result<Self, EmptyNameError> {
        let name = name.into();
        ensure_name(Self::KIND, &name)?;
        Ok(Self {
            game,
            player_number,
            name,
            ..Self::blank()
        })
    }

    fn blank() -> Self {
        Self {
            id: None,
            game: 0,
            player_number: 0,
            name: String::new(),
            current_stress: 0,
            max_stress: 0,
            pips: String::new(),
            border_color: String::new(),
            image: None,
        }
    }
}

impl Entity for PlayerInfo {
    fn validate(&self) -> bool {
        !self.name.is_empty()
    }
}
