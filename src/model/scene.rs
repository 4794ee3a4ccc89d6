use serde::{Deserialize, Serialize};

use super::{ensure_name, lenient, Entity, Named};
use crate::error::EmptyNameError;

/// Number of outcome tracks shown per scene.
pub const MISSION_TRACKS: usize = 3;

/// Characters per outcome track.
pub const TRACK_LENGTH: usize = 5;

/// A scene (or mission) within a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default = "SceneInfo::blank")]
pub struct SceneInfo {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_int")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient::int")]
    pub game: i64,
    pub name: String,
    /// Rich-text scene description (HTML).
    pub description: String,
    /// Serialized outcome tracks, always [`MISSION_TRACKS`] long.
    pub mission_track: Vec<String>,
}

impl_named!(SceneInfo, "scene");

impl SceneInfo {
    pub fn new(game: i64, name: impl Into<String>) -> Result<Self, EmptyNameError> {
        let name = name.into();
        ensure_name(Self::KIND, &name)?;
        Ok(Self {
            game,
            name,
            ..Self::blank()
        })
    }

    fn blank() -> Self {
        Self {
            id: None,
            game: 0,
            name: String::new(),
            description: String::new(),
            mission_track: vec![empty_track(); MISSION_TRACKS],
        }
    }
}

impl Entity for SceneInfo {
    fn validate(&self) -> bool {
        !self.name.is_empty()
    }

    fn normalize(mut self) -> Self {
        self.mission_track.resize_with(MISSION_TRACKS, empty_track);
        for track in &mut self.mission_track {
            let len = track.chars().count();
            if len < TRACK_LENGTH {
                track.extend(std::iter::repeat(' ').take(TRACK_LENGTH - len));
            } else if len > TRACK_LENGTH {
                *track = track.chars().take(TRACK_LENGTH).collect();
            }
        }
        self
    }
}

fn empty_track() -> String {
    " ".repeat(TRACK_LENGTH)
}
