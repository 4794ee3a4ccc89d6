use serde::{Deserialize, Serialize};

use super::{ensure_name, lenient, Entity, Named};
use crate::error::EmptyNameError;

pub const ATTRIBUTES: [&str; 6] = ["Control", "Daring", "Fitness", "Insight", "Presence", "Reason"];

pub const DEPARTMENTS: [&str; 6] = [
    "Command",
    "Conn",
    "Engineering",
    "Security",
    "Medicine",
    "Science",
];

pub const SHIP_SYSTEMS: [&str; 6] = [
    "Communications",
    "Computers",
    "Engines",
    "Sensors",
    "Structure",
    "Weapons",
];

/// An extended task or combat tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TrackerFields")]
pub struct TrackerInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub game: i64,
    pub name: String,
    pub attribute: String,
    pub department: String,
    pub ship_system: String,
    pub ship_department: String,
    pub progress_track: u32,
    pub max_progress_track: u32,
    pub resistance: u32,
    pub complication_range: u32,
    pub breakthroughs: u32,
}

impl_named!(TrackerInfo, "tracker");

impl TrackerInfo {
    /// New tracker using the first entry of each vocabulary.
    pub fn new(game: i64, name: impl Into<String>) -> Result<Self, EmptyNameError> {
        let name = name.into();
        ensure_name(Self::KIND, &name)?;
        Ok(Self {
            id: None,
            game,
            name,
            attribute: ATTRIBUTES[0].to_string(),
            department: DEPARTMENTS[0].to_string(),
            ship_system: SHIP_SYSTEMS[0].to_string(),
            ship_department: DEPARTMENTS[0].to_string(),
            progress_track: 0,
            max_progress_track: 0,
            resistance: 0,
            complication_range: 0,
            breakthroughs: 0,
        })
    }

    /// Set the progress track; the maximum follows when not given.
    pub fn with_progress(mut self, progress: u32, max: Option<u32>) -> Self {
        self.progress_track = progress;
        self.max_progress_track = max.unwrap_or(progress);
        self
    }
}

impl Entity for TrackerInfo {
    fn validate(&self) -> bool {
        [
            &self.name,
            &self.attribute,
            &self.department,
            &self.ship_system,
            &self.ship_department,
        ]
        .iter()
        .all(|s| !s.is_empty())
    }
}

/// Wire shape: `maxProgressTrack` may be absent.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackerFields {
    #[serde(default, deserialize_with = "lenient::opt_int")]
    id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::int")]
    game: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    attribute: String,
    #[serde(default)]
    department: String,
    #[serde(default)]
    ship_system: String,
    #[serde(default)]
    ship_department: String,
    #[serde(default, deserialize_with = "lenient::int")]
    progress_track: u32,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    max_progress_track: Option<u32>,
    #[serde(default, deserialize_with = "lenient::int")]
    resistance: u32,
    #[serde(default, deserialize_with = "lenient::int")]
    complication_range: u32,
    #[serde(default, deserialize_with = "lenient::int")]
    breakthroughs: u32,
}

impl From<TrackerFields> for TrackerInfo {
    fn from(f: TrackerFields) -> Self {
        Self {
            id: f.id,
            game: f.game,
            name: f.name,
            attribute: f.attribute,
            department: f.department,
            ship_system: f.ship_system,
            ship_department: f.ship_department,
            progress_track: f.progress_track,
            max_progress_track: f.max_progress_track.unwrap_or(f.progress_track),
            resistance: f.resistance,
            complication_range: f.complication_range,
            breakthroughs: f.breakthroughs,
        }
    }
}
