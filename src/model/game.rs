use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::{ensure_name, lenient, Attachment, Entity, Named};
use crate::error::EmptyNameError;

/// Alert conditions a ship can be placed under. An empty string means none.
pub const ALERT_CONDITIONS: [&str; 4] = ["red", "yellow", "blue", "grey"];

pub const DEFAULT_THEME: &str = "lcars";

/// Rules edition the session is played with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Edition {
    First,
    #[default]
    Second,
    CaptainsLog,
}

impl Edition {
    pub const ALL: [Edition; 3] = [Edition::First, Edition::Second, Edition::CaptainsLog];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "1",
            Self::Second => "2",
            Self::CaptainsLog => "captains-log",
        }
    }

    /// Parse raw input, falling back to the second edition.
    pub fn normalize(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl FromStr for Edition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Edition::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| format!("unknown edition {s:?}"))
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root record of a session. Exactly one is stored at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default = "GameInfo::blank")]
pub struct GameInfo {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_int")]
    pub id: Option<i64>,
    pub name: String,
    pub ship_name: String,
    #[serde(deserialize_with = "lenient::int")]
    pub momentum: u32,
    #[serde(deserialize_with = "lenient::int")]
    pub threat: u32,
    pub active_alert: String,
    pub theme: String,
    /// Raw edition identifier. Prefer [`GameInfo::set_edition`], which
    /// normalizes; writing the field directly bypasses normalization and is
    /// caught by [`Entity::validate`].
    #[serde(deserialize_with = "normalized_edition")]
    pub edition: String,
    /// 3D model of the ship. Carried out-of-band by storage and archives.
    #[serde(skip)]
    pub ship_model: Option<Attachment>,
    pub alt_font: bool,
    pub legacy_trackers: bool,
}

impl_named!(GameInfo, "game");

impl GameInfo {
    pub fn new(name: impl Into<String>) -> Result<Self, EmptyNameError> {
        let name = name.into();
        ensure_name(Self::KIND, &name)?;
        Ok(Self {
            name,
            ..Self::blank()
        })
    }

    fn blank() -> Self {
        Self {
            id: None,
            name: String::new(),
            ship_name: String::new(),
            momentum: 0,
            threat: 0,
            active_alert: String::new(),
            theme: DEFAULT_THEME.to_string(),
            edition: Edition::default().as_str().to_string(),
            ship_model: None,
            alt_font: false,
            legacy_trackers: false,
        }
    }

    /// Set the edition from raw input; unknown values become `"2"`.
    pub fn set_edition(&mut self, raw: &str) {
        self.edition = Edition::normalize(raw).as_str().to_string();
    }

    /// The edition, or `None` when the raw field holds an unknown value.
    pub fn edition(&self) -> Option<Edition> {
        self.edition.parse().ok()
    }
}

impl Entity for GameInfo {
    fn validate(&self) -> bool {
        !self.name.is_empty() && self.edition().is_some()
    }
}

fn normalized_edition<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    };
    Ok(Edition::normalize(&raw).as_str().to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn new_game_defaults() {
        let game = GameInfo::new("Voyage Home").unwrap();
        assert_eq!(game.id, None);
        assert_eq!(game.edition(), Some(Edition::Second));
        assert_eq!(game.theme, DEFAULT_THEME);
        assert!(game.ship_model.is_none());
        assert!(game.validate());
    }

    #[test]
    fn empty_name_fails() {
        assert!(GameInfo::new("").is_err());
    }

    #[test]
    fn set_edition_normalizes() {
        let mut game = GameInfo::new("g").unwrap();
        game.set_edition("captains-log");
        assert_eq!(game.edition, "captains-log");
        game.set_edition("3");
        assert_eq!(game.edition, "2");
        game.set_edition("1");
        assert_eq!(game.edition(), Some(Edition::First));
    }

    #[test]
    fn direct_edition_write_fails_validation() {
        let mut game = GameInfo::new("g").unwrap();
        game.edition = "third".to_string();
        assert!(!game.validate());
        game.set_edition("third");
        assert!(game.validate());
    }

    #[test]
    fn assign_fills_defaults_and_coerces() {
        let game = GameInfo::assign(json!({
            "id": 1,
            "name": "Voyage Home",
            "shipName": "HMS Bounty",
            "momentum": "3",
            "threat": 2,
            "edition": 1,
        }))
        .unwrap();

        assert_eq!(game.ship_name, "HMS Bounty");
        assert_eq!(game.momentum, 3);
        assert_eq!(game.threat, 2);
        assert_eq!(game.edition, "1");
        assert_eq!(game.active_alert, "");
        assert_eq!(game.theme, DEFAULT_THEME);
        assert!(!game.alt_font);
    }

    #[test]
    fn assign_normalizes_unknown_edition() {
        let game = GameInfo::assign(json!({ "name": "g", "edition": "4e" })).unwrap();
        assert_eq!(game.edition, "2");
    }

    #[test]
    fn serializes_camel_case_without_attachment() {
        let mut game = GameInfo::new("g").unwrap();
        game.ship_model = Some(Attachment::new("ship.glb", "model/gltf-binary", vec![1u8]));
        let value = serde_json::to_value(&game).unwrap();
        assert!(value.get("shipName").is_some());
        assert!(value.get("legacyTrackers").is_some());
        assert!(value.get("shipModel").is_none());
        assert!(value.get("id").is_none());
    }
}
