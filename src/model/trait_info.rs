use serde::{Deserialize, Serialize};

use super::{ensure_name, lenient, Entity, Named};
use crate::error::EmptyNameError;

/// A situational trait attached to a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitInfo {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_int"
    )]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient::int")]
    pub scene: i64,
    pub name: String,
}

impl_named!(TraitInfo, "trait");

impl TraitInfo {
    pub fn new(scene: i64, name: impl Into<String>) -> Result<Self, EmptyNameError> {
        let name = name.into();
        ensure_name(Self::KIND, &name)?;
        Ok(Self {
            id: None,
            scene,
            name,
        })
    }
}

impl Entity for TraitInfo {
    fn validate(&self) -> bool {
        !self.name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trait() {
        let t = TraitInfo::new(3, "Dense Nebula").unwrap();
        assert_eq!(t.scene, 3);
        assert!(t.validate());
    }

    #[test]
    fn empty_name_fails() {
        assert_eq!(TraitInfo::new(3, "").unwrap_err().kind, "trait");
    }
}
