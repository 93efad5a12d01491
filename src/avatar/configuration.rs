//! Avatar configuration snapshots
//!
//! An [`AvatarConfiguration`] is an immutable selection record produced by the
//! external editing UI. The composition core never mutates one; it only reads
//! the fields, derives layer identities from them and hashes the visually
//! relevant subset into a canonical cache key.

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Sentinel meaning "no selection, omit the layer".
pub const SENTINEL_NONE: &str = "none";
/// Sentinel species for the plain human head (baked into the body sheets).
pub const SENTINEL_HUMAN: &str = "human";
/// Sentinel hair style.
pub const SENTINEL_BALD: &str = "bald";

/// Closed body-type domain. Every other variant token stays a string because
/// the catalog owns those domains; body type is an enum here because the
/// per-category alias tables key on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    Male,
    Female,
    Muscular,
    Pregnant,
    Teen,
    Child,
}

impl Default for BodyType {
    fn default() -> Self {
        Self::Male
    }
}

impl std::fmt::Display for BodyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BodyType::Male => "male",
            BodyType::Female => "female",
            BodyType::Muscular => "muscular",
            BodyType::Pregnant => "pregnant",
            BodyType::Teen => "teen",
            BodyType::Child => "child",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodySelection {
    pub body_type: BodyType,
    /// Skin tone token selecting the authored color file, e.g. "olive".
    pub skin: String,
}

impl Default for BodySelection {
    fn default() -> Self {
        Self {
            body_type: BodyType::Male,
            skin: "light".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadSelection {
    /// Creature species, or `human` for the plain head.
    pub species: String,
}

impl HeadSelection {
    pub fn is_creature(&self) -> bool {
        self.species != SENTINEL_HUMAN
    }
}

impl Default for HeadSelection {
    fn default() -> Self {
        Self {
            species: SENTINEL_HUMAN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSelection {
    pub style: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl StyleSelection {
    pub fn enabled(&self) -> bool {
        self.style != SENTINEL_NONE
    }
}

impl Default for StyleSelection {
    fn default() -> Self {
        Self {
            style: SENTINEL_NONE.to_string(),
            color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HairSelection {
    pub style: String,
    pub color: String,
}

impl HairSelection {
    pub fn enabled(&self) -> bool {
        self.style != SENTINEL_BALD
    }
}

impl Default for HairSelection {
    fn default() -> Self {
        Self {
            style: SENTINEL_BALD.to_string(),
            color: "brown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyesSelection {
    pub color: String,
}

impl Default for EyesSelection {
    fn default() -> Self {
        Self {
            color: "blue".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeardSelection {
    pub style: String,
    pub color: String,
}

impl BeardSelection {
    pub fn enabled(&self) -> bool {
        self.style != SENTINEL_NONE
    }
}

impl Default for BeardSelection {
    fn default() -> Self {
        Self {
            style: SENTINEL_NONE.to_string(),
            color: "brown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClothingSelection {
    pub top: String,
    pub top_color: String,
    pub bottom: String,
    pub bottom_color: String,
    pub shoes: String,
    pub shoes_color: String,
}

impl Default for ClothingSelection {
    fn default() -> Self {
        Self {
            top: SENTINEL_NONE.to_string(),
            top_color: "white".to_string(),
            bottom: SENTINEL_NONE.to_string(),
            bottom_color: "gray".to_string(),
            shoes: SENTINEL_NONE.to_string(),
            shoes_color: "brown".to_string(),
        }
    }
}

/// One avatar's full selection record.
///
/// `id` and `revised_at` are editing metadata; they never participate in the
/// canonical cache key, so re-saving an unchanged look reuses the composed
/// sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfiguration {
    pub id: Option<Uuid>,
    /// Last-edit timestamp in milliseconds, assigned by the editor.
    pub revised_at: Option<u64>,

    pub body: BodySelection,
    pub head: HeadSelection,
    pub ears: StyleSelection,
    pub horns: StyleSelection,
    pub hair: HairSelection,
    pub eyes: EyesSelection,
    pub beard: BeardSelection,
    pub wings: StyleSelection,
    pub tail: StyleSelection,
    pub clothing: ClothingSelection,
    pub hat: StyleSelection,
    pub glasses: StyleSelection,
    /// Legacy composite `{style}_{color}` keys, drawn topmost in list order.
    pub accessories: Vec<String>,
}

impl Default for AvatarConfiguration {
    fn default() -> Self {
        Self {
            id: None,
            revised_at: None,
            body: BodySelection::default(),
            head: HeadSelection::default(),
            ears: StyleSelection::default(),
            horns: StyleSelection::default(),
            hair: HairSelection::default(),
            eyes: EyesSelection::default(),
            beard: BeardSelection::default(),
            wings: StyleSelection::default(),
            tail: StyleSelection::default(),
            clothing: ClothingSelection::default(),
            hat: StyleSelection::default(),
            glasses: StyleSelection::default(),
            accessories: Vec::new(),
        }
    }
}

impl AvatarConfiguration {
    /// Canonical composition-cache key.
    ///
    /// A deterministic JSON rendering of only the visually relevant fields.
    /// `serde_json` maps serialize with sorted keys, so two configurations
    /// that look the same produce byte-identical keys regardless of how they
    /// were built or when they were last saved.
    pub fn cache_key(&self) -> String {
        json!({
            "body": self.body,
            "head": self.head,
            "ears": self.ears,
            "horns": self.horns,
            "hair": self.hair,
            "eyes": self.eyes,
            "beard": self.beard,
            "wings": self.wings,
            "tail": self.tail,
            "clothing": self.clothing,
            "hat": self.hat,
            "glasses": self.glasses,
            "accessories": self.accessories,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_ignores_metadata_fields() {
        let mut a = AvatarConfiguration::default();
        let mut b = a.clone();
        a.id = Some(Uuid::new_v4());
        a.revised_at = Some(1_700_000_000_000);
        b.id = Some(Uuid::new_v4());
        b.revised_at = Some(1_800_000_000_000);
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_tracks_visual_fields() {
        let a = AvatarConfiguration::default();
        let mut b = a.clone();
        b.hair = HairSelection {
            style: "ponytail".to_string(),
            color: "raven".to_string(),
        };
        assert_ne!(a.cache_key(), b.cache_key());

        let mut c = a.clone();
        c.body.skin = "olive".to_string();
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        let config = AvatarConfiguration {
            accessories: vec!["cape_royal_blue".to_string()],
            ..AvatarConfiguration::default()
        };
        assert_eq!(config.cache_key(), config.clone().cache_key());
    }

    #[test]
    fn test_minimal_toml_deserializes_with_defaults() {
        let config: AvatarConfiguration = toml::from_str(
            r#"
            [body]
            body_type = "teen"
            skin = "tan"
            "#,
        )
        .unwrap();
        assert_eq!(config.body.body_type, BodyType::Teen);
        assert_eq!(config.hair.style, SENTINEL_BALD);
        assert!(!config.wings.enabled());
        assert!(config.accessories.is_empty());
    }
}
