//! Launchable item record.

#![allow(missing_docs)]

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::errors::{Result, TvdError};

/// One launchable entry. Identity is its position in the [`ItemStore`].
///
/// [`ItemStore`]: super::ItemStore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub name: String,
    /// Executable reference handed to the process launcher.
    #[serde(default)]
    pub path: String,
    /// Artwork reference. Stored on disk as an empty string when absent.
    #[serde(
        default,
        serialize_with = "icon_to_string",
        deserialize_with = "icon_from_string"
    )]
    pub icon: Option<String>,
}

impl Item {
    /// Build a validated item. Name and path are trimmed.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Result<Self> {
        let item = Self {
            name: name.into().trim().to_string(),
            path: path.into().trim().to_string(),
            icon: None,
        };
        item.validate()?;
        Ok(item)
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        let icon = icon.into();
        self.icon = if icon.trim().is_empty() {
            None
        } else {
            Some(icon)
        };
        self
    }

    /// Check the committed-item invariant: non-empty name and path.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TvdError::InvalidItem {
                details: "name must not be empty".to_string(),
            });
        }
        if self.path.trim().is_empty() {
            return Err(TvdError::InvalidItem {
                details: format!("{:?} has no executable path", self.name),
            });
        }
        Ok(())
    }
}

#[allow(clippy::ref_option)]
fn icon_to_string<S: Serializer>(icon: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(icon.as_deref().unwrap_or(""))
}

fn icon_from_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_and_validates() {
        let item = Item::new("  Steam ", " /usr/bin/steam ").expect("valid item");
        assert_eq!(item.name, "Steam");
        assert_eq!(item.path, "/usr/bin/steam");
        assert_eq!(item.icon, None);
    }

    #[test]
    fn empty_name_rejected() {
        let err = Item::new("   ", "/bin/true").expect_err("blank name");
        assert_eq!(err.code(), "TVD-2003");
    }

    #[test]
    fn empty_path_rejected() {
        let err = Item::new("Kodi", "").expect_err("blank path");
        assert!(err.to_string().contains("Kodi"));
    }

    #[test]
    fn blank_icon_is_none() {
        let item = Item::new("Kodi", "/usr/bin/kodi")
            .expect("valid")
            .with_icon("  ");
        assert_eq!(item.icon, None);
    }

    #[test]
    fn icon_serializes_as_empty_string_when_absent() {
        let item = Item::new("Kodi", "/usr/bin/kodi").expect("valid");
        let json = serde_json::to_string(&item).expect("serialize");
        assert!(json.contains("\"icon\":\"\""), "{json}");
    }

    #[test]
    fn missing_or_blank_icon_deserializes_to_none() {
        let a: Item = serde_json::from_str(r#"{"name":"A","path":"a"}"#).expect("parse");
        let b: Item = serde_json::from_str(r#"{"name":"B","path":"b","icon":""}"#).expect("parse");
        let c: Item =
            serde_json::from_str(r#"{"name":"C","path":"c","icon":"c.png"}"#).expect("parse");
        assert_eq!(a.icon, None);
        assert_eq!(b.icon, None);
        assert_eq!(c.icon.as_deref(), Some("c.png"));
    }
}
