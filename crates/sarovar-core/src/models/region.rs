use std::fmt;

use serde::{Deserialize, Serialize};

/// Administrative region that contains the ROI centroid.
///
/// A failed or empty lookup is recorded as [`RegionTag::Unclassified`];
/// it is never represented by an empty name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum RegionTag {
    Named(String),
    Unclassified,
}

impl RegionTag {
    /// Label shown for ROIs outside every known region.
    pub const UNCLASSIFIED_LABEL: &'static str = "Custom Area";

    /// Build a tag from the classifier's optional answer.
    pub fn from_lookup(name: Option<String>) -> Self {
        match name {
            Some(name) if !name.trim().is_empty() => RegionTag::Named(name.trim().to_string()),
            _ => RegionTag::Unclassified,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            RegionTag::Named(name) => Some(name),
            RegionTag::Unclassified => None,
        }
    }

    pub fn label(&self) -> &str {
        self.name().unwrap_or(Self::UNCLASSIFIED_LABEL)
    }

    pub fn is_classified(&self) -> bool {
        matches!(self, RegionTag::Named(_))
    }
}

impl fmt::Display for RegionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lookup() {
        assert_eq!(
            RegionTag::from_lookup(Some("Rajasthan".to_string())),
            RegionTag::Named("Rajasthan".to_string())
        );
        assert_eq!(RegionTag::from_lookup(None), RegionTag::Unclassified);
        assert_eq!(RegionTag::from_lookup(Some("  ".to_string())), RegionTag::Unclassified);
    }

    #[test]
    fn test_label() {
        assert_eq!(RegionTag::Named("Kerala".to_string()).label(), "Kerala");
        assert_eq!(RegionTag::Unclassified.to_string(), "Custom Area");
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_value(RegionTag::Named("Goa".to_string())).unwrap();
        assert_eq!(json["kind"], "named");
        assert_eq!(json["name"], "Goa");

        let json = serde_json::to_value(RegionTag::Unclassified).unwrap();
        assert_eq!(json["kind"], "unclassified");
    }
}
