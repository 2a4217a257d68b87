use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of an analysis module in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(Cow<'static, str>);

impl ModuleId {
    pub const RAINFALL: ModuleId = ModuleId::from_static("rainfall");
    pub const RAINWATER_HARVESTING: ModuleId = ModuleId::from_static("rwh");
    pub const ENCROACHMENT: ModuleId = ModuleId::from_static("encroachment");
    pub const FLOOD: ModuleId = ModuleId::from_static("flood");
    pub const WATER_QUALITY: ModuleId = ModuleId::from_static("water-quality");

    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ModuleId {
    fn default() -> Self {
        Self::RAINFALL
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ModuleId {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(s.trim().to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borrowed_and_owned_compare_equal() {
        assert_eq!(ModuleId::new("flood"), ModuleId::FLOOD);
        assert_eq!("Water-Quality".parse::<ModuleId>().unwrap(), ModuleId::WATER_QUALITY);
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&ModuleId::RAINWATER_HARVESTING).unwrap();
        assert_eq!(json, "\"rwh\"");
        let parsed: ModuleId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ModuleId::RAINWATER_HARVESTING);
    }
}
