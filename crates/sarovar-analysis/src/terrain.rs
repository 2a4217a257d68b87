//! Terrain profiles used to seed weighted-overlay defaults.

use serde::Serialize;

use sarovar_core::models::RegionTag;

/// Criteria weights of the rainwater-harvesting overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Weights {
    pub rain: f64,
    pub slope: f64,
    pub soil: f64,
    pub lulc: f64,
    pub drain: f64,
}

impl Weights {
    pub const fn new(rain: f64, slope: f64, soil: f64, lulc: f64, drain: f64) -> Self {
        Self { rain, slope, soil, lulc, drain }
    }

    pub fn to_array(self) -> [f64; 5] {
        [self.rain, self.slope, self.soil, self.lulc, self.drain]
    }

    pub fn from_array(values: [f64; 5]) -> Self {
        let [rain, slope, soil, lulc, drain] = values;
        Self { rain, slope, soil, lulc, drain }
    }

    pub fn sum(self) -> f64 {
        self.to_array().iter().sum()
    }
}

/// A named terrain class with the regions it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TerrainProfile {
    pub name: &'static str,
    pub regions: &'static [&'static str],
    pub weights: Weights,
}

pub const GENERAL: TerrainProfile = TerrainProfile {
    name: "General (Plateau)",
    regions: &[],
    weights: Weights::new(0.25, 0.20, 0.20, 0.15, 0.20),
};

pub const PROFILES: &[TerrainProfile] = &[
    TerrainProfile {
        name: "Arid/Semi-Arid",
        regions: &["Rajasthan", "Gujarat", "Haryana"],
        weights: Weights::new(0.35, 0.15, 0.25, 0.10, 0.15),
    },
    TerrainProfile {
        name: "Hilly/Mountainous",
        regions: &[
            "Himachal Pradesh",
            "Uttarakhand",
            "Sikkim",
            "Arunachal Pradesh",
            "Jammu and Kashmir",
            "Ladakh",
        ],
        weights: Weights::new(0.10, 0.40, 0.15, 0.10, 0.25),
    },
    TerrainProfile {
        name: "Coastal/Wet",
        regions: &["Kerala", "Goa", "Konkan"],
        weights: Weights::new(0.10, 0.30, 0.20, 0.20, 0.20),
    },
    TerrainProfile {
        name: "Alluvial Plains",
        regions: &["Uttar Pradesh", "Bihar", "West Bengal", "Punjab"],
        weights: Weights::new(0.20, 0.10, 0.15, 0.30, 0.25),
    },
];

impl TerrainProfile {
    /// Profile for a region; unknown or unclassified regions get [`GENERAL`].
    pub fn for_region(region: Option<&RegionTag>) -> &'static TerrainProfile {
        let Some(name) = region.and_then(RegionTag::name) else {
            return &GENERAL;
        };
        PROFILES
            .iter()
            .find(|p| p.regions.iter().any(|r| r.eq_ignore_ascii_case(name)))
            .unwrap_or(&GENERAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_lookup() {
        let rajasthan = RegionTag::Named("Rajasthan".to_string());
        assert_eq!(TerrainProfile::for_region(Some(&rajasthan)).name, "Arid/Semi-Arid");

        let sikkim = RegionTag::Named("sikkim".to_string());
        assert_eq!(TerrainProfile::for_region(Some(&sikkim)).name, "Hilly/Mountainous");

        assert_eq!(TerrainProfile::for_region(Some(&RegionTag::Unclassified)), &GENERAL);
        assert_eq!(TerrainProfile::for_region(None), &GENERAL);

        let other = RegionTag::Named("Karnataka".to_string());
        assert_eq!(TerrainProfile::for_region(Some(&other)), &GENERAL);
    }

    #[test]
    fn test_all_profiles_sum_to_one_and_are_positive() {
        for profile in PROFILES.iter().chain(std::iter::once(&GENERAL)) {
            assert!((profile.weights.sum() - 1.0).abs() < 1e-9, "{}", profile.name);
            assert!(profile.weights.to_array().iter().all(|w| *w > 0.0), "{}", profile.name);
        }
    }
}
