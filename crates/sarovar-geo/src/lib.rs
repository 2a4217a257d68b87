//! GeoSarovar Geo - ROI resolution, simplification and region lookup
//!
//! This crate turns user supplied ROI inputs into the canonical geometry
//! and tags that geometry with the administrative region containing it.

pub mod classifier;
pub mod models;
pub mod resolver;
pub mod simplify;

pub use classifier::RegionClassifier;
pub use resolver::{resolve, ResolveOptions, RoiInput};
