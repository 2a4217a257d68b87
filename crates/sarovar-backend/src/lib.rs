//! GeoSarovar Backend - Compute backend adapters
//!
//! [`MemoryBackend`] evaluates collection metadata locally and answers
//! pixel statistics from scripted values; [`HttpBackend`] forwards every
//! request to a remote compute service.

pub mod fixture;
pub mod http;
pub mod memory;

pub use fixture::{Fixture, FixtureFeature, Scene};
pub use http::HttpBackend;
pub use memory::MemoryBackend;
