//! GeoSarovar Core - Domain models, configuration and port definitions
//!
//! This crate contains the types shared by every other GeoSarovar crate:
//! the canonical ROI geometry, module parameters, visualization specs, the
//! remote request graph and the traits that adapters implement.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{BackendError, BackendResult, Result, SarovarError};
