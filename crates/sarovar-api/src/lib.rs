//! GeoSarovar HTTP API
//!
//! Each dashboard tab owns a session; the routes drive that session's
//! orchestrator through ROI locking, module selection and analysis runs.

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod services;
pub mod state;

pub use config::{ApiConfig, BackendKind};
pub use router::create_router;
pub use state::AppState;
