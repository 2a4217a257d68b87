//! GeoSarovar Session - ROI lifecycle, analysis orchestration and export
//!
//! [`SessionState`] is a plain value advanced by pure transitions; the
//! [`Orchestrator`] owns one such state per user session together with
//! the backend, the module registry and the region classifier.

pub mod error;
pub mod export;
pub mod orchestrator;
pub mod state;

pub use error::{Result, SessionError};
pub use export::{ExportSettings, Legend, LegendEntry, StaticMapRequest};
pub use orchestrator::{InputSnapshot, Orchestrator, SessionOptions};
pub use state::{AnalysisResult, Phase, SessionEvent, SessionState, TransitionError};
