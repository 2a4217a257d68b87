//! GeoSarovar Analysis - Module contract, parameter schemas and the standard modules
//!
//! Every analysis builds a remote request graph for the compute backend,
//! places its layers on the map and summarises the outcome on the result
//! panel. The orchestrator only sees the [`AnalysisModule`] trait.

pub mod error;
pub mod module;
pub mod modules;
pub mod registry;
pub mod schema;
pub mod terrain;

pub use error::{AnalysisError, Result};
pub use module::{AnalysisModule, AnalysisOutput, ModuleContext, ModuleDescriptor};
pub use registry::ModuleRegistry;
pub use schema::{ParamDef, ParamKind, ParameterSchema, SchemaContext, WeightGroup};
pub use terrain::{TerrainProfile, Weights};
