//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod backend;
pub mod display;
pub mod recording;

pub use backend::{
    ComputeBackend, ExportRequest, ExportTicket, FeatureQuery, FeatureRecord, ReduceOutput,
    ReduceRequest, RegionView, SeriesPoint, SeriesRequest, ThumbnailRequest, VideoRequest,
};
pub use display::{MapContext, MapLayer, PanelEntry, ResultPanel};
pub use recording::{Colorbar, RecordingMap, RecordingPanel, SplitView};
