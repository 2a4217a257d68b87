pub mod geometry;
pub mod module;
pub mod params;
pub mod raster;
pub mod region;
pub mod visualization;

pub use geometry::{Bounds, Geometry, GeometryType};
pub use module::ModuleId;
pub use params::{ParamValue, ParameterSet, RawParameters};
pub use raster::{
    BinaryOp, CollectionJoin, CollectionQuery, CollectionSource, DateRange, FocalKernel,
    ImageExpr, PropertyFilter, RasterHandle, Reducer,
};
pub use region::RegionTag;
pub use visualization::VisualizationSpec;
