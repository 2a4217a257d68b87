//! Geometry models for sarovar-geo.
//!
//! This module re-exports canonical types from `sarovar-core` and provides
//! conversions to and from the `geo` crate.

use geo::Geometry as GeoGeometry;

use sarovar_core::error::Result;
pub use sarovar_core::models::{Bounds, Geometry, GeometryType};

fn to_line_string(ring: &[[f64; 2]]) -> geo::LineString {
    geo::LineString::new(ring.iter().map(|c| geo::Coord { x: c[0], y: c[1] }).collect())
}

/// Convert a canonical Geometry to a geo::Geometry
pub fn to_geo_geometry(geom: &Geometry) -> GeoGeometry {
    match geom {
        Geometry::Point { coordinates } => {
            GeoGeometry::Point(geo::Point::new(coordinates[0], coordinates[1]))
        }
        Geometry::Polygon { coordinates } => {
            let mut rings = coordinates.iter().map(|ring| to_line_string(ring));
            let exterior = rings.next().unwrap_or_else(|| geo::LineString::new(vec![]));
            GeoGeometry::Polygon(geo::Polygon::new(exterior, rings.collect()))
        }
    }
}

/// Convert a geo::Polygon exterior to a canonical polygon.
///
/// Fails when the ring does not have three distinct vertices.
pub fn from_geo_polygon(polygon: &geo::Polygon) -> Result<Geometry> {
    Geometry::polygon(polygon.exterior().coords().map(|c| [c.x, c.y]).collect())
}

/// Extension trait for Geometry with geo-crate operations
pub trait GeometryExt {
    /// Convert to geo::Geometry
    fn to_geo(&self) -> GeoGeometry;

    /// Get the centroid as coordinates
    fn centroid_coords(&self) -> Option<[f64; 2]>;

    /// Planar area in square degrees
    fn planar_area(&self) -> f64;
}

impl GeometryExt for Geometry {
    fn to_geo(&self) -> GeoGeometry {
        to_geo_geometry(self)
    }

    fn centroid_coords(&self) -> Option<[f64; 2]> {
        use geo::algorithm::centroid::Centroid;
        self.to_geo().centroid().map(|p| [p.x(), p.y()])
    }

    fn planar_area(&self) -> f64 {
        use geo::algorithm::area::Area;
        self.to_geo().unsigned_area()
    }
}
