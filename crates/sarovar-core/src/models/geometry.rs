//! Canonical ROI geometry shared by all sarovar crates.
//!
//! The representation is GeoJSON-compatible (longitude/latitude pairs in
//! WGS 84) so it can be shipped to the compute backend and the UI as-is.

use std::collections::HashSet;

use geo::BoundingRect;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SarovarError};

/// Geometry type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    Polygon,
}

/// A point or polygon region of interest.
///
/// Polygons built through [`Geometry::polygon`] always have at least three
/// distinct vertices and an explicitly closed exterior ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
}

impl Geometry {
    /// Create a Point geometry
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point { coordinates: [lon, lat] }
    }

    /// Create a single-ring polygon, closing the ring if needed.
    pub fn polygon(ring: Vec<[f64; 2]>) -> Result<Self> {
        let mut ring = ring;
        if ring.iter().flatten().any(|v| !v.is_finite()) {
            return Err(SarovarError::InvalidGeometry {
                reason: "coordinates must be finite numbers".to_string(),
            });
        }

        ring.dedup();
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }

        let distinct: HashSet<(u64, u64)> =
            ring.iter().map(|c| (c[0].to_bits(), c[1].to_bits())).collect();
        if distinct.len() < 3 {
            return Err(SarovarError::InvalidGeometry {
                reason: format!("polygon needs at least 3 distinct vertices, got {}", distinct.len()),
            });
        }

        ring.push(ring[0]);
        Ok(Geometry::Polygon { coordinates: vec![ring] })
    }

    /// Get the geometry type
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point { .. } => GeometryType::Point,
            Geometry::Polygon { .. } => GeometryType::Polygon,
        }
    }

    /// Exterior ring of a polygon, or the single coordinate of a point.
    pub fn exterior(&self) -> &[[f64; 2]] {
        match self {
            Geometry::Point { coordinates } => std::slice::from_ref(coordinates),
            Geometry::Polygon { coordinates } => {
                coordinates.first().map(Vec::as_slice).unwrap_or(&[])
            }
        }
    }

    /// Number of distinct vertices (the closing vertex is not counted).
    pub fn vertex_count(&self) -> usize {
        match self {
            Geometry::Point { .. } => 1,
            Geometry::Polygon { .. } => {
                let ring = self.exterior();
                if ring.len() > 1 && ring.first() == ring.last() {
                    ring.len() - 1
                } else {
                    ring.len()
                }
            }
        }
    }

    /// Axis-aligned bounds of all coordinates.
    pub fn bounds(&self) -> Option<Bounds> {
        let line: geo::LineString =
            self.exterior().iter().map(|c| geo::Coord { x: c[0], y: c[1] }).collect();
        line.bounding_rect()
            .map(|rect| Bounds::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    /// Try to parse from a serde_json::Value (GeoJSON)
    pub fn from_geojson(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Convert to serde_json::Value (GeoJSON)
    pub fn to_geojson(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Longitude/latitude bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self { min_lon, min_lat, max_lon, max_lat }
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn center(&self) -> [f64; 2] {
        [(self.min_lon + self.max_lon) / 2.0, (self.min_lat + self.max_lat) / 2.0]
    }

    /// True when the point lies inside the box and not on its edge.
    pub fn strictly_contains(&self, lon: f64, lat: f64) -> bool {
        lon > self.min_lon && lon < self.max_lon && lat > self.min_lat && lat < self.max_lat
    }

    /// Counter-clockwise closed ring around the box.
    pub fn to_polygon(&self) -> Result<Geometry> {
        Geometry::polygon(vec![
            [self.min_lon, self.min_lat],
            [self.max_lon, self.min_lat],
            [self.max_lon, self.max_lat],
            [self.min_lon, self.max_lat],
        ])
    }
}
