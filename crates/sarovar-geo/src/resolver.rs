//! ROI input resolution.
//!
//! Three input modes are supported: an uploaded boundary file (KML-style
//! `<coordinates>` blocks), a point with a buffer radius, and a shape drawn
//! on the interactive map (GeoJSON). All of them resolve to the canonical
//! [`Geometry`]; nothing here touches session state.

use std::sync::OnceLock;

use geojson::GeoJson;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::{Deserialize, Serialize};

use sarovar_core::error::{Result, SarovarError};
use sarovar_core::models::{Bounds, Geometry};

use crate::models::{from_geo_polygon, GeometryExt};
use crate::simplify::{meters_to_degrees, simplify_ring};

/// Mean Earth radius (IUGG) in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Default simplification tolerance for boundary files, in meters.
pub const DEFAULT_SIMPLIFY_TOLERANCE_M: f64 = 50.0;

/// Raw ROI input as handed over by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RoiInput {
    /// Contents of an uploaded boundary file.
    BoundaryFile { content: Vec<u8> },
    /// Circular buffer around a point, replaced by its bounding box.
    PointBuffer { lat: f64, lon: f64, radius_m: f64 },
    /// GeoJSON geometry or feature from the drawing widget.
    DrawnShape { shape: serde_json::Value },
}

impl RoiInput {
    pub fn boundary_file(content: impl Into<Vec<u8>>) -> Self {
        Self::BoundaryFile { content: content.into() }
    }

    pub fn point_buffer(lat: f64, lon: f64, radius_m: f64) -> Self {
        Self::PointBuffer { lat, lon, radius_m }
    }

    pub fn drawn_shape(shape: serde_json::Value) -> Self {
        Self::DrawnShape { shape }
    }

    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::BoundaryFile { .. } => "boundary file",
            Self::PointBuffer { .. } => "point and radius",
            Self::DrawnShape { .. } => "drawn shape",
        }
    }
}

/// Tunables for [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveOptions {
    pub simplify_tolerance_m: f64,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { simplify_tolerance_m: DEFAULT_SIMPLIFY_TOLERANCE_M }
    }
}

/// Resolve any ROI input into the canonical geometry.
pub fn resolve(input: &RoiInput, options: &ResolveOptions) -> Result<Geometry> {
    match input {
        RoiInput::BoundaryFile { content } => resolve_boundary_file(content, options),
        RoiInput::PointBuffer { lat, lon, radius_m } => resolve_point_buffer(*lat, *lon, *radius_m),
        RoiInput::DrawnShape { shape } => resolve_drawn_shape(shape),
    }
}

/// Parse, validate and simplify the first coordinate block of a boundary file.
pub fn resolve_boundary_file(content: &[u8], options: &ResolveOptions) -> Result<Geometry> {
    let text = std::str::from_utf8(content)
        .map_err(|e| SarovarError::parse(format!("file is not valid UTF-8: {}", e)))?;

    let block = find_coordinates_block(text)?
        .ok_or_else(|| SarovarError::parse("no coordinates block found"))?;
    let coords = parse_coordinate_tokens(&block)?;

    let polygon = Geometry::polygon(coords).map_err(|e| SarovarError::parse(e.to_string()))?;
    if polygon.planar_area() <= 0.0 {
        return Err(SarovarError::parse("coordinates are collinear and enclose no area"));
    }

    let epsilon = meters_to_degrees(options.simplify_tolerance_m);
    let before = polygon.vertex_count();
    let simplified = Geometry::polygon(simplify_ring(polygon.exterior(), epsilon))
        .map_err(|e| SarovarError::parse(e.to_string()))?;

    tracing::debug!(
        before,
        after = simplified.vertex_count(),
        tolerance_m = options.simplify_tolerance_m,
        "Simplified boundary polygon"
    );

    Ok(simplified)
}

fn coordinates_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)<coordinates>(.*?)</coordinates>").ok()).as_ref()
}

/// Text of the first coordinates block.
///
/// A plain `<coordinates>` tag is matched directly; otherwise the document
/// is walked as XML for the first element whose local name ends with
/// `coordinates` (namespaced or prefixed variants).
fn find_coordinates_block(text: &str) -> Result<Option<String>> {
    if let Some(captures) = coordinates_pattern().and_then(|re| re.captures(text)) {
        return Ok(captures.get(1).map(|m| m.as_str().to_string()));
    }

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut inside = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                inside = name.ends_with("coordinates");
            }
            Ok(Event::Text(t)) if inside => {
                let content = t
                    .unescape()
                    .map_err(|e| SarovarError::parse(format!("invalid XML text: {}", e)))?;
                if !content.trim().is_empty() {
                    return Ok(Some(content.into_owned()));
                }
            }
            Ok(Event::CData(c)) if inside => {
                let content = String::from_utf8_lossy(&c.into_inner()).into_owned();
                if !content.trim().is_empty() {
                    return Ok(Some(content));
                }
            }
            Ok(Event::End(_)) => inside = false,
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(SarovarError::parse(format!("invalid XML: {}", e))),
            _ => {}
        }
    }
}

/// Parse whitespace separated `lon,lat[,alt]` tokens.
///
/// Tokens with fewer than two comma separated parts are skipped.
fn parse_coordinate_tokens(block: &str) -> Result<Vec<[f64; 2]>> {
    let mut coords = Vec::new();
    for token in block.split_whitespace() {
        let mut parts = token.split(',');
        let (Some(lon), Some(lat)) = (parts.next(), parts.next()) else {
            continue;
        };
        let parse = |s: &str| {
            s.trim()
                .parse::<f64>()
                .map_err(|_| SarovarError::parse(format!("invalid coordinate '{}'", token)))
        };
        coords.push([parse(lon)?, parse(lat)?]);
    }

    if coords.len() < 3 {
        return Err(SarovarError::parse(format!(
            "need at least 3 coordinate pairs, found {}",
            coords.len()
        )));
    }
    Ok(coords)
}

/// Smallest offset that still moves `around` in floating point.
fn min_offset(around: f64) -> f64 {
    around.abs().max(1.0) * 4.0 * f64::EPSILON
}

/// Upper box edge, capped at `limit` unless the center sits on it.
fn upper_edge(center: f64, offset: f64, limit: f64) -> f64 {
    if center < limit {
        (center + offset).min(limit)
    } else {
        center + min_offset(center)
    }
}

/// Lower box edge, capped at `limit` unless the center sits on it.
fn lower_edge(center: f64, offset: f64, limit: f64) -> f64 {
    if center > limit {
        (center - offset).max(limit)
    } else {
        center - min_offset(center)
    }
}

/// Bounding box of a geodesic circle, as a polygon.
///
/// The box strictly contains the center and stays within WGS 84 range.
/// Circles covering a pole or crossing the antimeridian take the full
/// longitude band. A center exactly on a pole or on ±180° is the one case
/// where the box pokes a hair past the range, so that containment stays
/// strict.
pub fn resolve_point_buffer(lat: f64, lon: f64, radius_m: f64) -> Result<Geometry> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(SarovarError::validation("latitude", format!("{} is outside [-90, 90]", lat)));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(SarovarError::validation(
            "longitude",
            format!("{} is outside [-180, 180]", lon),
        ));
    }
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(SarovarError::validation("radius", format!("{} must be positive", radius_m)));
    }

    let angular = radius_m / EARTH_RADIUS_M;
    let dlat = angular.to_degrees().max(min_offset(lat));

    let covers_pole = lat + dlat >= 90.0 || lat - dlat <= -90.0;
    let dlon = if covers_pole {
        360.0
    } else {
        let ratio = angular.sin() / lat.to_radians().cos();
        if ratio >= 1.0 {
            360.0
        } else {
            ratio.asin().to_degrees().max(min_offset(lon))
        }
    };
    let dlon = if lon - dlon < -180.0 || lon + dlon > 180.0 { 360.0 } else { dlon };

    Bounds::new(
        lower_edge(lon, dlon, -180.0),
        lower_edge(lat, dlat, -90.0),
        upper_edge(lon, dlon, 180.0),
        upper_edge(lat, dlat, 90.0),
    )
    .to_polygon()
}

/// Convert a drawn GeoJSON Polygon or Point into the canonical geometry.
pub fn resolve_drawn_shape(shape: &serde_json::Value) -> Result<Geometry> {
    let geojson = GeoJson::from_json_value(shape.clone())
        .map_err(|e| SarovarError::conversion(format!("malformed GeoJSON: {}", e)))?;

    let geometry = match geojson {
        GeoJson::Geometry(geometry) => geometry,
        GeoJson::Feature(feature) => feature
            .geometry
            .ok_or_else(|| SarovarError::conversion("feature has no geometry"))?,
        GeoJson::FeatureCollection(_) => {
            return Err(SarovarError::conversion("expected a single geometry, got a collection"))
        }
    };

    match geometry.value {
        value @ geojson::Value::Polygon(_) => {
            let polygon: geo::Polygon<f64> = value
                .try_into()
                .map_err(|e: geojson::Error| SarovarError::conversion(e.to_string()))?;
            if !polygon.interiors().is_empty() {
                tracing::debug!(holes = polygon.interiors().len(), "Ignoring polygon holes");
            }
            from_geo_polygon(&polygon).map_err(|e| SarovarError::conversion(e.to_string()))
        }
        value @ geojson::Value::Point(_) => {
            let point: geo::Point<f64> = value
                .try_into()
                .map_err(|e: geojson::Error| SarovarError::conversion(e.to_string()))?;
            let (lon, lat) = (point.x(), point.y());
            if !lon.is_finite()
                || !lat.is_finite()
                || !(-180.0..=180.0).contains(&lon)
                || !(-90.0..=90.0).contains(&lat)
            {
                return Err(SarovarError::conversion(format!(
                    "point ({}, {}) is outside geographic range",
                    lon, lat
                )));
            }
            Ok(Geometry::point(lon, lat))
        }
        other => Err(SarovarError::conversion(format!(
            "unsupported geometry type {}, expected Polygon or Point",
            geometry_type_name(&other)
        ))),
    }
}

fn geometry_type_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}
