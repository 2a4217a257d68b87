use serde::Deserialize;

use sarovar_core::models::{ModuleId, RawParameters};
use sarovar_geo::RoiInput;

/// ROI submission body, tagged by input mode
#[derive(Debug, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RoiRequest {
    /// Text of a KML boundary file.
    BoundaryFile { content: String },
    PointBuffer {
        lat: f64,
        lon: f64,
        #[serde(default = "default_radius_m")]
        radius_m: f64,
    },
    /// A shape from the drawing widget. It is only staged unless
    /// `confirm` is set.
    DrawnShape {
        shape: serde_json::Value,
        #[serde(default)]
        confirm: bool,
    },
    /// Lock the shape staged by an earlier unconfirmed drawing.
    ConfirmDrawing,
}

fn default_radius_m() -> f64 {
    1000.0
}

impl RoiRequest {
    /// Resolver input for the modes that lock immediately.
    pub fn input(&self) -> Option<RoiInput> {
        match self {
            Self::BoundaryFile { content } => Some(RoiInput::boundary_file(content.as_bytes())),
            Self::PointBuffer { lat, lon, radius_m } => Some(RoiInput::point_buffer(*lat, *lon, *radius_m)),
            Self::DrawnShape { shape, confirm: true } => Some(RoiInput::drawn_shape(shape.clone())),
            Self::DrawnShape { confirm: false, .. } | Self::ConfirmDrawing => None,
        }
    }
}

/// Module selection body
#[derive(Debug, Deserialize)]
pub struct SelectModuleRequest {
    pub module: ModuleId,
    /// Widget values to derive immediately; defaults apply otherwise.
    #[serde(default)]
    pub parameters: Option<RawParameters>,
}

/// Run trigger body
#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub parameters: Option<RawParameters>,
}

/// Static map body
#[derive(Debug, Default, Deserialize)]
pub struct StaticMapBody {
    pub title: Option<String>,
}

/// Module listing query string
#[derive(Debug, Default, Deserialize)]
pub struct ModulesQuery {
    /// Region name used to tune module defaults.
    pub region: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roi_request_modes() {
        let request: RoiRequest =
            serde_json::from_str(r#"{"mode": "point_buffer", "lat": 26.3, "lon": 73.0}"#).unwrap();
        assert_eq!(request.input(), Some(RoiInput::point_buffer(26.3, 73.0, 1000.0)));

        let request: RoiRequest =
            serde_json::from_str(r#"{"mode": "drawn_shape", "shape": {"type": "Point", "coordinates": [0, 0]}}"#)
                .unwrap();
        assert!(request.input().is_none());

        let request: RoiRequest = serde_json::from_str(
            r#"{"mode": "drawn_shape", "confirm": true, "shape": {"type": "Point", "coordinates": [0, 0]}}"#,
        )
        .unwrap();
        let point = serde_json::json!({"type": "Point", "coordinates": [0, 0]});
        assert_eq!(request.input(), Some(RoiInput::drawn_shape(point)));

        let request: RoiRequest = serde_json::from_str(r#"{"mode": "confirm_drawing"}"#).unwrap();
        assert!(matches!(request, RoiRequest::ConfirmDrawing));

        assert!(serde_json::from_str::<RoiRequest>(r#"{"mode": "telepathy"}"#).is_err());
    }
}
