use serde::{Deserialize, Serialize};

use super::backend::{RegionView, SeriesPoint};
use crate::models::{RasterHandle, VisualizationSpec};

/// A raster result placed on the interactive map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLayer {
    pub name: String,
    pub raster: RasterHandle,
    pub vis: VisualizationSpec,
    pub visible: bool,
}

impl MapLayer {
    pub fn new(name: impl Into<String>, raster: RasterHandle, vis: VisualizationSpec) -> Self {
        Self { name: name.into(), raster, vis, visible: true }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Port for the interactive map the modules draw on
pub trait MapContext {
    fn center_on(&mut self, view: &RegionView);

    fn add_layer(&mut self, layer: MapLayer);

    fn add_colorbar(&mut self, vis: &VisualizationSpec, label: &str);

    /// Swipe comparison of two layers
    fn split_map(&mut self, left: MapLayer, right: MapLayer);
}

/// Widget written to the result panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelEntry {
    Heading { text: String },
    Metric {
        label: String,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        help: Option<String>,
    },
    Caption { text: String },
    Info { text: String },
    Warning { text: String },
    Error { text: String },
    Progress { label: String, fraction: f64 },
    Chart { title: String, points: Vec<SeriesPoint> },
    Link { label: String, url: String },
    Download { label: String, file_name: String, mime: String, content: String },
}

/// Port for the summary panel next to the map
pub trait ResultPanel {
    fn push(&mut self, entry: PanelEntry);

    fn heading(&mut self, text: &str) {
        self.push(PanelEntry::Heading { text: text.to_string() });
    }

    fn metric(&mut self, label: &str, value: &str) {
        self.push(PanelEntry::Metric { label: label.to_string(), value: value.to_string(), help: None });
    }

    fn metric_with_help(&mut self, label: &str, value: &str, help: &str) {
        self.push(PanelEntry::Metric {
            label: label.to_string(),
            value: value.to_string(),
            help: Some(help.to_string()),
        });
    }

    fn caption(&mut self, text: &str) {
        self.push(PanelEntry::Caption { text: text.to_string() });
    }

    fn info(&mut self, text: &str) {
        self.push(PanelEntry::Info { text: text.to_string() });
    }

    fn warning(&mut self, text: &str) {
        self.push(PanelEntry::Warning { text: text.to_string() });
    }

    fn error(&mut self, text: &str) {
        self.push(PanelEntry::Error { text: text.to_string() });
    }

    /// Progress bar, `fraction` is clamped to `[0, 1]`.
    fn progress(&mut self, label: &str, fraction: f64) {
        self.push(PanelEntry::Progress { label: label.to_string(), fraction: fraction.clamp(0.0, 1.0) });
    }

    fn chart(&mut self, title: &str, points: Vec<SeriesPoint>) {
        self.push(PanelEntry::Chart { title: title.to_string(), points });
    }

    fn link(&mut self, label: &str, url: &str) {
        self.push(PanelEntry::Link { label: label.to_string(), url: url.to_string() });
    }

    fn download(&mut self, label: &str, file_name: &str, mime: &str, content: String) {
        self.push(PanelEntry::Download {
            label: label.to_string(),
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            content,
        });
    }
}
