//! In-memory map and panel that keep everything drawn on them.
//!
//! Used wherever there is no interactive UI: the HTTP API serializes
//! them, the CLI prints them and tests inspect them.

use serde::{Deserialize, Serialize};

use super::backend::RegionView;
use super::display::{MapContext, MapLayer, PanelEntry, ResultPanel};
use crate::models::VisualizationSpec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Colorbar {
    pub label: String,
    pub vis: VisualizationSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitView {
    pub left: MapLayer,
    pub right: MapLayer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingMap {
    pub view: Option<RegionView>,
    pub layers: Vec<MapLayer>,
    pub colorbars: Vec<Colorbar>,
    pub split: Option<SplitView>,
}

impl RecordingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, name: &str) -> Option<&MapLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl MapContext for RecordingMap {
    fn center_on(&mut self, view: &RegionView) {
        self.view = Some(*view);
    }

    fn add_layer(&mut self, layer: MapLayer) {
        self.layers.push(layer);
    }

    fn add_colorbar(&mut self, vis: &VisualizationSpec, label: &str) {
        self.colorbars.push(Colorbar { label: label.to_string(), vis: vis.clone() });
    }

    fn split_map(&mut self, left: MapLayer, right: MapLayer) {
        self.split = Some(SplitView { left, right });
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordingPanel {
    pub entries: Vec<PanelEntry>,
}

impl RecordingPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the first metric with this label.
    pub fn metric_value(&self, label: &str) -> Option<&str> {
        self.entries.iter().find_map(|e| match e {
            PanelEntry::Metric { label: l, value, .. } if l == label => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                PanelEntry::Warning { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                PanelEntry::Error { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_heading(&self, text: &str) -> bool {
        self.entries.iter().any(|e| matches!(e, PanelEntry::Heading { text: t } if t == text))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl ResultPanel for RecordingPanel {
    fn push(&mut self, entry: PanelEntry) {
        self.entries.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageExpr, RasterHandle};

    #[test]
    fn test_panel_helpers() {
        let mut panel = RecordingPanel::new();
        panel.heading("Flood Report");
        panel.metric("Estimated Extent", "12.5 Ha");
        panel.warning("careful");
        panel.progress("Rain", 1.7);

        assert!(panel.has_heading("Flood Report"));
        assert_eq!(panel.metric_value("Estimated Extent"), Some("12.5 Ha"));
        assert_eq!(panel.warnings(), vec!["careful"]);
        assert!(panel.errors().is_empty());
        assert_eq!(
            panel.entries.last(),
            Some(&PanelEntry::Progress { label: "Rain".to_string(), fraction: 1.0 })
        );
    }

    #[test]
    fn test_map_records_layers() {
        let mut map = RecordingMap::new();
        let raster = RasterHandle::new("dem", ImageExpr::asset("USGS/SRTMGL1_003"));
        map.add_layer(MapLayer::new("Slope Input", raster.clone(), VisualizationSpec::empty()).hidden());
        map.add_layer(MapLayer::new("Result", raster, VisualizationSpec::empty()));

        assert_eq!(map.layer_names(), vec!["Slope Input", "Result"]);
        assert!(!map.layer("Slope Input").unwrap().visible);
        map.clear();
        assert!(map.layers.is_empty());
    }
}
