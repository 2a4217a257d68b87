use serde::{Deserialize, Serialize};

/// How a raster result is colour-mapped.
///
/// Produced by analysis modules and consumed by map layers and static
/// export. An empty spec accompanies a missing result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub palette: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl VisualizationSpec {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ranged<I, S>(min: f64, max: f64, palette: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            min: Some(min),
            max: Some(max),
            palette: palette.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn single_color(color: impl Into<String>) -> Self {
        Self { palette: vec![color.into()], ..Self::default() }
    }

    pub fn with_classes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn is_categorical(&self) -> bool {
        self.class_names.as_ref().is_some_and(|names| !names.is_empty())
    }
}
