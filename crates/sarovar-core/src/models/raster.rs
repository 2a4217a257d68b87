//! Remote raster request graph.
//!
//! Nothing here computes pixels. An [`ImageExpr`] is a serializable
//! description of an image computation that the compute backend evaluates
//! on its side; modules build these trees and hand them over inside
//! [`RasterHandle`]s or backend requests.

use std::ops::{Add, Div, Mul, Not, Sub};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::geometry::Geometry;
use super::visualization::VisualizationSpec;

/// Reduction applied over a collection or over a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    Sum,
    Mean,
    Median,
    Min,
    Max,
    MinMax,
    Mosaic,
    First,
}

impl Reducer {
    pub fn as_str(self) -> &'static str {
        match self {
            Reducer::Sum => "sum",
            Reducer::Mean => "mean",
            Reducer::Median => "median",
            Reducer::Min => "min",
            Reducer::Max => "max",
            Reducer::MinMax => "min_max",
            Reducer::Mosaic => "mosaic",
            Reducer::First => "first",
        }
    }
}

/// Attribute predicate on collection members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyFilter {
    Equals { property: String, value: serde_json::Value },
    ListContains { property: String, value: serde_json::Value },
    LessThan { property: String, value: f64 },
}

impl PropertyFilter {
    pub fn equals(property: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::Equals { property: property.into(), value: value.into() }
    }

    pub fn list_contains(property: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::ListContains { property: property.into(), value: value.into() }
    }

    pub fn less_than(property: impl Into<String>, value: f64) -> Self {
        Self::LessThan { property: property.into(), value }
    }

    pub fn property(&self) -> &str {
        match self {
            Self::Equals { property, .. }
            | Self::ListContains { property, .. }
            | Self::LessThan { property, .. } => property,
        }
    }

    /// Evaluate the predicate against a member's attribute value.
    pub fn matches(&self, actual: Option<&serde_json::Value>) -> bool {
        match (self, actual) {
            (_, None) => false,
            (Self::Equals { value, .. }, Some(actual)) => actual == value,
            (Self::ListContains { value, .. }, Some(serde_json::Value::Array(items))) => {
                items.contains(value)
            }
            (Self::ListContains { .. }, Some(_)) => false,
            (Self::LessThan { value, .. }, Some(actual)) => {
                actual.as_f64().is_some_and(|v| v < *value)
            }
        }
    }
}

/// Half-open date interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A range whose start is not before its end matches nothing.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// The same calendar window shifted back by `years`.
    pub fn years_before(&self, years: i32) -> Self {
        Self { start: shift_year(self.start, -years), end: shift_year(self.end, -years) }
    }

    /// The whole calendar year.
    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year + 1, 1, 1)?,
        })
    }
}

fn shift_year(date: NaiveDate, delta: i32) -> NaiveDate {
    let year = date.year() + delta;
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .unwrap_or(date)
}

/// Secondary collection joined onto each member by a shared property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionJoin {
    pub dataset: String,
    pub match_property: String,
    pub save_as: String,
}

/// Filtered view of a dataset in the backend catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionQuery {
    pub dataset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<DateRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<PropertyFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bands: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<CollectionJoin>,
    /// Expression evaluated on every member, with [`ImageExpr::Current`]
    /// standing for the member itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_image: Option<Box<ImageExpr>>,
}

impl CollectionQuery {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            dates: None,
            region: None,
            filters: Vec::new(),
            bands: Vec::new(),
            join: None,
            per_image: None,
        }
    }

    pub fn dates(mut self, range: DateRange) -> Self {
        self.dates = Some(range);
        self
    }

    pub fn within(mut self, region: &Geometry) -> Self {
        self.region = Some(region.clone());
        self
    }

    pub fn filter(mut self, filter: PropertyFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn select<I, S>(mut self, bands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bands = bands.into_iter().map(Into::into).collect();
        self
    }

    pub fn join(mut self, join: CollectionJoin) -> Self {
        self.join = Some(join);
        self
    }

    pub fn map(mut self, expr: ImageExpr) -> Self {
        self.per_image = Some(Box::new(expr));
        self
    }

    /// Composite the collection into a single image.
    pub fn reduce(self, reducer: Reducer) -> ImageExpr {
        ImageExpr::Reduce { source: Box::new(CollectionSource::Query(self)), reducer }
    }
}

/// Input of a collection reduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectionSource {
    Query(CollectionQuery),
    Images { images: Vec<ImageExpr> },
}

impl CollectionSource {
    pub fn images(images: Vec<ImageExpr>) -> Self {
        Self::Images { images }
    }

    pub fn reduce(self, reducer: Reducer) -> ImageExpr {
        ImageExpr::Reduce { source: Box::new(self), reducer }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Pow,
    Gt,
    Gte,
    Lt,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocalKernel {
    Mean,
    Median,
}

/// Node of a remote image computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum ImageExpr {
    Asset { id: String },
    Constant { value: f64 },
    PixelArea,
    Current,
    Joined { name: String, band: String },
    Reduce { source: Box<CollectionSource>, reducer: Reducer },
    Select { image: Box<ImageExpr>, bands: Vec<String> },
    Rename { image: Box<ImageExpr>, names: Vec<String> },
    Binary { op: BinaryOp, lhs: Box<ImageExpr>, rhs: Box<ImageExpr> },
    Not { image: Box<ImageExpr> },
    Log { image: Box<ImageExpr> },
    NormalizedDifference { image: Box<ImageExpr>, bands: [String; 2] },
    UnitScale { image: Box<ImageExpr>, low: f64, high: f64 },
    Clamp { image: Box<ImageExpr>, low: f64, high: f64 },
    Remap { image: Box<ImageExpr>, from: Vec<f64>, to: Vec<f64> },
    Focal { image: Box<ImageExpr>, kernel: FocalKernel, radius_m: f64 },
    Slope { image: Box<ImageExpr> },
    Clip { image: Box<ImageExpr>, region: Geometry },
    UpdateMask { image: Box<ImageExpr>, mask: Box<ImageExpr> },
    SelfMask { image: Box<ImageExpr> },
    Unmask { image: Box<ImageExpr>, value: f64 },
    ConnectedPixelCount { image: Box<ImageExpr>, max_size: u32 },
    Where { image: Box<ImageExpr>, test: Box<ImageExpr>, value: f64 },
    Blend { base: Box<ImageExpr>, overlay: Box<ImageExpr> },
    Visualize { image: Box<ImageExpr>, vis: VisualizationSpec, bands: Vec<String> },
}

impl ImageExpr {
    pub fn asset(id: impl Into<String>) -> Self {
        Self::Asset { id: id.into() }
    }

    pub fn constant(value: f64) -> Self {
        Self::Constant { value }
    }

    pub fn pixel_area() -> Self {
        Self::PixelArea
    }

    /// The collection member inside a per-image expression.
    pub fn current() -> Self {
        Self::Current
    }

    pub fn joined(name: impl Into<String>, band: impl Into<String>) -> Self {
        Self::Joined { name: name.into(), band: band.into() }
    }

    pub fn select<I, S>(self, bands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Select { image: Box::new(self), bands: bands.into_iter().map(Into::into).collect() }
    }

    pub fn band(self, band: impl Into<String>) -> Self {
        self.select([band.into()])
    }

    pub fn rename(self, name: impl Into<String>) -> Self {
        Self::Rename { image: Box::new(self), names: vec![name.into()] }
    }

    pub fn binary(self, op: BinaryOp, rhs: impl Into<ImageExpr>) -> Self {
        Self::Binary { op, lhs: Box::new(self), rhs: Box::new(rhs.into()) }
    }

    pub fn pow(self, exponent: impl Into<ImageExpr>) -> Self {
        self.binary(BinaryOp::Pow, exponent)
    }

    pub fn gt(self, rhs: impl Into<ImageExpr>) -> Self {
        self.binary(BinaryOp::Gt, rhs)
    }

    pub fn gte(self, rhs: impl Into<ImageExpr>) -> Self {
        self.binary(BinaryOp::Gte, rhs)
    }

    pub fn lt(self, rhs: impl Into<ImageExpr>) -> Self {
        self.binary(BinaryOp::Lt, rhs)
    }

    pub fn and(self, rhs: impl Into<ImageExpr>) -> Self {
        self.binary(BinaryOp::And, rhs)
    }

    pub fn or(self, rhs: impl Into<ImageExpr>) -> Self {
        self.binary(BinaryOp::Or, rhs)
    }

    pub fn log(self) -> Self {
        Self::Log { image: Box::new(self) }
    }

    pub fn normalized_difference(self, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::NormalizedDifference { image: Box::new(self), bands: [a.into(), b.into()] }
    }

    pub fn unit_scale(self, low: f64, high: f64) -> Self {
        Self::UnitScale { image: Box::new(self), low, high }
    }

    pub fn clamp(self, low: f64, high: f64) -> Self {
        Self::Clamp { image: Box::new(self), low, high }
    }

    pub fn remap(self, from: Vec<f64>, to: Vec<f64>) -> Self {
        Self::Remap { image: Box::new(self), from, to }
    }

    pub fn focal_mean(self, radius_m: f64) -> Self {
        Self::Focal { image: Box::new(self), kernel: FocalKernel::Mean, radius_m }
    }

    pub fn focal_median(self, radius_m: f64) -> Self {
        Self::Focal { image: Box::new(self), kernel: FocalKernel::Median, radius_m }
    }

    pub fn slope(self) -> Self {
        Self::Slope { image: Box::new(self) }
    }

    pub fn clip(self, region: &Geometry) -> Self {
        Self::Clip { image: Box::new(self), region: region.clone() }
    }

    pub fn update_mask(self, mask: ImageExpr) -> Self {
        Self::UpdateMask { image: Box::new(self), mask: Box::new(mask) }
    }

    pub fn self_mask(self) -> Self {
        Self::SelfMask { image: Box::new(self) }
    }

    pub fn unmask(self, value: f64) -> Self {
        Self::Unmask { image: Box::new(self), value }
    }

    pub fn connected_pixel_count(self, max_size: u32) -> Self {
        Self::ConnectedPixelCount { image: Box::new(self), max_size }
    }

    /// Replace pixels where `test` is non-zero by `value`.
    pub fn replace_where(self, test: ImageExpr, value: f64) -> Self {
        Self::Where { image: Box::new(self), test: Box::new(test), value }
    }

    pub fn blend(self, overlay: ImageExpr) -> Self {
        Self::Blend { base: Box::new(self), overlay: Box::new(overlay) }
    }

    pub fn visualize(self, vis: VisualizationSpec) -> Self {
        Self::Visualize { image: Box::new(self), vis, bands: Vec::new() }
    }

    pub fn visualize_bands<I, S>(self, bands: I, vis: VisualizationSpec) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Visualize {
            image: Box::new(self),
            vis,
            bands: bands.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<f64> for ImageExpr {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

macro_rules! impl_arith {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<ImageExpr>> $trait<R> for ImageExpr {
            type Output = ImageExpr;

            fn $method(self, rhs: R) -> ImageExpr {
                self.binary($op, rhs)
            }
        }
    };
}

impl_arith!(Add, add, BinaryOp::Add);
impl_arith!(Sub, sub, BinaryOp::Subtract);
impl_arith!(Mul, mul, BinaryOp::Multiply);
impl_arith!(Div, div, BinaryOp::Divide);

impl Not for ImageExpr {
    type Output = ImageExpr;

    fn not(self) -> ImageExpr {
        ImageExpr::Not { image: Box::new(self) }
    }
}

impl ImageExpr {
    /// Name of the first band this expression produces, when it can be
    /// told without asking the backend.
    pub fn output_band(&self) -> Option<&str> {
        match self {
            ImageExpr::Rename { names, .. } => names.first().map(String::as_str),
            ImageExpr::Select { bands, .. } => bands.first().map(String::as_str),
            ImageExpr::Joined { band, .. } => Some(band),
            ImageExpr::Reduce { source, .. } => match source.as_ref() {
                CollectionSource::Query(query) => query.bands.first().map(String::as_str),
                CollectionSource::Images { images } => images.first().and_then(Self::output_band),
            },
            ImageExpr::Binary { lhs: image, .. }
            | ImageExpr::Not { image }
            | ImageExpr::Log { image }
            | ImageExpr::UnitScale { image, .. }
            | ImageExpr::Clamp { image, .. }
            | ImageExpr::Remap { image, .. }
            | ImageExpr::Focal { image, .. }
            | ImageExpr::Clip { image, .. }
            | ImageExpr::UpdateMask { image, .. }
            | ImageExpr::SelfMask { image }
            | ImageExpr::Unmask { image, .. }
            | ImageExpr::Where { image, .. } => image.output_band(),
            _ => None,
        }
    }
}

/// Handle on a remote raster result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterHandle {
    pub label: String,
    pub expr: ImageExpr,
}

impl RasterHandle {
    pub fn new(label: impl Into<String>, expr: ImageExpr) -> Self {
        Self { label: label.into(), expr }
    }
}
