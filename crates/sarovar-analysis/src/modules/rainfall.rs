//! Rainfall accumulation and anomaly.

use sarovar_core::error::SarovarError;
use sarovar_core::models::{
    CollectionQuery, CollectionSource, DateRange, Geometry, ImageExpr, ModuleId, ParameterSet,
    RasterHandle, Reducer, VisualizationSpec,
};
use sarovar_core::ports::ReduceRequest;

use super::{layer, period, ymd};
use crate::error::{AnalysisError, Result};
use crate::module::{AnalysisModule, AnalysisOutput, ModuleContext, ModuleDescriptor};
use crate::schema::{ParamDef, ParameterSchema, SchemaContext};

const CHIRPS_DAILY: &str = "UCSB-CHG/CHIRPS/DAILY";
const ANOMALY_BASELINE_YEARS: i32 = 5;

/// Precipitation product the totals are computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainfallDataset {
    Chirps,
    Gpm,
}

impl RainfallDataset {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "chirps" => Some(Self::Chirps),
            "gpm" => Some(Self::Gpm),
            _ => None,
        }
    }

    pub fn collection(self) -> &'static str {
        match self {
            Self::Chirps => CHIRPS_DAILY,
            Self::Gpm => "NASA/GPM_L3/IMERG_V06",
        }
    }

    pub fn band(self) -> &'static str {
        match self {
            Self::Chirps => "precipitation",
            Self::Gpm => "precipitationCal",
        }
    }

    /// Native resolution used for regional statistics.
    pub fn scale_m(self) -> f64 {
        match self {
            Self::Chirps => 5566.0,
            Self::Gpm => 10_000.0,
        }
    }
}

pub struct RainfallModule;

impl RainfallModule {
    fn accumulation(
        ctx: &mut ModuleContext<'_>,
        roi: &Geometry,
        dataset: RainfallDataset,
        total: ImageExpr,
    ) -> Result<(ImageExpr, VisualizationSpec)> {
        let band = dataset.band();
        let request =
            ReduceRequest::new(total.clone(), Reducer::MinMax, roi, dataset.scale_m()).best_effort();
        let stats = ctx.backend.reduce_region(&request)?;
        let min = stats.get_or(&format!("{}_min", band), 0.0);
        let max = stats.get_or(&format!("{}_max", band), 500.0);

        let vis = VisualizationSpec::ranged(
            min,
            max,
            ["#ffffcc", "#a1dab4", "#41b6c4", "#225ea8", "#081d58"],
        )
        .with_label("Total Rainfall (mm)");
        Ok((total, vis))
    }

    /// Percent departure from the mean of the preceding years' totals.
    fn anomaly(roi: &Geometry, range: DateRange, current: ImageExpr) -> (ImageExpr, VisualizationSpec) {
        let baseline: Vec<ImageExpr> = (1..=ANOMALY_BASELINE_YEARS)
            .rev()
            .map(|years| {
                CollectionQuery::new(CHIRPS_DAILY)
                    .dates(range.years_before(years))
                    .select(["precipitation"])
                    .reduce(Reducer::Sum)
            })
            .collect();
        let long_term_mean = CollectionSource::images(baseline).reduce(Reducer::Mean).clip(roi);

        let anomaly = ((current - long_term_mean.clone()) / long_term_mean * 100.0).rename("anomaly");
        let vis = VisualizationSpec::ranged(-50.0, 50.0, ["red", "orange", "white", "cyan", "blue"])
            .with_label("Rainfall Anomaly (%)");
        (anomaly, vis)
    }
}

impl AnalysisModule for RainfallModule {
    fn descriptor(&self) -> ModuleDescriptor {
        ModuleDescriptor {
            id: ModuleId::RAINFALL,
            name: "Rainfall & Climate Analysis",
            short_name: "Rainfall",
            description: "Seasonal rainfall totals or their departure from the five-year mean",
        }
    }

    fn schema(&self, _ctx: &SchemaContext) -> ParameterSchema {
        ParameterSchema::new(vec![
            ParamDef::choice("dataset", "Dataset", &["chirps", "gpm"], "chirps"),
            ParamDef::date("start", "Start date", ymd(2023, 6, 1)),
            ParamDef::date("end", "End date", ymd(2023, 9, 30)),
            ParamDef::choice("calc_mode", "Calculation", &["accumulation", "anomaly"], "accumulation"),
        ])
    }

    fn analyze(
        &self,
        ctx: &mut ModuleContext<'_>,
        roi: &Geometry,
        params: &ParameterSet,
    ) -> Result<AnalysisOutput> {
        let dataset = params.text("dataset")?;
        let dataset = RainfallDataset::parse(dataset).ok_or_else(|| {
            SarovarError::validation("dataset", format!("unknown dataset '{}'", dataset))
        })?;
        let range = period(params, "start", "end")?;
        let anomaly_mode = params.text("calc_mode")? == "anomaly";

        let collection = CollectionQuery::new(dataset.collection()).dates(range).within(roi);
        if ctx.backend.collection_size(&collection)? == 0 {
            return Err(AnalysisError::empty("rainfall data in the selected date range"));
        }

        let total = collection.select([dataset.band()]).reduce(Reducer::Sum).clip(roi);
        let (image, vis) = if anomaly_mode {
            Self::anomaly(roi, range, total)
        } else {
            Self::accumulation(ctx, roi, dataset, total)?
        };

        let title = vis.label.clone().unwrap_or_default();
        ctx.map.add_layer(layer(&title, image.clone(), vis.clone()));
        ctx.map.add_colorbar(&vis, &title);

        let request = ReduceRequest::new(image.clone(), Reducer::Mean, roi, dataset.scale_m()).best_effort();
        let unit = if anomaly_mode { "%" } else { "mm" };
        match ctx.backend.reduce_region(&request)?.first() {
            Some(mean) => ctx.panel.metric("Region Average", &format!("{:.1} {}", mean, unit)),
            None => ctx.panel.metric("Region Average", "N/A"),
        }

        Ok(AnalysisOutput::new(RasterHandle::new(title, image), vis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_dataset_constants() {
        assert_eq!(RainfallDataset::Chirps.band(), "precipitation");
        assert_eq!(RainfallDataset::Gpm.band(), "precipitationCal");
        assert_eq!(RainfallDataset::Gpm.scale_m(), 10_000.0);
        assert!(RainfallDataset::parse("era5").is_none());
    }

    #[test]
    fn test_anomaly_baseline_covers_five_prior_years() {
        let roi = Geometry::polygon(vec![[72.0, 26.0], [74.0, 26.0], [74.0, 28.0]]).unwrap();
        let range = DateRange::new(ymd(2023, 6, 1), ymd(2023, 9, 30));
        let (image, vis) = RainfallModule::anomaly(&roi, range, ImageExpr::constant(1.0));

        assert_eq!(vis.min, Some(-50.0));
        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["names"][0], "anomaly");

        let text = json.to_string();
        for year in 2018..=2022 {
            assert!(text.contains(&format!("{}-06-01", year)), "missing {}", year);
        }
        assert!(!text.contains("2017-06-01"));
        assert_eq!(range.years_before(5).start.year(), 2018);
    }
}
