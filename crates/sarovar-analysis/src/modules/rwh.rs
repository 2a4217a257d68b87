//! Rainwater harvesting suitability by weighted overlay.

use sarovar_core::models::{
    CollectionQuery, DateRange, Geometry, ImageExpr, ModuleId, ParameterSet, RasterHandle,
    Reducer, VisualizationSpec,
};
use sarovar_core::ports::ReduceRequest;

use super::{layer, ymd};
use crate::error::Result;
use crate::module::{AnalysisModule, AnalysisOutput, ModuleContext, ModuleDescriptor};
use crate::schema::{ParamDef, ParameterSchema, SchemaContext, WeightGroup};
use crate::terrain::{TerrainProfile, Weights};

pub const WEIGHT_NAMES: [&str; 5] = ["w_rain", "w_slope", "w_soil", "w_lulc", "w_drain"];

const STRUCTURES: &[&str] = &["percolation_tank", "check_dam", "farm_pond"];

/// USDA texture classes 1 (clay) to 12 (sand).
const SOIL_CLASSES: [f64; 12] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
const SOIL_STORAGE: [f64; 12] = [1.0, 0.9, 0.7, 0.6, 0.5, 0.9, 0.5, 0.4, 0.3, 0.4, 0.1, 0.2];
const SOIL_RECHARGE: [f64; 12] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.3, 0.6, 0.7, 0.9, 0.9, 1.0, 0.9];

const LANDCOVER_CLASSES: [f64; 11] =
    [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 95.0, 100.0];
const LANDCOVER_SCORES: [f64; 11] = [0.6, 0.8, 0.9, 1.0, 0.0, 0.1, 0.2, 0.0, 0.5, 0.0, 0.1];

const HIGH_POTENTIAL: f64 = 0.65;

/// Harvesting structure the suitability is tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureType {
    PercolationTank,
    CheckDam,
    FarmPond,
}

impl StructureType {
    fn parse(value: &str) -> Self {
        match value {
            "farm_pond" => Self::FarmPond,
            "check_dam" => Self::CheckDam,
            _ => Self::PercolationTank,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PercolationTank => "Percolation Tank",
            Self::CheckDam => "Check Dam",
            Self::FarmPond => "Farm Pond",
        }
    }

    /// Ponds store water and favour clay, the others recharge and favour sand.
    fn soil_scores(self) -> [f64; 12] {
        match self {
            Self::FarmPond => SOIL_STORAGE,
            Self::PercolationTank | Self::CheckDam => SOIL_RECHARGE,
        }
    }
}

pub struct RainwaterHarvestingModule;

impl RainwaterHarvestingModule {
    fn weights(params: &ParameterSet) -> Result<Weights> {
        let mut values = [0.0; 5];
        for (value, name) in values.iter_mut().zip(WEIGHT_NAMES) {
            *value = params.float(name)?;
        }
        Ok(Weights::from_array(values))
    }
}

impl AnalysisModule for RainwaterHarvestingModule {
    fn descriptor(&self) -> ModuleDescriptor {
        ModuleDescriptor {
            id: ModuleId::RAINWATER_HARVESTING,
            name: "Rainwater Harvesting Potential",
            short_name: "Rainwater",
            description: "Multi-criteria suitability of sites for harvesting structures",
        }
    }

    fn schema(&self, ctx: &SchemaContext) -> ParameterSchema {
        let profile = TerrainProfile::for_region(ctx.region.as_ref());
        let defaults = profile.weights.to_array();
        let labels = ["Rainfall", "Slope", "Soil", "Land use", "Drainage"];

        let mut params = vec![ParamDef::choice(
            "structure_type",
            "Structure type",
            STRUCTURES,
            "percolation_tank",
        )];
        for ((name, label), default) in WEIGHT_NAMES.into_iter().zip(labels).zip(defaults) {
            params.push(ParamDef::float(name, label, default, 0.0, 1.0, 0.05));
        }

        ParameterSchema::new(params)
            .with_weights(WeightGroup { names: WEIGHT_NAMES, fallback: profile.weights })
            .with_note(format!("Detected zone: {}", profile.name))
    }

    fn analyze(
        &self,
        ctx: &mut ModuleContext<'_>,
        roi: &Geometry,
        params: &ParameterSet,
    ) -> Result<AnalysisOutput> {
        let structure = StructureType::parse(params.text("structure_type")?);
        let weights = Self::weights(params)?;

        let rain = CollectionQuery::new("UCSB-CHG/CHIRPS/PENTAD")
            .dates(DateRange::new(ymd(2020, 1, 1), ymd(2023, 12, 31)))
            .within(roi)
            .reduce(Reducer::Mean)
            .clip(roi);
        let request = ReduceRequest::new(rain.clone(), Reducer::MinMax, roi, 5000.0).best_effort();
        let stats = ctx.backend.reduce_region(&request)?;
        let rain_min = stats.get_or("precipitation_mean_min", 0.0);
        let rain_max = stats.get_or("precipitation_mean_max", 2000.0);
        let rain_score = rain.unit_scale(rain_min, rain_max);

        let slope = ImageExpr::asset("USGS/SRTMGL1_003").clip(roi).slope();
        let slope_score = (slope.unit_scale(0.0, 30.0) * -1.0 + 1.0).clamp(0.0, 1.0);

        let drain_score = ImageExpr::asset("WWF/HydroSHEDS/15ACC")
            .clip(roi)
            .log()
            .unit_scale(0.0, 12.0)
            .clamp(0.0, 1.0);

        let soil_score = ImageExpr::asset("OpenLandMap/SOL/SOL_TEXTURE-CLASS_USDA-TT_M/v02")
            .clip(roi)
            .remap(SOIL_CLASSES.to_vec(), structure.soil_scores().to_vec());

        let lulc_score = CollectionQuery::new("ESA/WorldCover/v100")
            .reduce(Reducer::First)
            .clip(roi)
            .remap(LANDCOVER_CLASSES.to_vec(), LANDCOVER_SCORES.to_vec());

        let suitability = (rain_score.clone() * weights.rain
            + slope_score.clone() * weights.slope
            + soil_score * weights.soil
            + lulc_score * weights.lulc
            + drain_score * weights.drain)
            .rename("suitability");

        let vis = VisualizationSpec::ranged(0.0, 0.8, ["red", "orange", "yellow", "green", "darkgreen"])
            .with_label("Suitability Index (0-1)");

        ctx.map.add_layer(
            layer("Rainfall Input", rain_score, VisualizationSpec::ranged(0.0, 1.0, ["white", "blue"]))
                .hidden(),
        );
        ctx.map.add_layer(
            layer("Slope Input", slope_score, VisualizationSpec::ranged(0.0, 1.0, ["black", "white"]))
                .hidden(),
        );
        ctx.map.add_layer(layer("RWH Suitability Index", suitability.clone(), vis.clone()));
        ctx.map.add_colorbar(&vis, "Suitability Index (0-1)");

        let high_potential = suitability.clone().update_mask(suitability.clone().gt(HIGH_POTENTIAL));
        ctx.map.add_layer(layer(
            "High Potential Zones (>0.65)",
            high_potential,
            VisualizationSpec::single_color("cyan"),
        ));

        let request = ReduceRequest::new(suitability.clone(), Reducer::Mean, roi, 1000.0).best_effort();
        let mean = ctx.backend.reduce_region(&request)?.get("suitability");
        ctx.panel.heading("Model Stats");
        match mean {
            Some(mean) => ctx.panel.metric("Avg Suitability", &format!("{:.2} / 1.0", mean)),
            None => ctx.panel.metric("Avg Suitability", "N/A"),
        }
        ctx.panel.caption("Criteria Weights:");
        for (label, weight) in ["Rain", "Slope", "Soil", "Land Use", "Drainage"]
            .into_iter()
            .zip(weights.to_array())
        {
            ctx.panel.progress(label, weight);
        }
        ctx.panel.caption(&format!("Structure: {}", structure.label()));

        Ok(AnalysisOutput::new(RasterHandle::new("RWH Suitability Index", suitability), vis))
    }
}
