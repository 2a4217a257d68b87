//! Surface water change between two periods from Sentinel-1 radar.

use chrono::{Datelike, NaiveDate};

use sarovar_core::models::{
    CollectionQuery, CollectionSource, DateRange, Geometry, ImageExpr, ModuleId, ParameterSet,
    PropertyFilter, RasterHandle, Reducer, VisualizationSpec,
};
use sarovar_core::ports::VideoRequest;

use super::{format_date, layer, masked_area_ha, orbit_param, period, ymd, Orbit, SENTINEL1_GRD};
use crate::error::{AnalysisError, Result};
use crate::module::{AnalysisModule, AnalysisOutput, ModuleContext, ModuleDescriptor};
use crate::schema::{ParamDef, ParameterSchema, SchemaContext};

/// Backscatter below this (dB) is open water.
const WATER_THRESHOLD_DB: f64 = -16.0;
const SPECKLE_RADIUS_M: f64 = 50.0;
const AREA_SCALE_M: f64 = 10.0;

pub struct EncroachmentModule;

impl EncroachmentModule {
    fn collection(roi: &Geometry, orbit: Orbit, range: DateRange) -> CollectionQuery {
        let query = CollectionQuery::new(SENTINEL1_GRD)
            .filter(PropertyFilter::list_contains("transmitterReceiverPolarisation", "VV"))
            .filter(PropertyFilter::equals("instrumentMode", "IW"))
            .dates(range)
            .within(roi);
        match orbit.filter() {
            Some(filter) => query.filter(filter),
            None => query,
        }
    }

    /// 0/1 water raster of a period plus the date of its first scene.
    fn water(
        ctx: &ModuleContext<'_>,
        roi: &Geometry,
        orbit: Orbit,
        range: DateRange,
    ) -> Result<(ImageExpr, Option<NaiveDate>)> {
        let query = Self::collection(roi, orbit, range);
        if ctx.backend.collection_size(&query)? == 0 {
            return Err(AnalysisError::empty(format!(
                "Sentinel-1 scenes between {} and {} (orbit {})",
                range.start,
                range.end,
                orbit.label()
            )));
        }
        let acquired = ctx.backend.first_acquisition(&query)?;

        let smoothed = ImageExpr::current()
            .band("VV")
            .focal_median(SPECKLE_RADIUS_M)
            .rename("VV_smoothed");
        let water = query.map(smoothed).reduce(Reducer::Min).clip(roi).lt(WATER_THRESHOLD_DB);
        Ok((water, acquired))
    }

    /// One median radar frame per calendar year of the whole span.
    fn timelapse(roi: &Geometry, orbit: Orbit, span: DateRange) -> VideoRequest {
        let vis = VisualizationSpec::ranged(-25.0, -5.0, ["black", "blue", "white"]);
        let frames = (span.start.year()..=span.end.year())
            .filter_map(DateRange::year)
            .map(|year| {
                Self::collection(roi, orbit, year)
                    .select(["VV"])
                    .reduce(Reducer::Median)
                    .visualize(vis.clone())
            })
            .collect();

        VideoRequest {
            frames: CollectionSource::images(frames),
            region: roi.clone(),
            dimensions: 600,
            frames_per_second: 5,
            crs: "EPSG:3857".to_string(),
        }
    }
}

impl AnalysisModule for EncroachmentModule {
    fn descriptor(&self) -> ModuleDescriptor {
        ModuleDescriptor {
            id: ModuleId::ENCROACHMENT,
            name: "Encroachment (S1 SAR)",
            short_name: "Encroachment",
            description: "Water body loss and gain between a baseline and a current season",
        }
    }

    fn schema(&self, _ctx: &SchemaContext) -> ParameterSchema {
        ParameterSchema::new(vec![
            orbit_param(),
            ParamDef::date("baseline_start", "Baseline start", ymd(2018, 6, 1)),
            ParamDef::date("baseline_end", "Baseline end", ymd(2018, 9, 30)),
            ParamDef::date("current_start", "Current start", ymd(2024, 6, 1)),
            ParamDef::date("current_end", "Current end", ymd(2024, 9, 30)),
            ParamDef::flag("timelapse", "Create timelapse", false),
        ])
    }

    fn analyze(
        &self,
        ctx: &mut ModuleContext<'_>,
        roi: &Geometry,
        params: &ParameterSet,
    ) -> Result<AnalysisOutput> {
        let orbit = Orbit::from_params(params)?;
        let baseline = period(params, "baseline_start", "baseline_end")?;
        let current = period(params, "current_start", "current_end")?;

        let (initial, initial_date) = Self::water(ctx, roi, orbit, baseline)?;
        let (latest, latest_date) = Self::water(ctx, roi, orbit, current)?;

        let stable = initial.clone().and(latest.clone());
        let loss = initial.clone().and(!latest.clone());
        let gain = (!initial.clone()).and(latest.clone());

        let change = ImageExpr::constant(0.0)
            .replace_where(stable, 1.0)
            .replace_where(loss.clone(), 2.0)
            .replace_where(gain.clone(), 3.0)
            .clip(roi)
            .self_mask();
        let vis = VisualizationSpec::ranged(1.0, 3.0, ["cyan", "red", "blue"])
            .with_classes(["Stable Water", "Encroachment", "New Water"]);

        ctx.map.split_map(
            layer("Initial Water", initial.self_mask(), VisualizationSpec::single_color("blue")),
            layer("Final Water", latest.self_mask(), VisualizationSpec::single_color("cyan")),
        );
        ctx.map.add_layer(layer(
            "Encroachment (Loss)",
            loss.clone().self_mask(),
            VisualizationSpec::single_color("red"),
        ));
        ctx.map.add_layer(layer(
            "New Water (Gain)",
            gain.clone().self_mask(),
            VisualizationSpec::single_color("blue"),
        ));

        let loss_ha = masked_area_ha(ctx.backend, loss, roi, AREA_SCALE_M, |r| r.max_pixels(1e9))?;
        let gain_ha = masked_area_ha(ctx.backend, gain, roi, AREA_SCALE_M, |r| r.max_pixels(1e9))?;

        ctx.panel.heading("Change Report");
        ctx.panel.metric_with_help("Water Loss", &format!("{} Ha", loss_ha), "Potential Encroachment");
        ctx.panel.metric_with_help("Water Gain", &format!("{} Ha", gain_ha), "Flooding/New Storage");
        ctx.panel.caption(&format!("Base: {}", format_date(initial_date)));
        ctx.panel.caption(&format!("Curr: {}", format_date(latest_date)));

        if params.flag("timelapse")? {
            let span = DateRange::new(baseline.start, current.end);
            match ctx.backend.video_thumbnail_url(&Self::timelapse(roi, orbit, span)) {
                Ok(url) => ctx.panel.link("Radar Intensity (Dark=Water)", &url),
                Err(e) => {
                    tracing::warn!(error = %e, "Timelapse generation failed");
                    ctx.panel.warning(&format!("Timelapse Error: {}", e));
                }
            }
        }

        Ok(AnalysisOutput::new(RasterHandle::new("Water Change", change), vis))
    }
}
