//! Flood extent from Sentinel-1 change detection.

use sarovar_core::models::{
    CollectionQuery, Geometry, ImageExpr, ModuleId, ParameterSet, PropertyFilter, RasterHandle,
    Reducer, VisualizationSpec,
};

use super::{format_date, layer, masked_area_ha, orbit_param, period, ymd, Orbit, SENTINEL1_GRD};
use crate::error::{AnalysisError, Result};
use crate::module::{AnalysisModule, AnalysisOutput, ModuleContext, ModuleDescriptor};
use crate::schema::{ParamDef, ParameterSchema, SchemaContext};

const SMOOTHING_RADIUS_M: f64 = 50.0;
/// Pixels wet in more than this share of historic observations are not flood.
const PERMANENT_WATER_OCCURRENCE: f64 = 30.0;
const MAX_SLOPE_DEG: f64 = 5.0;
const MIN_CONNECTED_PIXELS: f64 = 8.0;
const CONNECTIVITY_WINDOW: u32 = 100;

pub struct FloodModule;

impl FloodModule {
    fn collection(roi: &Geometry, orbit: Orbit) -> CollectionQuery {
        let query = CollectionQuery::new(SENTINEL1_GRD)
            .filter(PropertyFilter::equals("instrumentMode", "IW"))
            .filter(PropertyFilter::list_contains("transmitterReceiverPolarisation", "VH"))
            .filter(PropertyFilter::equals("resolution_meters", 10))
            .within(roi)
            .select(["VH"]);
        match orbit.filter() {
            Some(filter) => query.filter(filter),
            None => query,
        }
    }

    /// Ratio change mask with permanent water, steep terrain and speckle removed.
    fn flood_mask(before: ImageExpr, after: ImageExpr, threshold: f64) -> ImageExpr {
        let changed = (after / before).gt(threshold);

        let permanent = ImageExpr::asset("JRC/GSW1_4/GlobalSurfaceWater")
            .band("occurrence")
            .gt(PERMANENT_WATER_OCCURRENCE);
        let flat = ImageExpr::asset("WWF/HydroSHEDS/03VFDEM").slope().lt(MAX_SLOPE_DEG);

        let flooded = changed.update_mask(!permanent).update_mask(flat);
        let connected = flooded
            .clone()
            .connected_pixel_count(CONNECTIVITY_WINDOW)
            .gte(MIN_CONNECTED_PIXELS);
        flooded.update_mask(connected).self_mask()
    }
}

impl AnalysisModule for FloodModule {
    fn descriptor(&self) -> ModuleDescriptor {
        ModuleDescriptor {
            id: ModuleId::FLOOD,
            name: "Flood Extent Mapping",
            short_name: "Flood",
            description: "Newly inundated land between a dry and a wet radar acquisition",
        }
    }

    fn schema(&self, _ctx: &SchemaContext) -> ParameterSchema {
        ParameterSchema::new(vec![
            orbit_param(),
            ParamDef::date("pre_start", "Pre-flood start", ymd(2023, 4, 1)),
            ParamDef::date("pre_end", "Pre-flood end", ymd(2023, 6, 1)),
            ParamDef::date("post_start", "Post-flood start", ymd(2023, 9, 29)),
            ParamDef::date("post_end", "Post-flood end", ymd(2023, 10, 15)),
            ParamDef::float("threshold", "Change threshold", 1.25, 1.0, 1.5, 0.05),
        ])
    }

    fn analyze(
        &self,
        ctx: &mut ModuleContext<'_>,
        roi: &Geometry,
        params: &ParameterSet,
    ) -> Result<AnalysisOutput> {
        let orbit = Orbit::from_params(params)?;
        let threshold = params.float("threshold")?;
        let base = Self::collection(roi, orbit);
        let pre = base.clone().dates(period(params, "pre_start", "pre_end")?);
        let post = base.dates(period(params, "post_start", "post_end")?);

        if ctx.backend.collection_size(&pre)? == 0 || ctx.backend.collection_size(&post)? == 0 {
            return Err(AnalysisError::empty(format!(
                "Sentinel-1 scenes for orbit {} in these dates",
                orbit.label()
            )));
        }
        let pre_date = ctx.backend.first_acquisition(&pre)?;
        let post_date = ctx.backend.first_acquisition(&post)?;

        let before = pre.reduce(Reducer::Median).clip(roi).focal_mean(SMOOTHING_RADIUS_M);
        let after = post.reduce(Reducer::Mosaic).clip(roi).focal_mean(SMOOTHING_RADIUS_M);
        let flooded = Self::flood_mask(before.clone(), after.clone(), threshold);

        let vis = VisualizationSpec::ranged(0.0, 1.0, ["#0000FF"]).with_classes(["Flood Extent"]);
        let backscatter = VisualizationSpec::ranged(-25.0, 0.0, Vec::<String>::new());
        ctx.map.add_layer(layer("Before Flood (Dry)", before, backscatter.clone()).hidden());
        ctx.map.add_layer(layer("After Flood (Wet)", after, backscatter));
        ctx.map.add_layer(layer(
            "Estimated Flood Extent",
            flooded.clone(),
            VisualizationSpec::single_color("#0000FF"),
        ));

        let area_ha = masked_area_ha(ctx.backend, flooded.clone(), roi, 10.0, |r| r.best_effort())?;

        ctx.panel.heading("Flood Report");
        ctx.panel.metric("Estimated Extent", &format!("{} Ha", area_ha));
        ctx.panel.caption(&format!("Pre: {}", format_date(pre_date)));
        ctx.panel.caption(&format!("Post: {}", format_date(post_date)));
        ctx.panel.caption(&format!("Orbit: {} | Pol: VH", orbit.label()));

        Ok(AnalysisOutput::new(RasterHandle::new("Estimated Flood Extent", flooded), vis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sarovar_core::models::BinaryOp;

    #[test]
    fn test_collection_selects_vh() {
        let roi = Geometry::point(85.0, 26.0);
        let query = FloodModule::collection(&roi, Orbit::Descending);
        assert_eq!(query.bands, vec!["VH".to_string()]);
        assert_eq!(query.filters.len(), 4);
        assert!(query.dates.is_none());
    }

    #[test]
    fn test_flood_mask_thresholds_ratio() {
        let mask = FloodModule::flood_mask(ImageExpr::constant(1.0), ImageExpr::constant(2.0), 1.3);
        let json = serde_json::to_string(&mask).unwrap();
        assert!(json.contains("GlobalSurfaceWater"));
        assert!(json.contains("connected_pixel_count"));
        assert!(matches!(mask, ImageExpr::SelfMask { .. }));

        let changed = (ImageExpr::constant(2.0) / ImageExpr::constant(1.0)).gt(1.3);
        assert!(matches!(changed, ImageExpr::Binary { op: BinaryOp::Gt, .. }));
    }
}
