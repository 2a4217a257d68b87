use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Local;

use sarovar_analysis::SchemaContext;
use sarovar_core::models::RegionTag;

use crate::dto::{ModuleResponse, ModulesQuery};
use crate::state::AppState;

/// List every registered module with its widgets for a region.
pub async fn list_modules(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModulesQuery>,
) -> Json<Vec<ModuleResponse>> {
    tracing::info!(region = ?query.region, "Listing modules");

    let today = state.today.unwrap_or_else(|| Local::now().date_naive());
    let ctx = SchemaContext::new(query.region.map(|name| RegionTag::from_lookup(Some(name))), today);

    let modules = state
        .registry
        .ids()
        .iter()
        .filter_map(|id| state.registry.get(id))
        .map(|module| ModuleResponse { descriptor: module.descriptor(), schema: module.schema(&ctx) })
        .collect();

    Json(modules)
}
