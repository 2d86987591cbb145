use axum::{
    extract::{Path as AxumPath, Query, State},
    Json,
};
use catalog::{Limit, StatCount, StatsSummary};

use crate::state::{AppState, JsonResult, StatsQuery};
use crate::utils::parse_category;

/// Ranked counts for one category; without `limit` every group is returned.
pub async fn get_category_stats(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
    Query(query): Query<StatsQuery>,
) -> JsonResult<Vec<StatCount>> {
    let category = parse_category(&name)?;
    let limit = Limit::from_option(query.limit);
    Ok(Json(state.catalog.list_statistics(category, limit)))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Json<StatsSummary> {
    let top_n = query.limit.unwrap_or_else(|| state.config.stats_top_n);
    Json(state.catalog.snapshot().summary(top_n))
}
