use std::collections::HashMap;

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    Json,
};
use catalog::{present_all, FacetValue, Filter, SongQuery, SongView, SortKey};
use common::{split_multi, Category};

use crate::state::{AppState, CategoryEntry, JsonResult, ListResponse, SubcategoryResponse};
use crate::utils::{facet_error, json_error, kind_name, parse_category};

pub async fn list_categories() -> Json<Vec<CategoryEntry>> {
    let items = Category::browsable()
        .iter()
        .map(|category| CategoryEntry {
            name: category.label(),
            kind: kind_name(*category),
        })
        .collect();
    Json(items)
}

/// Home listing. `search` and `sort` are reserved; any other parameter named
/// after a category filters on its comma-separated values.
pub async fn list_songs(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> JsonResult<ListResponse<SongView>> {
    let query = song_query(&params)?;
    let table = state.catalog.snapshot();
    let items = present_all(table.query(&query));
    let total = items.len();
    Ok(Json(ListResponse { items, total }))
}

pub async fn list_category(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> JsonResult<Vec<FacetValue>> {
    let category = parse_category(&name)?;
    Ok(Json(state.catalog.list_category_facets(category)))
}

pub async fn list_subcategory(
    State(state): State<AppState>,
    AxumPath((name, token)): AxumPath<(String, String)>,
) -> JsonResult<SubcategoryResponse> {
    let category = parse_category(&name)?;
    let (label, items) = state
        .catalog
        .list_subcategory_records(category, &token)
        .map_err(|err| facet_error(&err))?;
    Ok(Json(SubcategoryResponse {
        category: category.label(),
        label,
        items,
    }))
}

fn song_query(
    params: &HashMap<String, String>,
) -> Result<SongQuery, (StatusCode, Json<crate::state::ErrorResponse>)> {
    let mut query = SongQuery {
        search: params.get("search").cloned(),
        ..SongQuery::default()
    };
    if let Some(sort) = params.get("sort") {
        query.sort = SortKey::parse_list(sort)
            .ok_or_else(|| json_error(StatusCode::BAD_REQUEST, format!("invalid sort: {}", sort)))?;
    }
    let mut filters: Vec<Filter> = Vec::new();
    for (name, value) in params {
        if name == "search" || name == "sort" {
            continue;
        }
        let category = Category::parse(name).ok_or_else(|| {
            json_error(StatusCode::BAD_REQUEST, format!("unknown filter: {}", name))
        })?;
        let values: Vec<String> = split_multi(value)
            .into_iter()
            .filter(|item| !item.is_empty())
            .collect();
        if values.is_empty() {
            continue;
        }
        filters.push(Filter { category, values });
    }
    query.filters = filters;
    Ok(query)
}
