use std::sync::Arc;

use axum::http::StatusCode;
use axum::Json;
use catalog::{Catalog, SongView};
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::external::FeatureClient;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub config: Arc<ServerConfig>,
    pub extractor: FeatureClient,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

#[derive(Serialize)]
pub struct CategoryEntry {
    pub name: &'static str,
    pub kind: &'static str,
}

#[derive(Serialize)]
pub struct SubcategoryResponse {
    pub category: &'static str,
    pub label: String,
    pub items: Vec<SongView>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub limit: Option<usize>,
}

pub type JsonResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;
