use axum::http::StatusCode;
use axum::Json;
use catalog::{AppendError, FacetError};
use common::Category;

use crate::state::ErrorResponse;

pub fn json_error(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn parse_category(name: &str) -> Result<Category, (StatusCode, Json<ErrorResponse>)> {
    Category::parse(name).ok_or_else(|| {
        facet_error(&FacetError::UnknownCategory(name.trim().to_string()))
    })
}

/// Facet lookups that miss are client errors: a bad bucket is 400, an
/// unknown category or value is 404.
pub fn facet_error(err: &FacetError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        FacetError::InvalidToken { .. } => StatusCode::BAD_REQUEST,
        FacetError::UnknownCategory(_) | FacetError::NotFound { .. } => StatusCode::NOT_FOUND,
    };
    json_error(status, err.to_string())
}

pub fn append_error(err: &AppendError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        AppendError::ExtractionFailed(_) => StatusCode::BAD_GATEWAY,
        AppendError::RowRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AppendError::PersistenceFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, err.to_string())
}

pub fn kind_name(category: Category) -> &'static str {
    match category.kind() {
        common::CategoryKind::Ranged => "ranged",
        common::CategoryKind::MultiValued => "multi_valued",
        common::CategoryKind::SingleValued => "single_valued",
    }
}
