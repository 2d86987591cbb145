pub mod browse;
pub mod songs;
pub mod stats;

use axum::{
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::state::{AppState, HealthResponse};

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/categories", get(browse::list_categories))
        .route("/categories/:name", get(browse::list_category))
        .route("/categories/:name/:token", get(browse::list_subcategory))
        .route("/songs", get(browse::list_songs))
        .route("/songs", post(songs::add_song))
        .route("/stats", get(stats::get_summary))
        .route("/stats/:name", get(stats::get_category_stats))
        .with_state(state)
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_router(state))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use catalog::{Catalog, RecordSink, StoreError};
    use common::RawRow;
    use reqwest::Client;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::app_router;
    use crate::config::ServerConfig;
    use crate::external::FeatureClient;
    use crate::state::AppState;

    struct DiscardSink;

    impl RecordSink for DiscardSink {
        fn persist(&self, _rows: &[RawRow]) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn row(artist: &str, song: &str, year: &str, bpm: &str, key: &str, country: &str, genre: &str) -> RawRow {
        RawRow {
            main_artist: Some(artist.to_string()),
            song: Some(song.to_string()),
            duration: Some("3:30".to_string()),
            year_released: Some(year.to_string()),
            bpm: Some(bpm.to_string()),
            key: Some(key.to_string()),
            country: Some(country.to_string()),
            genre: Some(genre.to_string()),
            ..RawRow::default()
        }
    }

    fn test_state() -> AppState {
        let rows = vec![
            row("Céline Dion", "Pour que tu m'aimes encore", "1995", "127", "C", "Canada, France", "Pop"),
            row("Stromae", "Alors on danse", "2009", "120", "C", "Belgium, France", "Pop, Electronic"),
            row("Édith Piaf", "La Vie en rose", "1947", "73", "G", "France", "Chanson"),
            row("Ghost", "Missing Year", "N/A", "99", "D", "Nowhere", "Noise"),
        ];
        let (catalog, _) = Catalog::new(rows, Box::new(DiscardSink));
        AppState {
            catalog: Arc::new(catalog),
            config: Arc::new(ServerConfig::default()),
            extractor: FeatureClient::new(Client::new(), "", Duration::from_secs(1)),
        }
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app_router(test_state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get_json("/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn lists_browsable_categories() {
        let (status, body) = get_json("/api/v1/categories").await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["Key", "BPM", "Genre", "Language", "Country", "Year Released", "Arrangement"]
        );
    }

    #[tokio::test]
    async fn home_listing_skips_rejected_rows() {
        let (status, body) = get_json("/api/v1/songs").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["items"][2]["main_artist"], "Édith Piaf");
        assert_eq!(body["items"][2]["search_string"], "edith piaf la vie en rose  g");
    }

    #[tokio::test]
    async fn home_listing_filters_and_sorts() {
        let (status, body) = get_json("/api/v1/songs?country=france&sort=bpm:desc&genre=pop").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["items"][0]["bpm"], 127);
        assert_eq!(body["items"][1]["bpm"], 120);

        let (status, _) = get_json("/api/v1/songs?tempo=fast").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = get_json("/api/v1/songs?sort=genre").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn key_facets() {
        let (status, body) = get_json("/api/v1/categories/Key").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!([
                { "value": "c", "label": "C", "count": 2 },
                { "value": "g", "label": "G", "count": 1 }
            ])
        );
    }

    #[tokio::test]
    async fn subcategory_uses_source_label() {
        let (status, body) = get_json("/api/v1/categories/Country/frANCE").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "Country");
        assert_eq!(body["label"], "France");
        assert_eq!(body["items"].as_array().unwrap().len(), 3);

        let (status, body) = get_json("/api/v1/categories/Year%20Released/1990").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["label"], "1990-1999");
    }

    #[tokio::test]
    async fn facet_misses_map_to_client_errors() {
        let (status, body) = get_json("/api/v1/categories/BPM/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("abc"));

        let (status, _) = get_json("/api/v1/categories/Genre/polka").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get_json("/api/v1/categories/Tempo").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stats_rank_and_limit() {
        let (status, body) = get_json("/api/v1/stats/Genre?limit=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([{ "label": "Pop", "count": 2 }]));

        let (_, body) = get_json("/api/v1/stats/BPM").await;
        assert_eq!(
            body,
            serde_json::json!([
                { "label": "120-129", "count": 2 },
                { "label": "70-79", "count": 1 }
            ])
        );

        let (_, body) = get_json("/api/v1/stats?limit=1").await;
        assert_eq!(body["total_songs"], 3);
        assert_eq!(body["categories"][0]["label"], "Key");
    }

    #[tokio::test]
    async fn add_song_without_extractor_is_bad_gateway() {
        let state = test_state();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/songs")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"main_artist":"Angèle","song":"Balance ton quoi","year_released":"2019","media_url":"https://example.com/v"}"#,
            ))
            .unwrap();
        let response = app_router(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(state.catalog.snapshot().len(), 3);
    }
}
