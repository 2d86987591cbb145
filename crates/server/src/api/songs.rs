use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use catalog::{AppendError, NewSong, SongView};
use tracing::{info, warn};

use crate::state::{AppState, ErrorResponse};
use crate::utils::{append_error, json_error};

/// Runs feature extraction for the submitted media and appends the song.
pub async fn add_song(
    State(state): State<AppState>,
    Json(new_song): Json<NewSong>,
) -> Result<(StatusCode, Json<SongView>), (StatusCode, Json<ErrorResponse>)> {
    info!("Extracting features for {:?}", new_song.media_url);
    let features = match state.extractor.extract(&new_song.media_url).await {
        Ok(features) => features,
        Err(message) => {
            warn!("Feature extraction failed for {:?}: {}", new_song.media_url, message);
            return Err(append_error(&AppendError::ExtractionFailed(message)));
        }
    };

    let catalog = Arc::clone(&state.catalog);
    let result = tokio::task::spawn_blocking(move || catalog.append(new_song, features)).await;
    match result {
        Ok(Ok(view)) => Ok((StatusCode::CREATED, Json(view))),
        Ok(Err(err)) => {
            warn!("Failed to add song: {}", err);
            Err(append_error(&err))
        }
        Err(err) => Err(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("append task failed: {}", err),
        )),
    }
}
