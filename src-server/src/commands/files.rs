//! File download commands.

use std::io::ErrorKind;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use log::error;

use super::ApiError;
use crate::state::AppState;

/// Download name of the catalogue, whatever the configured path.
const DOWNLOAD_NAME: &str = "books.json";

/// Serve the catalogue file as an attachment.
pub async fn download_results(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let path = &state.config.output_file;
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::new(StatusCode::NOT_FOUND, "File not found"));
        }
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            return Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read file: {}", e),
            ));
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", DOWNLOAD_NAME),
            ),
        ],
        bytes,
    ))
}
