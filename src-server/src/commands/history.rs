use axum::extract::State;
use axum::Json;

use bookscan::HistoryEntry;

use super::ApiResponse;
use crate::state::AppState;

/// Finished runs, newest first.
pub async fn get_history(State(state): State<AppState>) -> Json<ApiResponse<Vec<HistoryEntry>>> {
    Json(ApiResponse::ok(state.history.entries()))
}
