//! Job lifecycle commands.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use log::info;
use tokio_stream::{Stream, StreamExt};

use bookscan::{ScanConfig, StartRequest, StatusSnapshot};

use super::{ApiError, ApiResponse, CommandAck};
use crate::state::AppState;

/// Start a scan in the background.
pub async fn start_job(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> Result<Json<ApiResponse<CommandAck>>, ApiError> {
    let config = ScanConfig::from_request(request, &state.config.credentials)?;
    state.controller.start_job(config)?;

    Ok(Json(ApiResponse::ok(CommandAck {
        status: "started",
        message: "Job started".to_string(),
    })))
}

/// Ask the running scan to stop.
pub async fn stop_job(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CommandAck>>, ApiError> {
    state.controller.stop_job()?;

    Ok(Json(ApiResponse::ok(CommandAck {
        status: "stopped",
        message: "Stop signal sent".to_string(),
    })))
}

/// Return the job to idle.
pub async fn reset_job(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CommandAck>>, ApiError> {
    state.controller.reset()?;
    info!("Job state reset");

    Ok(Json(ApiResponse::ok(CommandAck {
        status: "reset",
        message: "Job state reset successfully".to_string(),
    })))
}

pub async fn get_status(State(state): State<AppState>) -> Json<ApiResponse<StatusSnapshot>> {
    Json(ApiResponse::ok(state.controller.status()))
}

/// Server-sent events, one `data:` frame per log line.
pub async fn stream_logs(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = state
        .controller
        .log_stream()
        .map(|line| Ok(Event::default().data(line)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
