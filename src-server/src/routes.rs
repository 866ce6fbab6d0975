use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::commands;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/start", post(commands::start_job))
        .route("/stop", post(commands::stop_job))
        .route("/reset", post(commands::reset_job))
        .route("/status", get(commands::get_status))
        .route("/history", get(commands::get_history))
        .route("/logs/stream", get(commands::stream_logs))
        .route("/download", get(commands::download_results));

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
