use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::routes::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub data_dir: String,
    pub data_dir_writable: bool,
}

/// Liveness plus a quick check that the data directory is usable.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let data_dir = state.cfg.data_dir.clone();
    let writable = std::fs::create_dir_all(&data_dir).is_ok();
    Json(HealthResponse {
        status: "ok",
        data_dir: data_dir.display().to_string(),
        data_dir_writable: writable,
    })
}
