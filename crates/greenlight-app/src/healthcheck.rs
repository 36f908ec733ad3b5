use axum::{extract::State, response::IntoResponse, Json};
use http::StatusCode;
use serde_json::json;

use crate::state::AppState;

pub async fn healthcheck(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.config();
    (
        StatusCode::OK,
        Json(json!({
            "status": "available",
            "system_info": {
                "environment": config.env,
                "version": config.version,
            }
        })),
    )
}
