use axum::response::{IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Banner {
    message: String,
    status: &'static str,
    timestamp: String,
}

/// Service banner served at `/`; not part of the OpenAPI document.
pub async fn root() -> impl IntoResponse {
    Json(Banner {
        message: format!("{} API", env!("CARGO_PKG_NAME")),
        status: "running",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
