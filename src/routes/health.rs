use actix_web::{get, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::response;

/// Health check endpoint
///
/// Returns the current status of the API and timestamp.
#[get("/health")]
pub async fn health() -> HttpResponse {
    response::ok(
        "Server is healthy",
        json!({
            "status": "UP",
            "timestamp": Utc::now()
        }),
    )
    .into_response()
}
