//! The JSON envelope every endpoint answers with.
//!
//! Success: `{message, statusCode, success: true, data}`.
//! Failure: `{message, statusCode, success: false, errors}` (built in `error.rs`).

use actix_web::{http::StatusCode, HttpResponse, HttpResponseBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub message: String,
    pub status_code: u16,
    pub success: bool,
    pub data: T,
}

/// Failure body. `errors` lists per-field problems for validation failures
/// and is empty otherwise.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub message: String,
    pub status_code: u16,
    pub success: bool,
    pub errors: Vec<Value>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            status_code: status.as_u16(),
            success: true,
            data,
        }
    }

    /// Starts a response builder with the envelope's status, so callers can
    /// attach cookies before finishing it with [`ApiResponse::finish`].
    pub fn builder(&self) -> HttpResponseBuilder {
        HttpResponse::build(self.status())
    }

    pub fn finish(self, mut builder: HttpResponseBuilder) -> HttpResponse {
        builder.json(self)
    }

    pub fn into_response(self) -> HttpResponse {
        let builder = self.builder();
        self.finish(builder)
    }

    fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK)
    }
}

/// `200 OK` envelope.
pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> ApiResponse<T> {
    ApiResponse::new(StatusCode::OK, message, data)
}
