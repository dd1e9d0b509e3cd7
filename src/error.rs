//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every handler and middleware reports failure by returning one of its variants; the
//! single translation point is the `ResponseError` implementation below, which renders
//! the failure envelope `{message, statusCode, success: false, errors}`.
//!
//! Server-side failures (`DatabaseError`, `InternalServerError`) are logged with their
//! details and answered with a generic message. In development mode `startup` wraps the
//! app in [`detailed_errors`], which re-renders them with the details included.
//!
//! `From` implementations for `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error` and `bcrypt::BcryptError` allow the `?` operator
//! to be used directly on those results.

use actix_web::{
    dev::ServiceResponse,
    error::ResponseError,
    http::StatusCode,
    middleware::{ErrorHandlerResponse, ErrorHandlers},
    HttpResponse,
};
use serde_json::{json, Value};
use std::fmt;
use validator::ValidationErrors;

use crate::response::ApiErrorBody;

const GENERIC_SERVER_ERROR: &str = "Something Broke!";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Any authentication failure (HTTP 401). Callers collapse the cause into one message.
    Unauthorized(String),
    /// Malformed or missing input (HTTP 400).
    BadRequest(String),
    /// Authenticated, but the role is not permitted (HTTP 403).
    Forbidden(String),
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// Input failed validation rules (HTTP 422). `errors` holds `{field, message}` entries.
    ValidationError { message: String, errors: Vec<Value> },
    /// Unexpected server-side failure (HTTP 500).
    InternalServerError(String),
    /// Storage failure (HTTP 500).
    DatabaseError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::ValidationError { message, .. } => write!(f, "Validation Error: {}", message),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl AppError {
    fn public_message(&self, expose_details: bool) -> String {
        match self {
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::ValidationError { message, .. } => message.clone(),
            AppError::InternalServerError(msg) | AppError::DatabaseError(msg) => {
                if expose_details {
                    msg.clone()
                } else {
                    GENERIC_SERVER_ERROR.to_string()
                }
            }
        }
    }

    /// Builds the failure envelope. Server-side details are only included when
    /// `expose_details` is set.
    pub fn render(&self, expose_details: bool) -> HttpResponse {
        let status = self.status_code();
        let errors = match self {
            AppError::ValidationError { errors, .. } => errors.clone(),
            _ => Vec::new(),
        };

        HttpResponse::build(status).json(ApiErrorBody {
            message: self.public_message(expose_details),
            status_code: status.as_u16(),
            success: false,
            errors,
        })
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("[{}] {}", status.as_u16(), self);
        }
        self.render(false)
    }
}

/// Error handlers for development mode: `500` responses caused by an [`AppError`]
/// are rendered again with the underlying details.
pub fn detailed_errors<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().handler(StatusCode::INTERNAL_SERVER_ERROR, render_with_details)
}

fn render_with_details<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let detailed = match res.response().error().and_then(|e| e.as_error::<AppError>()) {
        Some(app_err) => app_err.render(true),
        None => return Ok(ErrorHandlerResponse::Response(res.map_into_left_body())),
    };
    Ok(ErrorHandlerResponse::Response(
        res.into_response(detailed).map_into_right_body(),
    ))
}

/// `RowNotFound` becomes `NotFound`; a unique-constraint violation becomes
/// `BadRequest`; everything else is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::BadRequest("Resource already exists".into())
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

/// Flattens field errors into `{field, message}` entries; the first one becomes
/// the top-level message.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        let mut errors: Vec<Value> = Vec::new();
        let mut fields: Vec<_> = error.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));

        for (field, field_errors) in fields {
            for field_error in field_errors {
                let message = field_error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                errors.push(json!({ "field": field, "message": message }));
            }
        }

        let message = errors
            .first()
            .and_then(|e| e["message"].as_str())
            .unwrap_or("Validation failed")
            .to_string();

        AppError::ValidationError { message, errors }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
