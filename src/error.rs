use actix_web::{HttpResponse, http::StatusCode};
use derive_more::Display;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::model::leave_application::LeaveStatus;

/// One violated field, as surfaced to the caller for inline display.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldError {
    #[schema(example = "start_date")]
    pub field: &'static str,
    #[schema(example = "start date cannot be in the past")]
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Error taxonomy of the workflow core. Handlers propagate these with `?`;
/// the `ResponseError` impl owns the HTTP mapping.
#[derive(Debug, Display)]
pub enum WorkflowError {
    #[display(fmt = "validation failed on {} field(s)", "_0.len()")]
    Validation(Vec<FieldError>),

    #[display(fmt = "unauthorized action: {}", _0)]
    UnauthorizedAction(&'static str),

    #[display(fmt = "application in status {} does not accept this action", status)]
    InvalidStateTransition { status: LeaveStatus },

    #[display(
        fmt = "balance invariant violated: {} days requested, {} available",
        requested,
        available
    )]
    InsufficientBalance { requested: i64, available: i64 },

    #[display(fmt = "concurrent update lost the race")]
    Conflict,

    #[display(fmt = "{} not found", _0)]
    NotFound(&'static str),

    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
}

impl std::error::Error for WorkflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkflowError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for WorkflowError {
    fn from(e: sqlx::Error) -> Self {
        WorkflowError::Database(e)
    }
}

impl actix_web::ResponseError for WorkflowError {
    fn status_code(&self) -> StatusCode {
        match self {
            WorkflowError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WorkflowError::UnauthorizedAction(_) => StatusCode::FORBIDDEN,
            WorkflowError::InvalidStateTransition { .. } => StatusCode::BAD_REQUEST,
            WorkflowError::Conflict => StatusCode::CONFLICT,
            WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkflowError::InsufficientBalance { .. } | WorkflowError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            WorkflowError::Validation(fields) => HttpResponse::UnprocessableEntity().json(json!({
                "error": "Validation failed",
                "fields": fields,
            })),
            WorkflowError::UnauthorizedAction(msg) => HttpResponse::Forbidden().json(json!({
                "error": msg,
            })),
            WorkflowError::InvalidStateTransition { .. } => {
                HttpResponse::BadRequest().json(json!({
                    "error": "Application already processed or not in a valid state",
                }))
            }
            WorkflowError::Conflict => HttpResponse::Conflict().json(json!({
                "error": "The application was updated concurrently, refresh and retry",
            })),
            WorkflowError::NotFound(what) => HttpResponse::NotFound().json(json!({
                "error": format!("{what} not found"),
            })),
            // Consistency bugs and infrastructure failures are logged with
            // detail but never surface internal state to the caller.
            WorkflowError::InsufficientBalance { requested, available } => {
                tracing::error!(requested, available, "balance invariant violated at approval");
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal Server Error",
                }))
            }
            WorkflowError::Database(e) => {
                tracing::error!(error = %e, "database failure");
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal Server Error",
                }))
            }
        }
    }
}
