use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::{Value, json};
use thiserror::Error;

use crate::response::{ApiResponse, Empty};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Required arguments are missing")]
    MissingArguments(Vec<&'static str>),

    /// Field level rejection. Reported with HTTP 200 and `Status: false`.
    #[error("Validation failed")]
    Validation(Value),

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Log in required")]
    AuthenticationRequired,

    #[error("Only for shops")]
    PermissionDenied,

    #[error("Could not authorize")]
    InvalidCredentials,

    #[error("Not Found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unique or foreign key violation, carrying the database's own message.
    #[error("Integrity error")]
    Integrity(String),

    #[error("ORM error")]
    OrmError(DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn field(field: &str, messages: Vec<String>) -> Self {
        AppError::Validation(json!({ field: messages }))
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg))
            | Some(SqlErr::ForeignKeyConstraintViolation(msg)) => AppError::Integrity(msg),
            _ => AppError::OrmError(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, errors) = match &self {
            AppError::MissingArguments(fields) => {
                (StatusCode::BAD_REQUEST, json!({ "missing": fields }))
            }
            AppError::Validation(detail) => (StatusCode::OK, detail.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!(msg)),
            AppError::AuthenticationRequired
            | AppError::PermissionDenied
            | AppError::InvalidCredentials => (StatusCode::FORBIDDEN, json!(self.to_string())),
            AppError::NotFound => (StatusCode::NOT_FOUND, json!(self.to_string())),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!(msg)),
            AppError::Integrity(raw) => (StatusCode::BAD_REQUEST, json!(raw)),
            AppError::OrmError(err) => {
                tracing::error!(error = %err, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!(self.to_string()))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!(self.to_string()))
            }
        };

        let body = ApiResponse::<Empty>::failure(self.to_string(), errors);
        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (AppError::MissingArguments(vec!["items"]), StatusCode::BAD_REQUEST),
            (AppError::field("password", vec!["too short".into()]), StatusCode::OK),
            (AppError::AuthenticationRequired, StatusCode::FORBIDDEN),
            (AppError::PermissionDenied, StatusCode::FORBIDDEN),
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::Conflict("placed".into()), StatusCode::CONFLICT),
            (AppError::Integrity("FOREIGN KEY constraint failed".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn plain_db_errors_stay_internal() {
        let err: AppError = DbErr::Custom("pool timed out".into()).into();
        assert!(matches!(err, AppError::OrmError(_)));
    }
}
