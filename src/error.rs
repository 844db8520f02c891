//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required variable: {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("{message}")]
    Constraint {
        message: String,
        suggestion: Option<String>,
    },
    #[error("database: {0}")]
    Db(sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Duplicate(_) | AppError::Constraint { .. } => StatusCode::CONFLICT,
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Duplicate(_) => "DUPLICATE_ERROR",
            AppError::Constraint { .. } => "CONSTRAINT_ERROR",
            AppError::Db(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Human message for a unique-violation, keyed by the partial unique index
/// that fired. Index names come from the migration DDL.
fn duplicate_message(constraint: Option<&str>) -> String {
    match constraint {
        Some("devices_active_name_key") => "A device with this name already exists".into(),
        Some("problems_active_title_key") => {
            "A problem with this title already exists for this device".into()
        }
        Some("tv_interfaces_active_name_key") => {
            "A TV interface with this name already exists for this device".into()
        }
        Some(c) => format!("Duplicate value violates unique constraint {c}"),
        None => "Duplicate value violates a unique constraint".into(),
    }
}

fn fk_message(constraint: Option<&str>) -> String {
    match constraint {
        Some(c) => format!("Operation violates foreign key constraint {c}"),
        None => "Operation violates a foreign key constraint".into(),
    }
}

/// Constraint violations are translated here so every `?` on a sqlx call
/// surfaces a typed conflict instead of a generic 500.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            match db.code().as_deref() {
                Some("23505") => return AppError::Duplicate(duplicate_message(db.constraint())),
                Some("23503") => {
                    return AppError::Constraint {
                        message: fk_message(db.constraint()),
                        suggestion: Some(
                            "Remove or archive dependent records first, or pass force=true".into(),
                        ),
                    }
                }
                _ => {}
            }
        }
        if matches!(e, sqlx::Error::RowNotFound) {
            return AppError::NotFound("Record not found".into());
        }
        AppError::Db(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let suggestion = match &self {
            AppError::Constraint { suggestion, .. } => suggestion.clone(),
            _ => None,
        };
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
            "errorType": self.error_type(),
            "suggestion": suggestion,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Duplicate("x".into()).status(), StatusCode::CONFLICT);
        let constraint = AppError::Constraint {
            message: "x".into(),
            suggestion: None,
        };
        assert_eq!(constraint.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Internal("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_types_match_statuses() {
        assert_eq!(AppError::Validation("x".into()).error_type(), "VALIDATION_ERROR");
        assert_eq!(AppError::Duplicate("x".into()).error_type(), "DUPLICATE_ERROR");
        assert_eq!(
            AppError::Constraint { message: "x".into(), suggestion: None }.error_type(),
            "CONSTRAINT_ERROR"
        );
    }

    #[test]
    fn duplicate_messages_are_constraint_specific() {
        assert!(duplicate_message(Some("devices_active_name_key")).contains("device"));
        assert!(duplicate_message(Some("problems_active_title_key")).contains("problem"));
        assert!(duplicate_message(None).contains("unique"));
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
