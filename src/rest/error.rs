use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::models::{ErrorResponse, FieldErrorResponse};
use crate::repository::RepoError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub fields: Vec<FieldErrorResponse>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Replaces the message of a 500 so the client sees what could not be
    /// done instead of the storage failure.
    pub fn or_internal(mut self, message: &str) -> Self {
        if self.status == StatusCode::INTERNAL_SERVER_ERROR {
            self.message = message.to_string();
        }
        self
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::ArticolNotFound(_) | RepoError::ReferenceNotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, err.to_string())
            }
            RepoError::IdMismatch { .. } => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            RepoError::ArticolHasReferences(_) => Self::new(StatusCode::CONFLICT, err.to_string()),
            RepoError::Validation(errors) => Self {
                status: StatusCode::BAD_REQUEST,
                message: "validation failed".to_string(),
                fields: errors.fields().iter().map(FieldErrorResponse::from).collect(),
            },
            RepoError::Internal(inner) => {
                log::error!("Request failed: {:#}", inner);
                Self::internal("500 - Server Error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                message: self.message,
                fields: self.fields,
            }),
        )
            .into_response()
    }
}
