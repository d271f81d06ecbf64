use thiserror::Error;

use crate::types::ValidationErrors;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("articol {0} not found")]
    ArticolNotFound(i64),
    #[error("reference {reference_id} not found for articol {articol_id}")]
    ReferenceNotFound { articol_id: i64, reference_id: i64 },
    #[error("route id {route} does not match body id {body:?}")]
    IdMismatch { route: i64, body: Option<i64> },
    #[error("articol {0} still has references")]
    ArticolHasReferences(i64),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;
