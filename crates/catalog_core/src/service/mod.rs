//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Turn absent lookups into typed `NotFound` errors.
//! - Validate caller-supplied identifiers and paging input.
//!
//! # Invariants
//! - Lookup-by-identifier returns exactly one entity or an error.
//! - Storage failures are passed through without translation or retry.

use crate::query::QueryError;
use crate::repo::{EntityKind, RepoError};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod product_service;
pub mod user_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error separating absent entities, bad input and storage failures.
#[derive(Debug)]
pub enum ServiceError {
    NotFound { entity: EntityKind, id: i64 },
    InvalidArgument(String),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found with id: {id}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::InvalidArgument(message) => Self::InvalidArgument(message),
            RepoError::Validation(err) => Self::InvalidArgument(err.to_string()),
            other => Self::Repo(other),
        }
    }
}

impl From<QueryError> for ServiceError {
    fn from(value: QueryError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

/// Rejects non-positive identifiers before they reach storage.
pub(crate) fn require_positive_id(entity: EntityKind, id: i64) -> ServiceResult<i64> {
    if id <= 0 {
        warn!(
            "event=invalid_id module=service status=rejected entity={} id={}",
            entity, id
        );
        return Err(ServiceError::InvalidArgument(format!(
            "invalid {entity} id: {id}"
        )));
    }
    Ok(id)
}
