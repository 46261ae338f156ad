//! Error types for entity API
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;

/// Errors while executing operations related to entities.
#[derive(Debug, PartialEq)]
pub struct Error {
    // Human readable detail for logs, never shown to clients
    pub detail: Option<String>,
    // Enum representing which category of error
    pub error_kind: EntityApiErrorKind,
}

#[derive(Debug, PartialEq, Serialize)]
pub enum EntityApiErrorKind {
    // Record not found
    RecordNotFound,
    // A record with the same unique key already exists
    RecordNotUnique,
    // Validation error
    ValidationError,
    // Other errors
    Other,
}

impl Error {
    pub(crate) fn not_found(detail: impl Into<String>) -> Self {
        Error {
            detail: Some(detail.into()),
            error_kind: EntityApiErrorKind::RecordNotFound,
        }
    }

    pub(crate) fn validation(detail: impl Into<String>) -> Self {
        Error {
            detail: Some(detail.into()),
            error_kind: EntityApiErrorKind::ValidationError,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Entity API Error: {:?}", self)
    }
}

impl StdError for Error {}
