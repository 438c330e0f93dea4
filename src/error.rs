//! Client Errors
//!
//! Validation errors never leave the form; service errors are what a
//! collaborator reported; `ClientError` is what callers see.

use thiserror::Error;

use crate::models::InventoryType;

/// Client-local form problems, raised before any cache mutation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("'{0}' is not a supported image link")]
    InvalidImageUrl(String),

    #[error("image file is empty")]
    EmptyFile,

    #[error("image file is {size} bytes, limit is {limit}")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("'{0}' is not an image file")]
    NotAnImage(String),

    #[error("color '{0}' is not a #RRGGBB value")]
    InvalidColor(String),

    #[error("{field} is out of range")]
    OutOfRange { field: &'static str },

    #[error("expected a {expected} entry, got {actual}")]
    WrongKind {
        expected: InventoryType,
        actual: InventoryType,
    },
}

/// Failure reported by the persistence or asset service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("blob is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
}

impl ServiceError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Rejected { status, .. } => Some(*status),
            ServiceError::TooLarge { .. } => Some(413),
            _ => None,
        }
    }
}

/// Top-level client error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("invalid form: {0}")]
    Validation(#[from] ValidationError),

    #[error("not signed in")]
    Unauthenticated,

    #[error("image upload failed: {0}")]
    Upload(ServiceError),

    #[error("saving failed: {0}")]
    Persistence(ServiceError),

    #[error("refresh failed, showing cached data: {0}")]
    Stale(ServiceError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} is still being saved")]
    Pending(String),

    #[error("background worker stopped: {0}")]
    Worker(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
