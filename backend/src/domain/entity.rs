//! Domain Layer - Core Entity Trait
//!
//! This trait defines the basic contract for all stored entities.

use serde::{Deserialize, Serialize};

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Clone + Eq + std::hash::Hash + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> &Self::Id;
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainError {
    NotFound(String),
    InvalidInput(String),
    PayloadTooLarge { size: u64, limit: u64 },
    Conflict(String),
    Internal(String),
}

impl DomainError {
    /// HTTP-style status code for callers that speak REST
    pub fn status(&self) -> u16 {
        match self {
            DomainError::NotFound(_) => 404,
            DomainError::InvalidInput(_) => 400,
            DomainError::PayloadTooLarge { .. } => 413,
            DomainError::Conflict(_) => 409,
            DomainError::Internal(_) => 500,
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            DomainError::PayloadTooLarge { size, limit } => {
                write!(f, "Payload too large: {} bytes (limit {})", size, limit)
            }
            DomainError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::InvalidInput(e.to_string())
    }
}
