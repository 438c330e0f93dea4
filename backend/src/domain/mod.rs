//! Domain Layer
//!
//! Documents, their identifiers and collection schemas.

mod collection;
mod document;
mod entity;
mod object_id;

pub use collection::{CollectionRegistry, CollectionSchema};
pub use document::{Document, RESERVED_KEYS};
pub use entity::{DomainError, DomainResult, Entity};
pub use object_id::DocumentId;
