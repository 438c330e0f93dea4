//! Repository Layer
//!
//! Data access abstractions and implementations.

mod db;
mod document_repo;
mod traits;


pub use db::{init_db, SharedConnection};
pub use document_repo::CollectionRepository;
pub use traits::Repository;
