//! Hobb Inventory
//!
//! Client side of a collection tracker for mechanical-keyboard hobbyists:
//! - models / validation: records, forms and client-local checks
//! - store: the revalidatable per-collection cache
//! - inventory: optimistic adds, direct edits and notes
//! - commands: persistence / asset-host bindings (HTTP and local)

pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod ids;
pub mod inventory;
pub mod models;
pub mod store;
pub mod validation;

#[cfg(test)]
mod testing;

pub use config::{ClientConfig, Settings};
pub use context::AppContext;
pub use error::{ClientError, Result, ServiceError, ValidationError};
pub use filter::{ListQuery, SortKey};
pub use inventory::{AddOutcome, Inventory, PendingAdd};
pub use models::{Entry, InventoryItem, InventoryType, ItemDetails, NewItemForm};
pub use store::CollectionCache;
