//! Service Bindings
//!
//! The collaborators the inventory flows depend on, organized by concern,
//! with an HTTP implementation and a local one backed by `hobb-backend`.

mod http;
mod local;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::models::{InventoryItem, InventoryType, ItemId, NewInventoryItem, UserId};

pub use http::{HttpAssetUploader, HttpPersistence};
pub use local::{LocalAssetUploader, LocalPersistence};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// CRUD over one user's inventory collections
#[async_trait]
pub trait PersistenceService: Send + Sync {
    async fn list(&self, kind: InventoryType, user: &UserId) -> ServiceResult<Vec<InventoryItem>>;

    /// Returns the stored record with its server-assigned id
    async fn create(&self, kind: InventoryType, item: &NewInventoryItem) -> ServiceResult<InventoryItem>;

    async fn update(&self, kind: InventoryType, item: &InventoryItem) -> ServiceResult<InventoryItem>;

    async fn delete(&self, kind: InventoryType, user: &UserId, id: &ItemId) -> ServiceResult<()>;
}

/// Binary blob bound for the asset host
#[derive(Debug, Clone, Copy)]
pub struct AssetUpload<'a> {
    pub file_name: &'a str,
    pub bytes: &'a [u8],
    /// Category tag
    pub folder: &'a str,
    pub owner: &'a UserId,
}

/// External image host
#[async_trait]
pub trait AssetUploader: Send + Sync {
    /// Returns a stable public URL
    async fn upload(&self, upload: AssetUpload<'_>) -> ServiceResult<String>;
}

/// Identity of the signed-in user, if any
pub trait SessionProvider: Send + Sync {
    fn current_user(&self) -> Option<UserId>;
}

/// User-facing alerts
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

/// Fixed session, e.g. from CLI flags
#[derive(Debug, Clone, Default)]
pub struct StaticSession(pub Option<UserId>);

impl SessionProvider for StaticSession {
    fn current_user(&self) -> Option<UserId> {
        self.0.clone()
    }
}

/// Alerts go to the log
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        tracing::error!(target: "hobb::alert", "{}", message);
    }
}
