//! Local Bindings
//!
//! Persistence and asset uploads served by the embedded `hobb-backend`
//! document store, for offline use of the CLI and for tests.

use async_trait::async_trait;
use hobb_backend::{AssetStore, Backend, Document, DocumentId, DomainError, Repository};

use super::{AssetUpload, AssetUploader, PersistenceService, ServiceResult};
use crate::error::ServiceError;
use crate::models::{InventoryItem, InventoryType, ItemId, NewInventoryItem, UserId};

impl From<DomainError> for ServiceError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::PayloadTooLarge { size, limit } => ServiceError::TooLarge { size, limit },
            other => ServiceError::Rejected {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

fn decode(document: &Document) -> ServiceResult<InventoryItem> {
    serde_json::from_value(document.to_wire()).map_err(|e| ServiceError::Decode(format!("{}: {}", document.id, e)))
}

fn encode<T: serde::Serialize>(value: &T) -> ServiceResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| ServiceError::Decode(e.to_string()))
}

/// Persistence backed by the local document store
#[derive(Clone)]
pub struct LocalPersistence {
    backend: Backend,
}

impl LocalPersistence {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl PersistenceService for LocalPersistence {
    async fn list(&self, kind: InventoryType, user: &UserId) -> ServiceResult<Vec<InventoryItem>> {
        let repo = self.backend.collection(kind.collection(), user.as_str())?;
        let documents = repo.list().await?;
        documents.iter().map(decode).collect()
    }

    async fn create(&self, kind: InventoryType, item: &NewInventoryItem) -> ServiceResult<InventoryItem> {
        let repo = self.backend.collection(kind.collection(), item.user_id.as_str())?;
        let document = Document::from_payload(kind.collection(), item.user_id.as_str(), encode(item)?)?;
        let created = repo.create(&document).await?;
        decode(&created)
    }

    async fn update(&self, kind: InventoryType, item: &InventoryItem) -> ServiceResult<InventoryItem> {
        let repo = self.backend.collection(kind.collection(), item.user_id.as_str())?;
        let mut document = Document::from_payload(kind.collection(), item.user_id.as_str(), encode(item)?)?;
        document.id = DocumentId::parse(item.id.as_str())?;
        let updated = repo.update(&document).await?;
        decode(&updated)
    }

    async fn delete(&self, kind: InventoryType, user: &UserId, id: &ItemId) -> ServiceResult<()> {
        let repo = self.backend.collection(kind.collection(), user.as_str())?;
        repo.delete(&DocumentId::parse(id.as_str())?).await?;
        Ok(())
    }
}

/// Uploads written to the local asset directory
#[derive(Debug, Clone)]
pub struct LocalAssetUploader {
    assets: AssetStore,
}

impl LocalAssetUploader {
    pub fn new(assets: AssetStore) -> Self {
        Self { assets }
    }
}

#[async_trait]
impl AssetUploader for LocalAssetUploader {
    async fn upload(&self, upload: AssetUpload<'_>) -> ServiceResult<String> {
        let stored = self
            .assets
            .store(upload.folder, upload.owner.as_str(), upload.file_name, upload.bytes)
            .await?;
        Ok(stored.url)
    }
}
