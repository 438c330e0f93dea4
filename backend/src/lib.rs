//! HobbInventory Backend
//!
//! Layered architecture:
//! - domain: documents, identifiers and collection schemas
//! - repository: data access abstractions and the SQLite implementation
//! - assets: directory-backed image host

use std::path::{Path, PathBuf};

pub mod assets;
pub mod domain;
pub mod repository;

pub use assets::{AssetStore, StoredAsset, DEFAULT_MAX_ASSET_BYTES};
pub use domain::{CollectionRegistry, CollectionSchema, Document, DocumentId, DomainError, DomainResult};
pub use repository::{CollectionRepository, Repository};

use repository::{init_db, SharedConnection};

/// Backend settings
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL handed out for stored assets (defaults to `file://`)
    pub public_asset_base: Option<String>,
    pub max_asset_bytes: u64,
    pub collections: CollectionRegistry,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            public_asset_base: None,
            max_asset_bytes: DEFAULT_MAX_ASSET_BYTES,
            collections: CollectionRegistry::hobby(),
        }
    }
}

/// Document store plus asset store, shared by all callers
#[derive(Clone)]
pub struct Backend {
    conn: SharedConnection,
    collections: CollectionRegistry,
    assets: AssetStore,
}

impl Backend {
    /// Open `<data_dir>/hobb.db` with assets under `<data_dir>/assets`
    pub async fn open(data_dir: &Path, config: BackendConfig) -> DomainResult<Self> {
        let conn = init_db(&data_dir.join("hobb.db")).await?;
        Ok(Self::with_connection(conn, data_dir.join("assets"), config))
    }

    /// In-memory database; assets still go to `asset_root`
    pub async fn in_memory(asset_root: impl Into<PathBuf>, config: BackendConfig) -> DomainResult<Self> {
        let conn = init_db(Path::new(":memory:")).await?;
        Ok(Self::with_connection(conn, asset_root.into(), config))
    }

    fn with_connection(conn: SharedConnection, asset_root: PathBuf, config: BackendConfig) -> Self {
        Self {
            conn,
            assets: AssetStore::new(asset_root, config.public_asset_base, config.max_asset_bytes),
            collections: config.collections,
        }
    }

    /// Repository for one user's documents in `collection`
    pub fn collection(&self, collection: &str, owner_id: &str) -> DomainResult<CollectionRepository> {
        let schema = self.collections.get(collection)?.clone();
        Ok(CollectionRepository::new(self.conn.clone(), schema, owner_id))
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }
}
