//! Application Context
//!
//! The injectable bundle of collaborators every inventory flow runs against.

use std::sync::Arc;

use crate::commands::{AssetUploader, LogNotifier, Notifier, PersistenceService, SessionProvider};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::models::UserId;

/// Services and limits shared by all inventories of a session
#[derive(Clone)]
pub struct AppContext {
    pub persistence: Arc<dyn PersistenceService>,
    pub assets: Arc<dyn AssetUploader>,
    pub session: Arc<dyn SessionProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub config: ClientConfig,
}

impl AppContext {
    /// Context with log-only alerts and default limits
    pub fn new(
        persistence: Arc<dyn PersistenceService>,
        assets: Arc<dyn AssetUploader>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            persistence,
            assets,
            session,
            notifier: Arc::new(LogNotifier),
            config: ClientConfig::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Signed-in user; mutation flows stop here without one
    pub fn current_user(&self) -> Result<UserId> {
        self.session.current_user().ok_or(ClientError::Unauthenticated)
    }
}
