//! Upload-and-Reconcile Worker
//!
//! Runs after the placeholder is visible: resolves the image (uploading a
//! file if one was picked), creates the record, then swaps the placeholder
//! for the confirmed record or rolls it back. Every error stops here.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::commands::{AssetUpload, Notifier};
use crate::context::AppContext;
use crate::error::{ClientError, Result};
use crate::models::{ImageSource, InventoryItem, NewInventoryItem, NewItemForm, TempId, UserId};
use crate::store::{remove_pending, replace_pending, CollectionCache};

/// Everything one add operation needs after the placeholder is in
pub struct AddJob {
    pub temp_id: TempId,
    pub user: UserId,
    pub form: NewItemForm,
    pub cache: CollectionCache,
    pub ctx: AppContext,
}

/// How an add settled
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// Placeholder replaced by the server-confirmed record
    Confirmed(InventoryItem),
    /// Placeholder removed; the user has been alerted
    RolledBack(ClientError),
}

impl AddOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, AddOutcome::Confirmed(_))
    }
}

/// Handle to an in-flight add. Dropping it does not cancel the work.
pub struct PendingAdd {
    temp_id: TempId,
    name: String,
    cache: CollectionCache,
    notifier: Arc<dyn Notifier>,
    handle: JoinHandle<AddOutcome>,
}

impl PendingAdd {
    /// Spawn the worker for `job` on `runtime`
    pub(crate) fn start(runtime: &Handle, job: AddJob) -> Self {
        let temp_id = job.temp_id.clone();
        let name = job.form.name.trim().to_string();
        let cache = job.cache.clone();
        let notifier = job.ctx.notifier.clone();
        let handle = runtime.spawn(upload_and_reconcile(job));
        Self {
            temp_id,
            name,
            cache,
            notifier,
            handle,
        }
    }

    pub fn temp_id(&self) -> &TempId {
        &self.temp_id
    }

    /// Wait for reconciliation (and its revalidation) to finish.
    ///
    /// A worker that died without settling is rolled back here.
    pub async fn settle(self) -> AddOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let error = ClientError::Worker(e.to_string());
                rollback(&self.cache, &self.temp_id, self.notifier.as_ref(), &self.name, &error);
                AddOutcome::RolledBack(error)
            }
        }
    }
}

pub async fn upload_and_reconcile(job: AddJob) -> AddOutcome {
    match run(&job).await {
        Ok(confirmed) => AddOutcome::Confirmed(confirmed),
        Err(e) => {
            rollback(
                &job.cache,
                &job.temp_id,
                job.ctx.notifier.as_ref(),
                job.form.name.trim(),
                &e,
            );
            AddOutcome::RolledBack(e)
        }
    }
}

async fn run(job: &AddJob) -> Result<InventoryItem> {
    let kind = job.cache.kind();

    let (image, uploaded) = match &job.form.image {
        ImageSource::Url(url) => (url.trim().to_string(), false),
        ImageSource::File(file) => {
            tracing::debug!(temp_id = %job.temp_id, file = %file.file_name, bytes = file.len(), "Uploading image");
            let url = job
                .ctx
                .assets
                .upload(AssetUpload {
                    file_name: &file.file_name,
                    bytes: &file.bytes,
                    folder: kind.asset_folder(),
                    owner: &job.user,
                })
                .await
                .map_err(ClientError::Upload)?;
            (url, true)
        }
    };

    let record = NewInventoryItem {
        user_id: job.user.clone(),
        name: job.form.name.trim().to_string(),
        image,
        notes: Vec::new(),
        details: job.form.details.clone(),
    };

    let confirmed = match job.ctx.persistence.create(kind, &record).await {
        Ok(confirmed) => confirmed,
        Err(e) => {
            if uploaded {
                // No cleanup path exists on the asset host
                tracing::warn!(temp_id = %job.temp_id, url = %record.image, "Uploaded asset orphaned by failed create");
            }
            return Err(ClientError::Persistence(e));
        }
    };

    tracing::info!(kind = %kind, temp_id = %job.temp_id, id = %confirmed.id, "Add reconciled");
    let refetch = job
        .cache
        .mutate(|entries| replace_pending(entries, &job.temp_id, confirmed.clone()), true);
    if let Some(refetch) = refetch {
        let _ = refetch.await;
    }

    Ok(confirmed)
}

fn rollback(cache: &CollectionCache, temp_id: &TempId, notifier: &dyn Notifier, name: &str, error: &ClientError) {
    cache.mutate(|entries| remove_pending(entries, temp_id), false);
    tracing::warn!(temp_id = %temp_id, error = %error, "Add rolled back");
    notifier.alert(&format!("Could not add \"{}\": {}", name, error));
}
