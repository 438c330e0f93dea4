//! Inventory
//!
//! One user's collection of one type, with optimistic adds and direct
//! edits. Adds show a placeholder synchronously and reconcile in a
//! background task; edits, deletes and note changes go straight to the
//! persistence service and then patch the cache.

mod inserter;
mod notes;
mod worker;


use crate::context::AppContext;
use crate::error::{ClientError, Result};
use crate::filter::{self, ListQuery};
use crate::models::{Entry, InventoryItem, InventoryType, ItemId, ItemPatch, NewItemForm, Note, NoteId, UserId};
use crate::store::{remove_item, upsert_item, CollectionCache};
use crate::validation::{validate_image_url, validate_item};

pub use inserter::insert_placeholder;
pub use worker::{upload_and_reconcile, AddJob, AddOutcome, PendingAdd};

/// Handle over one cached collection; clones share the cache
#[derive(Clone)]
pub struct Inventory {
    ctx: AppContext,
    user: UserId,
    cache: CollectionCache,
}

impl Inventory {
    /// Open the collection for the signed-in user. Nothing is fetched yet.
    pub fn open(ctx: AppContext, kind: InventoryType) -> Result<Self> {
        let user = ctx.current_user()?;
        let cache = CollectionCache::new(kind, user.clone(), ctx.persistence.clone());
        Ok(Self { ctx, user, cache })
    }

    pub fn kind(&self) -> InventoryType {
        self.cache.kind()
    }

    pub fn cache(&self) -> &CollectionCache {
        &self.cache
    }

    /// Fetch (or refetch) the confirmed list
    pub async fn load(&self) -> Result<()> {
        self.cache.revalidate().await
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.cache.read()
    }

    pub fn list(&self, query: &ListQuery) -> Vec<Entry> {
        filter::apply(&self.cache.read(), query)
    }

    // ========================
    // Optimistic Add
    // ========================

    /// Validate, show a placeholder, and start reconciliation in the background.
    ///
    /// Returns once the placeholder is in the cache. Must be called from
    /// within a tokio runtime.
    pub fn add_item(&self, form: NewItemForm) -> Result<PendingAdd> {
        self.check_session()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ClientError::Config(format!("no async runtime: {}", e)))?;

        let temp_id = insert_placeholder(&self.cache, &self.ctx.config, &self.user, &form)?;
        let job = AddJob {
            temp_id,
            user: self.user.clone(),
            form,
            cache: self.cache.clone(),
            ctx: self.ctx.clone(),
        };
        Ok(PendingAdd::start(&runtime, job))
    }

    // ========================
    // Direct Edits
    // ========================

    pub async fn update_item(&self, id: &ItemId, patch: ItemPatch) -> Result<InventoryItem> {
        self.check_session()?;
        let current = self.confirmed(id)?;
        if let Some(image) = &patch.image {
            validate_image_url(image)?;
        }
        self.save(patch.apply(&current)).await
    }

    pub async fn delete_item(&self, id: &ItemId) -> Result<()> {
        self.check_session()?;
        self.reject_pending(id)?;

        self.ctx
            .persistence
            .delete(self.kind(), &self.user, id)
            .await
            .map_err(ClientError::Persistence)?;

        tracing::info!(kind = %self.kind(), id = %id, "Item deleted");
        self.cache.mutate(|entries| remove_item(entries, id), true);
        Ok(())
    }

    pub async fn add_note(&self, id: &ItemId, text: &str) -> Result<Note> {
        self.check_session()?;
        let mut item = self.confirmed(id)?;
        let note = notes::append(&mut item.notes, text, &self.ctx.config)?;
        self.save(item).await?;
        Ok(note)
    }

    pub async fn edit_note(&self, id: &ItemId, note_id: &NoteId, text: &str) -> Result<Note> {
        self.check_session()?;
        let mut item = self.confirmed(id)?;
        let note = notes::edit(&mut item.notes, note_id, text, &self.ctx.config)?;
        self.save(item).await?;
        Ok(note)
    }

    pub async fn delete_note(&self, id: &ItemId, note_id: &NoteId) -> Result<()> {
        self.check_session()?;
        let mut item = self.confirmed(id)?;
        notes::remove(&mut item.notes, note_id)?;
        self.save(item).await?;
        Ok(())
    }

    /// Send the full record, then patch the cache and refetch in the background
    async fn save(&self, item: InventoryItem) -> Result<InventoryItem> {
        validate_item(&item, self.kind(), &self.ctx.config)?;

        let saved = self
            .ctx
            .persistence
            .update(self.kind(), &item)
            .await
            .map_err(ClientError::Persistence)?;

        tracing::info!(kind = %self.kind(), id = %saved.id, "Item updated");
        self.cache.mutate(|entries| upsert_item(entries, saved.clone()), true);
        Ok(saved)
    }

    // ========================
    // Helpers
    // ========================

    /// The session may have ended since the inventory was opened
    fn check_session(&self) -> Result<()> {
        match self.ctx.session.current_user() {
            Some(user) if user == self.user => Ok(()),
            _ => Err(ClientError::Unauthenticated),
        }
    }

    /// Placeholders are addressed by their temporary id and cannot be edited
    fn reject_pending(&self, id: &ItemId) -> Result<()> {
        let entries = self.cache.read();
        match entries.iter().find(|e| e.temp_id().map(|t| t.as_str()) == Some(id.as_str())) {
            Some(pending) => Err(ClientError::Pending(pending.name().to_string())),
            None => Ok(()),
        }
    }

    fn confirmed(&self, id: &ItemId) -> Result<InventoryItem> {
        self.reject_pending(id)?;
        self.cache
            .read()
            .iter()
            .find_map(|e| e.as_confirmed().filter(|item| &item.id == id).cloned())
            .ok_or_else(|| ClientError::NotFound(format!("{} {}", self.kind(), id)))
    }
}
