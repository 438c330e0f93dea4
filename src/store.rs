//! Client Collection Cache
//!
//! In-memory, revalidatable list of one user's items for one inventory
//! type. Every mutation is a closure over the live list, so concurrent
//! workers never act on a stale snapshot.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

use crate::commands::PersistenceService;
use crate::error::{ClientError, Result, ServiceError};
use crate::models::{Entry, InventoryItem, InventoryType, ItemId, Placeholder, TempId, UserId};

#[derive(Default)]
struct CacheState {
    entries: Vec<Entry>,
    /// Last revalidation failure; cleared by the next success
    error: Option<ServiceError>,
    loaded: bool,
    /// Sequence number handed to the most recently started fetch
    fetch_seq: u64,
    /// Sequence number of the newest fetch that has finished, either way
    settled_seq: u64,
}

/// Shared cache handle; clones see the same list
#[derive(Clone)]
pub struct CollectionCache {
    kind: InventoryType,
    user: UserId,
    persistence: Arc<dyn PersistenceService>,
    state: Arc<Mutex<CacheState>>,
}

impl CollectionCache {
    pub fn new(kind: InventoryType, user: UserId, persistence: Arc<dyn PersistenceService>) -> Self {
        Self {
            kind,
            user,
            persistence,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn kind(&self) -> InventoryType {
        self.kind
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Current list, pending placeholders included
    pub fn read(&self) -> Vec<Entry> {
        self.lock().entries.clone()
    }

    /// Whether a successful fetch has ever been applied
    pub fn is_loaded(&self) -> bool {
        self.lock().loaded
    }

    /// Last revalidation error, while the list is stale
    pub fn error(&self) -> Option<ServiceError> {
        self.lock().error.clone()
    }

    pub fn is_stale(&self) -> bool {
        self.lock().error.is_some()
    }

    /// Apply `updater` to the live list now; optionally refetch in the background.
    ///
    /// Returns the background revalidation task, if one was started. Outside
    /// a tokio runtime the refetch is skipped.
    pub fn mutate<F>(&self, updater: F, revalidate: bool) -> Option<JoinHandle<()>>
    where
        F: FnOnce(&mut Vec<Entry>),
    {
        updater(&mut self.lock().entries);

        if !revalidate {
            return None;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let cache = self.clone();
                Some(handle.spawn(async move {
                    // Failure is recorded on the cache itself
                    let _ = cache.revalidate().await;
                }))
            }
            Err(_) => {
                tracing::warn!(kind = %self.kind, "No runtime, skipping revalidation");
                None
            }
        }
    }

    /// Refetch from the server and replace the confirmed list wholesale.
    ///
    /// Placeholders still in flight are kept after the fetched items. A
    /// fetch that completes after a newer one has finished is dropped,
    /// whether the newer one succeeded or failed.
    pub async fn revalidate(&self) -> Result<()> {
        let seq = {
            let mut state = self.lock();
            state.fetch_seq += 1;
            state.fetch_seq
        };

        let fetched = self.persistence.list(self.kind, &self.user).await;

        let mut state = self.lock();
        if seq < state.settled_seq {
            tracing::debug!(kind = %self.kind, seq, settled = state.settled_seq, "Dropping out-of-order fetch");
            return Ok(());
        }
        state.settled_seq = seq;

        match fetched {
            Ok(items) => {
                let pending: Vec<Entry> = state.entries.drain(..).filter(Entry::is_loading).collect();
                state.entries = items.into_iter().map(Entry::Confirmed).chain(pending).collect();
                state.error = None;
                state.loaded = true;
                tracing::debug!(kind = %self.kind, count = state.entries.len(), "Cache revalidated");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(kind = %self.kind, error = %e, "Revalidation failed, keeping cached list");
                state.error = Some(e.clone());
                Err(ClientError::Stale(e))
            }
        }
    }
}

// ========================
// Cache Helper Functions
// ========================

/// Append a placeholder
pub fn push_placeholder(entries: &mut Vec<Entry>, placeholder: Placeholder) {
    entries.push(Entry::Pending(placeholder));
}

/// Swap the placeholder for the confirmed record.
///
/// A refetch can land the record before its own create returns; then the
/// existing entry is updated and the placeholder dropped, so each server id
/// appears once. With no placeholder and no entry the record is appended.
pub fn replace_pending(entries: &mut Vec<Entry>, temp_id: &TempId, confirmed: InventoryItem) {
    let placeholder = entries.iter().position(|e| e.temp_id() == Some(temp_id));
    let existing = entries.iter().position(|e| e.item_id() == Some(&confirmed.id));

    match (placeholder, existing) {
        (Some(slot), None) => entries[slot] = Entry::Confirmed(confirmed),
        (placeholder, Some(slot)) => {
            entries[slot] = Entry::Confirmed(confirmed);
            if let Some(placeholder) = placeholder {
                entries.remove(placeholder);
            }
        }
        (None, None) => entries.push(Entry::Confirmed(confirmed)),
    }
}

/// Drop the placeholder with this temporary id
pub fn remove_pending(entries: &mut Vec<Entry>, temp_id: &TempId) {
    entries.retain(|e| e.temp_id() != Some(temp_id));
}

/// Update a confirmed item in place by id, appending it if absent
pub fn upsert_item(entries: &mut Vec<Entry>, item: InventoryItem) {
    match entries.iter_mut().find(|e| e.item_id() == Some(&item.id)) {
        Some(slot) => *slot = Entry::Confirmed(item),
        None => entries.push(Entry::Confirmed(item)),
    }
}

/// Remove a confirmed item by id
pub fn remove_item(entries: &mut Vec<Entry>, id: &ItemId) {
    entries.retain(|e| e.item_id() != Some(id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{confirmed_switch, switch_form, MemoryPersistence};

    fn cache_with(persistence: Arc<MemoryPersistence>) -> CollectionCache {
        CollectionCache::new(InventoryType::Switches, UserId::from("user-1"), persistence)
    }

    fn placeholder(temp: &str, name: &str) -> Placeholder {
        Placeholder::new(TempId::from(temp), UserId::from("user-1"), &switch_form(name))
    }

    #[tokio::test]
    async fn test_revalidate_replaces_confirmed_and_keeps_pending() {
        let persistence = Arc::new(MemoryPersistence::default());
        persistence.seed(InventoryType::Switches, confirmed_switch("srv-1", "Oil King"));
        let cache = cache_with(persistence.clone());

        cache.mutate(
            |entries| {
                upsert_item(entries, confirmed_switch("gone", "Deleted elsewhere"));
                push_placeholder(entries, placeholder("tmp-1", "Boba U4"));
            },
            false,
        );

        cache.revalidate().await.expect("revalidate");
        let entries = cache.read();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].item_id(), Some(&ItemId::from("srv-1")));
        assert_eq!(entries[1].temp_id(), Some(&TempId::from("tmp-1")));
        assert!(cache.is_loaded());
        assert!(!cache.is_stale());
    }

    #[tokio::test]
    async fn test_failed_revalidate_keeps_last_known_good() {
        let persistence = Arc::new(MemoryPersistence::default());
        persistence.seed(InventoryType::Switches, confirmed_switch("srv-1", "Oil King"));
        let cache = cache_with(persistence.clone());
        cache.revalidate().await.unwrap();

        persistence.fail_list(true);
        let err = cache.revalidate().await.unwrap_err();

        assert!(matches!(err, ClientError::Stale(_)));
        assert!(cache.is_stale());
        assert_eq!(cache.read().len(), 1);

        // Manual retry clears the indicator
        persistence.fail_list(false);
        cache.revalidate().await.unwrap();
        assert!(!cache.is_stale());
    }

    #[tokio::test]
    async fn test_revalidate_twice_is_idempotent() {
        let persistence = Arc::new(MemoryPersistence::default());
        persistence.seed(InventoryType::Switches, confirmed_switch("srv-1", "Oil King"));
        persistence.seed(InventoryType::Switches, confirmed_switch("srv-2", "Boba U4"));
        let cache = cache_with(persistence);

        cache.revalidate().await.unwrap();
        let first = cache.read();
        cache.revalidate().await.unwrap();
        assert_eq!(first, cache.read());
    }

    #[tokio::test]
    async fn test_mutate_with_revalidate_spawns_refetch() {
        let persistence = Arc::new(MemoryPersistence::default());
        persistence.seed(InventoryType::Switches, confirmed_switch("srv-1", "Oil King"));
        let cache = cache_with(persistence.clone());

        let handle = cache.mutate(|entries| entries.clear(), true).expect("refetch task");
        assert!(cache.read().is_empty());

        handle.await.unwrap();
        assert_eq!(cache.read().len(), 1);
        assert_eq!(persistence.list_calls(), 1);
    }

    #[test]
    fn test_mutate_outside_runtime_skips_refetch() {
        let cache = cache_with(Arc::new(MemoryPersistence::default()));
        let handle = cache.mutate(|entries| push_placeholder(entries, placeholder("tmp-1", "Boba U4")), true);
        assert!(handle.is_none());
        assert_eq!(cache.read().len(), 1);
    }

    #[test]
    fn test_replace_pending_by_temp_id_only() {
        let mut entries = vec![
            Entry::Pending(placeholder("tmp-1", "Same Name")),
            Entry::Pending(placeholder("tmp-2", "Same Name")),
        ];

        replace_pending(&mut entries, &TempId::from("tmp-2"), confirmed_switch("srv-2", "Same Name"));

        assert_eq!(entries[0].temp_id(), Some(&TempId::from("tmp-1")));
        assert_eq!(entries[1].item_id(), Some(&ItemId::from("srv-2")));
    }

    #[test]
    fn test_replace_pending_when_placeholder_missing() {
        let mut entries = vec![Entry::Confirmed(confirmed_switch("srv-1", "Oil King"))];

        replace_pending(&mut entries, &TempId::from("tmp-9"), confirmed_switch("srv-1", "Oil King"));
        assert_eq!(entries.len(), 1);

        replace_pending(&mut entries, &TempId::from("tmp-9"), confirmed_switch("srv-2", "Boba U4"));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_replace_pending_merges_with_refetched_record() {
        let mut entries = vec![
            Entry::Confirmed(confirmed_switch("srv-1", "Boba U4")),
            Entry::Confirmed(confirmed_switch("srv-2", "Oil King")),
            Entry::Pending(placeholder("tmp-1", "Boba U4")),
        ];

        let mut confirmed = confirmed_switch("srv-1", "Boba U4");
        confirmed.image = "https://assets.example/fresh.png".to_string();
        replace_pending(&mut entries, &TempId::from("tmp-1"), confirmed);

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| !e.is_loading()));
        assert_eq!(entries[0].as_confirmed().map(|i| i.image.as_str()), Some("https://assets.example/fresh.png"));
        assert_eq!(entries[1].item_id(), Some(&ItemId::from("srv-2")));
    }

    #[tokio::test]
    async fn test_out_of_order_fetch_is_dropped() {
        let persistence = Arc::new(MemoryPersistence::default());
        persistence.seed(InventoryType::Switches, confirmed_switch("srv-1", "Oil King"));
        let cache = cache_with(persistence.clone());

        let gate = persistence.gate_next_list();
        let slow = tokio::spawn({
            let cache = cache.clone();
            async move { cache.revalidate().await }
        });
        while persistence.list_calls() < 1 {
            tokio::task::yield_now().await;
        }

        persistence.seed(InventoryType::Switches, confirmed_switch("srv-2", "Boba U4"));
        cache.revalidate().await.unwrap();
        assert_eq!(cache.read().len(), 2);

        // The first fetch saw only srv-1; it must not win
        gate.add_permits(1);
        slow.await.unwrap().unwrap();
        assert_eq!(cache.read().len(), 2);
        assert!(!cache.is_stale());
    }

    #[tokio::test]
    async fn test_older_success_does_not_mask_newer_failure() {
        let persistence = Arc::new(MemoryPersistence::default());
        persistence.seed(InventoryType::Switches, confirmed_switch("srv-1", "Oil King"));
        let cache = cache_with(persistence.clone());
        cache.revalidate().await.unwrap();

        persistence.seed(InventoryType::Switches, confirmed_switch("srv-2", "Boba U4"));
        let gate = persistence.gate_next_list();
        let slow = tokio::spawn({
            let cache = cache.clone();
            async move { cache.revalidate().await }
        });
        while persistence.list_calls() < 2 {
            tokio::task::yield_now().await;
        }

        persistence.fail_list(true);
        assert!(matches!(cache.revalidate().await, Err(ClientError::Stale(_))));

        gate.add_permits(1);
        slow.await.unwrap().unwrap();
        assert!(cache.is_stale());
        assert_eq!(cache.read().len(), 1);
    }

    #[test]
    fn test_remove_helpers() {
        let mut entries = vec![
            Entry::Pending(placeholder("tmp-1", "Boba U4")),
            Entry::Confirmed(confirmed_switch("srv-1", "Oil King")),
        ];

        remove_pending(&mut entries, &TempId::from("tmp-1"));
        assert_eq!(entries.len(), 1);
        remove_item(&mut entries, &ItemId::from("srv-1"));
        assert!(entries.is_empty());
    }
}
