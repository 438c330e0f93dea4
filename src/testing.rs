//! Test Fakes
//!
//! In-memory collaborators with knobs for failure injection and gating,
//! shared by the unit tests across modules.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::commands::{AssetUpload, AssetUploader, Notifier, PersistenceService, ServiceResult, StaticSession};
use crate::context::AppContext;
use crate::error::ServiceError;
use crate::models::{
    ImageFile, ImageSource, InventoryItem, InventoryType, ItemDetails, ItemId, NewInventoryItem, NewItemForm,
    SwitchDetails, SwitchType, UserId,
};

pub fn switch_details(switch_type: SwitchType) -> ItemDetails {
    ItemDetails::Switch(SwitchDetails {
        switch_type,
        manufacturer: None,
        quantity: Some(70),
        spring_weight: None,
    })
}

pub fn confirmed_switch(id: &str, name: &str) -> InventoryItem {
    InventoryItem {
        id: ItemId::from(id),
        user_id: UserId::from("user-1"),
        name: name.to_string(),
        image: format!("https://assets.example/{}.png", id),
        notes: vec![],
        details: switch_details(SwitchType::Linear),
        created_at: None,
        updated_at: None,
    }
}

/// Switch form with a direct image link
pub fn switch_form(name: &str) -> NewItemForm {
    NewItemForm {
        name: name.to_string(),
        image: ImageSource::Url("https://assets.example/direct.png".to_string()),
        details: switch_details(SwitchType::Tactile),
    }
}

/// Switch form with a picked file
pub fn switch_form_with_file(name: &str, file_name: &str) -> NewItemForm {
    NewItemForm {
        image: ImageSource::File(ImageFile::new(file_name, vec![0x89, b'P', b'N', b'G'])),
        ..switch_form(name)
    }
}

// ========================
// Persistence
// ========================

#[derive(Default)]
struct Collections {
    items: HashMap<InventoryType, Vec<InventoryItem>>,
    next_ids: Vec<String>,
    fail_create: HashSet<String>,
    created: Vec<NewInventoryItem>,
    list_gates: VecDeque<Arc<Semaphore>>,
    create_gates: HashMap<String, Arc<Semaphore>>,
}

/// Persistence service over a map, with scripted ids and failures
#[derive(Default)]
pub struct MemoryPersistence {
    state: Mutex<Collections>,
    fail_list: AtomicBool,
    fail_update: AtomicBool,
    list_calls: AtomicUsize,
    counter: AtomicUsize,
}

impl MemoryPersistence {
    pub fn seed(&self, kind: InventoryType, item: InventoryItem) {
        self.lock().items.entry(kind).or_default().push(item);
    }

    /// Ids handed to the next creates, in order
    pub fn script_ids(&self, ids: &[&str]) {
        self.lock().next_ids.extend(ids.iter().map(|id| id.to_string()));
    }

    /// Reject creates of records with this name
    pub fn fail_create_for(&self, name: &str) {
        self.lock().fail_create.insert(name.to_string());
    }

    /// Hold the next list call's response (taken when the call starts)
    /// until a permit is added to the returned gate
    pub fn gate_next_list(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.lock().list_gates.push_back(gate.clone());
        gate
    }

    /// Store creates of `name` at once but hold their response on the gate
    pub fn hold_create_response(&self, name: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.lock().create_gates.insert(name.to_string(), gate.clone());
        gate
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Create payloads received so far
    pub fn created(&self) -> Vec<NewInventoryItem> {
        self.lock().created.clone()
    }

    pub fn stored(&self, kind: InventoryType) -> Vec<InventoryItem> {
        self.lock().items.get(&kind).cloned().unwrap_or_default()
    }

    fn store_created(
        &self,
        kind: InventoryType,
        item: &NewInventoryItem,
    ) -> ServiceResult<(InventoryItem, Option<Arc<Semaphore>>)> {
        let mut state = self.lock();
        state.created.push(item.clone());
        if state.fail_create.contains(&item.name) {
            return Err(ServiceError::Rejected {
                status: 500,
                message: "insert failed".to_string(),
            });
        }

        let id = if state.next_ids.is_empty() {
            format!("srv-{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1)
        } else {
            state.next_ids.remove(0)
        };
        let confirmed = InventoryItem {
            id: ItemId::from(id.as_str()),
            user_id: item.user_id.clone(),
            name: item.name.clone(),
            image: item.image.clone(),
            notes: item.notes.clone(),
            details: item.details.clone(),
            created_at: Some(chrono::Utc::now()),
            updated_at: None,
        };
        state.items.entry(kind).or_default().push(confirmed.clone());
        let gate = state.create_gates.get(&item.name).cloned();
        Ok((confirmed, gate))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Collections> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl PersistenceService for MemoryPersistence {
    async fn list(&self, kind: InventoryType, user: &UserId) -> ServiceResult<Vec<InventoryItem>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let response = if self.fail_list.load(Ordering::SeqCst) {
            Err(ServiceError::Network("connection reset".to_string()))
        } else {
            Ok(self
                .stored(kind)
                .into_iter()
                .filter(|item| &item.user_id == user)
                .collect())
        };

        let gate = self.lock().list_gates.pop_front();
        if let Some(gate) = gate {
            wait(&gate).await?;
        }
        tokio::task::yield_now().await;
        response
    }

    async fn create(&self, kind: InventoryType, item: &NewInventoryItem) -> ServiceResult<InventoryItem> {
        tokio::task::yield_now().await;
        let (confirmed, gate) = self.store_created(kind, item)?;
        if let Some(gate) = gate {
            wait(&gate).await?;
        }
        Ok(confirmed)
    }

    async fn update(&self, kind: InventoryType, item: &InventoryItem) -> ServiceResult<InventoryItem> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(ServiceError::Network("timeout".to_string()));
        }
        let mut state = self.lock();
        let items = state.items.entry(kind).or_default();
        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(slot) => {
                *slot = InventoryItem {
                    updated_at: Some(chrono::Utc::now()),
                    ..item.clone()
                };
                Ok(slot.clone())
            }
            None => Err(ServiceError::Rejected {
                status: 404,
                message: format!("{} not found", item.id),
            }),
        }
    }

    async fn delete(&self, kind: InventoryType, _user: &UserId, id: &ItemId) -> ServiceResult<()> {
        let mut state = self.lock();
        let items = state.items.entry(kind).or_default();
        let before = items.len();
        items.retain(|item| &item.id != id);
        if items.len() == before {
            return Err(ServiceError::Rejected {
                status: 404,
                message: format!("{} not found", id),
            });
        }
        Ok(())
    }
}

async fn wait(gate: &Semaphore) -> ServiceResult<()> {
    let permit = gate
        .acquire()
        .await
        .map_err(|e| ServiceError::Network(e.to_string()))?;
    permit.forget();
    Ok(())
}

// ========================
// Asset Host
// ========================

/// Uploader whose requests can be held open per file name
#[derive(Default)]
pub struct FakeUploader {
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    failing: Mutex<HashSet<String>>,
    uploads: Mutex<Vec<String>>,
}

impl FakeUploader {
    /// Hold uploads of `file_name` until `release` is called
    pub fn gate(&self, file_name: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(file_name.to_string(), Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, file_name: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(file_name) {
            gate.add_permits(1);
        }
    }

    pub fn fail_for(&self, file_name: &str) {
        self.failing.lock().unwrap().insert(file_name.to_string());
    }

    /// File names whose upload completed
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetUploader for FakeUploader {
    async fn upload(&self, upload: AssetUpload<'_>) -> ServiceResult<String> {
        let gate = self.gates.lock().unwrap().get(upload.file_name).cloned();
        if let Some(gate) = gate {
            wait(&gate).await?;
        }

        if self.failing.lock().unwrap().contains(upload.file_name) {
            return Err(ServiceError::Rejected {
                status: 400,
                message: "upload rejected".to_string(),
            });
        }
        self.uploads.lock().unwrap().push(upload.file_name.to_string());
        Ok(format!("https://assets.example/{}", upload.file_name))
    }
}

// ========================
// Notifier / Context
// ========================

#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

/// Fakes wired into a context for `user-1`
pub struct Harness {
    pub persistence: Arc<MemoryPersistence>,
    pub uploader: Arc<FakeUploader>,
    pub notifier: Arc<RecordingNotifier>,
    pub ctx: AppContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_user(Some("user-1"))
    }

    pub fn with_user(user: Option<&str>) -> Self {
        let persistence = Arc::new(MemoryPersistence::default());
        let uploader = Arc::new(FakeUploader::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let ctx = AppContext::new(
            persistence.clone(),
            uploader.clone(),
            Arc::new(StaticSession(user.map(UserId::from))),
        )
        .with_notifier(notifier.clone());
        Self {
            persistence,
            uploader,
            notifier,
            ctx,
        }
    }
}
