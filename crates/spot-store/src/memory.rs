use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use spot_types::{GarageId, GaragePatch, GarageRecord, SectionPatch, SectionRecord};

use crate::documents::Documents;
use crate::error::{StoreError, StoreResult};
use crate::traits::GarageStore;

/// In-memory, HashMap-based garage store.
///
/// Intended for tests and embedding. Documents are held behind a `RwLock`
/// and cloned on read. Failures and latency can be injected to exercise
/// callers' error and timeout paths.
pub struct InMemoryGarageStore {
    docs: RwLock<Documents>,
    failing: AtomicBool,
    latency_ms: AtomicUsize,
    calls: AtomicUsize,
}

impl InMemoryGarageStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::with_documents(Documents::new())
    }

    /// Create a store pre-populated with documents.
    pub fn with_documents(docs: Documents) -> Self {
        Self {
            docs: RwLock::new(docs),
            failing: AtomicBool::new(false),
            latency_ms: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make every following call fail with [`StoreError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every following call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as usize, Ordering::SeqCst);
    }

    /// Number of calls made so far, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Copy of the stored documents.
    pub fn snapshot(&self) -> Documents {
        self.docs.read().expect("lock poisoned").clone()
    }

    /// Stored document for one garage.
    pub fn garage(&self, id: &GarageId) -> Option<GarageRecord> {
        self.docs.read().expect("lock poisoned").get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.docs.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().expect("lock poisoned").is_empty()
    }

    async fn enter(&self, op: &str) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency as u64)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{op}: injected failure")));
        }
        Ok(())
    }

    fn write<T>(&self, f: impl FnOnce(&mut Documents) -> StoreResult<T>) -> StoreResult<T> {
        let mut docs = self.docs.write().expect("lock poisoned");
        f(&mut docs)
    }
}

impl Default for InMemoryGarageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GarageStore for InMemoryGarageStore {
    async fn create_garage(&self, garage: &GarageRecord) -> StoreResult<()> {
        self.enter("create_garage").await?;
        self.write(|docs| docs.insert_garage(garage.clone()))
    }

    async fn update_garage(&self, id: &GarageId, patch: &GaragePatch) -> StoreResult<()> {
        self.enter("update_garage").await?;
        self.write(|docs| docs.update_garage(id, patch))
    }

    async fn delete_garage(&self, id: &GarageId) -> StoreResult<()> {
        self.enter("delete_garage").await?;
        self.write(|docs| docs.delete_garage(id))
    }

    async fn find_all_garages(&self) -> StoreResult<HashMap<GarageId, GarageRecord>> {
        self.enter("find_all_garages").await?;
        Ok(self.docs.read().expect("lock poisoned").to_map())
    }

    async fn insert_section(
        &self,
        garage_id: &GarageId,
        section: &SectionRecord,
    ) -> StoreResult<()> {
        self.enter("insert_section").await?;
        self.write(|docs| docs.insert_section(garage_id, section))
    }

    async fn update_section(
        &self,
        garage_id: &GarageId,
        section_name: &str,
        patch: &SectionPatch,
    ) -> StoreResult<()> {
        self.enter("update_section").await?;
        self.write(|docs| docs.update_section(garage_id, section_name, patch))
    }

    async fn delete_section(&self, garage_id: &GarageId, section_name: &str) -> StoreResult<()> {
        self.enter("delete_section").await?;
        self.write(|docs| docs.delete_section(garage_id, section_name))
    }
}

impl std::fmt::Debug for InMemoryGarageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryGarageStore")
            .field("garage_count", &self.len())
            .field("failing", &self.failing.load(Ordering::SeqCst))
            .finish()
    }
}
