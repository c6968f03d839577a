//! JSON file backend.
//!
//! All garage documents live in a single JSON array on disk. Each mutating
//! call applies the change to a copy of the cached documents, writes the copy
//! to a sibling temp file, renames it over the original, and only then
//! replaces the cache. A crash mid-write leaves the previous file intact.
//!
//! The write and the cache swap run in a spawned task that owns the cache
//! lock. Dropping the caller's future (a timeout, for instance) never leaves
//! the file and the cache out of step.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use spot_types::{GarageId, GaragePatch, GarageRecord, SectionPatch, SectionRecord};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::documents::Documents;
use crate::error::{StoreError, StoreResult};
use crate::traits::GarageStore;

/// Garage store persisted as one JSON document file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    docs: Arc<Mutex<Documents>>,
}

impl JsonFileStore {
    /// Open the store at `path`, reading existing documents if the file
    /// exists. A missing file is an empty store; it is created on the first
    /// write.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let docs = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let records: Vec<GarageRecord> = serde_json::from_slice(&bytes)?;
                Documents::from_records(records)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Documents::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), garages = docs.len(), "garage store opened");
        Ok(Self {
            path,
            docs: Arc::new(Mutex::new(docs)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn mutate(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Documents) -> StoreResult<()>,
    ) -> StoreResult<()> {
        let mut docs = self.docs.clone().lock_owned().await;
        let mut next = docs.clone();
        f(&mut next)?;

        let path = self.path.clone();
        let commit = tokio::spawn(async move {
            persist(&path, &next).await?;
            *docs = next;
            debug!(op, path = %path.display(), "garage store written");
            Ok::<(), StoreError>(())
        });
        commit
            .await
            .map_err(|e| StoreError::Unavailable(format!("{op} aborted: {e}")))?
    }
}

async fn persist(path: &Path, docs: &Documents) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(&docs.to_records())?;
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl GarageStore for JsonFileStore {
    async fn create_garage(&self, garage: &GarageRecord) -> StoreResult<()> {
        self.mutate("create_garage", |docs| docs.insert_garage(garage.clone()))
            .await
    }

    async fn update_garage(&self, id: &GarageId, patch: &GaragePatch) -> StoreResult<()> {
        self.mutate("update_garage", |docs| docs.update_garage(id, patch))
            .await
    }

    async fn delete_garage(&self, id: &GarageId) -> StoreResult<()> {
        self.mutate("delete_garage", |docs| docs.delete_garage(id)).await
    }

    async fn find_all_garages(&self) -> StoreResult<HashMap<GarageId, GarageRecord>> {
        Ok(self.docs.lock().await.to_map())
    }

    async fn insert_section(
        &self,
        garage_id: &GarageId,
        section: &SectionRecord,
    ) -> StoreResult<()> {
        self.mutate("insert_section", |docs| docs.insert_section(garage_id, section))
            .await
    }

    async fn update_section(
        &self,
        garage_id: &GarageId,
        section_name: &str,
        patch: &SectionPatch,
    ) -> StoreResult<()> {
        self.mutate("update_section", |docs| {
            docs.update_section(garage_id, section_name, patch)
        })
        .await
    }

    async fn delete_section(&self, garage_id: &GarageId, section_name: &str) -> StoreResult<()> {
        self.mutate("delete_section", |docs| docs.delete_section(garage_id, section_name))
            .await
    }
}
