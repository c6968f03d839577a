use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use rand::rngs::OsRng;
use spot_store::{GarageStore, StoreResult};
use spot_types::{
    GarageId, GaragePatch, GarageRecord, GarageView, NewGarage, SectionPatch, SectionRecord,
    SectionView, SpotView,
};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::model::{Garage, Section};

/// The in-memory authority over all garages.
///
/// One `RwLock` guards the whole map. Reads take it shared. Every mutation
/// takes it exclusively and, for catalog changes, calls the store inside
/// the critical section before touching memory.
pub struct GarageRegistry {
    pub(crate) store: Arc<dyn GarageStore>,
    pub(crate) config: RegistryConfig,
    pub(crate) garages: RwLock<HashMap<GarageId, Garage>>,
}

impl GarageRegistry {
    /// An empty registry over `store`.
    pub fn new(store: Arc<dyn GarageStore>, config: RegistryConfig) -> Self {
        Self {
            store,
            config,
            garages: RwLock::new(HashMap::new()),
        }
    }

    /// Rehydrate from every garage in `store`.
    ///
    /// Spot occupancy is not persisted, so every section comes back with all
    /// spots offline.
    pub async fn load(store: Arc<dyn GarageStore>, config: RegistryConfig) -> RegistryResult<Self> {
        let records = match tokio::time::timeout(config.load_timeout, store.find_all_garages()).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(RegistryError::StoreTimeout {
                    op: "find_all_garages",
                    after: config.load_timeout,
                })
            }
        };

        let mut garages = HashMap::with_capacity(records.len());
        for (id, record) in records {
            let garage = Garage::from_record(record).map_err(|e| {
                error!(garage_id = %id, error = %e, "stored garage rejected");
                RegistryError::Invalid(e)
            })?;
            garages.insert(id, garage);
        }
        info!(garages = garages.len(), "garage registry loaded");

        Ok(Self {
            store,
            config,
            garages: RwLock::new(garages),
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ---- Garages ----

    /// Every garage, ordered by id.
    pub async fn garages(&self) -> Vec<GarageView> {
        let garages = self.garages.read().await;
        let mut views: Vec<GarageView> = garages.values().map(Garage::view).collect();
        views.sort_by(|a, b| a.id.cmp(&b.id));
        views
    }

    pub async fn garage(&self, id: &GarageId) -> RegistryResult<GarageView> {
        let garages = self.garages.read().await;
        garages
            .get(id)
            .map(Garage::view)
            .ok_or_else(|| RegistryError::GarageNotFound(id.clone()))
    }

    /// Create a garage under a fresh id.
    ///
    /// The id is checked for collisions under the same exclusive lock that
    /// inserts it.
    pub async fn create_garage(&self, new: NewGarage) -> RegistryResult<GarageView> {
        let mut garages = self.garages.write().await;

        let id = GarageId::generate_unique(&mut OsRng, |candidate| {
            garages.contains_key(candidate)
        })
        .map_err(|e| {
            error!(error = %e, "failed to obtain a garage id");
            RegistryError::from(e)
        })?;

        let garage = Garage::new(id.clone(), new);
        self.persist("create_garage", self.store.create_garage(&garage.to_record()))
            .await?;

        let view = garage.view();
        garages.insert(id.clone(), garage);
        info!(garage_id = %id, name = %view.name, "garage created");
        Ok(view)
    }

    /// Update name, city, and address. Geolocation cannot change.
    pub async fn update_garage(
        &self,
        id: &GarageId,
        patch: &GaragePatch,
    ) -> RegistryResult<GarageView> {
        let mut garages = self.garages.write().await;
        let garage = garages
            .get_mut(id)
            .ok_or_else(|| RegistryError::GarageNotFound(id.clone()))?;

        if !patch.is_empty() {
            self.persist("update_garage", self.store.update_garage(id, patch))
                .await?;
            garage.apply(patch);
            info!(garage_id = %id, "garage updated");
        }
        Ok(garage.view())
    }

    /// Delete a garage with all its sections and live occupancy.
    pub async fn delete_garage(&self, id: &GarageId) -> RegistryResult<()> {
        let mut garages = self.garages.write().await;
        if !garages.contains_key(id) {
            return Err(RegistryError::GarageNotFound(id.clone()));
        }

        self.persist("delete_garage", self.store.delete_garage(id))
            .await?;
        garages.remove(id);
        info!(garage_id = %id, "garage deleted");
        Ok(())
    }

    // ---- Sections ----

    pub async fn sections(&self, garage_id: &GarageId) -> RegistryResult<Vec<SectionView>> {
        let garages = self.garages.read().await;
        let garage = garages
            .get(garage_id)
            .ok_or_else(|| RegistryError::GarageNotFound(garage_id.clone()))?;
        Ok(garage.sections.iter().map(Section::view).collect())
    }

    pub async fn section(&self, garage_id: &GarageId, name: &str) -> RegistryResult<SectionView> {
        let garages = self.garages.read().await;
        lookup_section(&garages, garage_id, name).map(Section::view)
    }

    /// Live state of every spot in a section, by position.
    pub async fn spots(&self, garage_id: &GarageId, name: &str) -> RegistryResult<Vec<SpotView>> {
        let garages = self.garages.read().await;
        lookup_section(&garages, garage_id, name).map(Section::spot_views)
    }

    /// Append a section with every spot offline.
    pub async fn create_section(
        &self,
        garage_id: &GarageId,
        section: SectionRecord,
    ) -> RegistryResult<SectionView> {
        section.validate()?;

        let mut garages = self.garages.write().await;
        let garage = garages
            .get_mut(garage_id)
            .ok_or_else(|| RegistryError::GarageNotFound(garage_id.clone()))?;
        if garage.section_index(&section.name).is_some() {
            return Err(RegistryError::SectionExists {
                garage_id: garage_id.clone(),
                section: section.name,
            });
        }

        self.persist("insert_section", self.store.insert_section(garage_id, &section))
            .await?;

        let section = Section::from_record(section);
        let view = section.view();
        garage.sections.push(section);
        info!(garage_id = %garage_id, section = %view.name, total_spots = view.total_spots, "section created");
        Ok(view)
    }

    /// Update a section.
    ///
    /// Supplying `total_spots` is destructive: once the store accepts the new
    /// capacity, every spot of the section goes offline and its free counter
    /// drops to zero.
    pub async fn update_section(
        &self,
        garage_id: &GarageId,
        name: &str,
        patch: &SectionPatch,
    ) -> RegistryResult<SectionView> {
        patch.validate()?;

        let mut garages = self.garages.write().await;
        let garage = garages
            .get_mut(garage_id)
            .ok_or_else(|| RegistryError::GarageNotFound(garage_id.clone()))?;
        let index = garage
            .section_index(name)
            .ok_or_else(|| RegistryError::SectionNotFound {
                garage_id: garage_id.clone(),
                section: name.to_string(),
            })?;
        if let Some(new_name) = patch.name.as_deref() {
            if new_name != name && garage.section_index(new_name).is_some() {
                return Err(RegistryError::SectionExists {
                    garage_id: garage_id.clone(),
                    section: new_name.to_string(),
                });
            }
        }

        let section = &mut garage.sections[index];
        if !patch.is_empty() {
            self.persist(
                "update_section",
                self.store.update_section(garage_id, name, patch),
            )
            .await?;
            section.apply(patch);
            info!(
                garage_id = %garage_id,
                section = %name,
                resized = patch.total_spots.is_some(),
                "section updated"
            );
        }
        Ok(section.view())
    }

    /// Remove a section, keeping the order of the remaining ones.
    pub async fn delete_section(&self, garage_id: &GarageId, name: &str) -> RegistryResult<()> {
        let mut garages = self.garages.write().await;
        let garage = garages
            .get_mut(garage_id)
            .ok_or_else(|| RegistryError::GarageNotFound(garage_id.clone()))?;
        let index = garage
            .section_index(name)
            .ok_or_else(|| RegistryError::SectionNotFound {
                garage_id: garage_id.clone(),
                section: name.to_string(),
            })?;

        self.persist("delete_section", self.store.delete_section(garage_id, name))
            .await?;
        garage.sections.remove(index);
        info!(garage_id = %garage_id, section = %name, "section deleted");
        Ok(())
    }

    /// Catalog documents as currently held in memory.
    pub async fn records(&self) -> Vec<GarageRecord> {
        let garages = self.garages.read().await;
        let mut records: Vec<GarageRecord> = garages.values().map(Garage::to_record).collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Run one store call under the configured deadline.
    async fn persist<F>(&self, op: &'static str, call: F) -> RegistryResult<()>
    where
        F: Future<Output = StoreResult<()>>,
    {
        let after = self.config.store_timeout;
        match tokio::time::timeout(after, call).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(op, error = %e, "store call failed");
                Err(e.into())
            }
            Err(_) => {
                error!(op, timeout = ?after, "store call timed out");
                Err(RegistryError::StoreTimeout { op, after })
            }
        }
    }
}

impl std::fmt::Debug for GarageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GarageRegistry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

pub(crate) fn lookup_section<'a>(
    garages: &'a HashMap<GarageId, Garage>,
    garage_id: &GarageId,
    name: &str,
) -> RegistryResult<&'a Section> {
    let garage = garages
        .get(garage_id)
        .ok_or_else(|| RegistryError::GarageNotFound(garage_id.clone()))?;
    garage
        .section(name)
        .ok_or_else(|| RegistryError::SectionNotFound {
            garage_id: garage_id.clone(),
            section: name.to_string(),
        })
}
