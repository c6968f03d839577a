use std::collections::HashMap;

use async_trait::async_trait;
use spot_types::{GarageId, GaragePatch, GarageRecord, SectionPatch, SectionRecord};

use crate::error::StoreResult;

/// Document store holding the garage catalog.
///
/// All implementations must satisfy these invariants:
/// - Each call is independently atomic: it either fully applies or leaves
///   the stored documents untouched.
/// - Patch fields set to `None` are never written.
/// - Sections keep their insertion order inside a garage document.
/// - Calls may run concurrently; implementations synchronize internally.
///
/// Callers bound every call with their own deadline, so implementations
/// need not enforce timeouts.
#[async_trait]
pub trait GarageStore: Send + Sync {
    /// Insert a new garage document.
    async fn create_garage(&self, garage: &GarageRecord) -> StoreResult<()>;

    /// Set the supplied name, city, and address fields of a garage.
    async fn update_garage(&self, id: &GarageId, patch: &GaragePatch) -> StoreResult<()>;

    /// Remove a garage document together with its sections.
    async fn delete_garage(&self, id: &GarageId) -> StoreResult<()>;

    /// Load every garage document, keyed by id.
    async fn find_all_garages(&self) -> StoreResult<HashMap<GarageId, GarageRecord>>;

    /// Append a section to a garage document.
    async fn insert_section(&self, garage_id: &GarageId, section: &SectionRecord)
        -> StoreResult<()>;

    /// Set the supplied fields of the section currently named `section_name`.
    async fn update_section(
        &self,
        garage_id: &GarageId,
        section_name: &str,
        patch: &SectionPatch,
    ) -> StoreResult<()>;

    /// Remove a section from a garage document.
    async fn delete_section(&self, garage_id: &GarageId, section_name: &str) -> StoreResult<()>;
}
