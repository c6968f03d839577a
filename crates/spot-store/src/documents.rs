//! Document-level operations shared by the store backends.

use std::collections::{BTreeMap, HashMap};

use spot_types::{GarageId, GaragePatch, GarageRecord, SectionPatch, SectionRecord};

use crate::error::{StoreError, StoreResult};

/// The full set of garage documents held by a backend.
///
/// Every mutating method checks its preconditions before touching any
/// document, so an `Err` always leaves the set unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Documents {
    garages: BTreeMap<GarageId, GarageRecord>,
}

impl Documents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of documents, rejecting duplicate ids.
    pub fn from_records(records: Vec<GarageRecord>) -> StoreResult<Self> {
        let mut docs = Self::new();
        for record in records {
            docs.insert_garage(record)?;
        }
        Ok(docs)
    }

    /// Documents in id order.
    pub fn to_records(&self) -> Vec<GarageRecord> {
        self.garages.values().cloned().collect()
    }

    pub fn to_map(&self) -> HashMap<GarageId, GarageRecord> {
        self.garages
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect()
    }

    pub fn get(&self, id: &GarageId) -> Option<&GarageRecord> {
        self.garages.get(id)
    }

    pub fn len(&self) -> usize {
        self.garages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.garages.is_empty()
    }

    pub fn insert_garage(&mut self, record: GarageRecord) -> StoreResult<()> {
        if self.garages.contains_key(&record.id) {
            return Err(StoreError::DuplicateGarage(record.id));
        }
        self.garages.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn update_garage(&mut self, id: &GarageId, patch: &GaragePatch) -> StoreResult<()> {
        let record = self.garage_mut(id)?;
        patch.apply_to(record);
        Ok(())
    }

    pub fn delete_garage(&mut self, id: &GarageId) -> StoreResult<()> {
        self.garages
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::GarageNotFound(id.clone()))
    }

    pub fn insert_section(&mut self, garage_id: &GarageId, section: &SectionRecord) -> StoreResult<()> {
        let record = self.garage_mut(garage_id)?;
        record.sections.push(section.clone());
        Ok(())
    }

    pub fn update_section(
        &mut self,
        garage_id: &GarageId,
        section_name: &str,
        patch: &SectionPatch,
    ) -> StoreResult<()> {
        let record = self.garage_mut(garage_id)?;
        let section = record
            .section_mut(section_name)
            .ok_or_else(|| StoreError::SectionNotFound {
                garage_id: garage_id.clone(),
                section: section_name.to_string(),
            })?;
        patch.apply_to(section);
        Ok(())
    }

    pub fn delete_section(&mut self, garage_id: &GarageId, section_name: &str) -> StoreResult<()> {
        let record = self.garage_mut(garage_id)?;
        let index = record
            .sections
            .iter()
            .position(|s| s.name == section_name)
            .ok_or_else(|| StoreError::SectionNotFound {
                garage_id: garage_id.clone(),
                section: section_name.to_string(),
            })?;
        record.sections.remove(index);
        Ok(())
    }

    fn garage_mut(&mut self, id: &GarageId) -> StoreResult<&mut GarageRecord> {
        self.garages
            .get_mut(id)
            .ok_or_else(|| StoreError::GarageNotFound(id.clone()))
    }
}
