//! Persisted catalog documents and their partial updates.
//!
//! A garage document is the unit of storage: it embeds its section documents
//! in order. Spot occupancy is never part of a document.

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::GarageId;

/// Pattern every section name must match.
pub const SECTION_NAME_PATTERN: &str = "^[a-zA-Z0-9]+$";

/// Check that a section name is non-empty ASCII alphanumerics.
pub fn validate_section_name(name: &str) -> Result<(), TypeError> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(TypeError::InvalidSectionName(name.to_string()));
    }
    Ok(())
}

/// Largest capacity a single section may declare. Every spot is allocated
/// in memory up front, so this bounds the allocation per section.
pub const MAX_TOTAL_SPOTS: u32 = 100_000;

/// A section holds between 1 and [`MAX_TOTAL_SPOTS`] spots.
pub fn validate_capacity(total_spots: u32) -> Result<(), TypeError> {
    if !(1..=MAX_TOTAL_SPOTS).contains(&total_spots) {
        return Err(TypeError::InvalidCapacity(total_spots));
    }
    Ok(())
}

/// Estimated real-world location of a garage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    pub longitude: f64,
    pub latitude: f64,
}

/// Client-supplied fields for a new garage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewGarage {
    pub name: String,
    pub city: String,
    pub address: String,
    pub geolocation: Geolocation,
}

/// Stored garage document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GarageRecord {
    pub id: GarageId,
    pub name: String,
    pub city: String,
    pub address: String,
    pub geolocation: Geolocation,
    #[serde(default)]
    pub sections: Vec<SectionRecord>,
}

impl GarageRecord {
    /// A fresh document for `id` with no sections.
    pub fn new(id: GarageId, garage: NewGarage) -> Self {
        Self {
            id,
            name: garage.name,
            city: garage.city,
            address: garage.address,
            geolocation: garage.geolocation,
            sections: Vec::new(),
        }
    }

    pub fn section(&self, name: &str) -> Option<&SectionRecord> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut SectionRecord> {
        self.sections.iter_mut().find(|s| s.name == name)
    }
}

/// Stored section document, also the body of a create-section request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionRecord {
    pub name: String,
    pub level: String,
    pub description: String,
    pub total_spots: u32,
}

impl SectionRecord {
    /// Validate name shape and capacity for a section about to be created.
    pub fn validate(&self) -> Result<(), TypeError> {
        validate_section_name(&self.name)?;
        validate_capacity(self.total_spots)
    }
}

/// Partial garage update. `None` leaves a field untouched.
///
/// Geolocation is deliberately absent: it is fixed at creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaragePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl GaragePatch {
    /// Returns `true` if no field is supplied.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.city.is_none() && self.address.is_none()
    }

    /// Apply the supplied fields to a stored document.
    pub fn apply_to(&self, record: &mut GarageRecord) {
        if let Some(name) = &self.name {
            record.name.clone_from(name);
        }
        if let Some(city) = &self.city {
            record.city.clone_from(city);
        }
        if let Some(address) = &self.address {
            record.address.clone_from(address);
        }
    }
}

/// Partial section update. `None` leaves a field untouched.
///
/// Supplying `total_spots` resizes the section, which discards all live
/// occupancy state for it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_spots: Option<u32>,
}

impl SectionPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.level.is_none()
            && self.description.is_none()
            && self.total_spots.is_none()
    }

    /// Validate the supplied fields.
    pub fn validate(&self) -> Result<(), TypeError> {
        if let Some(name) = &self.name {
            validate_section_name(name)?;
        }
        if let Some(total) = self.total_spots {
            validate_capacity(total)?;
        }
        Ok(())
    }

    pub fn apply_to(&self, record: &mut SectionRecord) {
        if let Some(name) = &self.name {
            record.name.clone_from(name);
        }
        if let Some(level) = &self.level {
            record.level.clone_from(level);
        }
        if let Some(description) = &self.description {
            record.description.clone_from(description);
        }
        if let Some(total) = self.total_spots {
            record.total_spots = total;
        }
    }
}
