use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Geolocation;
use crate::identity::GarageId;

/// Summary of a garage as returned to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GarageView {
    pub id: GarageId,
    pub name: String,
    pub city: String,
    pub address: String,
    pub geolocation: Geolocation,
    /// Free spots summed across all sections.
    pub free_spots: u32,
}

/// Summary of a section as returned to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionView {
    pub name: String,
    pub level: String,
    pub description: String,
    pub total_spots: u32,
    pub free_spots: u32,
}

/// Live state of one spot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotView {
    /// 1-based position within the section.
    pub number: u32,
    pub label: String,
    pub online: bool,
    pub taken: bool,
    pub last_update: Option<DateTime<Utc>>,
}

impl SpotView {
    /// Returns `true` if the spot counts towards free spots.
    pub fn is_free(&self) -> bool {
        self.online && !self.taken
    }
}
