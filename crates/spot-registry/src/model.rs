//! Live in-memory state owned by the registry.
//!
//! These types are only ever mutated under the registry's exclusive lock.
//! Each [`Section`] keeps a running free-spot counter that every mutation
//! adjusts to match the online/taken transition it performs.

use chrono::{DateTime, Utc};
use spot_types::{
    GarageId, GaragePatch, GarageRecord, GarageView, Geolocation, NewGarage, SectionPatch,
    SectionRecord, SectionView, SpotView, TypeError,
};

/// One parking spot, addressed by its position in the section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Spot {
    pub label: String,
    /// A sensor reported since the spot was last cleared.
    pub online: bool,
    pub taken: bool,
    pub last_update: Option<DateTime<Utc>>,
}

impl Spot {
    /// Counts towards the section's free spots.
    pub fn is_free(&self) -> bool {
        self.online && !self.taken
    }

    /// Back to the never-reported state.
    pub fn clear(&mut self) {
        *self = Spot::default();
    }

    pub fn view(&self, number: u32) -> SpotView {
        SpotView {
            number,
            label: self.label.clone(),
            online: self.online,
            taken: self.taken,
            last_update: self.last_update,
        }
    }
}

/// A garage section with its spot array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    record: SectionRecord,
    free_spots: u32,
    spots: Vec<Spot>,
}

impl Section {
    /// Allocate a section with every spot offline. The record must already
    /// have passed [`SectionRecord::validate`].
    pub fn from_record(record: SectionRecord) -> Self {
        let spots = vec![Spot::default(); record.total_spots as usize];
        Self {
            record,
            free_spots: 0,
            spots,
        }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn record(&self) -> &SectionRecord {
        &self.record
    }

    pub fn total_spots(&self) -> u32 {
        self.record.total_spots
    }

    pub fn free_spots(&self) -> u32 {
        self.free_spots
    }

    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    /// Spot at a 1-based position.
    pub fn spot(&self, number: u32) -> Option<&Spot> {
        self.index_of(i64::from(number)).map(|i| &self.spots[i])
    }

    /// Array index for a 1-based position, if it is in range.
    pub fn index_of(&self, number: i64) -> Option<usize> {
        if number >= 1 && number <= i64::from(self.total_spots()) {
            Some((number - 1) as usize)
        } else {
            None
        }
    }

    /// Record a sensor report for the spot at `index`.
    ///
    /// The spot becomes online with the reported occupancy. A non-empty
    /// label replaces the current one.
    pub fn report(&mut self, index: usize, label: &str, taken: bool, now: DateTime<Utc>) {
        let spot = &mut self.spots[index];
        let was_free = spot.is_free();

        if !label.is_empty() {
            spot.label = label.to_string();
        }
        spot.online = true;
        spot.taken = taken;
        spot.last_update = Some(now);

        match (was_free, spot.is_free()) {
            (false, true) => self.free_spots += 1,
            (true, false) => self.free_spots -= 1,
            _ => {}
        }
    }

    /// Take the spot at `index` offline. Returns `false` if it already was.
    pub fn disconnect(&mut self, index: usize) -> bool {
        let spot = &mut self.spots[index];
        if !spot.online {
            return false;
        }
        if spot.is_free() {
            self.free_spots -= 1;
        }
        spot.clear();
        true
    }

    /// Apply a catalog patch. A new capacity reallocates every spot offline
    /// and zeroes the free counter.
    pub fn apply(&mut self, patch: &SectionPatch) {
        patch.apply_to(&mut self.record);
        if patch.total_spots.is_some() {
            self.spots = vec![Spot::default(); self.record.total_spots as usize];
            self.free_spots = 0;
        }
    }

    /// Free spots recomputed from the spot array.
    pub fn counted_free(&self) -> u32 {
        self.spots.iter().filter(|s| s.is_free()).count() as u32
    }

    pub fn view(&self) -> SectionView {
        SectionView {
            name: self.record.name.clone(),
            level: self.record.level.clone(),
            description: self.record.description.clone(),
            total_spots: self.record.total_spots,
            free_spots: self.free_spots,
        }
    }

    pub fn spot_views(&self) -> Vec<SpotView> {
        self.spots
            .iter()
            .zip(1u32..)
            .map(|(spot, number)| spot.view(number))
            .collect()
    }
}

/// A garage and its ordered sections.
#[derive(Clone, Debug, PartialEq)]
pub struct Garage {
    pub id: GarageId,
    pub name: String,
    pub city: String,
    pub address: String,
    geolocation: Geolocation,
    pub sections: Vec<Section>,
}

impl Garage {
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

    /// Rehydrate from a stored document; every spot starts offline.
    ///
    /// Sections are validated again first, so a document edited out of band
    /// cannot force an oversized spot allocation.
    pub fn from_record(record: GarageRecord) -> Result<Self, TypeError> {
        for section in &record.sections {
            section.validate()?;
        }
        Ok(Self {
            id: record.id,
            name: record.name,
            city: record.city,
            address: record.address,
            geolocation: record.geolocation,
            sections: record.sections.into_iter().map(Section::from_record).collect(),
        })
    }

    /// The document this garage persists as.
    pub fn to_record(&self) -> GarageRecord {
        GarageRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            city: self.city.clone(),
            address: self.address.clone(),
            geolocation: self.geolocation,
            sections: self.sections.iter().map(|s| s.record().clone()).collect(),
        }
    }

    /// Fixed at creation.
    pub fn geolocation(&self) -> Geolocation {
        self.geolocation
    }

    /// Position of a section by exact name.
    pub fn section_index(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name() == name)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name() == name)
    }

    pub fn free_spots(&self) -> u32 {
        self.sections.iter().map(Section::free_spots).sum()
    }

    pub fn apply(&mut self, patch: &GaragePatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(city) = &patch.city {
            self.city.clone_from(city);
        }
        if let Some(address) = &patch.address {
            self.address.clone_from(address);
        }
    }

    pub fn view(&self) -> GarageView {
        GarageView {
            id: self.id.clone(),
            name: self.name.clone(),
            city: self.city.clone(),
            address: self.address.clone(),
            geolocation: self.geolocation,
            free_spots: self.free_spots(),
        }
    }
}
