//! Foundation types for Spot.
//!
//! This crate provides the identifier, document, and projection types shared
//! by the store backends, the garage registry, and the HTTP transport. Every
//! other Spot crate depends on `spot-types`.
//!
//! # Key Types
//!
//! - [`GarageId`]: Short random hexadecimal garage identifier
//! - [`GarageRecord`] / [`SectionRecord`]: Persisted catalog documents
//! - [`GaragePatch`] / [`SectionPatch`]: Partial updates with explicit omission
//! - [`GarageView`] / [`SectionView`] / [`SpotView`]: Read projections

pub mod catalog;
pub mod error;
pub mod identity;
pub mod view;

pub use catalog::{
    validate_capacity, validate_section_name, Geolocation, GaragePatch, GarageRecord, NewGarage, SectionPatch,
    SectionRecord, MAX_TOTAL_SPOTS, SECTION_NAME_PATTERN,
};
pub use error::TypeError;
pub use identity::{GarageId, GARAGE_ID_LEN};
pub use view::{GarageView, SectionView, SpotView};
