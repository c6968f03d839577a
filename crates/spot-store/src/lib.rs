//! Persistent store gateway for Spot.
//!
//! The garage registry keeps the live replica of the catalog in memory and
//! writes every catalog change through a [`GarageStore`] before applying it
//! locally. This crate defines that boundary and ships two backends.
//!
//! # Documents
//!
//! A store holds one document per garage. Each document embeds its section
//! documents in creation order. Spot occupancy is never persisted.
//!
//! # Storage Backends
//!
//! - [`InMemoryGarageStore`] -- `HashMap`-based store for tests and embedding,
//!   with failure and latency injection
//! - [`JsonFileStore`] -- all documents in one JSON file, replaced atomically
//!   on every write
//!
//! # Design Rules
//!
//! 1. Every call is atomic on its own; there are no multi-call transactions.
//! 2. A failed call leaves the stored documents unchanged.
//! 3. Fields omitted from a patch are never touched.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod documents;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use documents::Documents;
pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::InMemoryGarageStore;
pub use traits::GarageStore;
