//! Garage registry: the in-memory authority over garages, sections, and spots.
//!
//! [`GarageRegistry`] holds the live replica of the catalog behind a single
//! reader/writer lock. Reads share the lock. Every mutation takes it
//! exclusively, so catalog changes, occupancy batches, and the staleness sweep
//! are strictly serialized against each other.
//!
//! # Write-through
//!
//! Catalog mutations (garages and sections) call the [`GarageStore`] first,
//! inside the critical section and under a per-call deadline, and touch
//! memory only after the store reports success. A failed or timed-out store
//! call leaves memory exactly as it was.
//!
//! Occupancy (spot updates, disconnects, the sweep) is live telemetry and is
//! never persisted.
//!
//! # Modules
//!
//! - [`registry`]: catalog reads and write-through mutations
//! - [`occupancy`]: best-effort batch update/disconnect and the sweep
//! - [`sweeper`]: the cancellable background sweep task
//! - [`model`]: in-memory garage, section, and spot state
//!
//! [`GarageStore`]: spot_store::GarageStore

pub mod config;
pub mod error;
pub mod model;
pub mod occupancy;
pub mod registry;
pub mod sweeper;

pub use config::{RegistryConfig, SweeperConfig};
pub use error::{ErrorKind, InvalidPositions, RegistryError, RegistryResult};
pub use model::{Garage, Section, Spot};
pub use occupancy::{BatchSummary, SpotUpdate};
pub use registry::GarageRegistry;
pub use sweeper::StalenessSweeper;
