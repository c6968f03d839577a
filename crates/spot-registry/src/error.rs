use std::fmt;
use std::time::Duration;

use spot_store::StoreError;
use spot_types::{GarageId, TypeError};
use thiserror::Error;

/// Coarse classification of a [`RegistryError`] for the transport layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The garage or section does not exist.
    NotFound,
    /// Caller input was rejected; retrying the same input fails again.
    Validation,
    /// The request clashes with existing state.
    Conflict,
    /// The store failed or timed out.
    Store,
    /// No identifier could be generated.
    Generation,
}

/// Errors produced by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("garage {0} not found")]
    GarageNotFound(GarageId),

    #[error("section {section:?} not found in garage {garage_id}")]
    SectionNotFound { garage_id: GarageId, section: String },

    #[error("section {section:?} already exists in garage {garage_id}")]
    SectionExists { garage_id: GarageId, section: String },

    #[error("invalid input: {0}")]
    Invalid(TypeError),

    #[error("{0}")]
    InvalidPositions(InvalidPositions),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("store call {op} timed out after {after:?}")]
    StoreTimeout { op: &'static str, after: Duration },

    #[error("failed to obtain a garage id: {0}")]
    IdGeneration(TypeError),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::GarageNotFound(_) | Self::SectionNotFound { .. } => ErrorKind::NotFound,
            Self::SectionExists { .. } => ErrorKind::Conflict,
            Self::Invalid(_) | Self::InvalidPositions(_) => ErrorKind::Validation,
            Self::Store(_) | Self::StoreTimeout { .. } => ErrorKind::Store,
            Self::IdGeneration(_) => ErrorKind::Generation,
        }
    }
}

impl From<TypeError> for RegistryError {
    fn from(e: TypeError) -> Self {
        match e {
            TypeError::Randomness(_) => Self::IdGeneration(e),
            _ => Self::Invalid(e),
        }
    }
}

/// Every out-of-range entry of one occupancy batch.
///
/// The valid entries of the same batch were applied; `applied` counts them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidPositions {
    pub garage_id: GarageId,
    pub garage_name: String,
    pub section: String,
    pub total_spots: u32,
    /// Rejected positions in input order.
    pub positions: Vec<i64>,
    pub applied: usize,
}

impl fmt::Display for InvalidPositions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, position) in self.positions.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(
                f,
                "{position} is not a valid spot number for section '{}', garage '{}' (garage id {})",
                self.section, self.garage_name, self.garage_id
            )?;
        }
        Ok(())
    }
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
