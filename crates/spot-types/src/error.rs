use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid garage id {value:?}: {reason}")]
    InvalidGarageId { value: String, reason: String },

    #[error("section name {0:?} in wrong format, use pattern: {pattern}", pattern = crate::SECTION_NAME_PATTERN)]
    InvalidSectionName(String),

    #[error(
        "illegal value for total number of spots: {0}, must be between 1 and {max}",
        max = crate::MAX_TOTAL_SPOTS
    )]
    InvalidCapacity(u32),

    #[error("randomness source failed: {0}")]
    Randomness(String),
}
