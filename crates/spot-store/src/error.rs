use spot_types::GarageId;

/// Errors from garage store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document exists for the garage.
    #[error("garage document not found: {0}")]
    GarageNotFound(GarageId),

    /// The garage document has no section with this name.
    #[error("section {section:?} not found in garage document {garage_id}")]
    SectionNotFound { garage_id: GarageId, section: String },

    /// A document with this id is already stored.
    #[error("garage document already exists: {0}")]
    DuplicateGarage(GarageId),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend refused the call.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
