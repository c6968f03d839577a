use std::time::Duration;

/// Deadlines and thresholds for [`GarageRegistry`](crate::GarageRegistry).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Deadline for each catalog store call.
    pub store_timeout: Duration,
    /// Deadline for loading all garages at startup.
    pub load_timeout: Duration,
    /// An online spot with no update for longer than this is cleared by the
    /// sweep.
    pub stale_after: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(10),
            load_timeout: Duration::from_secs(10),
            stale_after: Duration::from_secs(20 * 60),
        }
    }
}

/// Schedule for the [`StalenessSweeper`](crate::StalenessSweeper).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SweeperConfig {
    /// Time between sweeps. The first sweep runs one period after start.
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30 * 60),
        }
    }
}
