use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::TypeError;

/// Number of hex characters in a [`GarageId`].
pub const GARAGE_ID_LEN: usize = 8;

/// Opaque garage identifier.
///
/// Eight lowercase hex characters drawn from four bytes of randomness. Ids
/// are assigned by the registry and never supplied by clients; the HTTP
/// routes only match strings of this shape.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GarageId(String);

impl GarageId {
    /// Draw a fresh random identifier.
    ///
    /// A failing randomness source fails this attempt; no fallback id is
    /// ever produced.
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self, TypeError> {
        let mut bytes = [0u8; GARAGE_ID_LEN / 2];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| TypeError::Randomness(e.to_string()))?;
        Ok(Self(hex::encode(bytes)))
    }

    /// Draw identifiers until one is not `taken`.
    ///
    /// Collisions are logged and resampled. The caller must hold whatever
    /// lock makes `taken` authoritative for the duration of the call.
    pub fn generate_unique<R, F>(rng: &mut R, mut taken: F) -> Result<Self, TypeError>
    where
        R: RngCore + ?Sized,
        F: FnMut(&GarageId) -> bool,
    {
        loop {
            let id = Self::random(rng)?;
            if !taken(&id) {
                return Ok(id);
            }
            info!(garage_id = %id, "garage id collision prevented");
        }
    }

    /// Parse and validate an identifier string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.len() != GARAGE_ID_LEN {
            return Err(TypeError::InvalidGarageId {
                value: s.to_string(),
                reason: format!("expected {GARAGE_ID_LEN} characters, got {}", s.len()),
            });
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(TypeError::InvalidGarageId {
                value: s.to_string(),
                reason: "expected lowercase hex".into(),
            });
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for GarageId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for GarageId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<GarageId> for String {
    fn from(id: GarageId) -> Self {
        id.0
    }
}

impl fmt::Debug for GarageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GarageId({})", self.0)
    }
}

impl fmt::Display for GarageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
