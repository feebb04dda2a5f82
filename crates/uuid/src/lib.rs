//! Record identifiers and sharded-path utilities.
//!
//! Every stored record (patient, appointment, somatometry row) is identified by a UUID in a
//! *canonical* form: **32 lowercase hexadecimal characters** with no hyphens, e.g.
//! `550e8400e29b41d4a716446655440000`. This is the value `Uuid::new_v4().simple().to_string()`
//! produces.
//!
//! Externally supplied identifiers (path parameters, CLI arguments) must already be canonical;
//! [`RecordId::parse`] rejects uppercase, hyphenated or malformed values rather than normalising
//! them, so that one record can never be addressed through two spellings.
//!
//! ## Sharded directory layout
//! For a canonical id `u`, records live under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `clinic_data/patients/55/0e/550e8400e29b41d4a716446655440000/`

mod service;

pub use service::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;

#[cfg(feature = "serde")]
impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordId::parse(&s).map_err(serde::de::Error::custom)
    }
}
