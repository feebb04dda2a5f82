//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services as an
//! `Arc<CoreConfig>`. Services never read environment variables during request handling, which
//! keeps behaviour consistent across threads and test harnesses.

use crate::constants::{APPOINTMENTS_DIR_NAME, PATIENTS_DIR_NAME};
use crate::status::TransitionTable;
use crate::{ClinicError, ClinicResult};
use growth::ReferenceTable;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    reference_table: Arc<ReferenceTable>,
    transitions: Arc<TransitionTable>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`, creating `data_dir` if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] for an empty path, or
    /// [`ClinicError::StorageDirCreation`] if the directory cannot be created.
    pub fn new(
        data_dir: PathBuf,
        reference_table: ReferenceTable,
        transitions: TransitionTable,
    ) -> ClinicResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(ClinicError::InvalidInput("data_dir cannot be empty".into()));
        }
        std::fs::create_dir_all(&data_dir).map_err(ClinicError::StorageDirCreation)?;

        if reference_table.is_empty() {
            tracing::warn!("growth reference table is empty; neutral ranges will be used");
        }

        Ok(Self {
            data_dir,
            reference_table: Arc::new(reference_table),
            transitions: Arc::new(transitions),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn patients_dir(&self) -> PathBuf {
        self.data_dir.join(PATIENTS_DIR_NAME)
    }

    pub fn appointments_dir(&self) -> PathBuf {
        self.data_dir.join(APPOINTMENTS_DIR_NAME)
    }

    pub fn reference_table(&self) -> &ReferenceTable {
        &self.reference_table
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the WHO reference table from an optional override path.
///
/// If `value` is `None` or blank, the bundled table is used.
pub fn reference_table_from_env_value(value: Option<String>) -> ClinicResult<ReferenceTable> {
    match non_blank(value) {
        Some(path) => {
            tracing::info!("loading growth reference table from {}", path);
            Ok(ReferenceTable::load(Path::new(&path))?)
        }
        None => Ok(ReferenceTable::bundled()?),
    }
}

/// Resolve the appointment transition table from an optional override path.
///
/// If `value` is `None` or blank, the compiled-in default table is used.
pub fn transition_table_from_env_value(value: Option<String>) -> ClinicResult<TransitionTable> {
    match non_blank(value) {
        Some(path) => {
            tracing::info!("loading appointment transition table from {}", path);
            TransitionTable::load(Path::new(&path))
        }
        None => Ok(TransitionTable::default()),
    }
}
