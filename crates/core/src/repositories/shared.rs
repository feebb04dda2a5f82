//! Shared repository utilities.
//!
//! Every record kind is stored as a YAML file inside its own sharded directory:
//!
//! ```text
//! <base_dir>/<s1>/<s2>/<record-id>/<filename>.yaml
//! ```
//!
//! This module holds the pieces the record services share: allocating a fresh sharded
//! directory, reading and writing YAML records, and walking a sharded tree.

use crate::{ClinicError, ClinicResult, RecordId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

/// Creates a unique sharded directory within `base_dir`.
///
/// Identifiers come from `id_source`. Collisions (or directories left by external
/// interference) are retried up to 5 times with a new identifier.
///
/// # Errors
///
/// Returns [`ClinicError::RecordDirCreation`] if a parent directory cannot be created or no
/// unique directory could be allocated after 5 attempts.
pub(crate) fn create_record_dir(
    base_dir: &Path,
    mut id_source: impl FnMut() -> RecordId,
) -> ClinicResult<(RecordId, PathBuf)> {
    for _attempt in 0..5 {
        let id = id_source();
        let candidate = id.sharded_dir(base_dir);

        if candidate.exists() {
            continue;
        }

        if let Some(parent) = candidate.parent() {
            fs::create_dir_all(parent).map_err(ClinicError::RecordDirCreation)?;
        }

        match fs::create_dir(&candidate) {
            Ok(()) => return Ok((id, candidate)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(ClinicError::RecordDirCreation(e)),
        }
    }

    Err(ClinicError::RecordDirCreation(io::Error::new(
        ErrorKind::AlreadyExists,
        "failed to allocate a unique record directory after 5 attempts",
    )))
}

/// Serialises `value` to YAML and writes it to `path`, replacing any existing file.
pub(crate) fn write_yaml<T: Serialize>(path: &Path, value: &T) -> ClinicResult<()> {
    let yaml = serde_yaml::to_string(value).map_err(ClinicError::YamlSerialization)?;
    fs::write(path, yaml).map_err(ClinicError::FileWrite)
}

/// Reads and deserialises a YAML record.
pub(crate) fn read_yaml<T: DeserializeOwned>(path: &Path) -> ClinicResult<T> {
    let contents = fs::read_to_string(path).map_err(ClinicError::FileRead)?;
    serde_yaml::from_str(&contents).map_err(ClinicError::YamlDeserialization)
}

/// Reads the record `filename` inside the sharded directory of `id`.
///
/// # Errors
///
/// Returns [`ClinicError::NotFound`] (labelled with `kind`) when the file does not exist.
pub(crate) fn read_record<T: DeserializeOwned>(
    base_dir: &Path,
    id: &RecordId,
    filename: &str,
    kind: &'static str,
) -> ClinicResult<T> {
    let path = id.sharded_dir(base_dir).join(filename);
    if !path.is_file() {
        return Err(ClinicError::NotFound {
            kind,
            id: id.to_string(),
        });
    }
    read_yaml(&path)
}

/// Collects `<base_dir>/<s1>/<s2>/<id>/<filename>` paths that exist.
///
/// Unreadable directories are skipped; a missing `base_dir` yields an empty list.
pub(crate) fn sharded_record_files(base_dir: &Path, filename: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let s1_iter = match fs::read_dir(base_dir) {
        Ok(it) => it,
        Err(_) => return files,
    };
    for s1 in s1_iter.flatten() {
        let s1_path = s1.path();
        if !s1_path.is_dir() {
            continue;
        }

        let s2_iter = match fs::read_dir(&s1_path) {
            Ok(it) => it,
            Err(_) => continue,
        };

        for s2 in s2_iter.flatten() {
            let s2_path = s2.path();
            if !s2_path.is_dir() {
                continue;
            }

            let id_iter = match fs::read_dir(&s2_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for id_ent in id_iter.flatten() {
                let record_path = id_ent.path().join(filename);
                if record_path.is_file() {
                    files.push(record_path);
                }
            }
        }
    }

    files
}

/// Reads every record file in a sharded tree, logging and skipping unparseable ones.
pub(crate) fn read_all_records<T: DeserializeOwned>(base_dir: &Path, filename: &str) -> Vec<T> {
    sharded_record_files(base_dir, filename)
        .into_iter()
        .filter_map(|path| match read_yaml(&path) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("failed to parse {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}
