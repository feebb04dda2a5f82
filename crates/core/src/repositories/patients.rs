//! Patient records.
//!
//! Patients are stored one per sharded directory:
//!
//! ```text
//! patients/
//!   <s1>/
//!     <s2>/
//!       <id>/
//!         patient.yaml
//!         somatometry/     # see `repositories::somatometry`
//! ```

use crate::constants::PATIENT_FILENAME;
use crate::repositories::shared::{create_record_dir, read_all_records, read_record, write_yaml};
use crate::repositories::somatometry::rows_for_birth_date;
use crate::{ClinicError, ClinicResult, CoreConfig, NonEmptyText, RecordId, Sex};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// A stored patient record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Patient {
    pub id: RecordId,
    pub given_names: NonEmptyText,
    pub family_name: NonEmptyText,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian_name: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<NonEmptyText>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied patient fields, used for both create and update.
///
/// Blank optional fields are stored as absent.
#[derive(Clone, Debug, PartialEq)]
pub struct PatientDetails {
    pub given_names: String,
    pub family_name: String,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    pub guardian_name: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

struct ValidatedDetails {
    given_names: NonEmptyText,
    family_name: NonEmptyText,
    birth_date: NaiveDate,
    sex: Sex,
    guardian_name: Option<NonEmptyText>,
    phone: Option<NonEmptyText>,
    notes: Option<NonEmptyText>,
}

impl PatientDetails {
    fn validate(self, today: NaiveDate) -> ClinicResult<ValidatedDetails> {
        let given_names = NonEmptyText::new(&self.given_names)
            .map_err(|_| ClinicError::InvalidInput("given_names is required".into()))?;
        let family_name = NonEmptyText::new(&self.family_name)
            .map_err(|_| ClinicError::InvalidInput("family_name is required".into()))?;

        if self.birth_date > today {
            return Err(ClinicError::InvalidInput(format!(
                "birth_date {} is in the future",
                self.birth_date
            )));
        }

        Ok(ValidatedDetails {
            given_names,
            family_name,
            birth_date: self.birth_date,
            sex: self.sex,
            guardian_name: NonEmptyText::optional(self.guardian_name),
            phone: NonEmptyText::optional(self.phone),
            notes: NonEmptyText::optional(self.notes),
        })
    }
}

/// Pure patient data operations - no API concerns
#[derive(Clone, Debug)]
pub struct PatientService {
    cfg: Arc<CoreConfig>,
}

impl PatientService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Directory holding everything stored for patient `id`.
    pub fn patient_dir(&self, id: &RecordId) -> PathBuf {
        id.sharded_dir(&self.cfg.patients_dir())
    }

    /// Creates a new patient record.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] if either name is blank or the birth date lies in
    /// the future, and a storage error if the record cannot be written.
    pub fn create(&self, details: PatientDetails) -> ClinicResult<Patient> {
        let now = Utc::now();
        let details = details.validate(now.date_naive())?;

        let (id, dir) = create_record_dir(&self.cfg.patients_dir(), RecordId::new)?;
        let patient = Patient {
            id,
            given_names: details.given_names,
            family_name: details.family_name,
            birth_date: details.birth_date,
            sex: details.sex,
            guardian_name: details.guardian_name,
            phone: details.phone,
            notes: details.notes,
            created_at: now,
            updated_at: now,
        };

        write_yaml(&dir.join(PATIENT_FILENAME), &patient)?;
        tracing::info!("created patient {}", patient.id);
        Ok(patient)
    }

    pub fn get(&self, id: &RecordId) -> ClinicResult<Patient> {
        read_record(&self.cfg.patients_dir(), id, PATIENT_FILENAME, "patient")
    }

    pub fn exists(&self, id: &RecordId) -> bool {
        self.patient_dir(id).join(PATIENT_FILENAME).is_file()
    }

    /// Lists all patients, ordered by family name then given names.
    ///
    /// Records that cannot be parsed are skipped with a warning.
    pub fn list(&self) -> Vec<Patient> {
        let mut patients: Vec<Patient> =
            read_all_records(&self.cfg.patients_dir(), PATIENT_FILENAME);
        patients.sort_by(|a, b| {
            a.family_name
                .as_str()
                .cmp(b.family_name.as_str())
                .then_with(|| a.given_names.as_str().cmp(b.given_names.as_str()))
                .then_with(|| a.id.cmp(&b.id))
        });
        patients
    }

    /// Replaces the editable fields of an existing patient, rewriting the record in place.
    ///
    /// A changed birth date re-derives `age_months` of the patient's somatometry rows.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] for invalid details, or when the new birth date
    /// falls after one of the patient's recorded measurements.
    pub fn update(&self, id: &RecordId, details: PatientDetails) -> ClinicResult<Patient> {
        let existing = self.get(id)?;
        let now = Utc::now();
        let details = details.validate(now.date_naive())?;

        let rederived = if details.birth_date != existing.birth_date {
            rows_for_birth_date(&self.patient_dir(id), details.birth_date, now)?
        } else {
            Vec::new()
        };

        let patient = Patient {
            id: existing.id,
            given_names: details.given_names,
            family_name: details.family_name,
            birth_date: details.birth_date,
            sex: details.sex,
            guardian_name: details.guardian_name,
            phone: details.phone,
            notes: details.notes,
            created_at: existing.created_at,
            updated_at: now,
        };

        write_yaml(&self.patient_dir(id).join(PATIENT_FILENAME), &patient)?;
        for (path, row) in &rederived {
            write_yaml(path, row)?;
        }
        if !rederived.is_empty() {
            tracing::info!(
                "birth date of patient {} changed; re-derived {} somatometry rows",
                patient.id,
                rederived.len()
            );
        }
        tracing::info!("updated patient {}", patient.id);
        Ok(patient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransitionTable;
    use growth::ReferenceTable;
    use tempfile::TempDir;

    fn test_cfg(temp_dir: &TempDir) -> Arc<CoreConfig> {
        Arc::new(
            CoreConfig::new(
                temp_dir.path().to_path_buf(),
                ReferenceTable::default(),
                TransitionTable::default(),
            )
            .expect("CoreConfig::new should succeed"),
        )
    }

    fn details(given: &str, family: &str) -> PatientDetails {
        PatientDetails {
            given_names: given.into(),
            family_name: family.into(),
            birth_date: NaiveDate::from_ymd_opt(2023, 5, 17).expect("valid date"),
            sex: Sex::Female,
            guardian_name: Some("  ".into()),
            phone: Some("555-0101".into()),
            notes: None,
        }
    }

    #[test]
    fn create_then_get_round_trips_through_storage() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = PatientService::new(test_cfg(&temp_dir));

        let created = service
            .create(details("Ana", "Lopez"))
            .expect("create should succeed");
        assert!(service.patient_dir(&created.id).join("patient.yaml").is_file());
        assert!(created.guardian_name.is_none(), "blank guardian is dropped");

        let loaded = service.get(&created.id).expect("get should succeed");
        assert_eq!(loaded, created);
        assert!(service.exists(&created.id));
    }

    #[test]
    fn create_rejects_blank_names_and_future_birth_dates() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = PatientService::new(test_cfg(&temp_dir));

        let err = service
            .create(details("  ", "Lopez"))
            .expect_err("blank given names");
        assert!(matches!(err, ClinicError::InvalidInput(_)));

        let mut future = details("Ana", "Lopez");
        future.birth_date = NaiveDate::from_ymd_opt(2999, 1, 1).expect("valid date");
        let err = service.create(future).expect_err("future birth date");
        assert!(matches!(err, ClinicError::InvalidInput(_)));

        assert!(service.list().is_empty());
    }

    #[test]
    fn list_is_sorted_by_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = PatientService::new(test_cfg(&temp_dir));

        service.create(details("Zoe", "Moreno")).expect("create");
        service.create(details("Luis", "Alvarez")).expect("create");
        service.create(details("Ana", "Moreno")).expect("create");

        let names: Vec<String> = service
            .list()
            .into_iter()
            .map(|p| format!("{} {}", p.given_names, p.family_name))
            .collect();
        assert_eq!(names, vec!["Luis Alvarez", "Ana Moreno", "Zoe Moreno"]);
    }

    #[test]
    fn update_rewrites_in_place_and_keeps_created_at() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = PatientService::new(test_cfg(&temp_dir));
        let created = service.create(details("Ana", "Lopez")).expect("create");

        let mut changed = details("Ana Maria", "Lopez");
        changed.notes = Some("penicillin allergy".into());
        let updated = service.update(&created.id, changed).expect("update");

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.given_names.as_str(), "Ana Maria");
        assert_eq!(service.get(&created.id).expect("get"), updated);
        assert_eq!(service.list().len(), 1);
    }

    #[test]
    fn get_unknown_patient_is_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = PatientService::new(test_cfg(&temp_dir));

        let err = service.get(&RecordId::new()).expect_err("missing");
        assert!(matches!(err, ClinicError::NotFound { kind: "patient", .. }));
        let err = service
            .update(&RecordId::new(), details("Ana", "Lopez"))
            .expect_err("missing");
        assert!(matches!(err, ClinicError::NotFound { .. }));
    }
}
