//! Somatometry (growth measurement) records.
//!
//! Rows belong to a patient and live inside that patient's directory, one file per row:
//!
//! ```text
//! patients/<s1>/<s2>/<patient-id>/somatometry/<record-id>.yaml
//! ```
//!
//! `bmi` and `age_months` are derived from the measurements and the patient's birth date on
//! every create and update; callers cannot supply them. Updates rewrite the row in place, and a
//! change to the patient's birth date re-derives `age_months` of every row.

use crate::constants::{SOMATOMETRY_DIR_NAME, SOMATOMETRY_EXTENSION};
use crate::repositories::patients::{Patient, PatientService};
use crate::repositories::shared::{read_yaml, write_yaml};
use crate::{ClinicError, ClinicResult, CoreConfig, NonEmptyText, RecordId, Sex};
use chrono::{DateTime, NaiveDate, Utc};
use growth::{
    age_in_months, bmi, chart_overlay, round_to, ChartOverlay, GrowthAssessment, Indicator,
    Measurement,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const WEIGHT_RANGE_KG: (f64, f64) = (0.2, 300.0);
const HEIGHT_RANGE_CM: (f64, f64) = (20.0, 250.0);
const HEAD_RANGE_CM: (f64, f64) = (15.0, 80.0);
const TEMPERATURE_RANGE_C: (f64, f64) = (25.0, 45.0);

/// A stored somatometry row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SomatometryRecord {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub measurement_date: NaiveDate,
    /// Kilograms.
    pub weight: f64,
    /// Centimetres.
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_circumference: Option<f64>,
    /// Degrees Celsius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub bmi: f64,
    pub age_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<NonEmptyText>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SomatometryRecord {
    pub fn measurement(&self) -> Measurement {
        Measurement {
            age_months: self.age_months,
            weight_kg: self.weight,
            height_cm: self.height,
            head_circumference_cm: self.head_circumference,
            temperature_c: self.temperature,
        }
    }
}

/// Measured values entered for a row.
#[derive(Clone, Debug, PartialEq)]
pub struct SomatometryInput {
    pub measurement_date: NaiveDate,
    pub weight: f64,
    pub height: f64,
    pub head_circumference: Option<f64>,
    pub temperature: Option<f64>,
    pub notes: Option<String>,
}

fn check_range(field: &str, value: f64, (min, max): (f64, f64)) -> ClinicResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(ClinicError::InvalidInput(format!(
            "{field} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

impl SomatometryInput {
    fn validate(&self, birth_date: NaiveDate, today: NaiveDate) -> ClinicResult<()> {
        check_range("weight", self.weight, WEIGHT_RANGE_KG)?;
        check_range("height", self.height, HEIGHT_RANGE_CM)?;
        if let Some(head) = self.head_circumference {
            check_range("head_circumference", head, HEAD_RANGE_CM)?;
        }
        if let Some(temperature) = self.temperature {
            check_range("temperature", temperature, TEMPERATURE_RANGE_C)?;
        }

        if self.measurement_date < birth_date {
            return Err(ClinicError::InvalidInput(format!(
                "measurement_date {} is before birth date {}",
                self.measurement_date, birth_date
            )));
        }
        if self.measurement_date > today {
            return Err(ClinicError::InvalidInput(format!(
                "measurement_date {} is in the future",
                self.measurement_date
            )));
        }
        Ok(())
    }
}

/// Growth summary for one patient: the latest assessment and chart data for every indicator.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatientGrowth {
    pub patient_id: RecordId,
    pub sex: Sex,
    pub latest: Option<SomatometryRecord>,
    pub assessment: Option<GrowthAssessment>,
    pub charts: Vec<ChartOverlay>,
}

/// Pure somatometry data operations - no API concerns
#[derive(Clone, Debug)]
pub struct SomatometryService {
    cfg: Arc<CoreConfig>,
    patients: PatientService,
}

impl SomatometryService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let patients = PatientService::new(cfg.clone());
        Self { cfg, patients }
    }

    fn records_dir(&self, patient_id: &RecordId) -> PathBuf {
        self.patients
            .patient_dir(patient_id)
            .join(SOMATOMETRY_DIR_NAME)
    }

    fn record_path(&self, patient_id: &RecordId, record_id: &RecordId) -> PathBuf {
        self.records_dir(patient_id)
            .join(format!("{record_id}.{SOMATOMETRY_EXTENSION}"))
    }

    /// Records a new row for `patient_id`, deriving `bmi` and `age_months`.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::NotFound`] if the patient does not exist,
    /// - [`ClinicError::InvalidInput`] for out-of-range values or a measurement date before the
    ///   patient's birth or after today.
    pub fn create(
        &self,
        patient_id: &RecordId,
        input: SomatometryInput,
    ) -> ClinicResult<SomatometryRecord> {
        let patient = self.patients.get(patient_id)?;
        let now = Utc::now();
        let record = derive_record(&patient, RecordId::new(), input, now, now)?;

        fs::create_dir_all(self.records_dir(patient_id)).map_err(ClinicError::RecordDirCreation)?;
        write_yaml(&self.record_path(patient_id, &record.id), &record)?;
        tracing::info!(
            "recorded somatometry {} for patient {}",
            record.id,
            patient_id
        );
        Ok(record)
    }

    pub fn get(&self, patient_id: &RecordId, record_id: &RecordId) -> ClinicResult<SomatometryRecord> {
        let path = self.record_path(patient_id, record_id);
        if !path.is_file() {
            return Err(ClinicError::NotFound {
                kind: "somatometry record",
                id: record_id.to_string(),
            });
        }
        read_yaml(&path)
    }

    /// Rewrites an existing row; derived fields are recomputed from the new values.
    pub fn update(
        &self,
        patient_id: &RecordId,
        record_id: &RecordId,
        input: SomatometryInput,
    ) -> ClinicResult<SomatometryRecord> {
        let patient = self.patients.get(patient_id)?;
        let existing = self.get(patient_id, record_id)?;
        let record = derive_record(
            &patient,
            existing.id,
            input,
            existing.created_at,
            Utc::now(),
        )?;

        write_yaml(&self.record_path(patient_id, record_id), &record)?;
        tracing::info!("updated somatometry {} for patient {}", record.id, patient_id);
        Ok(record)
    }

    /// Lists a patient's rows ordered by measurement date (oldest first).
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::NotFound`] if the patient does not exist.
    pub fn list(&self, patient_id: &RecordId) -> ClinicResult<Vec<SomatometryRecord>> {
        if !self.patients.exists(patient_id) {
            return Err(ClinicError::NotFound {
                kind: "patient",
                id: patient_id.to_string(),
            });
        }

        let mut records: Vec<SomatometryRecord> = read_rows(&self.records_dir(patient_id))
            .into_iter()
            .map(|(_, record)| record)
            .collect();

        records.sort_by(|a: &SomatometryRecord, b: &SomatometryRecord| {
            a.measurement_date
                .cmp(&b.measurement_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(records)
    }

    /// Assesses the most recent row and builds chart overlays from every row.
    pub fn growth(&self, patient_id: &RecordId) -> ClinicResult<PatientGrowth> {
        let patient = self.patients.get(patient_id)?;
        let records = self.list(patient_id)?;
        let table = self.cfg.reference_table();

        let latest = records.last().cloned();
        let assessment = latest
            .as_ref()
            .map(|record| GrowthAssessment::assess(table, patient.sex, &record.measurement()));

        let charts = Indicator::ALL
            .iter()
            .map(|&indicator| {
                let points = records.iter().filter_map(|record| {
                    record
                        .measurement()
                        .value(indicator)
                        .map(|value| (record.age_months, value))
                });
                chart_overlay(table, indicator, patient.sex, points)
            })
            .collect();

        Ok(PatientGrowth {
            patient_id: patient.id,
            sex: patient.sex,
            latest,
            assessment,
            charts,
        })
    }
}

/// Every parseable row in `records_dir`, paired with its file path.
fn read_rows(records_dir: &Path) -> Vec<(PathBuf, SomatometryRecord)> {
    let entries = match fs::read_dir(records_dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(SOMATOMETRY_EXTENSION)
        })
        .filter_map(|path| match read_yaml(&path) {
            Ok(record) => Some((path, record)),
            Err(e) => {
                tracing::warn!("failed to parse {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

/// Re-derives `age_months` of a patient's rows against a new birth date.
///
/// Nothing is written; the caller persists the returned rows once the patient record itself has
/// been saved.
///
/// # Errors
///
/// Returns [`ClinicError::InvalidInput`] if any row was measured before `birth_date`.
pub(crate) fn rows_for_birth_date(
    patient_dir: &Path,
    birth_date: NaiveDate,
    now: DateTime<Utc>,
) -> ClinicResult<Vec<(PathBuf, SomatometryRecord)>> {
    let rows = read_rows(&patient_dir.join(SOMATOMETRY_DIR_NAME));

    if let Some((_, row)) = rows.iter().find(|(_, row)| row.measurement_date < birth_date) {
        return Err(ClinicError::InvalidInput(format!(
            "birth date {birth_date} is after somatometry measurement {} on {}",
            row.id, row.measurement_date
        )));
    }

    Ok(rows
        .into_iter()
        .map(|(path, mut row)| {
            row.age_months = age_in_months(birth_date, row.measurement_date);
            row.updated_at = now;
            (path, row)
        })
        .collect())
}

fn derive_record(
    patient: &Patient,
    id: RecordId,
    input: SomatometryInput,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> ClinicResult<SomatometryRecord> {
    input.validate(patient.birth_date, now.date_naive())?;

    let bmi = bmi(input.weight, input.height)
        .map(|value| round_to(value, 2))
        .ok_or_else(|| ClinicError::InvalidInput("height must be positive".into()))?;

    Ok(SomatometryRecord {
        id,
        patient_id: patient.id.clone(),
        measurement_date: input.measurement_date,
        weight: input.weight,
        height: input.height,
        head_circumference: input.head_circumference,
        temperature: input.temperature,
        bmi,
        age_months: age_in_months(patient.birth_date, input.measurement_date),
        notes: NonEmptyText::optional(input.notes),
        created_at,
        updated_at: now,
    })
}
