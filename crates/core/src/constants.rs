//! Constants used throughout the clinic core crate.
//!
//! Path and filename constants live here so that every repository derives storage locations the
//! same way.

/// Default directory for record storage when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "clinic_data";

/// Directory name for patient records.
pub const PATIENTS_DIR_NAME: &str = "patients";

/// Directory name for appointment records.
pub const APPOINTMENTS_DIR_NAME: &str = "appointments";

/// Directory name, inside a patient directory, holding somatometry records.
pub const SOMATOMETRY_DIR_NAME: &str = "somatometry";

/// Filename for a patient record.
pub const PATIENT_FILENAME: &str = "patient.yaml";

/// Filename for an appointment record.
pub const APPOINTMENT_FILENAME: &str = "appointment.yaml";

/// Extension for somatometry record files (`<record-id>.yaml`).
pub const SOMATOMETRY_EXTENSION: &str = "yaml";
