//! # Clinic Core
//!
//! Core business logic for the clinic records service.
//!
//! This crate contains pure data operations and file/folder management:
//! - The appointment status table and transition rules
//! - Patient, appointment and somatometry records in sharded YAML storage
//! - Growth assessments built on the `growth` crate
//!
//! **No API concerns**: authentication, HTTP servers, or wire formats belong in `api-rest` or
//! `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod repositories;
pub mod status;

pub use config::{reference_table_from_env_value, transition_table_from_env_value, CoreConfig};
pub use error::{ClinicError, ClinicResult};
pub use repositories::appointments::{
    Appointment, AppointmentService, AppointmentUpdate, NewAppointment, StatusChange,
};
pub use repositories::patients::{Patient, PatientDetails, PatientService};
pub use repositories::somatometry::{
    PatientGrowth, SomatometryInput, SomatometryRecord, SomatometryService,
};
pub use status::{
    ids, is_terminal_status, AppointmentActions, AppointmentStatus, TransitionRequest,
    TransitionTable, STATUSES, TERMINAL_STATUS_IDS,
};

pub use clinic_types::{NonEmptyText, Sex, TextError};
pub use clinic_uuid::RecordId;
pub use growth;
