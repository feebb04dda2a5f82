//! Record management modules.
//!
//! Services for the three record kinds the clinic keeps: patients, appointments and the
//! somatometry rows that hang off each patient.

pub mod appointments;
pub mod patients;
pub(crate) mod shared;
pub mod somatometry;
