//! Appointment records and status changes.
//!
//! Appointments are stored one per sharded directory under `appointments/`. Every status change
//! is validated against the configured [`TransitionTable`](crate::TransitionTable), appended to
//! the record's history and written back before the updated appointment is returned; callers only
//! ever see state that has reached storage.

use crate::constants::APPOINTMENT_FILENAME;
use crate::repositories::patients::PatientService;
use crate::repositories::shared::{create_record_dir, read_all_records, read_record, write_yaml};
use crate::status::{ids, is_terminal_status, AppointmentActions, AppointmentStatus};
use crate::{ClinicError, ClinicResult, CoreConfig, NonEmptyText, RecordId, TransitionRequest};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Longest appointment slot accepted, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 8 * 60;

/// One entry in an appointment's status history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusChange {
    pub from: u8,
    pub to: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<NonEmptyText>,
    pub changed_at: DateTime<Utc>,
}

/// A stored appointment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Appointment {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub reason: NonEmptyText,
    pub status_id: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<NonEmptyText>,
    #[serde(default)]
    pub status_history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// An appointment is past once its start time has gone by.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_at < now
    }

    pub fn is_terminal(&self) -> bool {
        is_terminal_status(self.status_id)
    }

    pub fn status(&self) -> Option<&'static AppointmentStatus> {
        AppointmentStatus::from_id(self.status_id)
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.scheduled_at + Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Fields supplied when booking an appointment.
#[derive(Clone, Debug, PartialEq)]
pub struct NewAppointment {
    pub patient_id: RecordId,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub reason: String,
    pub notes: Option<String>,
}

/// Editable fields of an existing appointment. Status is changed separately.
#[derive(Clone, Debug, PartialEq)]
pub struct AppointmentUpdate {
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub reason: String,
    pub notes: Option<String>,
}

fn validate_slot(
    scheduled_at: DateTime<Utc>,
    duration_minutes: u32,
    reason: &str,
    now: DateTime<Utc>,
) -> ClinicResult<NonEmptyText> {
    if duration_minutes == 0 || duration_minutes > MAX_DURATION_MINUTES {
        return Err(ClinicError::InvalidInput(format!(
            "duration_minutes must be between 1 and {MAX_DURATION_MINUTES}, got {duration_minutes}"
        )));
    }
    if scheduled_at < now {
        return Err(ClinicError::InvalidInput(
            "scheduled_at must not be in the past".into(),
        ));
    }
    NonEmptyText::new(reason).map_err(|_| ClinicError::InvalidInput("reason is required".into()))
}

/// Pure appointment data operations - no API concerns
#[derive(Clone, Debug)]
pub struct AppointmentService {
    cfg: Arc<CoreConfig>,
}

impl AppointmentService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Books a new appointment in the `Scheduled` status.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::NotFound`] if the patient does not exist,
    /// - [`ClinicError::InvalidInput`] for a blank reason, an out-of-range duration or a start
    ///   time before `now`.
    pub fn create(&self, new: NewAppointment, now: DateTime<Utc>) -> ClinicResult<Appointment> {
        if !PatientService::new(self.cfg.clone()).exists(&new.patient_id) {
            return Err(ClinicError::NotFound {
                kind: "patient",
                id: new.patient_id.to_string(),
            });
        }
        let reason = validate_slot(new.scheduled_at, new.duration_minutes, &new.reason, now)?;

        let (id, dir) = create_record_dir(&self.cfg.appointments_dir(), RecordId::new)?;
        let appointment = Appointment {
            id,
            patient_id: new.patient_id,
            scheduled_at: new.scheduled_at,
            duration_minutes: new.duration_minutes,
            reason,
            status_id: ids::SCHEDULED,
            notes: NonEmptyText::optional(new.notes),
            status_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        write_yaml(&dir.join(APPOINTMENT_FILENAME), &appointment)?;
        tracing::info!(
            "created appointment {} for patient {}",
            appointment.id,
            appointment.patient_id
        );
        Ok(appointment)
    }

    pub fn get(&self, id: &RecordId) -> ClinicResult<Appointment> {
        read_record(
            &self.cfg.appointments_dir(),
            id,
            APPOINTMENT_FILENAME,
            "appointment",
        )
    }

    /// Lists appointments in start-time order, optionally only those of one patient.
    pub fn list(&self, patient_id: Option<&RecordId>) -> Vec<Appointment> {
        let mut appointments: Vec<Appointment> =
            read_all_records(&self.cfg.appointments_dir(), APPOINTMENT_FILENAME);
        if let Some(patient_id) = patient_id {
            appointments.retain(|a| &a.patient_id == patient_id);
        }
        appointments.sort_by(|a, b| {
            a.scheduled_at
                .cmp(&b.scheduled_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        appointments
    }

    /// The actions currently offered for `appointment`.
    pub fn actions(&self, appointment: &Appointment, now: DateTime<Utc>) -> AppointmentActions {
        AppointmentActions::resolve(
            appointment.status_id,
            appointment.is_past(now),
            self.cfg.transitions(),
        )
    }

    /// Edits time, duration, reason and notes.
    ///
    /// # Errors
    ///
    /// [`ClinicError::TerminalStatus`] or [`ClinicError::AppointmentInPast`] when editing is no
    /// longer offered, plus the validation errors of [`create`](Self::create).
    pub fn update(
        &self,
        id: &RecordId,
        update: AppointmentUpdate,
        now: DateTime<Utc>,
    ) -> ClinicResult<Appointment> {
        let mut appointment = self.get(id)?;
        ensure_editable(&appointment, now)?;

        let reason = validate_slot(
            update.scheduled_at,
            update.duration_minutes,
            &update.reason,
            now,
        )?;
        appointment.scheduled_at = update.scheduled_at;
        appointment.duration_minutes = update.duration_minutes;
        appointment.reason = reason;
        appointment.notes = NonEmptyText::optional(update.notes);
        appointment.updated_at = now;

        self.persist(&appointment)?;
        tracing::info!("updated appointment {}", appointment.id);
        Ok(appointment)
    }

    /// Moves an appointment to status `to`.
    ///
    /// The request is checked against the stored status (not a caller-supplied one) and the
    /// configured transition table. Nothing is written when validation fails.
    ///
    /// # Errors
    ///
    /// See [`TransitionRequest::validate`].
    pub fn change_status(
        &self,
        id: &RecordId,
        to: u8,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> ClinicResult<Appointment> {
        let appointment = self.get(id)?;
        let request = TransitionRequest::new(appointment.status_id, to, notes);
        request.validate(self.cfg.transitions())?;

        self.apply(appointment, request, now)
    }

    /// Cancels an appointment on the patient's behalf.
    ///
    /// Cancellation is offered from any non-terminal status that is not yet past, regardless of
    /// the transition table, and always requires notes.
    pub fn cancel(
        &self,
        id: &RecordId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> ClinicResult<Appointment> {
        let appointment = self.get(id)?;
        ensure_editable(&appointment, now)?;

        let request =
            TransitionRequest::new(appointment.status_id, ids::CANCELLED_BY_PATIENT, notes);
        if request.notes.is_none() {
            return Err(ClinicError::NotesRequired(ids::CANCELLED_BY_PATIENT));
        }

        self.apply(appointment, request, now)
    }

    fn apply(
        &self,
        mut appointment: Appointment,
        request: TransitionRequest,
        now: DateTime<Utc>,
    ) -> ClinicResult<Appointment> {
        appointment.status_id = request.to;
        appointment.status_history.push(StatusChange {
            from: request.from,
            to: request.to,
            notes: request.notes,
            changed_at: now,
        });
        appointment.updated_at = now;

        self.persist(&appointment)?;
        tracing::info!(
            "appointment {} moved from status {} to {}",
            appointment.id,
            request.from,
            request.to
        );
        Ok(appointment)
    }

    fn persist(&self, appointment: &Appointment) -> ClinicResult<()> {
        let path = appointment
            .id
            .sharded_dir(&self.cfg.appointments_dir())
            .join(APPOINTMENT_FILENAME);
        write_yaml(&path, appointment)
    }
}

fn ensure_editable(appointment: &Appointment, now: DateTime<Utc>) -> ClinicResult<()> {
    if appointment.is_terminal() {
        return Err(ClinicError::TerminalStatus(appointment.status_id));
    }
    if appointment.is_past(now) {
        return Err(ClinicError::AppointmentInPast);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::patients::PatientDetails;
    use crate::{Sex, TransitionTable};
    use chrono::{NaiveDate, TimeZone};
    use growth::ReferenceTable;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        service: AppointmentService,
        patient_id: RecordId,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = Arc::new(
            CoreConfig::new(
                temp_dir.path().to_path_buf(),
                ReferenceTable::default(),
                TransitionTable::default(),
            )
            .expect("CoreConfig::new should succeed"),
        );
        let patient = PatientService::new(cfg.clone())
            .create(PatientDetails {
                given_names: "Mateo".into(),
                family_name: "Rivas".into(),
                birth_date: NaiveDate::from_ymd_opt(2022, 2, 10).expect("valid date"),
                sex: Sex::Male,
                guardian_name: Some("Lucia Rivas".into()),
                phone: None,
                notes: None,
            })
            .expect("patient create");

        Fixture {
            _temp_dir: temp_dir,
            service: AppointmentService::new(cfg),
            patient_id: patient.id,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn book(f: &Fixture, day: u32) -> Appointment {
        f.service
            .create(
                NewAppointment {
                    patient_id: f.patient_id.clone(),
                    scheduled_at: at(day, 10),
                    duration_minutes: 30,
                    reason: "Well-child visit".into(),
                    notes: None,
                },
                at(1, 8),
            )
            .expect("create should succeed")
    }

    #[test]
    fn new_appointments_start_scheduled() {
        let f = fixture();
        let appt = book(&f, 10);

        assert_eq!(appt.status_id, ids::SCHEDULED);
        assert!(appt.status_history.is_empty());
        assert_eq!(f.service.get(&appt.id).expect("get"), appt);
        assert_eq!(appt.ends_at(), at(10, 10) + Duration::minutes(30));
    }

    #[test]
    fn create_requires_an_existing_patient() {
        let f = fixture();
        let err = f
            .service
            .create(
                NewAppointment {
                    patient_id: RecordId::new(),
                    scheduled_at: at(10, 10),
                    duration_minutes: 30,
                    reason: "Check-up".into(),
                    notes: None,
                },
                at(1, 8),
            )
            .expect_err("unknown patient");
        assert!(matches!(err, ClinicError::NotFound { kind: "patient", .. }));
    }

    #[test]
    fn create_validates_slot() {
        let f = fixture();
        let mut new = NewAppointment {
            patient_id: f.patient_id.clone(),
            scheduled_at: at(10, 10),
            duration_minutes: 0,
            reason: "Check-up".into(),
            notes: None,
        };
        assert!(matches!(
            f.service.create(new.clone(), at(1, 8)),
            Err(ClinicError::InvalidInput(_))
        ));

        new.duration_minutes = 20;
        new.reason = "   ".into();
        assert!(matches!(
            f.service.create(new.clone(), at(1, 8)),
            Err(ClinicError::InvalidInput(_))
        ));

        new.reason = "Check-up".into();
        assert!(matches!(
            f.service.create(new, at(11, 8)),
            Err(ClinicError::InvalidInput(_))
        ));
    }

    #[test]
    fn change_status_persists_history() {
        let f = fixture();
        let appt = book(&f, 10);

        let confirmed = f
            .service
            .change_status(&appt.id, ids::CONFIRMED, None, at(2, 9))
            .expect("0 -> 1 is allowed");
        assert_eq!(confirmed.status_id, ids::CONFIRMED);
        assert_eq!(
            confirmed.status_history,
            vec![StatusChange {
                from: ids::SCHEDULED,
                to: ids::CONFIRMED,
                notes: None,
                changed_at: at(2, 9),
            }]
        );
        assert_eq!(f.service.get(&appt.id).expect("get"), confirmed);
    }

    #[test]
    fn terminal_target_without_notes_leaves_record_unchanged() {
        let f = fixture();
        let appt = book(&f, 10);

        let err = f
            .service
            .change_status(&appt.id, ids::CANCELLED_BY_CLINIC, Some("  ".into()), at(2, 9))
            .expect_err("notes required");
        assert!(matches!(err, ClinicError::NotesRequired(15)));
        assert_eq!(f.service.get(&appt.id).expect("get"), appt);

        let cancelled = f
            .service
            .change_status(
                &appt.id,
                ids::CANCELLED_BY_CLINIC,
                Some("Doctor unavailable".into()),
                at(2, 9),
            )
            .expect("with notes");
        assert!(cancelled.is_terminal());
    }

    #[test]
    fn disallowed_and_post_terminal_transitions_are_rejected() {
        let f = fixture();
        let appt = book(&f, 10);

        let err = f
            .service
            .change_status(&appt.id, ids::PAID, None, at(2, 9))
            .expect_err("0 -> 11 is not in the table");
        assert!(matches!(
            err,
            ClinicError::TransitionNotAllowed { from: 0, to: 11 }
        ));

        f.service
            .change_status(&appt.id, ids::NO_SHOW, Some("Did not attend".into()), at(10, 11))
            .expect("no show");
        let err = f
            .service
            .change_status(&appt.id, ids::CONFIRMED, None, at(10, 12))
            .expect_err("terminal");
        assert!(matches!(err, ClinicError::TerminalStatus(8)));

        let err = f
            .service
            .change_status(&appt.id, 42, None, at(10, 12))
            .expect_err("unknown");
        assert!(matches!(err, ClinicError::UnknownStatus(42)));
    }

    #[test]
    fn cancel_requires_notes_and_a_future_appointment() {
        let f = fixture();
        let appt = book(&f, 10);

        let err = f
            .service
            .cancel(&appt.id, None, at(2, 9))
            .expect_err("notes required");
        assert!(matches!(err, ClinicError::NotesRequired(7)));

        let err = f
            .service
            .cancel(&appt.id, Some("Sick".into()), at(10, 11))
            .expect_err("past");
        assert!(matches!(err, ClinicError::AppointmentInPast));

        let cancelled = f
            .service
            .cancel(&appt.id, Some("Sick".into()), at(2, 9))
            .expect("cancel");
        assert_eq!(cancelled.status_id, ids::CANCELLED_BY_PATIENT);
        assert_eq!(
            cancelled.status_history[0].notes.as_ref().map(|n| n.as_str()),
            Some("Sick")
        );

        let err = f
            .service
            .cancel(&appt.id, Some("Again".into()), at(2, 9))
            .expect_err("already terminal");
        assert!(matches!(err, ClinicError::TerminalStatus(7)));
    }

    #[test]
    fn update_is_blocked_once_past_or_terminal() {
        let f = fixture();
        let appt = book(&f, 10);
        let update = AppointmentUpdate {
            scheduled_at: at(12, 15),
            duration_minutes: 45,
            reason: "Vaccination".into(),
            notes: Some("bring card".into()),
        };

        let moved = f
            .service
            .update(&appt.id, update.clone(), at(2, 9))
            .expect("update");
        assert_eq!(moved.scheduled_at, at(12, 15));
        assert_eq!(moved.reason.as_str(), "Vaccination");
        assert_eq!(moved.status_id, ids::SCHEDULED);

        let err = f
            .service
            .update(&appt.id, update, at(13, 9))
            .expect_err("past");
        assert!(matches!(err, ClinicError::AppointmentInPast));
    }

    #[test]
    fn actions_follow_status_and_time() {
        let f = fixture();
        let appt = book(&f, 10);

        let before = f.service.actions(&appt, at(2, 9));
        assert!(before.can_edit && before.can_cancel && before.can_change_status);

        let after = f.service.actions(&appt, at(10, 11));
        assert!(!after.can_edit && !after.can_cancel);
        assert!(after.next_statuses.contains(&ids::NO_SHOW));

        let done = f
            .service
            .change_status(&appt.id, ids::NO_SHOW, Some("No call".into()), at(10, 11))
            .expect("no show");
        let terminal = f.service.actions(&done, at(10, 11));
        assert!(!terminal.can_change_status && terminal.next_statuses.is_empty());
    }

    #[test]
    fn list_filters_by_patient_and_sorts_by_time() {
        let f = fixture();
        let later = book(&f, 20);
        let sooner = book(&f, 5);

        let order: Vec<RecordId> = f
            .service
            .list(Some(&f.patient_id))
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(order, vec![sooner.id, later.id]);
        assert!(f.service.list(Some(&RecordId::new())).is_empty());
        assert_eq!(f.service.list(None).len(), 2);
    }
}
