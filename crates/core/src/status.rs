//! Appointment status engine.
//!
//! Appointment statuses form a fixed table of 17 states identified by integer ids. Four of them
//! (completed, cancelled by patient, no show, cancelled by clinic) are *terminal*: once an
//! appointment reaches one, nothing about it may change again.
//!
//! Which non-terminal state may follow which is decided by a [`TransitionTable`] held by the
//! service, not by callers. Clients ask for the allowed transitions of the current status and
//! submit one of them; the service re-validates the request against the same table before
//! persisting it.
//!
//! Responsibilities:
//! - the static status table and terminal-state detection
//! - the allowed-transition lookup (compiled-in default, optional YAML override)
//! - resolving which actions (edit, cancel, change status) an appointment currently offers
//! - validating a requested transition, including the notes requirement for terminal targets

use crate::{ClinicError, ClinicResult, NonEmptyText};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Named status ids.
pub mod ids {
    pub const SCHEDULED: u8 = 0;
    pub const CONFIRMED: u8 = 1;
    pub const REMINDER_SENT: u8 = 2;
    pub const ARRIVED: u8 = 3;
    pub const IN_WAITING_ROOM: u8 = 4;
    pub const IN_CONSULTATION: u8 = 5;
    pub const COMPLETED: u8 = 6;
    pub const CANCELLED_BY_PATIENT: u8 = 7;
    pub const NO_SHOW: u8 = 8;
    pub const RESCHEDULED: u8 = 9;
    pub const PENDING_PAYMENT: u8 = 10;
    pub const PAID: u8 = 11;
    pub const RUNNING_LATE: u8 = 12;
    pub const PENDING_RESULTS: u8 = 13;
    pub const FOLLOW_UP_REQUIRED: u8 = 14;
    pub const CANCELLED_BY_CLINIC: u8 = 15;
    pub const ON_HOLD: u8 = 16;
}

/// Statuses from which no further transition is permitted.
pub const TERMINAL_STATUS_IDS: [u8; 4] = [
    ids::COMPLETED,
    ids::CANCELLED_BY_PATIENT,
    ids::NO_SHOW,
    ids::CANCELLED_BY_CLINIC,
];

/// One entry of the static status table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AppointmentStatus {
    pub id: u8,
    pub name: &'static str,
    /// Display colour as a `#rrggbb` hex string.
    pub color: &'static str,
    /// Material icon name.
    pub icon: &'static str,
    pub terminal: bool,
}

const fn status(
    id: u8,
    name: &'static str,
    color: &'static str,
    icon: &'static str,
    terminal: bool,
) -> AppointmentStatus {
    AppointmentStatus {
        id,
        name,
        color,
        icon,
        terminal,
    }
}

/// The status table, indexed by id.
pub const STATUSES: [AppointmentStatus; 17] = [
    status(0, "Scheduled", "#1976d2", "event", false),
    status(1, "Confirmed", "#0288d1", "event_available", false),
    status(2, "Reminder sent", "#7b1fa2", "notifications", false),
    status(3, "Arrived", "#00796b", "how_to_reg", false),
    status(4, "In waiting room", "#fbc02d", "hourglass_empty", false),
    status(5, "In consultation", "#f57c00", "medical_services", false),
    status(6, "Completed", "#388e3c", "check_circle", true),
    status(7, "Cancelled by patient", "#d32f2f", "cancel", true),
    status(8, "No show", "#616161", "person_off", true),
    status(9, "Rescheduled", "#5d4037", "update", false),
    status(10, "Pending payment", "#c2185b", "payments", false),
    status(11, "Paid", "#689f38", "paid", false),
    status(12, "Running late", "#ffa000", "schedule", false),
    status(13, "Pending results", "#0097a7", "science", false),
    status(14, "Follow-up required", "#512da8", "assignment_return", false),
    status(15, "Cancelled by clinic", "#b71c1c", "event_busy", true),
    status(16, "On hold", "#455a64", "pause_circle", false),
];

impl AppointmentStatus {
    pub fn from_id(id: u8) -> Option<&'static AppointmentStatus> {
        STATUSES.get(id as usize)
    }

    pub fn all() -> &'static [AppointmentStatus] {
        &STATUSES
    }
}

/// True iff `id` is one of the terminal statuses {6, 7, 8, 15}.
pub fn is_terminal_status(id: u8) -> bool {
    TERMINAL_STATUS_IDS.contains(&id)
}

fn known(id: u8) -> ClinicResult<&'static AppointmentStatus> {
    AppointmentStatus::from_id(id).ok_or(ClinicError::UnknownStatus(id))
}

// ============================================================================
// Transition table
// ============================================================================

/// Allowed next statuses keyed by current status.
///
/// Invariants (checked on construction):
/// - every id is a known status,
/// - terminal statuses have no outgoing transitions,
/// - no status transitions to itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionTable {
    allowed: BTreeMap<u8, Vec<u8>>,
}

impl Default for TransitionTable {
    fn default() -> Self {
        use ids::*;

        let entries: [(u8, &[u8]); 13] = [
            (
                SCHEDULED,
                &[CONFIRMED, REMINDER_SENT, ARRIVED, RESCHEDULED, RUNNING_LATE, ON_HOLD,
                  CANCELLED_BY_PATIENT, CANCELLED_BY_CLINIC, NO_SHOW],
            ),
            (
                CONFIRMED,
                &[REMINDER_SENT, ARRIVED, RESCHEDULED, RUNNING_LATE, ON_HOLD,
                  CANCELLED_BY_PATIENT, CANCELLED_BY_CLINIC, NO_SHOW],
            ),
            (
                REMINDER_SENT,
                &[CONFIRMED, ARRIVED, RESCHEDULED, RUNNING_LATE, CANCELLED_BY_PATIENT,
                  CANCELLED_BY_CLINIC, NO_SHOW],
            ),
            (ARRIVED, &[IN_WAITING_ROOM, IN_CONSULTATION, PENDING_PAYMENT]),
            (IN_WAITING_ROOM, &[IN_CONSULTATION, CANCELLED_BY_PATIENT, CANCELLED_BY_CLINIC]),
            (
                IN_CONSULTATION,
                &[COMPLETED, PENDING_PAYMENT, PENDING_RESULTS, FOLLOW_UP_REQUIRED],
            ),
            (
                RESCHEDULED,
                &[CONFIRMED, REMINDER_SENT, ARRIVED, CANCELLED_BY_PATIENT, CANCELLED_BY_CLINIC,
                  NO_SHOW],
            ),
            (PENDING_PAYMENT, &[PAID, COMPLETED]),
            (PAID, &[COMPLETED]),
            (RUNNING_LATE, &[ARRIVED, RESCHEDULED, CANCELLED_BY_PATIENT, NO_SHOW]),
            (PENDING_RESULTS, &[FOLLOW_UP_REQUIRED, COMPLETED]),
            (FOLLOW_UP_REQUIRED, &[COMPLETED]),
            (
                ON_HOLD,
                &[SCHEDULED, CONFIRMED, RESCHEDULED, CANCELLED_BY_PATIENT, CANCELLED_BY_CLINIC],
            ),
        ];

        Self {
            allowed: entries
                .into_iter()
                .map(|(from, to)| (from, to.to_vec()))
                .collect(),
        }
    }
}

impl TransitionTable {
    /// Builds a table from `from -> [to, ...]` entries, validating every invariant.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::TransitionTable`] if an id is unknown, a terminal status has
    /// outgoing transitions, or a status transitions to itself.
    pub fn new(entries: BTreeMap<u8, Vec<u8>>) -> ClinicResult<Self> {
        let mut allowed = BTreeMap::new();

        for (from, mut targets) in entries {
            if AppointmentStatus::from_id(from).is_none() {
                return Err(ClinicError::TransitionTable(format!("unknown status {from}")));
            }
            if is_terminal_status(from) && !targets.is_empty() {
                return Err(ClinicError::TransitionTable(format!(
                    "terminal status {from} cannot have outgoing transitions"
                )));
            }
            for &to in &targets {
                if AppointmentStatus::from_id(to).is_none() {
                    return Err(ClinicError::TransitionTable(format!(
                        "status {from} lists unknown target {to}"
                    )));
                }
                if to == from {
                    return Err(ClinicError::TransitionTable(format!(
                        "status {from} cannot transition to itself"
                    )));
                }
            }
            targets.sort_unstable();
            targets.dedup();
            if !targets.is_empty() {
                allowed.insert(from, targets);
            }
        }

        Ok(Self { allowed })
    }

    /// Parses a YAML override of the form:
    ///
    /// ```yaml
    /// transitions:
    ///   0: [1, 7]
    ///   1: [6, 7]
    /// ```
    pub fn parse(yaml_text: &str) -> ClinicResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let wire = serde_path_to_error::deserialize::<_, TransitionTableWire>(deserializer)
            .map_err(|err| {
                let path = err.path().to_string();
                let path = if path.is_empty() { "<root>".to_string() } else { path };
                ClinicError::TransitionTable(format!(
                    "schema mismatch at {path}: {}",
                    err.into_inner()
                ))
            })?;
        Self::new(wire.transitions)
    }

    pub fn load(path: &Path) -> ClinicResult<Self> {
        let text = std::fs::read_to_string(path).map_err(ClinicError::FileRead)?;
        Self::parse(&text)
    }

    /// The statuses reachable from `from`, in ascending id order. Empty for terminal or
    /// unknown statuses.
    pub fn allowed(&self, from: u8) -> &[u8] {
        self.allowed.get(&from).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_allowed(&self, from: u8, to: u8) -> bool {
        self.allowed(from).contains(&to)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TransitionTableWire {
    transitions: BTreeMap<u8, Vec<u8>>,
}

// ============================================================================
// Actions and transition requests
// ============================================================================

/// What an appointment currently offers in its action menu.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppointmentActions {
    pub can_edit: bool,
    pub can_cancel: bool,
    pub can_change_status: bool,
    /// Targets for the status-change submenu.
    pub next_statuses: Vec<u8>,
}

impl AppointmentActions {
    /// Resolves the available actions for an appointment in `current_status`.
    ///
    /// Edit and cancel are disabled once the appointment is terminal or in the past. The
    /// status submenu is populated from `table` and is empty for terminal statuses; past
    /// appointments keep it so they can still be closed out (completed, no show).
    pub fn resolve(current_status: u8, is_past: bool, table: &TransitionTable) -> Self {
        let terminal = is_terminal_status(current_status);
        let next_statuses = if terminal {
            Vec::new()
        } else {
            table.allowed(current_status).to_vec()
        };

        Self {
            can_edit: !terminal && !is_past,
            can_cancel: !terminal && !is_past,
            can_change_status: !next_statuses.is_empty(),
            next_statuses,
        }
    }
}

/// A requested move from one status to another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionRequest {
    pub from: u8,
    pub to: u8,
    pub notes: Option<NonEmptyText>,
}

impl TransitionRequest {
    /// Blank notes are treated as absent.
    pub fn new(from: u8, to: u8, notes: Option<String>) -> Self {
        Self {
            from,
            to,
            notes: NonEmptyText::optional(notes),
        }
    }

    /// Checks the request against `table`.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::UnknownStatus`] if either id is not in the status table,
    /// - [`ClinicError::TerminalStatus`] if the current status is terminal,
    /// - [`ClinicError::TransitionNotAllowed`] if `table` does not list the target,
    /// - [`ClinicError::NotesRequired`] if the target is terminal and no notes were given.
    pub fn validate(&self, table: &TransitionTable) -> ClinicResult<()> {
        let from = known(self.from)?;
        let to = known(self.to)?;

        if from.terminal {
            return Err(ClinicError::TerminalStatus(from.id));
        }
        if !table.is_allowed(from.id, to.id) {
            return Err(ClinicError::TransitionNotAllowed {
                from: from.id,
                to: to.id,
            });
        }
        if to.terminal && self.notes.is_none() {
            return Err(ClinicError::NotesRequired(to.id));
        }
        Ok(())
    }
}
