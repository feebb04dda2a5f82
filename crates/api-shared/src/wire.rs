//! JSON request and response bodies.
//!
//! Dates travel as strings: calendar dates as `YYYY-MM-DD`, timestamps as RFC 3339. Requests are
//! converted into core inputs with `into_*` methods that report malformed fields as
//! [`ClinicError::InvalidInput`]; responses are built from core records with `From`.

use chrono::{DateTime, NaiveDate, Utc};
use clinic_core::growth::{
    ChartOverlay, ChartPoint, GrowthAssessment, IndicatorAssessment, PercentileRow, SliderBounds,
};
use clinic_core::{
    Appointment, AppointmentActions, AppointmentStatus, AppointmentUpdate, ClinicError,
    ClinicResult, NewAppointment, Patient, PatientDetails, PatientGrowth, RecordId, Sex,
    SomatometryInput, SomatometryRecord, StatusChange,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn parse_date(field: &str, value: &str) -> ClinicResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ClinicError::InvalidInput(format!("{field} must be a YYYY-MM-DD date, got '{value}'"))
    })
}

fn parse_timestamp(field: &str, value: &str) -> ClinicResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| {
            ClinicError::InvalidInput(format!("{field} must be an RFC 3339 timestamp, got '{value}'"))
        })
}

fn optional_text<T: AsRef<str>>(value: Option<T>) -> Option<String> {
    value.map(|v| v.as_ref().to_string())
}

// ============================================================================
// General
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

// ============================================================================
// Patients
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct PatientReq {
    pub given_names: String,
    pub family_name: String,
    /// `YYYY-MM-DD`
    pub birth_date: String,
    /// `male` or `female`
    pub sex: String,
    #[serde(default)]
    pub guardian_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PatientReq {
    pub fn into_details(self) -> ClinicResult<PatientDetails> {
        let sex: Sex = self
            .sex
            .parse()
            .map_err(|e| ClinicError::InvalidInput(format!("{e}")))?;

        Ok(PatientDetails {
            birth_date: parse_date("birth_date", &self.birth_date)?,
            given_names: self.given_names,
            family_name: self.family_name,
            sex,
            guardian_name: self.guardian_name,
            phone: self.phone,
            notes: self.notes,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    pub given_names: String,
    pub family_name: String,
    pub birth_date: String,
    pub sex: String,
    pub guardian_name: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Patient> for PatientRes {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id.to_string(),
            given_names: p.given_names.into_inner(),
            family_name: p.family_name.into_inner(),
            birth_date: p.birth_date.to_string(),
            sex: p.sex.to_string(),
            guardian_name: optional_text(p.guardian_name),
            phone: optional_text(p.phone),
            notes: optional_text(p.notes),
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListPatientsRes {
    pub patients: Vec<PatientRes>,
}

// ============================================================================
// Somatometry
// ============================================================================

/// Measured values. `bmi` and `age_months` are derived server-side and rejected here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SomatometryReq {
    /// `YYYY-MM-DD`
    pub measurement_date: String,
    /// Kilograms.
    pub weight: f64,
    /// Centimetres.
    pub height: f64,
    #[serde(default)]
    pub head_circumference: Option<f64>,
    /// Degrees Celsius.
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SomatometryReq {
    pub fn into_input(self) -> ClinicResult<SomatometryInput> {
        Ok(SomatometryInput {
            measurement_date: parse_date("measurement_date", &self.measurement_date)?,
            weight: self.weight,
            height: self.height,
            head_circumference: self.head_circumference,
            temperature: self.temperature,
            notes: self.notes,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SomatometryRes {
    pub id: String,
    pub patient_id: String,
    pub measurement_date: String,
    pub weight: f64,
    pub height: f64,
    pub head_circumference: Option<f64>,
    pub temperature: Option<f64>,
    pub bmi: f64,
    pub age_months: u32,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SomatometryRecord> for SomatometryRes {
    fn from(r: SomatometryRecord) -> Self {
        Self {
            id: r.id.to_string(),
            patient_id: r.patient_id.to_string(),
            measurement_date: r.measurement_date.to_string(),
            weight: r.weight,
            height: r.height,
            head_circumference: r.head_circumference,
            temperature: r.temperature,
            bmi: r.bmi,
            age_months: r.age_months,
            notes: optional_text(r.notes),
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListSomatometryRes {
    pub records: Vec<SomatometryRes>,
}

// ============================================================================
// Growth
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PercentileRowRes {
    pub age_months: u32,
    pub p3: f64,
    pub p15: f64,
    pub p50: f64,
    pub p85: f64,
    pub p97: f64,
}

impl From<&PercentileRow> for PercentileRowRes {
    fn from(row: &PercentileRow) -> Self {
        Self {
            age_months: row.age_months,
            p3: row.p3,
            p15: row.p15,
            p50: row.p50,
            p85: row.p85,
            p97: row.p97,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReferenceRes {
    pub indicator: String,
    pub sex: String,
    pub unit: String,
    pub rows: Vec<PercentileRowRes>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BoundsRes {
    pub indicator: String,
    pub sex: String,
    pub age_months: u32,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// True when no reference row was available and neutral bounds were used.
    pub fallback: bool,
}

impl BoundsRes {
    pub fn new(indicator: &str, sex: Sex, age_months: u32, bounds: SliderBounds) -> Self {
        Self {
            indicator: indicator.to_string(),
            sex: sex.to_string(),
            age_months,
            min: bounds.min,
            max: bounds.max,
            step: bounds.step,
            fallback: bounds.fallback,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IndicatorAssessmentRes {
    pub indicator: String,
    pub value: f64,
    pub percentile: f64,
    pub z_score: f64,
    pub classification: String,
    pub alert: bool,
    pub reference_age_months: u32,
}

impl From<&IndicatorAssessment> for IndicatorAssessmentRes {
    fn from(a: &IndicatorAssessment) -> Self {
        Self {
            indicator: a.indicator.to_string(),
            value: a.value,
            percentile: a.percentile,
            z_score: a.z_score,
            classification: a.classification.label().to_string(),
            alert: a.classification.is_alert(),
            reference_age_months: a.reference_age_months,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssessmentRes {
    pub age_months: u32,
    pub bmi: Option<f64>,
    pub indicators: Vec<IndicatorAssessmentRes>,
    pub temperature: Option<String>,
    pub temperature_alert: bool,
}

impl From<&GrowthAssessment> for AssessmentRes {
    fn from(a: &GrowthAssessment) -> Self {
        Self {
            age_months: a.age_months,
            bmi: a.bmi,
            indicators: a.indicators.iter().map(IndicatorAssessmentRes::from).collect(),
            temperature: a.temperature.map(|t| t.label().to_string()),
            temperature_alert: a.temperature.is_some_and(|t| t.is_alert()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartPointRes {
    pub age_months: u32,
    pub value: f64,
    pub percentile: Option<f64>,
}

impl From<&ChartPoint> for ChartPointRes {
    fn from(p: &ChartPoint) -> Self {
        Self {
            age_months: p.age_months,
            value: p.value,
            percentile: p.percentile,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartOverlayRes {
    pub indicator: String,
    pub sex: String,
    pub unit: String,
    pub curves: Vec<PercentileRowRes>,
    pub points: Vec<ChartPointRes>,
}

impl From<&ChartOverlay> for ChartOverlayRes {
    fn from(c: &ChartOverlay) -> Self {
        Self {
            indicator: c.indicator.to_string(),
            sex: c.sex.to_string(),
            unit: c.unit.clone(),
            curves: c.curves.iter().map(PercentileRowRes::from).collect(),
            points: c.points.iter().map(ChartPointRes::from).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GrowthRes {
    pub patient_id: String,
    pub sex: String,
    pub latest: Option<SomatometryRes>,
    pub assessment: Option<AssessmentRes>,
    pub charts: Vec<ChartOverlayRes>,
}

impl From<PatientGrowth> for GrowthRes {
    fn from(g: PatientGrowth) -> Self {
        Self {
            patient_id: g.patient_id.to_string(),
            sex: g.sex.to_string(),
            assessment: g.assessment.as_ref().map(AssessmentRes::from),
            charts: g.charts.iter().map(ChartOverlayRes::from).collect(),
            latest: g.latest.map(SomatometryRes::from),
        }
    }
}

// ============================================================================
// Appointments
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusRes {
    pub id: u8,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub terminal: bool,
}

impl From<&AppointmentStatus> for StatusRes {
    fn from(s: &AppointmentStatus) -> Self {
        Self {
            id: s.id,
            name: s.name.to_string(),
            color: s.color.to_string(),
            icon: s.icon.to_string(),
            terminal: s.terminal,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListStatusesRes {
    pub statuses: Vec<StatusRes>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransitionsRes {
    pub status_id: u8,
    pub transitions: Vec<StatusRes>,
}

/// Resolves ids against the status table, skipping any that are unknown.
fn statuses_for(ids: &[u8]) -> Vec<StatusRes> {
    ids.iter()
        .filter_map(|&id| AppointmentStatus::from_id(id))
        .map(StatusRes::from)
        .collect()
}

impl TransitionsRes {
    pub fn new(status_id: u8, allowed: &[u8]) -> Self {
        Self {
            status_id,
            transitions: statuses_for(allowed),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActionsRes {
    pub can_edit: bool,
    pub can_cancel: bool,
    pub can_change_status: bool,
    pub next_statuses: Vec<StatusRes>,
}

impl From<&AppointmentActions> for ActionsRes {
    fn from(a: &AppointmentActions) -> Self {
        Self {
            can_edit: a.can_edit,
            can_cancel: a.can_cancel,
            can_change_status: a.can_change_status,
            next_statuses: statuses_for(&a.next_statuses),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusChangeRes {
    pub from: u8,
    pub to: u8,
    pub notes: Option<String>,
    pub changed_at: String,
}

impl From<&StatusChange> for StatusChangeRes {
    fn from(c: &StatusChange) -> Self {
        Self {
            from: c.from,
            to: c.to,
            notes: c.notes.as_ref().map(|n| n.as_str().to_string()),
            changed_at: c.changed_at.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AppointmentRes {
    pub id: String,
    pub patient_id: String,
    pub scheduled_at: String,
    pub ends_at: String,
    pub duration_minutes: u32,
    pub reason: String,
    pub status_id: u8,
    /// `None` only if the stored status id is no longer in the status table.
    pub status: Option<StatusRes>,
    pub notes: Option<String>,
    pub status_history: Vec<StatusChangeRes>,
    pub actions: ActionsRes,
    pub created_at: String,
    pub updated_at: String,
}

impl AppointmentRes {
    pub fn new(a: Appointment, actions: &AppointmentActions) -> Self {
        Self {
            id: a.id.to_string(),
            patient_id: a.patient_id.to_string(),
            scheduled_at: a.scheduled_at.to_rfc3339(),
            ends_at: a.ends_at().to_rfc3339(),
            duration_minutes: a.duration_minutes,
            status_id: a.status_id,
            status: a.status().map(StatusRes::from),
            status_history: a.status_history.iter().map(StatusChangeRes::from).collect(),
            actions: ActionsRes::from(actions),
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.to_rfc3339(),
            reason: a.reason.into_inner(),
            notes: optional_text(a.notes),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListAppointmentsRes {
    pub appointments: Vec<AppointmentRes>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AppointmentReq {
    pub patient_id: String,
    /// RFC 3339 timestamp.
    pub scheduled_at: String,
    pub duration_minutes: u32,
    pub reason: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AppointmentReq {
    pub fn into_new(self) -> ClinicResult<NewAppointment> {
        Ok(NewAppointment {
            patient_id: RecordId::parse(&self.patient_id)?,
            scheduled_at: parse_timestamp("scheduled_at", &self.scheduled_at)?,
            duration_minutes: self.duration_minutes,
            reason: self.reason,
            notes: self.notes,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AppointmentUpdateReq {
    /// RFC 3339 timestamp.
    pub scheduled_at: String,
    pub duration_minutes: u32,
    pub reason: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AppointmentUpdateReq {
    pub fn into_update(self) -> ClinicResult<AppointmentUpdate> {
        Ok(AppointmentUpdate {
            scheduled_at: parse_timestamp("scheduled_at", &self.scheduled_at)?,
            duration_minutes: self.duration_minutes,
            reason: self.reason,
            notes: self.notes,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct StatusChangeReq {
    pub status_id: u8,
    /// Required when the target status is terminal.
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CancelReq {
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_req_parses_date_and_sex() {
        let req: PatientReq = serde_json::from_value(serde_json::json!({
            "given_names": "Ana",
            "family_name": "Lopez",
            "birth_date": "2023-05-17",
            "sex": "F"
        }))
        .expect("valid body");

        let details = req.into_details().expect("valid details");
        assert_eq!(details.sex, Sex::Female);
        assert_eq!(
            details.birth_date,
            NaiveDate::from_ymd_opt(2023, 5, 17).expect("valid date")
        );
        assert!(details.guardian_name.is_none());
    }

    #[test]
    fn malformed_fields_are_invalid_input() {
        let req = PatientReq {
            given_names: "Ana".into(),
            family_name: "Lopez".into(),
            birth_date: "17/05/2023".into(),
            sex: "female".into(),
            guardian_name: None,
            phone: None,
            notes: None,
        };
        assert!(matches!(req.into_details(), Err(ClinicError::InvalidInput(_))));

        let req = AppointmentReq {
            patient_id: RecordId::new().to_string(),
            scheduled_at: "tomorrow".into(),
            duration_minutes: 30,
            reason: "Check-up".into(),
            notes: None,
        };
        assert!(matches!(req.into_new(), Err(ClinicError::InvalidInput(_))));
    }

    #[test]
    fn somatometry_req_rejects_derived_fields() {
        let result: Result<SomatometryReq, _> = serde_json::from_value(serde_json::json!({
            "measurement_date": "2024-01-15",
            "weight": 9.6,
            "height": 75.7,
            "bmi": 30.0
        }));
        assert!(result.is_err());
    }

    #[test]
    fn timestamps_are_normalised_to_utc() {
        let req = AppointmentUpdateReq {
            scheduled_at: "2026-03-10T10:00:00-03:00".into(),
            duration_minutes: 30,
            reason: "Check-up".into(),
            notes: None,
        };
        let update = req.into_update().expect("valid update");
        assert_eq!(update.scheduled_at.to_rfc3339(), "2026-03-10T13:00:00+00:00");
    }

    #[test]
    fn transitions_skip_unknown_ids() {
        let res = TransitionsRes::new(0, &[1, 99, 7]);
        let ids: Vec<u8> = res.transitions.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 7]);
        assert!(res.transitions[1].terminal);
    }
}
