// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_database::DatabaseError;

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub clinician_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "slot_time")]
    pub time: NaiveTime,
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub confirmation_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub clinician_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "slot_time")]
    pub time: NaiveTime,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit record of a recurring availability request. Written once when the
/// expansion is materialized; never read back on the hot path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringPattern {
    pub id: Uuid,
    pub clinician_id: Uuid,
    pub start_date: NaiveDate,
    pub until_date: NaiveDate,
    pub weekdays: Vec<u8>,
    #[serde(with = "slot_time_vec")]
    pub time_slots: Vec<NaiveTime>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Canceled,
    Rescheduled,
    NoShow,
}

impl AppointmentStatus {
    /// Everything except `canceled` occupies its slot.
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Canceled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Canceled => write!(f, "canceled"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    Virtual,
    InPerson,
    HomeVisit,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::Virtual => write!(f, "virtual"),
            AppointmentType::InPerson => write!(f, "in_person"),
            AppointmentType::HomeVisit => write!(f, "home_visit"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

// Dates and times arrive as strings and are parsed by the engine so that bad
// input surfaces as InvalidDate/InvalidTime rather than a deserializer reject.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub clinician_id: Uuid,
    pub patient_id: Uuid,
    pub date: String,
    pub time: String,
    pub appointment_type: AppointmentType,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAvailabilityRequest {
    pub date: String,
    pub time_slots: Vec<String>,
    #[serde(default)]
    pub recurring: bool,
    pub recurring_days: Option<Vec<u8>>,
    pub recurring_until: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub date: Option<String>,
    pub time: Option<String>,
    pub appointment_type: Option<AppointmentType>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_date: String,
    pub new_time: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

// ==============================================================================
// VIEW MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotView {
    #[serde(with = "slot_time")]
    pub time: NaiveTime,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityView {
    pub clinician_id: Uuid,
    pub clinician_name: String,
    pub date: NaiveDate,
    pub slots: Vec<SlotView>,
}

/// Appointment with display names resolved at read time. Names are never
/// stored on the appointment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentView {
    pub id: Uuid,
    pub clinician_id: Uuid,
    pub clinician_name: String,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub date: NaiveDate,
    #[serde(with = "slot_time")]
    pub time: NaiveTime,
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub confirmation_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentView {
    pub fn from_appointment(
        appointment: Appointment,
        clinician_name: String,
        patient_name: String,
    ) -> Self {
        Self {
            id: appointment.id,
            clinician_id: appointment.clinician_id,
            clinician_name,
            patient_id: appointment.patient_id,
            patient_name,
            date: appointment.date,
            time: appointment.time,
            appointment_type: appointment.appointment_type,
            status: appointment.status,
            notes: appointment.notes,
            confirmation_code: appointment.confirmation_code,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSummary {
    pub id: Uuid,
    pub clinician_id: Uuid,
    pub clinician_name: String,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub date: NaiveDate,
    #[serde(with = "slot_time")]
    pub time: NaiveTime,
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub confirmation_code: String,
}

/// What a SetAvailability call materialized. The handler picks the wire shape
/// (single-day vs recurring) from `recurring`.
#[derive(Debug, Clone)]
pub struct SetAvailabilityOutcome {
    pub recurring: bool,
    pub date: NaiveDate,
    pub dates_affected: usize,
    pub time_slots: Vec<NaiveTime>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum SchedulingError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Time slot is already booked")]
    SlotConflict,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Invalid weekday set: {0}")]
    InvalidWeekdaySet(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Appointment cannot change status from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Could not allocate a unique confirmation code")]
    CodeGenerationExhausted,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

// Auth rejections keep their own variant; every other store failure
// collapses into a message.
impl From<DatabaseError> for SchedulingError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::Auth(message) => SchedulingError::Unauthorized(message),
            other => SchedulingError::DatabaseError(other.to_string()),
        }
    }
}

// ==============================================================================
// WIRE FORMATS
// ==============================================================================

pub fn parse_wire_date(value: &str) -> Result<NaiveDate, SchedulingError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| SchedulingError::InvalidDate(value.to_string()))
}

pub fn parse_wire_time(value: &str) -> Result<NaiveTime, SchedulingError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| SchedulingError::InvalidTime(value.to_string()))
}

/// Serialize slot times as `HH:MM`. Postgres `time` columns come back as
/// `HH:MM:SS`, so deserialization accepts both renderings.
pub mod slot_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&value, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&value, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

pub mod slot_time_vec {
    use chrono::NaiveTime;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(times: &[NaiveTime], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(times.len()))?;
        for time in times {
            seq.serialize_element(&time.format("%H:%M").to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|value| {
                NaiveTime::parse_from_str(value, "%H:%M")
                    .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}
