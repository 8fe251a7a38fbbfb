use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::{DatabaseError, SupabaseClient};

use crate::models::{Appointment, SchedulingError};

/// Persistence for appointment rows. Rows are never deleted; cancellation is
/// a status change. The advisory conflict reads here are backed by the
/// `appointments_active_slot_key` partial unique index, which rejects any
/// write that would give a clinician two non-canceled appointments at the
/// same date and time.
pub struct AppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl AppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn get(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Loading appointment {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        rows.into_iter().next().ok_or(SchedulingError::NotFound)
    }

    /// The non-canceled appointment occupying (clinician, date, time), if any.
    pub async fn find_active_at(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        auth_token: &str,
    ) -> Result<Option<Appointment>, SchedulingError> {
        let path = format!(
            "/rest/v1/appointments?clinician_id=eq.{}&date=eq.{}&time=eq.{}&status=neq.canceled",
            clinician_id,
            date,
            time.format("%H:%M:%S")
        );

        let rows: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(rows.into_iter().next())
    }

    /// All non-canceled appointments for a clinician on one date.
    pub async fn active_for_date(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        debug!("Loading active appointments for {} on {}", clinician_id, date);

        let path = format!(
            "/rest/v1/appointments?clinician_id=eq.{}&date=eq.{}&status=neq.canceled&order=time.asc",
            clinician_id, date
        );

        let rows = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(rows)
    }

    /// Insert a new appointment row. Returns `Ok(None)` when the confirmation
    /// code lost a uniqueness race (the caller regenerates and retries); a
    /// collision on the active-slot index surfaces as `SlotConflict`.
    pub async fn insert(
        &self,
        appointment: &Appointment,
        auth_token: &str,
    ) -> Result<Option<Appointment>, SchedulingError> {
        debug!(
            "Inserting appointment {} for clinician {} on {} {}",
            appointment.id, appointment.clinician_id, appointment.date, appointment.time
        );

        let appointment_data = json!({
            "id": appointment.id,
            "clinician_id": appointment.clinician_id,
            "patient_id": appointment.patient_id,
            "date": appointment.date.to_string(),
            "time": appointment.time.format("%H:%M:%S").to_string(),
            "appointment_type": appointment.appointment_type,
            "status": appointment.status,
            "notes": appointment.notes,
            "confirmation_code": appointment.confirmation_code,
            "created_at": appointment.created_at.to_rfc3339(),
            "updated_at": appointment.updated_at.to_rfc3339(),
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Result<Vec<Appointment>, DatabaseError> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(headers),
            )
            .await;

        match result {
            Ok(rows) => rows
                .into_iter()
                .next()
                .map(Some)
                .ok_or_else(|| {
                    SchedulingError::DatabaseError(
                        "appointment insert returned no rows".to_string(),
                    )
                }),
            Err(DatabaseError::Conflict(body)) => {
                if body.contains("confirmation_code") {
                    warn!("Confirmation code collided with a concurrent insert");
                    Ok(None)
                } else {
                    Err(SchedulingError::SlotConflict)
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// PATCH the given columns on one appointment and return the updated row.
    pub async fn update_fields(
        &self,
        appointment_id: Uuid,
        fields: Map<String, Value>,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Updating appointment {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Result<Vec<Appointment>, DatabaseError> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(fields)),
                Some(headers),
            )
            .await;

        match result {
            Ok(rows) => rows.into_iter().next().ok_or(SchedulingError::NotFound),
            // The active-slot index also guards moves onto an occupied slot.
            Err(DatabaseError::Conflict(_)) => Err(SchedulingError::SlotConflict),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn code_exists(
        &self,
        code: &str,
        auth_token: &str,
    ) -> Result<bool, SchedulingError> {
        let path = format!(
            "/rest/v1/appointments?confirmation_code=eq.{}&select=id",
            urlencoding::encode(code)
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(!rows.is_empty())
    }

    /// Appointments for a clinician, optionally windowed by inclusive dates,
    /// ascending for day planning.
    pub async fn list_for_clinician(
        &self,
        clinician_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        debug!("Listing appointments for clinician {}", clinician_id);

        let mut path = format!("/rest/v1/appointments?clinician_id=eq.{}", clinician_id);
        if let Some(from_date) = from {
            path.push_str(&format!("&date=gte.{}", from_date));
        }
        if let Some(to_date) = to {
            path.push_str(&format!("&date=lte.{}", to_date));
        }
        path.push_str("&order=date.asc,time.asc");

        let rows = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(rows)
    }

    /// A patient's appointment history, most recent first.
    pub async fn list_for_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        debug!("Listing appointments for patient {}", patient_id);

        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=date.desc,time.desc",
            patient_id
        );

        let rows = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(rows)
    }
}
