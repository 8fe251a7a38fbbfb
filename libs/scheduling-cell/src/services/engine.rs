// libs/scheduling-cell/src/services/engine.rs
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use rand::Rng;
use serde_json::{json, Map};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::catalog::SlotCatalog;
use crate::models::{
    parse_wire_date, parse_wire_time, Appointment, AppointmentStatus, AppointmentSummary,
    AppointmentView, AvailabilityView, BookAppointmentRequest, RecurringPattern,
    RescheduleAppointmentRequest, SchedulingError, SetAvailabilityOutcome,
    SetAvailabilityRequest, SlotView, UpdateAppointmentRequest,
};
use crate::services::appointment_store::AppointmentStore;
use crate::services::availability_store::AvailabilityStore;
use crate::services::directory::UserDirectory;
use crate::services::expander::AvailabilityExpander;
use crate::services::lifecycle::AppointmentLifecycle;

const MAX_CODE_ATTEMPTS: usize = 5;
const CODE_LENGTH: usize = 6;
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn generate_confirmation_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

/// Orchestrates availability reads and writes, booking, and appointment
/// lifecycle against the stores. Holds no cross-request state; every
/// operation re-reads the database.
pub struct SchedulingEngine {
    catalog: SlotCatalog,
    availability: AvailabilityStore,
    appointments: AppointmentStore,
    directory: UserDirectory,
    expander: AvailabilityExpander,
    lifecycle: AppointmentLifecycle,
}

impl SchedulingEngine {
    pub fn new(
        catalog: SlotCatalog,
        availability: AvailabilityStore,
        appointments: AppointmentStore,
        directory: UserDirectory,
    ) -> Self {
        Self {
            catalog,
            availability,
            appointments,
            directory,
            expander: AvailabilityExpander,
            lifecycle: AppointmentLifecycle::new(),
        }
    }

    /// Standard catalog wired to one Supabase client, for the handlers.
    pub fn from_config(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self::new(
            SlotCatalog::standard(),
            AvailabilityStore::new(Arc::clone(&supabase)),
            AppointmentStore::new(Arc::clone(&supabase)),
            UserDirectory::new(supabase),
        )
    }

    /// Merge the slot catalog with explicit availability rows and active
    /// appointments. A booked slot always reads unavailable; a slot without
    /// an explicit row reads unavailable (default closed).
    pub async fn get_availability(
        &self,
        clinician_id: Uuid,
        date: &str,
        auth_token: &str,
    ) -> Result<AvailabilityView, SchedulingError> {
        let date = parse_wire_date(date)?;
        debug!("Computing availability for {} on {}", clinician_id, date);

        let explicit_rows = self
            .availability
            .slots_for_date(clinician_id, date, auth_token)
            .await?;
        let appointments = self
            .appointments
            .active_for_date(clinician_id, date, auth_token)
            .await?;

        let explicit: HashMap<NaiveTime, bool> = explicit_rows
            .iter()
            .map(|row| (row.time, row.available))
            .collect();
        let booked: HashSet<NaiveTime> = appointments
            .iter()
            .filter(|appointment| appointment.status.is_active())
            .map(|appointment| appointment.time)
            .collect();

        let slots = self
            .catalog
            .slots()
            .iter()
            .map(|time| SlotView {
                time: *time,
                available: if booked.contains(time) {
                    false
                } else {
                    explicit.get(time).copied().unwrap_or(false)
                },
            })
            .collect();

        let clinician_name = self
            .directory
            .clinician_display_name(clinician_id, auth_token)
            .await;

        Ok(AvailabilityView {
            clinician_id,
            clinician_name,
            date,
            slots,
        })
    }

    /// Book a slot for a patient. The advisory conflict read gives friendly
    /// errors; the database unique index settles races.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<AppointmentView, SchedulingError> {
        let date = parse_wire_date(&request.date)?;
        let time = parse_wire_time(&request.time)?;
        if !self.catalog.contains(time) {
            return Err(SchedulingError::InvalidTime(format!(
                "{} is not a bookable slot time",
                request.time
            )));
        }

        info!(
            "Booking appointment for clinician {} on {} at {}",
            request.clinician_id, date, request.time
        );

        if let Some(existing) = self
            .appointments
            .find_active_at(request.clinician_id, date, time, auth_token)
            .await?
        {
            debug!("Slot already held by appointment {}", existing.id);
            return Err(SchedulingError::SlotConflict);
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_confirmation_code();
            if self.appointments.code_exists(&code, auth_token).await? {
                warn!("Confirmation code collision on attempt {}", attempt);
                continue;
            }

            let now = Utc::now();
            let appointment = Appointment {
                id: Uuid::new_v4(),
                clinician_id: request.clinician_id,
                patient_id: request.patient_id,
                date,
                time,
                appointment_type: request.appointment_type.clone(),
                status: AppointmentStatus::Scheduled,
                notes: request.notes.clone(),
                confirmation_code: code,
                created_at: now,
                updated_at: now,
            };

            match self.appointments.insert(&appointment, auth_token).await? {
                Some(created) => {
                    info!("Appointment {} booked", created.id);
                    return Ok(self.into_view(created, auth_token).await);
                }
                None => {
                    warn!("Confirmation code collision on attempt {}", attempt);
                }
            }
        }

        Err(SchedulingError::CodeGenerationExhausted)
    }

    /// Open slots for one date, or materialize a weekly recurring pattern.
    ///
    /// The seed date is always written. On the recurring path every written
    /// date skips times that already carry a non-canceled appointment, so
    /// re-running the same request never reopens a booked slot.
    pub async fn set_availability(
        &self,
        clinician_id: Uuid,
        request: SetAvailabilityRequest,
        auth_token: &str,
    ) -> Result<SetAvailabilityOutcome, SchedulingError> {
        let date = parse_wire_date(&request.date)?;

        let mut times = Vec::with_capacity(request.time_slots.len());
        for raw in &request.time_slots {
            let time = parse_wire_time(raw)?;
            if !self.catalog.contains(time) {
                return Err(SchedulingError::InvalidTime(format!(
                    "{} is not a catalog slot time",
                    raw
                )));
            }
            times.push(time);
        }
        times.sort();
        times.dedup();

        if !request.recurring {
            self.availability
                .upsert_slots(clinician_id, date, &times, auth_token)
                .await?;
            info!(
                "Opened {} slots for clinician {} on {}",
                times.len(),
                clinician_id,
                date
            );
            return Ok(SetAvailabilityOutcome {
                recurring: false,
                date,
                dates_affected: 0,
                time_slots: times,
            });
        }

        let weekdays = request.recurring_days.ok_or_else(|| {
            SchedulingError::ValidationError(
                "recurring_days is required when recurring is true".to_string(),
            )
        })?;
        let until_raw = request.recurring_until.ok_or_else(|| {
            SchedulingError::ValidationError(
                "recurring_until is required when recurring is true".to_string(),
            )
        })?;
        let until = parse_wire_date(&until_raw)?;

        // Range and weekday validation happens here, before the first write.
        let mut expansion = self.expander.expand(date, until, &weekdays)?;
        expansion.retain(|candidate| *candidate != date);
        let dates_affected = expansion.len();

        let mut write_dates = Vec::with_capacity(expansion.len() + 1);
        write_dates.push(date);
        write_dates.extend(expansion);

        for write_date in &write_dates {
            let appointments = self
                .appointments
                .active_for_date(clinician_id, *write_date, auth_token)
                .await?;
            let booked: HashSet<NaiveTime> = appointments
                .iter()
                .map(|appointment| appointment.time)
                .collect();

            let open: Vec<NaiveTime> = times
                .iter()
                .copied()
                .filter(|time| !booked.contains(time))
                .collect();
            if open.len() < times.len() {
                debug!(
                    "Skipping {} booked slots on {}",
                    times.len() - open.len(),
                    write_date
                );
            }

            self.availability
                .upsert_slots(clinician_id, *write_date, &open, auth_token)
                .await?;
        }

        let pattern = RecurringPattern {
            id: Uuid::new_v4(),
            clinician_id,
            start_date: date,
            until_date: until,
            weekdays,
            time_slots: times.clone(),
            created_at: Utc::now(),
        };
        self.availability.record_pattern(&pattern, auth_token).await?;

        info!(
            "Materialized recurring availability for clinician {}: seed {} plus {} dates",
            clinician_id, date, dates_affected
        );

        Ok(SetAvailabilityOutcome {
            recurring: true,
            date,
            dates_affected,
            time_slots: times,
        })
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<AppointmentView, SchedulingError> {
        let appointment = self.appointments.get(appointment_id, auth_token).await?;
        Ok(self.into_view(appointment, auth_token).await)
    }

    /// Partial update. Every provided field is validated before anything is
    /// written; date and time are format-checked only on this path.
    pub async fn update_appointment(
        &self,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
        auth_token: &str,
    ) -> Result<AppointmentView, SchedulingError> {
        let current = self.appointments.get(appointment_id, auth_token).await?;

        let new_date = request.date.as_deref().map(parse_wire_date).transpose()?;
        let new_time = request.time.as_deref().map(parse_wire_time).transpose()?;

        if let Some(status) = &request.status {
            self.lifecycle.validate_transition(&current.status, status)?;
        }

        let mut update_data = Map::new();
        if let Some(date) = new_date {
            update_data.insert("date".to_string(), json!(date.to_string()));
        }
        if let Some(time) = new_time {
            update_data.insert(
                "time".to_string(),
                json!(time.format("%H:%M:%S").to_string()),
            );
        }
        if let Some(appointment_type) = &request.appointment_type {
            update_data.insert("appointment_type".to_string(), json!(appointment_type));
        }
        if let Some(status) = &request.status {
            update_data.insert("status".to_string(), json!(status));
        }
        if let Some(notes) = &request.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let updated = self
            .appointments
            .update_fields(appointment_id, update_data, auth_token)
            .await?;
        info!("Appointment {} updated", appointment_id);

        Ok(self.into_view(updated, auth_token).await)
    }

    /// Cancellation is a status change; the row is kept.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        reason: Option<String>,
        auth_token: &str,
    ) -> Result<(), SchedulingError> {
        info!("Canceling appointment {}", appointment_id);

        let request = UpdateAppointmentRequest {
            date: None,
            time: None,
            appointment_type: None,
            status: Some(AppointmentStatus::Canceled),
            notes: reason,
        };
        self.update_appointment(appointment_id, request, auth_token)
            .await?;
        Ok(())
    }

    /// Move an appointment to a new slot. The new time is held to the same
    /// catalog-alignment rule as booking and the status becomes rescheduled.
    pub async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
        auth_token: &str,
    ) -> Result<AppointmentView, SchedulingError> {
        let time = parse_wire_time(&request.new_time)?;
        if !self.catalog.contains(time) {
            return Err(SchedulingError::InvalidTime(format!(
                "{} is not a bookable slot time",
                request.new_time
            )));
        }
        parse_wire_date(&request.new_date)?;

        info!(
            "Rescheduling appointment {} to {} at {}",
            appointment_id, request.new_date, request.new_time
        );

        let update = UpdateAppointmentRequest {
            date: Some(request.new_date),
            time: Some(request.new_time),
            appointment_type: None,
            status: Some(AppointmentStatus::Rescheduled),
            notes: request.reason,
        };
        self.update_appointment(appointment_id, update, auth_token)
            .await
    }

    pub async fn list_clinician_appointments(
        &self,
        clinician_id: Uuid,
        from: Option<&str>,
        to: Option<&str>,
        auth_token: &str,
    ) -> Result<Vec<AppointmentSummary>, SchedulingError> {
        let from = from.map(parse_wire_date).transpose()?;
        let to = to.map(parse_wire_date).transpose()?;

        let appointments = self
            .appointments
            .list_for_clinician(clinician_id, from, to, auth_token)
            .await?;
        Ok(self.summarize(appointments, auth_token).await)
    }

    pub async fn list_patient_appointments(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<AppointmentSummary>, SchedulingError> {
        let appointments = self
            .appointments
            .list_for_patient(patient_id, auth_token)
            .await?;
        Ok(self.summarize(appointments, auth_token).await)
    }

    async fn into_view(&self, appointment: Appointment, auth_token: &str) -> AppointmentView {
        let clinician_name = self
            .directory
            .clinician_display_name(appointment.clinician_id, auth_token)
            .await;
        let patient_name = self
            .directory
            .patient_display_name(appointment.patient_id, auth_token)
            .await;
        AppointmentView::from_appointment(appointment, clinician_name, patient_name)
    }

    /// Names are resolved once per unique id across the batch.
    async fn summarize(
        &self,
        appointments: Vec<Appointment>,
        auth_token: &str,
    ) -> Vec<AppointmentSummary> {
        let mut clinician_names: HashMap<Uuid, String> = HashMap::new();
        let mut patient_names: HashMap<Uuid, String> = HashMap::new();

        let mut summaries = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            let clinician_name = match clinician_names.get(&appointment.clinician_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .directory
                        .clinician_display_name(appointment.clinician_id, auth_token)
                        .await;
                    clinician_names.insert(appointment.clinician_id, name.clone());
                    name
                }
            };
            let patient_name = match patient_names.get(&appointment.patient_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .directory
                        .patient_display_name(appointment.patient_id, auth_token)
                        .await;
                    patient_names.insert(appointment.patient_id, name.clone());
                    name
                }
            };

            summaries.push(AppointmentSummary {
                id: appointment.id,
                clinician_id: appointment.clinician_id,
                clinician_name,
                patient_id: appointment.patient_id,
                patient_name,
                date: appointment.date,
                time: appointment.time,
                appointment_type: appointment.appointment_type,
                status: appointment.status,
                confirmation_code: appointment.confirmation_code,
            });
        }

        summaries
    }
}
