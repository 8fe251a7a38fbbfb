// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveTime;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    BookAppointmentRequest, CancelAppointmentRequest, RescheduleAppointmentRequest,
    SchedulingError, SetAvailabilityRequest, UpdateAppointmentRequest,
};
use crate::services::engine::SchedulingEngine;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct ClinicianAppointmentsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

// ==============================================================================
// ERROR MAPPING
// ==============================================================================

fn map_scheduling_error(e: SchedulingError) -> AppError {
    match e {
        SchedulingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        SchedulingError::SlotConflict => {
            AppError::Conflict("Time slot is already booked".to_string())
        }
        SchedulingError::InvalidDate(_)
        | SchedulingError::InvalidTime(_)
        | SchedulingError::InvalidRange(_)
        | SchedulingError::InvalidWeekdaySet(_)
        | SchedulingError::InvalidStatusTransition { .. } => AppError::BadRequest(e.to_string()),
        SchedulingError::ValidationError(msg) => AppError::ValidationError(msg),
        SchedulingError::CodeGenerationExhausted => AppError::Internal(e.to_string()),
        SchedulingError::Unauthorized(msg) => AppError::Auth(msg),
        SchedulingError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn format_times(times: &[NaiveTime]) -> Vec<String> {
    times
        .iter()
        .map(|time| time.format("%H:%M").to_string())
        .collect()
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppConfig>>,
    Path(clinician_id): Path<Uuid>,
    Query(params): Query<AvailabilityQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let engine = SchedulingEngine::from_config(&state);

    let availability = engine
        .get_availability(clinician_id, &params.date, auth.token())
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "availability": availability
    })))
}

#[axum::debug_handler]
pub async fn set_availability(
    State(state): State<Arc<AppConfig>>,
    Path(clinician_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let engine = SchedulingEngine::from_config(&state);

    let outcome = engine
        .set_availability(clinician_id, request, auth.token())
        .await
        .map_err(map_scheduling_error)?;

    let response = if outcome.recurring {
        json!({
            "success": true,
            "dates_affected": outcome.dates_affected,
            "time_slots": format_times(&outcome.time_slots),
            "message": "Recurring availability saved"
        })
    } else {
        json!({
            "success": true,
            "date": outcome.date.to_string(),
            "time_slots": format_times(&outcome.time_slots),
            "message": "Availability saved"
        })
    };

    Ok(Json(response))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let engine = SchedulingEngine::from_config(&state);

    let appointment = engine
        .book_appointment(request, auth.token())
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let engine = SchedulingEngine::from_config(&state);

    let appointment = engine
        .get_appointment(appointment_id, auth.token())
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let engine = SchedulingEngine::from_config(&state);

    let appointment = engine
        .update_appointment(appointment_id, request, auth.token())
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let engine = SchedulingEngine::from_config(&state);

    engine
        .cancel_appointment(appointment_id, request.reason, auth.token())
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment canceled successfully"
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let engine = SchedulingEngine::from_config(&state);

    let appointment = engine
        .reschedule_appointment(appointment_id, request, auth.token())
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment rescheduled successfully"
    })))
}

// ==============================================================================
// LISTING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_clinician_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(clinician_id): Path<Uuid>,
    Query(params): Query<ClinicianAppointmentsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let engine = SchedulingEngine::from_config(&state);

    let appointments = engine
        .list_clinician_appointments(
            clinician_id,
            params.from.as_deref(),
            params.to.as_deref(),
            auth.token(),
        )
        .await
        .map_err(map_scheduling_error)?;

    let count = appointments.len();
    Ok(Json(json!({
        "success": true,
        "count": count,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn list_patient_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let engine = SchedulingEngine::from_config(&state);

    let appointments = engine
        .list_patient_appointments(patient_id, auth.token())
        .await
        .map_err(map_scheduling_error)?;

    let count = appointments.len();
    Ok(Json(json!({
        "success": true,
        "count": count,
        "appointments": appointments
    })))
}
