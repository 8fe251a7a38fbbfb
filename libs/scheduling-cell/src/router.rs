// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn scheduling_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        // Clinician availability
        .route(
            "/clinicians/{clinician_id}/availability",
            get(handlers::get_availability),
        )
        .route(
            "/clinicians/{clinician_id}/availability",
            post(handlers::set_availability),
        )
        // Appointment lifecycle
        .route("/appointments", post(handlers::book_appointment))
        .route(
            "/appointments/{appointment_id}",
            get(handlers::get_appointment),
        )
        .route(
            "/appointments/{appointment_id}",
            put(handlers::update_appointment),
        )
        .route(
            "/appointments/{appointment_id}/cancel",
            post(handlers::cancel_appointment),
        )
        .route(
            "/appointments/{appointment_id}/reschedule",
            patch(handlers::reschedule_appointment),
        )
        // Calendars
        .route(
            "/clinicians/{clinician_id}/appointments",
            get(handlers::list_clinician_appointments),
        )
        .route(
            "/patients/{patient_id}/appointments",
            get(handlers::list_patient_appointments),
        )
        .with_state(state)
}
