use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::{AvailabilitySlot, RecurringPattern, SchedulingError};

/// Persistence for explicit availability rows and recurring-pattern audit
/// records. One row per (clinician, date, time); absence of a row means the
/// slot is closed.
pub struct AvailabilityStore {
    supabase: Arc<SupabaseClient>,
}

impl AvailabilityStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// All explicit availability rows for a clinician on one date.
    pub async fn slots_for_date(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AvailabilitySlot>, SchedulingError> {
        debug!("Loading availability rows for {} on {}", clinician_id, date);

        let path = format!(
            "/rest/v1/availability_slots?clinician_id=eq.{}&date=eq.{}&order=time.asc",
            clinician_id, date
        );

        let rows = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(rows)
    }

    /// Upsert `available = true` rows for the given times on one date, keyed
    /// on (clinician_id, date, time). Existing rows are merged rather than
    /// duplicated, so re-running a request converges on the same state.
    pub async fn upsert_slots(
        &self,
        clinician_id: Uuid,
        date: NaiveDate,
        times: &[NaiveTime],
        auth_token: &str,
    ) -> Result<(), SchedulingError> {
        if times.is_empty() {
            return Ok(());
        }

        debug!(
            "Upserting {} availability rows for {} on {}",
            times.len(),
            clinician_id,
            date
        );

        let now = Utc::now().to_rfc3339();
        let rows: Vec<Value> = times
            .iter()
            .map(|time| {
                // id and created_at come from column defaults so that merged
                // rows keep their identity.
                json!({
                    "clinician_id": clinician_id,
                    "date": date.to_string(),
                    "time": time.format("%H:%M:%S").to_string(),
                    "available": true,
                    "updated_at": now,
                })
            })
            .collect();

        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
        );

        let upserted: Vec<AvailabilitySlot> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/availability_slots?on_conflict=clinician_id,date,time",
                Some(auth_token),
                Some(Value::Array(rows)),
                Some(headers),
            )
            .await?;

        if upserted.len() != times.len() {
            return Err(SchedulingError::DatabaseError(format!(
                "availability upsert wrote {} of {} rows",
                upserted.len(),
                times.len()
            )));
        }

        Ok(())
    }

    /// Record the audit row for a recurring availability request.
    pub async fn record_pattern(
        &self,
        pattern: &RecurringPattern,
        auth_token: &str,
    ) -> Result<(), SchedulingError> {
        debug!(
            "Recording recurring pattern {} for {}",
            pattern.id, pattern.clinician_id
        );

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let body = serde_json::to_value(pattern)
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))?;

        let created: Vec<RecurringPattern> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/recurring_patterns",
                Some(auth_token),
                Some(body),
                Some(headers),
            )
            .await?;

        if created.is_empty() {
            return Err(SchedulingError::DatabaseError(
                "recurring pattern insert returned no rows".to_string(),
            ));
        }

        Ok(())
    }
}
