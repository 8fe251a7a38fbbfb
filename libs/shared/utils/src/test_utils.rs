use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;

/// Test configuration pointed at a Supabase double (usually a wiremock
/// server). Keeps test setup to one line per suite.
pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn for_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            ..Default::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Canned PostgREST rows matching the production table shapes.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn availability_slot(
        clinician_id: &str,
        date: &str,
        time: &str,
        available: bool,
    ) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "clinician_id": clinician_id,
            "date": date,
            "time": time,
            "available": available,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn appointment(
        id: &str,
        clinician_id: &str,
        patient_id: &str,
        date: &str,
        time: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "clinician_id": clinician_id,
            "patient_id": patient_id,
            "date": date,
            "time": time,
            "appointment_type": "virtual",
            "status": status,
            "notes": null,
            "confirmation_code": "A1B2C3",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn profile(id: &str, full_name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "full_name": full_name
        })
    }
}
