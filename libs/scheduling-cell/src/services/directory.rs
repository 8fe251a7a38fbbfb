use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use shared_database::SupabaseClient;

/// Display-name resolution for the denormalized views. Resolution never
/// fails the calling operation: a miss falls back to the seeded demo names,
/// then to a generic label.
pub struct UserDirectory {
    supabase: Arc<SupabaseClient>,
}

// Seeded demo identities, kept for environments that run without a populated
// profiles table.
const MOCK_CLINICIAN_NAMES: &[(&str, &str)] = &[
    ("3f2c8d1e-5b4a-4c6d-8e7f-9a0b1c2d3e4f", "Dr. Sarah Chen"),
    ("7a9b2c4d-6e8f-4a1b-9c3d-5e7f9a1b3c5d", "Dr. Miguel Alvarez"),
    ("b1d3f5a7-9c2e-4b6d-8f0a-2c4e6a8b0d2f", "Dr. Amara Okafor"),
];

const MOCK_PATIENT_NAMES: &[(&str, &str)] = &[
    ("9e8d7c6b-5a4f-4e3d-2c1b-0a9f8e7d6c5b", "Jordan Ellis"),
    ("1a2b3c4d-5e6f-4a7b-8c9d-0e1f2a3b4c5d", "Priya Raman"),
    ("5f4e3d2c-1b0a-4f9e-8d7c-6b5a4f3e2d1c", "Tomas Lindqvist"),
];

impl UserDirectory {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn clinician_display_name(&self, clinician_id: Uuid, auth_token: &str) -> String {
        self.display_name(clinician_id, MOCK_CLINICIAN_NAMES, "Unknown Doctor", auth_token)
            .await
    }

    pub async fn patient_display_name(&self, patient_id: Uuid, auth_token: &str) -> String {
        self.display_name(patient_id, MOCK_PATIENT_NAMES, "Unknown Patient", auth_token)
            .await
    }

    async fn display_name(
        &self,
        user_id: Uuid,
        mock_names: &[(&str, &str)],
        fallback: &str,
        auth_token: &str,
    ) -> String {
        let path = format!("/rest/v1/profiles?id=eq.{}&select=full_name", user_id);

        match self
            .supabase
            .request::<Vec<Value>>(Method::GET, &path, Some(auth_token), None)
            .await
        {
            Ok(rows) => {
                if let Some(name) = rows.first().and_then(|row| row["full_name"].as_str()) {
                    if !name.is_empty() {
                        return name.to_string();
                    }
                }
            }
            Err(e) => {
                warn!("Profile lookup failed for {}: {}", user_id, e);
            }
        }

        let key = user_id.to_string();
        mock_names
            .iter()
            .find(|(id, _)| *id == key)
            .map(|(_, name)| (*name).to_string())
            .unwrap_or_else(|| fallback.to_string())
    }
}
