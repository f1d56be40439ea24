//! Completed diagnosis records.

use serde::{Deserialize, Serialize};

/// An immutable record of a finished diagnosis session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosisRecord {
    /// Unique record ID
    pub id: String,
    /// User who ran the diagnosis
    pub user_email: String,
    /// Symptom codes answered "yes", in the order they were asked
    pub symptom_codes: Vec<String>,
    /// Resulting disease code
    pub disease_code: String,
    /// Creation timestamp
    pub created_at: String,
}

impl DiagnosisRecord {
    /// Create a new record stamped with a fresh ID and the current time.
    pub fn new(user_email: String, symptom_codes: Vec<String>, disease_code: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_email,
            symptom_codes,
            disease_code,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Check if a symptom was reported.
    pub fn reported(&self, code: &str) -> bool {
        self.symptom_codes.iter().any(|c| c == code)
    }
}
