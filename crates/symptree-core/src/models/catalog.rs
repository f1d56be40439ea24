//! Symptom and disease catalog models.

use serde::{Deserialize, Serialize};

/// A symptom the decision tree can ask about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Symptom {
    /// Symptom code (e.g., "G01") - unique identifier
    pub code: String,
    /// Question text shown to the user
    pub name: String,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Symptom {
    /// Create a new symptom with required fields.
    pub fn new(code: String, name: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            code,
            name,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Render the yes/no question for this symptom.
    pub fn question(&self) -> String {
        format!("Do you experience: {}?", self.name)
    }
}

/// A disease a diagnosis can conclude with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Disease {
    /// Disease code (e.g., "P01") - unique identifier
    pub code: String,
    /// Display name
    pub name: String,
    /// Long-form description
    pub description: String,
    /// Handling/treatment advice
    pub solution: String,
    /// Stored illustration path, if any
    pub image_path: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Disease {
    /// Create a new disease with required fields.
    pub fn new(code: String, name: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            code,
            name,
            description: String::new(),
            solution: String::new(),
            image_path: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symptom_question() {
        let symptom = Symptom::new("G01".into(), "persistent cough".into());
        assert_eq!(symptom.question(), "Do you experience: persistent cough?");
    }

    #[test]
    fn test_new_disease_defaults() {
        let disease = Disease::new("P01".into(), "Bronchitis".into());
        assert_eq!(disease.code, "P01");
        assert!(disease.description.is_empty());
        assert!(disease.image_path.is_none());
        assert_eq!(disease.created_at, disease.updated_at);
    }
}
