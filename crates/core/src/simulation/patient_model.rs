use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// Parameters chosen by the trainee before a practice session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    pub age: u32,
    pub ethnicity: String,
    /// Comma-separated list of conditions, most relevant first.
    pub diseases: String,
    pub working_domain: String,
    pub gender: String,
    /// Planned length of the session in minutes.
    pub session_duration: u32,
}

impl PatientProfile {
    pub fn validate(&self) -> Result<()> {
        if self.age == 0 || self.age > 120 {
            return Err(ValidationError::invalid("age", "must be between 1 and 120").into());
        }
        if self.diseases.trim().is_empty() {
            return Err(ValidationError::MissingField("diseases".into()).into());
        }
        Ok(())
    }

    pub fn primary_condition(&self) -> &str {
        self.diseases.split(',').next().unwrap_or_default().trim()
    }
}
