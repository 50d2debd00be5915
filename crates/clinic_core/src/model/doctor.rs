//! Doctor and specialization records.
//!
//! # Invariants
//! - `license_number` is unique across doctors.
//! - Specialization names are unique, compared case-insensitively.

use crate::model::validation::{check_email, check_phone, require_text, ValidationResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DoctorId = Uuid;
pub type SpecializationId = Uuid;

/// A clinician who can hold appointments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub uuid: DoctorId,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Doctor {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        license_number: impl Into<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            license_number: license_number.into(),
            phone: None,
            email: None,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)?;
        require_text("license_number", &self.license_number)?;
        check_phone(self.phone.as_deref())?;
        check_email(self.email.as_deref())?;
        Ok(())
    }
}

/// A medical discipline a doctor can be linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialization {
    pub uuid: SpecializationId,
    pub name: String,
    pub description: Option<String>,
}

impl Specialization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            description: None,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require_text("name", &self.name)
    }
}
