//! Insurance providers and patient coverage links.
//!
//! # Invariants
//! - A patient links to a provider at most once.
//! - `member_number` is unique within one provider.

use crate::model::patient::PatientId;
use crate::model::validation::{check_email, check_phone, require_text, ValidationResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type InsuranceProviderId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceProvider {
    pub uuid: InsuranceProviderId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl InsuranceProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            phone: None,
            email: None,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require_text("name", &self.name)?;
        check_phone(self.phone.as_deref())?;
        check_email(self.email.as_deref())?;
        Ok(())
    }
}

/// Coverage of one patient by one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInsurance {
    pub patient_id: PatientId,
    pub provider_id: InsuranceProviderId,
    pub member_number: String,
    pub is_primary: bool,
}

impl PatientInsurance {
    pub fn validate(&self) -> ValidationResult {
        require_text("member_number", &self.member_number)
    }
}
