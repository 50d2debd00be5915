//! Patient directory record.
//!
//! # Invariants
//! - `phone` is mandatory and unique across patients.
//! - `email` is optional but unique when present.

use crate::model::validation::{
    check_date, check_email, check_phone, require_text, ValidationResult,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PatientId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    Other,
    #[default]
    Unspecified,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
            Self::Other => "other",
            Self::Unspecified => "unspecified",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "female" => Some(Self::Female),
            "male" => Some(Self::Male),
            "other" => Some(Self::Other),
            "unspecified" => Some(Self::Unspecified),
            _ => None,
        }
    }
}

/// A person receiving care.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub uuid: PatientId,
    pub first_name: String,
    pub last_name: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date_of_birth: Option<String>,
    pub gender: Gender,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl Patient {
    /// Creates a patient with a generated stable ID and no optional details.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth: None,
            gender: Gender::Unspecified,
            phone: phone.into(),
            email: None,
            address: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn validate(&self) -> ValidationResult {
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)?;
        require_text("phone", &self.phone)?;
        check_phone(Some(self.phone.as_str()))?;
        check_email(self.email.as_deref())?;
        check_date(self.date_of_birth.as_deref())?;
        Ok(())
    }
}
