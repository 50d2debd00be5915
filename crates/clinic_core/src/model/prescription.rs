//! Medications and prescriptions issued at appointments.
//!
//! # Invariants
//! - A prescription lists each medication at most once.
//! - `duration_days` is a positive count of days.

use crate::model::appointment::AppointmentId;
use crate::model::validation::{require_positive, require_text, ValidationResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MedicationId = Uuid;
pub type PrescriptionId = Uuid;

/// Catalog entry, identified by name, form and strength together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub uuid: MedicationId,
    pub name: String,
    /// e.g. `tablet`, `syrup`. Empty when not applicable.
    pub form: String,
    /// e.g. `500 mg`. Empty when not applicable.
    pub strength: String,
}

impl Medication {
    pub fn new(
        name: impl Into<String>,
        form: impl Into<String>,
        strength: impl Into<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            form: form.into(),
            strength: strength.into(),
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require_text("name", &self.name)
    }
}

/// One prescribed medication line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionItem {
    pub medication_id: MedicationId,
    pub dosage: String,
    pub frequency: String,
    pub duration_days: u32,
    pub instructions: Option<String>,
}

impl PrescriptionItem {
    pub fn validate(&self) -> ValidationResult {
        require_text("dosage", &self.dosage)?;
        require_text("frequency", &self.frequency)?;
        require_positive("duration_days", i64::from(self.duration_days))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub uuid: PrescriptionId,
    pub appointment_id: AppointmentId,
    /// Unix epoch milliseconds.
    pub issued_at: i64,
    pub notes: Option<String>,
    pub items: Vec<PrescriptionItem>,
}

impl Prescription {
    pub fn new(appointment_id: AppointmentId, issued_at: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            appointment_id,
            issued_at,
            notes: None,
            items: Vec::new(),
        }
    }

    pub fn validate(&self) -> ValidationResult {
        for item in &self.items {
            item.validate()?;
        }
        Ok(())
    }
}
