//! Appointment record and lifecycle.
//!
//! # Responsibility
//! - Define the scheduled encounter between a patient and a doctor.
//! - Own the legal status transitions.
//!
//! # Invariants
//! - `(doctor_id, scheduled_at)` is unique across all appointments,
//!   regardless of status. Storage enforces this at write time.
//! - `duration_minutes` is positive.
//! - `completed`, `cancelled` and `no_show` are terminal.

use crate::model::doctor::DoctorId;
use crate::model::patient::PatientId;
use crate::model::room::RoomId;
use crate::model::validation::{require_non_negative, require_positive, ValidationResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type AppointmentId = Uuid;

/// Appointment lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Booked and awaiting the patient.
    #[default]
    Scheduled,
    /// Patient arrived at the clinic.
    CheckedIn,
    /// Patient never arrived.
    NoShow,
    /// Called off before the encounter took place.
    Cancelled,
    /// Encounter finished.
    Completed,
}

impl AppointmentStatus {
    pub const ALL: [Self; 5] = [
        Self::Scheduled,
        Self::CheckedIn,
        Self::NoShow,
        Self::Cancelled,
        Self::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::CheckedIn => "checked_in",
            Self::NoShow => "no_show",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(Self::Scheduled),
            "checked_in" => Some(Self::CheckedIn),
            "no_show" => Some(Self::NoShow),
            "cancelled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::NoShow | Self::Cancelled | Self::Completed)
    }

    /// Returns whether moving from `self` to `next` is a legal lifecycle step.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::CheckedIn)
                | (Self::Scheduled, Self::NoShow)
                | (Self::Scheduled, Self::Cancelled)
                | (Self::CheckedIn, Self::Completed)
                | (Self::CheckedIn, Self::Cancelled)
        )
    }
}

impl Display for AppointmentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub uuid: AppointmentId,
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    /// Cleared automatically when the room is deleted.
    pub room_id: Option<RoomId>,
    /// Slot start, Unix epoch milliseconds.
    pub scheduled_at: i64,
    pub duration_minutes: u32,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl Appointment {
    /// Creates a `scheduled` appointment with a generated stable ID.
    pub fn new(
        patient_id: PatientId,
        doctor_id: DoctorId,
        scheduled_at: i64,
        duration_minutes: u32,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            patient_id,
            doctor_id,
            room_id: None,
            scheduled_at,
            duration_minutes,
            status: AppointmentStatus::Scheduled,
            reason: None,
            notes: None,
        }
    }

    /// Slot end, Unix epoch milliseconds. Saturates at `i64::MAX`.
    pub fn ends_at(&self) -> i64 {
        self.scheduled_at
            .saturating_add(i64::from(self.duration_minutes) * 60_000)
    }

    pub fn validate(&self) -> ValidationResult {
        require_non_negative("scheduled_at", self.scheduled_at)?;
        require_positive("duration_minutes", i64::from(self.duration_minutes))?;
        Ok(())
    }
}
