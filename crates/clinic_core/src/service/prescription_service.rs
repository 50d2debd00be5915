//! Prescription use-case service.
//!
//! # Invariants
//! - A prescription carries at least one item.
//! - Cancelled and no-show appointments cannot receive prescriptions.

use crate::model::appointment::{AppointmentId, AppointmentStatus};
use crate::model::now_epoch_ms;
use crate::model::prescription::{Prescription, PrescriptionItem};
use crate::repo::prescription_repo::PrescriptionRepository;
use crate::repo::{ConstraintKind, RepoError};
use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrescriptionError {
    #[error("prescription must contain at least one item")]
    Empty,
    #[error("appointment not found: {0}")]
    AppointmentNotFound(AppointmentId),
    #[error("appointment is `{0}` and cannot receive prescriptions")]
    AppointmentClosed(AppointmentStatus),
    /// An item names a medication missing from the catalog.
    #[error("prescription references an unknown medication")]
    UnknownMedication,
    #[error("prescription lists the same medication twice")]
    DuplicateMedication,
    #[error("{0}")]
    Repo(#[from] RepoError),
}

pub type PrescriptionResult<T> = Result<T, PrescriptionError>;

pub struct PrescriptionService<R: PrescriptionRepository> {
    repo: R,
}

impl<R: PrescriptionRepository> PrescriptionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Issues a prescription with `items` for an appointment.
    pub fn prescribe(
        &mut self,
        appointment_id: AppointmentId,
        items: Vec<PrescriptionItem>,
        notes: Option<String>,
    ) -> PrescriptionResult<Prescription> {
        if items.is_empty() {
            return Err(PrescriptionError::Empty);
        }

        match self.repo.appointment_status(appointment_id)? {
            None => return Err(PrescriptionError::AppointmentNotFound(appointment_id)),
            Some(status @ (AppointmentStatus::Cancelled | AppointmentStatus::NoShow)) => {
                return Err(PrescriptionError::AppointmentClosed(status));
            }
            Some(_) => {}
        }

        let mut prescription = Prescription::new(appointment_id, now_epoch_ms());
        prescription.items = items;
        prescription.notes = notes;

        match self.repo.create_prescription(&prescription) {
            Ok(_) => {
                info!(
                    "event=prescription_issue module=prescription status=ok prescription_id={} appointment_id={} items={}",
                    prescription.uuid,
                    appointment_id,
                    prescription.items.len()
                );
                Ok(prescription)
            }
            Err(RepoError::Constraint(violation))
                if violation.kind == ConstraintKind::ForeignKey =>
            {
                Err(PrescriptionError::UnknownMedication)
            }
            Err(RepoError::Constraint(violation))
                if matches!(
                    violation.kind,
                    ConstraintKind::PrimaryKey | ConstraintKind::Unique
                ) && violation.detail.contains("prescription_items") =>
            {
                Err(PrescriptionError::DuplicateMedication)
            }
            Err(other) => Err(other.into()),
        }
    }

    pub fn for_appointment(
        &self,
        appointment_id: AppointmentId,
    ) -> PrescriptionResult<Vec<Prescription>> {
        Ok(self.repo.list_for_appointment(appointment_id)?)
    }
}
