//! Appointment booking and lifecycle service.
//!
//! # Responsibility
//! - Book appointments and move them through the lifecycle.
//! - Report double-booking as `BookingError::SlotTaken`.
//!
//! # Invariants
//! - Only legal `AppointmentStatus` transitions are written.
//! - Only `scheduled` appointments can be rescheduled.
//! - Slot conflicts are never retried or resolved here.

use crate::model::appointment::{Appointment, AppointmentId, AppointmentStatus};
use crate::model::doctor::DoctorId;
use crate::model::patient::PatientId;
use crate::model::room::RoomId;
use crate::repo::appointment_repo::{AppointmentListQuery, AppointmentRepository};
use crate::repo::{ConstraintKind, RepoError};
use log::{info, warn};
use thiserror::Error;

/// Default slot length when a request does not name one.
pub const DEFAULT_APPOINTMENT_MINUTES: u32 = 30;

/// Errors from booking use-cases.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("doctor {doctor_id} already has an appointment at {scheduled_at}")]
    SlotTaken { doctor_id: DoctorId, scheduled_at: i64 },
    #[error("appointment not found: {0}")]
    AppointmentNotFound(AppointmentId),
    /// Patient, doctor or room referenced by the request does not exist.
    #[error("booking references an unknown patient, doctor or room")]
    UnknownReference,
    #[error("cannot move appointment from `{from}` to `{to}`")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("appointment in status `{0}` cannot be rescheduled")]
    NotReschedulable(AppointmentStatus),
    /// Another writer changed the status between read and write.
    #[error("appointment {0} changed concurrently; reload and retry")]
    Conflict(AppointmentId),
    #[error("{0}")]
    Repo(RepoError),
}

impl From<RepoError> for BookingError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::SlotTaken {
                doctor_id,
                scheduled_at,
            } => Self::SlotTaken {
                doctor_id,
                scheduled_at,
            },
            RepoError::NotFound {
                entity: "appointment",
                id,
            } => Self::AppointmentNotFound(id),
            RepoError::Constraint(violation) if violation.kind == ConstraintKind::ForeignKey => {
                Self::UnknownReference
            }
            other => Self::Repo(other),
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;

/// Request model for booking one appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub room_id: Option<RoomId>,
    /// Slot start in epoch milliseconds.
    pub scheduled_at: i64,
    /// Falls back to the service default when `None`.
    pub duration_minutes: Option<u32>,
    pub reason: Option<String>,
}

/// Use-case service for appointment booking.
pub struct BookingService<R: AppointmentRepository> {
    repo: R,
    default_duration_minutes: u32,
}

impl<R: AppointmentRepository> BookingService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_default_duration(repo, DEFAULT_APPOINTMENT_MINUTES)
    }

    pub fn with_default_duration(repo: R, default_duration_minutes: u32) -> Self {
        Self {
            repo,
            default_duration_minutes,
        }
    }

    /// Books a `scheduled` appointment.
    ///
    /// # Errors
    /// - `SlotTaken` when the doctor already holds the identical instant.
    /// - `UnknownReference` when patient, doctor or room does not exist.
    pub fn book(&self, request: &BookingRequest) -> BookingResult<Appointment> {
        let mut appointment = Appointment::new(
            request.patient_id,
            request.doctor_id,
            request.scheduled_at,
            request
                .duration_minutes
                .unwrap_or(self.default_duration_minutes),
        );
        appointment.room_id = request.room_id;
        appointment.reason = request.reason.clone();

        match self.repo.create_appointment(&appointment) {
            Ok(_) => {
                info!(
                    "event=appointment_book module=booking status=ok appointment_id={} doctor_id={} scheduled_at={}",
                    appointment.uuid, appointment.doctor_id, appointment.scheduled_at
                );
                Ok(appointment)
            }
            Err(err) => {
                let err = BookingError::from(err);
                warn!(
                    "event=appointment_book module=booking status=error doctor_id={} scheduled_at={} error={}",
                    request.doctor_id, request.scheduled_at, err
                );
                Err(err)
            }
        }
    }

    /// Moves a `scheduled` appointment to a new slot start.
    pub fn reschedule(&self, id: AppointmentId, scheduled_at: i64) -> BookingResult<Appointment> {
        let current = self.load(id)?;
        if current.status != AppointmentStatus::Scheduled {
            return Err(BookingError::NotReschedulable(current.status));
        }

        if !self
            .repo
            .reschedule(id, AppointmentStatus::Scheduled, scheduled_at)?
        {
            return Err(BookingError::Conflict(id));
        }
        info!(
            "event=appointment_reschedule module=booking status=ok appointment_id={id} scheduled_at={scheduled_at}"
        );
        self.load(id)
    }

    pub fn check_in(&self, id: AppointmentId) -> BookingResult<Appointment> {
        self.transition(id, AppointmentStatus::CheckedIn)
    }

    pub fn complete(&self, id: AppointmentId) -> BookingResult<Appointment> {
        self.transition(id, AppointmentStatus::Completed)
    }

    pub fn cancel(&self, id: AppointmentId) -> BookingResult<Appointment> {
        self.transition(id, AppointmentStatus::Cancelled)
    }

    pub fn mark_no_show(&self, id: AppointmentId) -> BookingResult<Appointment> {
        self.transition(id, AppointmentStatus::NoShow)
    }

    /// Applies one lifecycle step after checking it is legal.
    pub fn transition(
        &self,
        id: AppointmentId,
        next: AppointmentStatus,
    ) -> BookingResult<Appointment> {
        let mut current = self.load(id)?;
        if !current.status.can_transition_to(next) {
            return Err(BookingError::InvalidTransition {
                from: current.status,
                to: next,
            });
        }

        if !self.repo.update_status(id, current.status, next)? {
            return Err(BookingError::Conflict(id));
        }
        info!(
            "event=appointment_status module=booking status=ok appointment_id={id} from={} to={}",
            current.status.as_str(),
            next.as_str()
        );
        current.status = next;
        Ok(current)
    }

    pub fn get(&self, id: AppointmentId) -> BookingResult<Option<Appointment>> {
        Ok(self.repo.get_appointment(id)?)
    }

    /// Lists a doctor's appointments with `scheduled_at` in `[from, to)`.
    pub fn doctor_schedule(
        &self,
        doctor_id: DoctorId,
        from: i64,
        to: i64,
    ) -> BookingResult<Vec<Appointment>> {
        Ok(self.repo.list_appointments(&AppointmentListQuery {
            doctor_id: Some(doctor_id),
            from: Some(from),
            to: Some(to),
            ..AppointmentListQuery::default()
        })?)
    }

    /// Lists every appointment of a patient, oldest first.
    pub fn patient_history(&self, patient_id: PatientId) -> BookingResult<Vec<Appointment>> {
        Ok(self.repo.list_appointments(&AppointmentListQuery {
            patient_id: Some(patient_id),
            ..AppointmentListQuery::default()
        })?)
    }

    pub fn list(&self, query: &AppointmentListQuery) -> BookingResult<Vec<Appointment>> {
        Ok(self.repo.list_appointments(query)?)
    }

    fn load(&self, id: AppointmentId) -> BookingResult<Appointment> {
        self.repo
            .get_appointment(id)?
            .ok_or(BookingError::AppointmentNotFound(id))
    }
}
