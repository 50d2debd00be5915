//! Core domain logic for the clinic booking store.
//! This crate is the single source of truth for schema and booking invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ClinicConfig, ConfigError};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::appointment::{Appointment, AppointmentId, AppointmentStatus};
pub use model::billing::{Invoice, InvoiceId, InvoiceStatus, Payment, PaymentMethod};
pub use model::doctor::{Doctor, DoctorId, Specialization, SpecializationId};
pub use model::insurance::{InsuranceProvider, InsuranceProviderId, PatientInsurance};
pub use model::patient::{Gender, Patient, PatientId};
pub use model::prescription::{Medication, MedicationId, Prescription, PrescriptionItem};
pub use model::room::{Room, RoomId, RoomKind};
pub use model::validation::ValidationError;
pub use repo::appointment_repo::{
    AppointmentListQuery, AppointmentRepository, SqliteAppointmentRepository,
};
pub use repo::billing_repo::{
    BillingRepository, InvoiceBalance, PaymentOutcome, SqliteBillingRepository, VoidOutcome,
};
pub use repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
pub use repo::doctor_repo::{DoctorRepository, SqliteDoctorRepository};
pub use repo::patient_repo::{PatientListQuery, PatientRepository, SqlitePatientRepository};
pub use repo::prescription_repo::{PrescriptionRepository, SqlitePrescriptionRepository};
pub use repo::{ConstraintKind, ConstraintViolation, RepoError, RepoResult};
pub use service::billing_service::{
    BillingError, BillingService, IssueInvoiceRequest, PaymentRequest,
};
pub use service::booking_service::{BookingError, BookingRequest, BookingService};
pub use service::prescription_service::{PrescriptionError, PrescriptionService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
