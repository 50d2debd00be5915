//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per aggregate.
//! - Isolate SQL details from service orchestration.
//! - Translate storage constraint failures into typed errors.
//!
//! # Invariants
//! - Repository writes call the record's `validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Repositories only accept fully migrated connections with foreign keys on.

pub mod appointment_repo;
pub mod billing_repo;
pub mod directory_repo;
pub mod doctor_repo;
mod error;
pub mod patient_repo;
pub mod prescription_repo;
mod support;

pub use error::{ConstraintKind, ConstraintViolation, RepoError, RepoResult};
