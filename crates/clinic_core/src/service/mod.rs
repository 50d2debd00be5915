//! Clinic use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into booking, prescribing and billing
//!   use-cases.
//! - Turn storage constraint failures into use-case errors.
//!
//! # Invariants
//! - Services never bypass repository validation/persistence contracts.
//! - Services remain storage-agnostic; they only see repository traits.

pub mod billing_service;
pub mod booking_service;
pub mod prescription_service;
