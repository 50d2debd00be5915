//! Clinic domain model.
//!
//! # Responsibility
//! - Define the canonical records persisted by the clinic store.
//! - Own write-time validation shared by every repository.
//!
//! # Invariants
//! - Every record is identified by a stable `Uuid`.
//! - Timestamps are Unix epoch milliseconds.
//! - Money is carried as integer minor units (`*_cents`).

pub mod appointment;
pub mod billing;
pub mod doctor;
pub mod insurance;
pub mod patient;
pub mod prescription;
pub mod room;
pub mod validation;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in epoch milliseconds.
///
/// Clamps to `0` when the system clock is set before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
