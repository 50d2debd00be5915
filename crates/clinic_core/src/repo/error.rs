//! Repository error model and SQLite constraint classification.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use rusqlite::{ffi, ErrorCode};
use std::fmt::{Display, Formatter};
use thiserror::Error;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

const UNIQUE_FAILED_PREFIX: &str = "UNIQUE constraint failed: ";

/// Kind of integrity rule the storage engine refused to break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    PrimaryKey,
    ForeignKey,
    Check,
    NotNull,
    Other,
}

impl Display for ConstraintKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Unique => "unique",
            Self::PrimaryKey => "primary key",
            Self::ForeignKey => "foreign key",
            Self::Check => "check",
            Self::NotNull => "not null",
            Self::Other => "integrity",
        };
        f.write_str(label)
    }
}

/// A write rejected by a declared schema constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} constraint violated: {detail}")]
pub struct ConstraintViolation {
    pub kind: ConstraintKind,
    /// Engine message, e.g. `UNIQUE constraint failed: doctors.license_number`.
    pub detail: String,
}

impl ConstraintViolation {
    /// Classifies a SQLite error. Returns `None` for non-constraint failures.
    pub fn from_sqlite(err: &rusqlite::Error) -> Option<Self> {
        let rusqlite::Error::SqliteFailure(failure, message) = err else {
            return None;
        };
        if failure.code != ErrorCode::ConstraintViolation {
            return None;
        }

        let detail = message.clone().unwrap_or_else(|| failure.to_string());
        let kind = match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE => ConstraintKind::Unique,
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY => ConstraintKind::PrimaryKey,
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ConstraintKind::ForeignKey,
            ffi::SQLITE_CONSTRAINT_CHECK => ConstraintKind::Check,
            ffi::SQLITE_CONSTRAINT_NOTNULL => ConstraintKind::NotNull,
            _ => kind_from_message(&detail),
        };
        Some(Self { kind, detail })
    }

    /// Returns whether this is a uniqueness failure covering exactly `columns`
    /// of `table`, in declaration order.
    pub fn is_unique_on(&self, table: &str, columns: &[&str]) -> bool {
        if self.kind != ConstraintKind::Unique {
            return false;
        }
        let expected = columns
            .iter()
            .map(|column| format!("{table}.{column}"))
            .collect::<Vec<_>>()
            .join(", ");
        self.detail.strip_prefix(UNIQUE_FAILED_PREFIX) == Some(expected.as_str())
    }

    /// Returns whether this is a check failure for the named constraint.
    pub fn is_check(&self, constraint_name: &str) -> bool {
        self.kind == ConstraintKind::Check && self.detail.contains(constraint_name)
    }
}

fn kind_from_message(message: &str) -> ConstraintKind {
    if message.starts_with("UNIQUE") {
        ConstraintKind::Unique
    } else if message.starts_with("FOREIGN KEY") {
        ConstraintKind::ForeignKey
    } else if message.starts_with("CHECK") {
        ConstraintKind::Check
    } else if message.starts_with("NOT NULL") {
        ConstraintKind::NotNull
    } else {
        ConstraintKind::Other
    }
}

/// Error for clinic persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("{0}")]
    Constraint(ConstraintViolation),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },
    /// Double-booking: the doctor already holds an appointment at this instant.
    #[error("doctor {doctor_id} already has an appointment at {scheduled_at}")]
    SlotTaken { doctor_id: Uuid, scheduled_at: i64 },
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error(
        "connection schema version {actual_version} does not match expected {expected_version}"
    )]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
    #[error("connection has foreign key enforcement disabled")]
    ForeignKeysDisabled,
}

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    /// Returns the constraint violation carried by this error, if any.
    pub fn constraint(&self) -> Option<&ConstraintViolation> {
        match self {
            Self::Constraint(violation) => Some(violation),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match ConstraintViolation::from_sqlite(&value) {
            Some(violation) => Self::Constraint(violation),
            None => Self::Db(DbError::Sqlite(value)),
        }
    }
}
