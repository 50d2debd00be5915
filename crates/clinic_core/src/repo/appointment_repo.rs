//! Appointment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist appointments and their lifecycle status.
//! - Surface double-booking as `RepoError::SlotTaken`.
//!
//! # Invariants
//! - `(doctor_uuid, scheduled_at)` uniqueness is enforced by storage on both
//!   insert and update; no pre-check query is trusted.
//! - Status updates are compare-and-set against the expected current status.
//!
//! No retry or automatic rescheduling happens here; conflicts go to callers.

use crate::model::appointment::{Appointment, AppointmentId, AppointmentStatus};
use crate::model::doctor::DoctorId;
use crate::model::patient::PatientId;
use crate::repo::support::{
    delete_by_uuid, ensure_connection_ready, parse_enum, parse_optional_uuid, parse_uuid,
    push_pagination,
};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const REQUIRED_TABLES: &[&str] = &["appointments", "patients", "doctors", "rooms"];

const APPOINTMENT_SELECT_SQL: &str = "SELECT
    uuid,
    patient_uuid,
    doctor_uuid,
    room_uuid,
    scheduled_at,
    duration_minutes,
    status,
    reason,
    notes
FROM appointments";

/// Query options for listing appointments.
///
/// `from`/`to` bound `scheduled_at` as a half-open `[from, to)` range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentListQuery {
    pub doctor_id: Option<DoctorId>,
    pub patient_id: Option<PatientId>,
    pub status: Option<AppointmentStatus>,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for appointment persistence.
pub trait AppointmentRepository {
    fn create_appointment(&self, appointment: &Appointment) -> RepoResult<AppointmentId>;
    /// Replaces room, time, duration, reason and notes. Status is untouched.
    fn update_appointment(&self, appointment: &Appointment) -> RepoResult<()>;
    fn get_appointment(&self, id: AppointmentId) -> RepoResult<Option<Appointment>>;
    fn list_appointments(&self, query: &AppointmentListQuery) -> RepoResult<Vec<Appointment>>;
    /// Moves status from `expected` to `next`. Returns `false` when the row
    /// exists but is no longer in `expected`.
    fn update_status(
        &self,
        id: AppointmentId,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> RepoResult<bool>;
    /// Moves the slot start while the row is still in `expected` status.
    /// Returns `false` when the row exists but is in another status.
    fn reschedule(
        &self,
        id: AppointmentId,
        expected: AppointmentStatus,
        scheduled_at: i64,
    ) -> RepoResult<bool>;
    fn delete_appointment(&self, id: AppointmentId) -> RepoResult<()>;
}

/// SQLite-backed appointment repository.
pub struct SqliteAppointmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAppointmentRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn exists(&self, id: AppointmentId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM appointments WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl AppointmentRepository for SqliteAppointmentRepository<'_> {
    fn create_appointment(&self, appointment: &Appointment) -> RepoResult<AppointmentId> {
        appointment.validate()?;

        self.conn
            .execute(
                "INSERT INTO appointments (
                    uuid,
                    patient_uuid,
                    doctor_uuid,
                    room_uuid,
                    scheduled_at,
                    duration_minutes,
                    status,
                    reason,
                    notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                params![
                    appointment.uuid.to_string(),
                    appointment.patient_id.to_string(),
                    appointment.doctor_id.to_string(),
                    appointment.room_id.map(|id| id.to_string()),
                    appointment.scheduled_at,
                    appointment.duration_minutes,
                    appointment.status.as_str(),
                    appointment.reason.as_deref(),
                    appointment.notes.as_deref(),
                ],
            )
            .map_err(|err| slot_error(err, appointment.doctor_id, appointment.scheduled_at))?;

        Ok(appointment.uuid)
    }

    fn update_appointment(&self, appointment: &Appointment) -> RepoResult<()> {
        appointment.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE appointments
                 SET
                    room_uuid = ?1,
                    scheduled_at = ?2,
                    duration_minutes = ?3,
                    reason = ?4,
                    notes = ?5,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?6;",
                params![
                    appointment.room_id.map(|id| id.to_string()),
                    appointment.scheduled_at,
                    appointment.duration_minutes,
                    appointment.reason.as_deref(),
                    appointment.notes.as_deref(),
                    appointment.uuid.to_string(),
                ],
            )
            .map_err(|err| slot_error(err, appointment.doctor_id, appointment.scheduled_at))?;

        if changed == 0 {
            return Err(RepoError::not_found("appointment", appointment.uuid));
        }
        Ok(())
    }

    fn get_appointment(&self, id: AppointmentId) -> RepoResult<Option<Appointment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{APPOINTMENT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_appointment_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_appointments(&self, query: &AppointmentListQuery) -> RepoResult<Vec<Appointment>> {
        let mut sql = format!("{APPOINTMENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(doctor_id) = query.doctor_id {
            sql.push_str(" AND doctor_uuid = ?");
            bind_values.push(Value::Text(doctor_id.to_string()));
        }
        if let Some(patient_id) = query.patient_id {
            sql.push_str(" AND patient_uuid = ?");
            bind_values.push(Value::Text(patient_id.to_string()));
        }
        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(from) = query.from {
            sql.push_str(" AND scheduled_at >= ?");
            bind_values.push(Value::Integer(from));
        }
        if let Some(to) = query.to {
            sql.push_str(" AND scheduled_at < ?");
            bind_values.push(Value::Integer(to));
        }

        sql.push_str(" ORDER BY scheduled_at ASC, doctor_uuid ASC, uuid ASC");
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut appointments = Vec::new();
        while let Some(row) = rows.next()? {
            appointments.push(parse_appointment_row(row)?);
        }
        Ok(appointments)
    }

    fn update_status(
        &self,
        id: AppointmentId,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE appointments
             SET
                status = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?2 AND status = ?3;",
            params![next.as_str(), id.to_string(), expected.as_str()],
        )?;

        if changed == 0 {
            if !self.exists(id)? {
                return Err(RepoError::not_found("appointment", id));
            }
            return Ok(false);
        }
        Ok(true)
    }

    fn reschedule(
        &self,
        id: AppointmentId,
        expected: AppointmentStatus,
        scheduled_at: i64,
    ) -> RepoResult<bool> {
        let current = self
            .get_appointment(id)?
            .ok_or_else(|| RepoError::not_found("appointment", id))?;
        let mut moved = current.clone();
        moved.scheduled_at = scheduled_at;
        moved.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE appointments
                 SET
                    scheduled_at = ?1,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?2 AND status = ?3;",
                params![scheduled_at, id.to_string(), expected.as_str()],
            )
            .map_err(|err| slot_error(err, current.doctor_id, scheduled_at))?;

        Ok(changed == 1)
    }

    fn delete_appointment(&self, id: AppointmentId) -> RepoResult<()> {
        delete_by_uuid(self.conn, "appointments", "appointment", id)
    }
}

/// Maps the doctor-slot uniqueness failure to `SlotTaken`; other errors pass
/// through the usual classification.
fn slot_error(err: rusqlite::Error, doctor_id: DoctorId, scheduled_at: i64) -> RepoError {
    match RepoError::from(err) {
        RepoError::Constraint(violation)
            if violation.is_unique_on("appointments", &["doctor_uuid", "scheduled_at"]) =>
        {
            RepoError::SlotTaken {
                doctor_id,
                scheduled_at,
            }
        }
        other => other,
    }
}

fn parse_appointment_row(row: &Row<'_>) -> RepoResult<Appointment> {
    let uuid: String = row.get("uuid")?;
    let patient_uuid: String = row.get("patient_uuid")?;
    let doctor_uuid: String = row.get("doctor_uuid")?;
    let status: String = row.get("status")?;
    let duration: i64 = row.get("duration_minutes")?;

    let appointment = Appointment {
        uuid: parse_uuid(&uuid, "appointments.uuid")?,
        patient_id: parse_uuid(&patient_uuid, "appointments.patient_uuid")?,
        doctor_id: parse_uuid(&doctor_uuid, "appointments.doctor_uuid")?,
        room_id: parse_optional_uuid(row.get("room_uuid")?, "appointments.room_uuid")?,
        scheduled_at: row.get("scheduled_at")?,
        duration_minutes: u32::try_from(duration).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid duration `{duration}` in appointments.duration_minutes"
            ))
        })?,
        status: parse_enum(&status, "appointments.status", AppointmentStatus::parse)?,
        reason: row.get("reason")?,
        notes: row.get("notes")?,
    };
    appointment.validate()?;
    Ok(appointment)
}
