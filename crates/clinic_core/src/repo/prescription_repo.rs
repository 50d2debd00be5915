//! Prescription repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist a prescription header and its items atomically.
//! - Read prescriptions back with items in stable order.
//!
//! # Invariants
//! - Header and items are written in one transaction; a failing item leaves
//!   no partial prescription behind.
//! - Deleting an appointment cascades to its prescriptions and items.

use crate::model::appointment::{AppointmentId, AppointmentStatus};
use crate::model::prescription::{Prescription, PrescriptionId, PrescriptionItem};
use crate::repo::support::{delete_by_uuid, ensure_connection_ready, parse_enum, parse_uuid};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, TransactionBehavior};

const REQUIRED_TABLES: &[&str] = &["prescriptions", "prescription_items", "medications"];

/// Repository interface for prescription persistence.
pub trait PrescriptionRepository {
    fn create_prescription(&mut self, prescription: &Prescription) -> RepoResult<PrescriptionId>;
    fn get_prescription(&self, id: PrescriptionId) -> RepoResult<Option<Prescription>>;
    fn list_for_appointment(&self, appointment_id: AppointmentId)
        -> RepoResult<Vec<Prescription>>;
    fn delete_prescription(&self, id: PrescriptionId) -> RepoResult<()>;
    /// Current status of the appointment a prescription would attach to.
    fn appointment_status(
        &self,
        appointment_id: AppointmentId,
    ) -> RepoResult<Option<AppointmentStatus>>;
}

/// SQLite-backed prescription repository.
pub struct SqlitePrescriptionRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqlitePrescriptionRepository<'conn> {
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn load_items(&self, prescription_uuid: &str) -> RepoResult<Vec<PrescriptionItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                pi.medication_uuid,
                pi.dosage,
                pi.frequency,
                pi.duration_days,
                pi.instructions
             FROM prescription_items pi
             INNER JOIN medications m ON m.uuid = pi.medication_uuid
             WHERE pi.prescription_uuid = ?1
             ORDER BY m.name ASC, pi.medication_uuid ASC;",
        )?;
        let mut rows = stmt.query([prescription_uuid])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let medication_uuid: String = row.get("medication_uuid")?;
            let duration_days: i64 = row.get("duration_days")?;
            let item = PrescriptionItem {
                medication_id: parse_uuid(&medication_uuid, "prescription_items.medication_uuid")?,
                dosage: row.get("dosage")?,
                frequency: row.get("frequency")?,
                duration_days: u32::try_from(duration_days).map_err(|_| {
                    RepoError::InvalidData(format!(
                        "invalid duration `{duration_days}` in prescription_items.duration_days"
                    ))
                })?,
                instructions: row.get("instructions")?,
            };
            item.validate()?;
            items.push(item);
        }
        Ok(items)
    }

    fn load_headers(&self, sql: &str, value: String) -> RepoResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([value])?;
        let mut headers = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid: String = row.get("uuid")?;
            let appointment_uuid: String = row.get("appointment_uuid")?;
            headers.push(Prescription {
                uuid: parse_uuid(&uuid, "prescriptions.uuid")?,
                appointment_id: parse_uuid(&appointment_uuid, "prescriptions.appointment_uuid")?,
                issued_at: row.get("issued_at")?,
                notes: row.get("notes")?,
                items: Vec::new(),
            });
        }
        drop(rows);

        for header in &mut headers {
            header.items = self.load_items(&header.uuid.to_string())?;
        }
        Ok(headers)
    }
}

impl PrescriptionRepository for SqlitePrescriptionRepository<'_> {
    fn create_prescription(&mut self, prescription: &Prescription) -> RepoResult<PrescriptionId> {
        prescription.validate()?;

        let uuid = prescription.uuid.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO prescriptions (uuid, appointment_uuid, issued_at, notes)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                uuid.as_str(),
                prescription.appointment_id.to_string(),
                prescription.issued_at,
                prescription.notes.as_deref(),
            ],
        )?;

        for item in &prescription.items {
            tx.execute(
                "INSERT INTO prescription_items (
                    prescription_uuid,
                    medication_uuid,
                    dosage,
                    frequency,
                    duration_days,
                    instructions
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    uuid.as_str(),
                    item.medication_id.to_string(),
                    item.dosage.trim(),
                    item.frequency.trim(),
                    item.duration_days,
                    item.instructions.as_deref(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(prescription.uuid)
    }

    fn get_prescription(&self, id: PrescriptionId) -> RepoResult<Option<Prescription>> {
        let mut found = self.load_headers(
            "SELECT uuid, appointment_uuid, issued_at, notes
             FROM prescriptions
             WHERE uuid = ?1;",
            id.to_string(),
        )?;
        Ok(found.pop())
    }

    fn list_for_appointment(
        &self,
        appointment_id: AppointmentId,
    ) -> RepoResult<Vec<Prescription>> {
        self.load_headers(
            "SELECT uuid, appointment_uuid, issued_at, notes
             FROM prescriptions
             WHERE appointment_uuid = ?1
             ORDER BY issued_at ASC, uuid ASC;",
            appointment_id.to_string(),
        )
    }

    fn delete_prescription(&self, id: PrescriptionId) -> RepoResult<()> {
        delete_by_uuid(self.conn, "prescriptions", "prescription", id)
    }

    fn appointment_status(
        &self,
        appointment_id: AppointmentId,
    ) -> RepoResult<Option<AppointmentStatus>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status FROM appointments WHERE uuid = ?1;")?;
        let mut rows = stmt.query([appointment_id.to_string()])?;
        match rows.next()? {
            Some(row) => {
                let status: String = row.get(0)?;
                Ok(Some(parse_enum(
                    &status,
                    "appointments.status",
                    AppointmentStatus::parse,
                )?))
            }
            None => Ok(None),
        }
    }
}
