//! Doctor repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `doctors`.
//! - Manage doctor-specialization links.
//!
//! # Invariants
//! - Deleting a doctor cascades to specialization links.
//! - Deleting a doctor with appointments is refused by storage, so
//!   appointment history is never orphaned.

use crate::model::doctor::{Doctor, DoctorId, Specialization, SpecializationId};
use crate::repo::directory_repo::parse_specialization_row;
use crate::repo::support::{delete_by_uuid, ensure_connection_ready, parse_uuid};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const REQUIRED_TABLES: &[&str] = &["doctors", "doctor_specializations", "specializations"];

const DOCTOR_SELECT_SQL: &str = "SELECT
    d.uuid,
    d.first_name,
    d.last_name,
    d.license_number,
    d.phone,
    d.email
FROM doctors d";

/// Repository interface for doctor records.
pub trait DoctorRepository {
    fn create_doctor(&self, doctor: &Doctor) -> RepoResult<DoctorId>;
    fn update_doctor(&self, doctor: &Doctor) -> RepoResult<()>;
    fn get_doctor(&self, id: DoctorId) -> RepoResult<Option<Doctor>>;
    /// Lists doctors, optionally only those linked to one specialization.
    fn list_doctors(&self, specialization: Option<SpecializationId>) -> RepoResult<Vec<Doctor>>;
    fn delete_doctor(&self, id: DoctorId) -> RepoResult<()>;
    fn assign_specialization(
        &self,
        doctor_id: DoctorId,
        specialization_id: SpecializationId,
    ) -> RepoResult<()>;
    fn remove_specialization(
        &self,
        doctor_id: DoctorId,
        specialization_id: SpecializationId,
    ) -> RepoResult<()>;
    fn list_doctor_specializations(&self, doctor_id: DoctorId) -> RepoResult<Vec<Specialization>>;
}

/// SQLite-backed doctor repository.
pub struct SqliteDoctorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDoctorRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl DoctorRepository for SqliteDoctorRepository<'_> {
    fn create_doctor(&self, doctor: &Doctor) -> RepoResult<DoctorId> {
        doctor.validate()?;

        self.conn.execute(
            "INSERT INTO doctors (
                uuid,
                first_name,
                last_name,
                license_number,
                phone,
                email
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                doctor.uuid.to_string(),
                doctor.first_name.trim(),
                doctor.last_name.trim(),
                doctor.license_number.trim(),
                doctor.phone.as_deref().map(str::trim),
                doctor.email.as_deref().map(str::trim),
            ],
        )?;

        Ok(doctor.uuid)
    }

    fn update_doctor(&self, doctor: &Doctor) -> RepoResult<()> {
        doctor.validate()?;

        let changed = self.conn.execute(
            "UPDATE doctors
             SET
                first_name = ?1,
                last_name = ?2,
                license_number = ?3,
                phone = ?4,
                email = ?5
             WHERE uuid = ?6;",
            params![
                doctor.first_name.trim(),
                doctor.last_name.trim(),
                doctor.license_number.trim(),
                doctor.phone.as_deref().map(str::trim),
                doctor.email.as_deref().map(str::trim),
                doctor.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found("doctor", doctor.uuid));
        }
        Ok(())
    }

    fn get_doctor(&self, id: DoctorId) -> RepoResult<Option<Doctor>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DOCTOR_SELECT_SQL} WHERE d.uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_doctor_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_doctors(&self, specialization: Option<SpecializationId>) -> RepoResult<Vec<Doctor>> {
        let mut sql = format!("{DOCTOR_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(specialization_id) = specialization {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM doctor_specializations ds
                    WHERE ds.doctor_uuid = d.uuid
                      AND ds.specialization_uuid = ?
                )",
            );
            bind_values.push(Value::Text(specialization_id.to_string()));
        }
        sql.push_str(" ORDER BY d.last_name ASC, d.first_name ASC, d.uuid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut doctors = Vec::new();
        while let Some(row) = rows.next()? {
            doctors.push(parse_doctor_row(row)?);
        }
        Ok(doctors)
    }

    fn delete_doctor(&self, id: DoctorId) -> RepoResult<()> {
        delete_by_uuid(self.conn, "doctors", "doctor", id)
    }

    fn assign_specialization(
        &self,
        doctor_id: DoctorId,
        specialization_id: SpecializationId,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO doctor_specializations (doctor_uuid, specialization_uuid)
             VALUES (?1, ?2);",
            params![doctor_id.to_string(), specialization_id.to_string()],
        )?;
        Ok(())
    }

    fn remove_specialization(
        &self,
        doctor_id: DoctorId,
        specialization_id: SpecializationId,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM doctor_specializations
             WHERE doctor_uuid = ?1 AND specialization_uuid = ?2;",
            params![doctor_id.to_string(), specialization_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("specialization link", specialization_id));
        }
        Ok(())
    }

    fn list_doctor_specializations(&self, doctor_id: DoctorId) -> RepoResult<Vec<Specialization>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.uuid, s.name, s.description
             FROM doctor_specializations ds
             INNER JOIN specializations s ON s.uuid = ds.specialization_uuid
             WHERE ds.doctor_uuid = ?1
             ORDER BY s.name ASC;",
        )?;
        let mut rows = stmt.query([doctor_id.to_string()])?;
        let mut specializations = Vec::new();
        while let Some(row) = rows.next()? {
            specializations.push(parse_specialization_row(row)?);
        }
        Ok(specializations)
    }
}

fn parse_doctor_row(row: &Row<'_>) -> RepoResult<Doctor> {
    let uuid: String = row.get("uuid")?;
    let doctor = Doctor {
        uuid: parse_uuid(&uuid, "doctors.uuid")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        license_number: row.get("license_number")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
    };
    doctor.validate()?;
    Ok(doctor)
}
