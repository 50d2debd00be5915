//! Patient repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `patients`.
//! - Manage patient insurance links with member numbers.
//!
//! # Invariants
//! - Deleting a patient cascades to insurance links.
//! - Deleting a patient with appointments is refused by storage.

use crate::model::insurance::{InsuranceProviderId, PatientInsurance};
use crate::model::patient::{Gender, Patient, PatientId};
use crate::repo::support::{
    bool_to_int, delete_by_uuid, ensure_connection_ready, int_to_bool, parse_enum, parse_uuid,
    push_pagination,
};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const REQUIRED_TABLES: &[&str] = &["patients", "patient_insurance"];

const PATIENT_SELECT_SQL: &str = "SELECT
    uuid,
    first_name,
    last_name,
    date_of_birth,
    gender,
    phone,
    email,
    address
FROM patients";

/// Query options for listing patients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientListQuery {
    /// Case-insensitive substring match over first or last name.
    pub name_contains: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for patient records.
pub trait PatientRepository {
    fn create_patient(&self, patient: &Patient) -> RepoResult<PatientId>;
    fn update_patient(&self, patient: &Patient) -> RepoResult<()>;
    fn get_patient(&self, id: PatientId) -> RepoResult<Option<Patient>>;
    fn find_patient_by_phone(&self, phone: &str) -> RepoResult<Option<Patient>>;
    fn list_patients(&self, query: &PatientListQuery) -> RepoResult<Vec<Patient>>;
    fn delete_patient(&self, id: PatientId) -> RepoResult<()>;
    fn link_insurance(&self, link: &PatientInsurance) -> RepoResult<()>;
    fn unlink_insurance(
        &self,
        patient_id: PatientId,
        provider_id: InsuranceProviderId,
    ) -> RepoResult<()>;
    fn list_insurance(&self, patient_id: PatientId) -> RepoResult<Vec<PatientInsurance>>;
}

/// SQLite-backed patient repository.
pub struct SqlitePatientRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePatientRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn query_one(&self, sql: &str, value: String) -> RepoResult<Option<Patient>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([value])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_patient_row(row)?)),
            None => Ok(None),
        }
    }
}

impl PatientRepository for SqlitePatientRepository<'_> {
    fn create_patient(&self, patient: &Patient) -> RepoResult<PatientId> {
        patient.validate()?;

        self.conn.execute(
            "INSERT INTO patients (
                uuid,
                first_name,
                last_name,
                date_of_birth,
                gender,
                phone,
                email,
                address
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                patient.uuid.to_string(),
                patient.first_name.trim(),
                patient.last_name.trim(),
                patient.date_of_birth.as_deref(),
                patient.gender.as_str(),
                patient.phone.trim(),
                patient.email.as_deref().map(str::trim),
                patient.address.as_deref(),
            ],
        )?;

        Ok(patient.uuid)
    }

    fn update_patient(&self, patient: &Patient) -> RepoResult<()> {
        patient.validate()?;

        let changed = self.conn.execute(
            "UPDATE patients
             SET
                first_name = ?1,
                last_name = ?2,
                date_of_birth = ?3,
                gender = ?4,
                phone = ?5,
                email = ?6,
                address = ?7
             WHERE uuid = ?8;",
            params![
                patient.first_name.trim(),
                patient.last_name.trim(),
                patient.date_of_birth.as_deref(),
                patient.gender.as_str(),
                patient.phone.trim(),
                patient.email.as_deref().map(str::trim),
                patient.address.as_deref(),
                patient.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found("patient", patient.uuid));
        }
        Ok(())
    }

    fn get_patient(&self, id: PatientId) -> RepoResult<Option<Patient>> {
        self.query_one(
            &format!("{PATIENT_SELECT_SQL} WHERE uuid = ?1;"),
            id.to_string(),
        )
    }

    fn find_patient_by_phone(&self, phone: &str) -> RepoResult<Option<Patient>> {
        self.query_one(
            &format!("{PATIENT_SELECT_SQL} WHERE phone = ?1;"),
            phone.trim().to_string(),
        )
    }

    fn list_patients(&self, query: &PatientListQuery) -> RepoResult<Vec<Patient>> {
        let mut sql = format!("{PATIENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(needle) = query.name_contains.as_deref() {
            sql.push_str(
                " AND (first_name LIKE '%' || ? || '%' OR last_name LIKE '%' || ? || '%')",
            );
            bind_values.push(Value::Text(needle.trim().to_string()));
            bind_values.push(Value::Text(needle.trim().to_string()));
        }

        sql.push_str(" ORDER BY last_name ASC, first_name ASC, uuid ASC");
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut patients = Vec::new();
        while let Some(row) = rows.next()? {
            patients.push(parse_patient_row(row)?);
        }
        Ok(patients)
    }

    fn delete_patient(&self, id: PatientId) -> RepoResult<()> {
        delete_by_uuid(self.conn, "patients", "patient", id)
    }

    fn link_insurance(&self, link: &PatientInsurance) -> RepoResult<()> {
        link.validate()?;

        self.conn.execute(
            "INSERT INTO patient_insurance (
                patient_uuid,
                provider_uuid,
                member_number,
                is_primary
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                link.patient_id.to_string(),
                link.provider_id.to_string(),
                link.member_number.trim(),
                bool_to_int(link.is_primary),
            ],
        )?;
        Ok(())
    }

    fn unlink_insurance(
        &self,
        patient_id: PatientId,
        provider_id: InsuranceProviderId,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM patient_insurance WHERE patient_uuid = ?1 AND provider_uuid = ?2;",
            params![patient_id.to_string(), provider_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("insurance link", provider_id));
        }
        Ok(())
    }

    fn list_insurance(&self, patient_id: PatientId) -> RepoResult<Vec<PatientInsurance>> {
        let mut stmt = self.conn.prepare(
            "SELECT patient_uuid, provider_uuid, member_number, is_primary
             FROM patient_insurance
             WHERE patient_uuid = ?1
             ORDER BY is_primary DESC, provider_uuid ASC;",
        )?;
        let mut rows = stmt.query([patient_id.to_string()])?;
        let mut links = Vec::new();
        while let Some(row) = rows.next()? {
            let patient_uuid: String = row.get("patient_uuid")?;
            let provider_uuid: String = row.get("provider_uuid")?;
            links.push(PatientInsurance {
                patient_id: parse_uuid(&patient_uuid, "patient_insurance.patient_uuid")?,
                provider_id: parse_uuid(&provider_uuid, "patient_insurance.provider_uuid")?,
                member_number: row.get("member_number")?,
                is_primary: int_to_bool(row.get("is_primary")?, "patient_insurance.is_primary")?,
            });
        }
        Ok(links)
    }
}

fn parse_patient_row(row: &Row<'_>) -> RepoResult<Patient> {
    let uuid: String = row.get("uuid")?;
    let gender: String = row.get("gender")?;

    let patient = Patient {
        uuid: parse_uuid(&uuid, "patients.uuid")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        date_of_birth: row.get("date_of_birth")?,
        gender: parse_enum(&gender, "patients.gender", Gender::parse)?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        address: row.get("address")?,
    };
    patient.validate()?;
    Ok(patient)
}
