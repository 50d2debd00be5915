//! Reference catalog repository: specializations, rooms, medications and
//! insurance providers.
//!
//! # Responsibility
//! - Provide create/list/delete APIs over catalog tables.
//!
//! # Invariants
//! - Catalog names/codes are unique case-insensitively.
//! - Deleting a catalog row still referenced through a restrictive foreign
//!   key fails with `ConstraintKind::ForeignKey`; deleting a room clears the
//!   room on its appointments instead.

use crate::model::doctor::{Specialization, SpecializationId};
use crate::model::insurance::{InsuranceProvider, InsuranceProviderId};
use crate::model::prescription::{Medication, MedicationId};
use crate::model::room::{Room, RoomId, RoomKind};
use crate::repo::support::{delete_by_uuid, ensure_connection_ready, parse_enum, parse_uuid};
use crate::repo::RepoResult;
use rusqlite::{params, Connection, Row};

const REQUIRED_TABLES: &[&str] = &[
    "specializations",
    "rooms",
    "medications",
    "insurance_providers",
];

/// Repository interface for catalog data.
pub trait DirectoryRepository {
    fn create_specialization(&self, specialization: &Specialization)
        -> RepoResult<SpecializationId>;
    fn list_specializations(&self) -> RepoResult<Vec<Specialization>>;
    fn delete_specialization(&self, id: SpecializationId) -> RepoResult<()>;

    fn create_room(&self, room: &Room) -> RepoResult<RoomId>;
    fn get_room(&self, id: RoomId) -> RepoResult<Option<Room>>;
    fn list_rooms(&self) -> RepoResult<Vec<Room>>;
    fn delete_room(&self, id: RoomId) -> RepoResult<()>;

    fn create_medication(&self, medication: &Medication) -> RepoResult<MedicationId>;
    fn list_medications(&self) -> RepoResult<Vec<Medication>>;
    fn delete_medication(&self, id: MedicationId) -> RepoResult<()>;

    fn create_insurance_provider(
        &self,
        provider: &InsuranceProvider,
    ) -> RepoResult<InsuranceProviderId>;
    fn list_insurance_providers(&self) -> RepoResult<Vec<InsuranceProvider>>;
    fn delete_insurance_provider(&self, id: InsuranceProviderId) -> RepoResult<()>;
}

/// SQLite-backed catalog repository.
pub struct SqliteDirectoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectoryRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn collect<T>(
        &self,
        sql: &str,
        parse: impl Fn(&Row<'_>) -> RepoResult<T>,
    ) -> RepoResult<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse(row)?);
        }
        Ok(items)
    }
}

impl DirectoryRepository for SqliteDirectoryRepository<'_> {
    fn create_specialization(
        &self,
        specialization: &Specialization,
    ) -> RepoResult<SpecializationId> {
        specialization.validate()?;
        self.conn.execute(
            "INSERT INTO specializations (uuid, name, description) VALUES (?1, ?2, ?3);",
            params![
                specialization.uuid.to_string(),
                specialization.name.trim(),
                specialization.description.as_deref(),
            ],
        )?;
        Ok(specialization.uuid)
    }

    fn list_specializations(&self) -> RepoResult<Vec<Specialization>> {
        self.collect(
            "SELECT uuid, name, description
             FROM specializations
             ORDER BY name ASC, uuid ASC;",
            parse_specialization_row,
        )
    }

    fn delete_specialization(&self, id: SpecializationId) -> RepoResult<()> {
        delete_by_uuid(self.conn, "specializations", "specialization", id)
    }

    fn create_room(&self, room: &Room) -> RepoResult<RoomId> {
        room.validate()?;
        self.conn.execute(
            "INSERT INTO rooms (uuid, code, floor, kind) VALUES (?1, ?2, ?3, ?4);",
            params![
                room.uuid.to_string(),
                room.code.trim(),
                room.floor,
                room.kind.as_str(),
            ],
        )?;
        Ok(room.uuid)
    }

    fn get_room(&self, id: RoomId) -> RepoResult<Option<Room>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, code, floor, kind FROM rooms WHERE uuid = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_room_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_rooms(&self) -> RepoResult<Vec<Room>> {
        self.collect(
            "SELECT uuid, code, floor, kind FROM rooms ORDER BY code ASC, uuid ASC;",
            parse_room_row,
        )
    }

    fn delete_room(&self, id: RoomId) -> RepoResult<()> {
        delete_by_uuid(self.conn, "rooms", "room", id)
    }

    fn create_medication(&self, medication: &Medication) -> RepoResult<MedicationId> {
        medication.validate()?;
        self.conn.execute(
            "INSERT INTO medications (uuid, name, form, strength) VALUES (?1, ?2, ?3, ?4);",
            params![
                medication.uuid.to_string(),
                medication.name.trim(),
                medication.form.trim(),
                medication.strength.trim(),
            ],
        )?;
        Ok(medication.uuid)
    }

    fn list_medications(&self) -> RepoResult<Vec<Medication>> {
        self.collect(
            "SELECT uuid, name, form, strength
             FROM medications
             ORDER BY name ASC, form ASC, strength ASC;",
            |row| {
                let uuid: String = row.get("uuid")?;
                Ok(Medication {
                    uuid: parse_uuid(&uuid, "medications.uuid")?,
                    name: row.get("name")?,
                    form: row.get("form")?,
                    strength: row.get("strength")?,
                })
            },
        )
    }

    fn delete_medication(&self, id: MedicationId) -> RepoResult<()> {
        delete_by_uuid(self.conn, "medications", "medication", id)
    }

    fn create_insurance_provider(
        &self,
        provider: &InsuranceProvider,
    ) -> RepoResult<InsuranceProviderId> {
        provider.validate()?;
        self.conn.execute(
            "INSERT INTO insurance_providers (uuid, name, phone, email) VALUES (?1, ?2, ?3, ?4);",
            params![
                provider.uuid.to_string(),
                provider.name.trim(),
                provider.phone.as_deref().map(str::trim),
                provider.email.as_deref().map(str::trim),
            ],
        )?;
        Ok(provider.uuid)
    }

    fn list_insurance_providers(&self) -> RepoResult<Vec<InsuranceProvider>> {
        self.collect(
            "SELECT uuid, name, phone, email FROM insurance_providers ORDER BY name ASC;",
            |row| {
                let uuid: String = row.get("uuid")?;
                Ok(InsuranceProvider {
                    uuid: parse_uuid(&uuid, "insurance_providers.uuid")?,
                    name: row.get("name")?,
                    phone: row.get("phone")?,
                    email: row.get("email")?,
                })
            },
        )
    }

    fn delete_insurance_provider(&self, id: InsuranceProviderId) -> RepoResult<()> {
        delete_by_uuid(self.conn, "insurance_providers", "insurance provider", id)
    }
}

pub(crate) fn parse_specialization_row(row: &Row<'_>) -> RepoResult<Specialization> {
    let uuid: String = row.get("uuid")?;
    Ok(Specialization {
        uuid: parse_uuid(&uuid, "specializations.uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}

fn parse_room_row(row: &Row<'_>) -> RepoResult<Room> {
    let uuid: String = row.get("uuid")?;
    let kind: String = row.get("kind")?;
    Ok(Room {
        uuid: parse_uuid(&uuid, "rooms.uuid")?,
        code: row.get("code")?,
        floor: row.get("floor")?,
        kind: parse_enum(&kind, "rooms.kind", RoomKind::parse)?,
    })
}
