#![allow(dead_code)]

use clinic_core::{
    Appointment, AppointmentRepository, DirectoryRepository, Doctor, DoctorId,
    DoctorRepository, Medication, MedicationId, Patient, PatientId, PatientRepository, Room,
    RoomId, RoomKind, SqliteAppointmentRepository, SqliteDirectoryRepository,
    SqliteDoctorRepository, SqlitePatientRepository,
};
use rusqlite::Connection;

/// 2030-01-07T09:00:00Z in epoch milliseconds.
pub const MONDAY_9AM: i64 = 1_894_006_800_000;
pub const HOUR_MS: i64 = 60 * 60 * 1000;

pub fn add_patient(conn: &Connection, phone: &str) -> PatientId {
    let repo = SqlitePatientRepository::try_new(conn).unwrap();
    repo.create_patient(&Patient::new("Test", "Patient", phone))
        .unwrap()
}

pub fn add_doctor(conn: &Connection, license: &str) -> DoctorId {
    let repo = SqliteDoctorRepository::try_new(conn).unwrap();
    repo.create_doctor(&Doctor::new("Test", "Doctor", license))
        .unwrap()
}

pub fn add_room(conn: &Connection, code: &str) -> RoomId {
    let repo = SqliteDirectoryRepository::try_new(conn).unwrap();
    repo.create_room(&Room::new(code, RoomKind::Consultation))
        .unwrap()
}

pub fn add_medication(conn: &Connection, name: &str) -> MedicationId {
    let repo = SqliteDirectoryRepository::try_new(conn).unwrap();
    repo.create_medication(&Medication::new(name, "tablet", "500 mg"))
        .unwrap()
}

pub fn add_appointment(
    conn: &Connection,
    patient_id: PatientId,
    doctor_id: DoctorId,
    scheduled_at: i64,
) -> Appointment {
    let repo = SqliteAppointmentRepository::try_new(conn).unwrap();
    let appointment = Appointment::new(patient_id, doctor_id, scheduled_at, 30);
    repo.create_appointment(&appointment).unwrap();
    appointment
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
