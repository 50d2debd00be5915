mod common;

use clinic_core::db::open_db_in_memory;
use clinic_core::{
    AppointmentRepository, ConstraintKind, DirectoryRepository, DoctorRepository,
    InsuranceProvider, PatientInsurance, PatientRepository, RepoError, Specialization,
    SqliteAppointmentRepository, SqliteDirectoryRepository, SqliteDoctorRepository,
    SqlitePatientRepository,
};
use common::{add_appointment, add_doctor, add_patient, add_room, count_rows, MONDAY_9AM};

fn is_foreign_key_violation(err: &RepoError) -> bool {
    matches!(err.constraint(), Some(violation) if violation.kind == ConstraintKind::ForeignKey)
}

#[test]
fn deleting_specialization_in_use_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let doctor = add_doctor(&conn, "LIC-1");
    let directory = SqliteDirectoryRepository::try_new(&conn).unwrap();
    let doctors = SqliteDoctorRepository::try_new(&conn).unwrap();

    let cardiology = directory
        .create_specialization(&Specialization::new("Cardiology"))
        .unwrap();
    doctors.assign_specialization(doctor, cardiology).unwrap();

    let err = directory.delete_specialization(cardiology).unwrap_err();
    assert!(is_foreign_key_violation(&err), "unexpected error: {err}");

    doctors.remove_specialization(doctor, cardiology).unwrap();
    directory.delete_specialization(cardiology).unwrap();
}

#[test]
fn deleting_doctor_cascades_specialization_links() {
    let conn = open_db_in_memory().unwrap();
    let doctor = add_doctor(&conn, "LIC-1");
    let directory = SqliteDirectoryRepository::try_new(&conn).unwrap();
    let doctors = SqliteDoctorRepository::try_new(&conn).unwrap();

    let pediatrics = directory
        .create_specialization(&Specialization::new("Pediatrics"))
        .unwrap();
    doctors.assign_specialization(doctor, pediatrics).unwrap();
    doctors.assign_specialization(doctor, pediatrics).unwrap();
    assert_eq!(count_rows(&conn, "doctor_specializations"), 1);

    doctors.delete_doctor(doctor).unwrap();
    assert_eq!(count_rows(&conn, "doctor_specializations"), 0);
    assert_eq!(directory.list_specializations().unwrap().len(), 1);
}

#[test]
fn deleting_doctor_with_appointments_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let patient = add_patient(&conn, "+15550000001");
    let doctor = add_doctor(&conn, "LIC-1");
    add_appointment(&conn, patient, doctor, MONDAY_9AM);

    let doctors = SqliteDoctorRepository::try_new(&conn).unwrap();
    let err = doctors.delete_doctor(doctor).unwrap_err();
    assert!(is_foreign_key_violation(&err));
    assert!(doctors.get_doctor(doctor).unwrap().is_some());
    assert_eq!(count_rows(&conn, "appointments"), 1);
}

#[test]
fn deleting_patient_cascades_insurance_but_not_past_appointments() {
    let conn = open_db_in_memory().unwrap();
    let patient = add_patient(&conn, "+15550000001");
    let doctor = add_doctor(&conn, "LIC-1");
    let directory = SqliteDirectoryRepository::try_new(&conn).unwrap();
    let patients = SqlitePatientRepository::try_new(&conn).unwrap();

    let provider = directory
        .create_insurance_provider(&InsuranceProvider::new("Acme Health"))
        .unwrap();
    patients
        .link_insurance(&PatientInsurance {
            patient_id: patient,
            provider_id: provider,
            member_number: "M-001".to_string(),
            is_primary: true,
        })
        .unwrap();

    let booked = add_appointment(&conn, patient, doctor, MONDAY_9AM);
    let err = patients.delete_patient(patient).unwrap_err();
    assert!(is_foreign_key_violation(&err));
    assert_eq!(count_rows(&conn, "patient_insurance"), 1);

    SqliteAppointmentRepository::try_new(&conn)
        .unwrap()
        .delete_appointment(booked.uuid)
        .unwrap();
    patients.delete_patient(patient).unwrap();
    assert_eq!(count_rows(&conn, "patient_insurance"), 0);
    assert_eq!(directory.list_insurance_providers().unwrap().len(), 1);
}

#[test]
fn deleting_insurance_provider_with_members_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let patient = add_patient(&conn, "+15550000001");
    let directory = SqliteDirectoryRepository::try_new(&conn).unwrap();
    let patients = SqlitePatientRepository::try_new(&conn).unwrap();

    let provider = directory
        .create_insurance_provider(&InsuranceProvider::new("Acme Health"))
        .unwrap();
    patients
        .link_insurance(&PatientInsurance {
            patient_id: patient,
            provider_id: provider,
            member_number: "M-001".to_string(),
            is_primary: false,
        })
        .unwrap();

    let err = directory.delete_insurance_provider(provider).unwrap_err();
    assert!(is_foreign_key_violation(&err));
}

#[test]
fn deleting_room_clears_it_from_appointments() {
    let conn = open_db_in_memory().unwrap();
    let patient = add_patient(&conn, "+15550000001");
    let doctor = add_doctor(&conn, "LIC-1");
    let room = add_room(&conn, "B-2");
    let mut booked = add_appointment(&conn, patient, doctor, MONDAY_9AM);

    let appointments = SqliteAppointmentRepository::try_new(&conn).unwrap();
    booked.room_id = Some(room);
    appointments.update_appointment(&booked).unwrap();

    SqliteDirectoryRepository::try_new(&conn)
        .unwrap()
        .delete_room(room)
        .unwrap();

    let reloaded = appointments.get_appointment(booked.uuid).unwrap().unwrap();
    assert_eq!(reloaded.room_id, None);
}

#[test]
fn inserting_appointment_for_missing_patient_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let doctor = add_doctor(&conn, "LIC-1");
    let repo = SqliteAppointmentRepository::try_new(&conn).unwrap();

    let orphan = clinic_core::Appointment::new(uuid::Uuid::new_v4(), doctor, MONDAY_9AM, 30);
    let err = repo.create_appointment(&orphan).unwrap_err();
    assert!(is_foreign_key_violation(&err));
}

#[test]
fn deleting_missing_rows_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let doctors = SqliteDoctorRepository::try_new(&conn).unwrap();
    let missing = uuid::Uuid::new_v4();

    let err = doctors.delete_doctor(missing).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound { entity: "doctor", id } if id == missing
    ));
}
