mod common;

use clinic_core::db::open_db_in_memory;
use clinic_core::{
    ConstraintKind, DirectoryRepository, Doctor, DoctorRepository, Gender, InsuranceProvider,
    Patient, PatientInsurance, PatientListQuery, PatientRepository, RepoError, Room, RoomKind,
    Specialization, SqliteDirectoryRepository, SqliteDoctorRepository, SqlitePatientRepository,
    ValidationError,
};
use common::add_patient;

fn is_unique_violation(err: &RepoError) -> bool {
    matches!(err.constraint(), Some(violation) if violation.kind == ConstraintKind::Unique)
}

#[test]
fn patient_phone_and_email_are_unique() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePatientRepository::try_new(&conn).unwrap();

    let mut first = Patient::new("Ada", "Lovelace", "+15550000001");
    first.email = Some("ada@clinic.test".to_string());
    repo.create_patient(&first).unwrap();

    let same_phone = Patient::new("Grace", "Hopper", "+15550000001");
    let err = repo.create_patient(&same_phone).unwrap_err();
    assert!(matches!(
        err.constraint(),
        Some(violation) if violation.is_unique_on("patients", &["phone"])
    ));

    let mut same_email = Patient::new("Grace", "Hopper", "+15550000002");
    same_email.email = Some("ADA@clinic.test".to_string());
    let err = repo.create_patient(&same_email).unwrap_err();
    assert!(is_unique_violation(&err));

    let no_email = Patient::new("Alan", "Turing", "+15550000003");
    let also_no_email = Patient::new("Edsger", "Dijkstra", "+15550000004");
    repo.create_patient(&no_email).unwrap();
    repo.create_patient(&also_no_email).unwrap();
}

#[test]
fn doctor_license_is_unique() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDoctorRepository::try_new(&conn).unwrap();

    repo.create_doctor(&Doctor::new("Meredith", "Grey", "LIC-42"))
        .unwrap();
    let err = repo
        .create_doctor(&Doctor::new("Derek", "Shepherd", "LIC-42"))
        .unwrap_err();
    assert!(matches!(
        err.constraint(),
        Some(violation) if violation.is_unique_on("doctors", &["license_number"])
    ));
}

#[test]
fn doctor_contact_details_are_trimmed_before_uniqueness_applies() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDoctorRepository::try_new(&conn).unwrap();

    let mut first = Doctor::new("Meredith", "Grey", "LIC-42");
    first.phone = Some("+15550001111  ".to_string());
    first.email = Some("grey@clinic.test ".to_string());
    repo.create_doctor(&first).unwrap();

    let stored = repo.get_doctor(first.uuid).unwrap().unwrap();
    assert_eq!(stored.phone.as_deref(), Some("+15550001111"));
    assert_eq!(stored.email.as_deref(), Some("grey@clinic.test"));

    let mut second = Doctor::new("Derek", "Shepherd", "LIC-43");
    second.phone = Some("+15550001111".to_string());
    let err = repo.create_doctor(&second).unwrap_err();
    assert!(matches!(
        err.constraint(),
        Some(violation) if violation.is_unique_on("doctors", &["phone"])
    ));
}

#[test]
fn doctor_reads_reject_invalid_stored_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDoctorRepository::try_new(&conn).unwrap();
    let doctor = Doctor::new("Meredith", "Grey", "LIC-42");
    repo.create_doctor(&doctor).unwrap();

    conn.execute(
        "UPDATE doctors SET email = 'not-an-email' WHERE uuid = ?1;",
        [doctor.uuid.to_string()],
    )
    .unwrap();

    assert!(matches!(
        repo.get_doctor(doctor.uuid).unwrap_err(),
        RepoError::Validation(ValidationError::InvalidEmail(_))
    ));
    assert!(matches!(
        repo.list_doctors(None).unwrap_err(),
        RepoError::Validation(_)
    ));
}

#[test]
fn catalog_names_are_unique_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDirectoryRepository::try_new(&conn).unwrap();

    repo.create_specialization(&Specialization::new("Dermatology"))
        .unwrap();
    assert!(is_unique_violation(
        &repo
            .create_specialization(&Specialization::new("dermatology"))
            .unwrap_err()
    ));

    repo.create_room(&Room::new("a-1", RoomKind::Imaging)).unwrap();
    assert!(is_unique_violation(
        &repo
            .create_room(&Room::new("A-1", RoomKind::Procedure))
            .unwrap_err()
    ));
}

#[test]
fn member_number_is_unique_per_provider() {
    let conn = open_db_in_memory().unwrap();
    let first = add_patient(&conn, "+15550000001");
    let second = add_patient(&conn, "+15550000002");
    let directory = SqliteDirectoryRepository::try_new(&conn).unwrap();
    let patients = SqlitePatientRepository::try_new(&conn).unwrap();

    let acme = directory
        .create_insurance_provider(&InsuranceProvider::new("Acme"))
        .unwrap();
    let other = directory
        .create_insurance_provider(&InsuranceProvider::new("Other"))
        .unwrap();

    let link = |patient_id: uuid::Uuid, provider_id: uuid::Uuid| PatientInsurance {
        patient_id,
        provider_id,
        member_number: "M-1".to_string(),
        is_primary: false,
    };

    patients.link_insurance(&link(first, acme)).unwrap();
    patients.link_insurance(&link(second, other)).unwrap();
    let err = patients.link_insurance(&link(second, acme)).unwrap_err();
    assert!(is_unique_violation(&err));

    let coverage = patients.list_insurance(first).unwrap();
    assert_eq!(coverage.len(), 1);
    patients.unlink_insurance(first, acme).unwrap();
    assert!(patients.list_insurance(first).unwrap().is_empty());
}

#[test]
fn validation_runs_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePatientRepository::try_new(&conn).unwrap();

    let mut patient = Patient::new("Ada", "Lovelace", "+15550000001");
    patient.email = Some("nope".to_string());
    let err = repo.create_patient(&patient).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidEmail(_))
    ));
}

#[test]
fn patient_update_get_find_and_list() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePatientRepository::try_new(&conn).unwrap();

    let mut ada = Patient::new("Ada", "Lovelace", "+15550000001");
    ada.date_of_birth = Some("1815-12-10".to_string());
    repo.create_patient(&ada).unwrap();
    repo.create_patient(&Patient::new("Alan", "Turing", "+15550000002"))
        .unwrap();

    ada.gender = Gender::Female;
    ada.address = Some("London".to_string());
    repo.update_patient(&ada).unwrap();

    let loaded = repo.get_patient(ada.uuid).unwrap().unwrap();
    assert_eq!(loaded, ada);
    assert_eq!(
        repo.find_patient_by_phone(" +15550000001 ")
            .unwrap()
            .map(|patient| patient.uuid),
        Some(ada.uuid)
    );

    let filtered = repo
        .list_patients(&PatientListQuery {
            name_contains: Some("tur".to_string()),
            ..PatientListQuery::default()
        })
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].last_name, "Turing");

    let all = repo.list_patients(&PatientListQuery::default()).unwrap();
    let names: Vec<&str> = all.iter().map(|p| p.last_name.as_str()).collect();
    assert_eq!(names, vec!["Lovelace", "Turing"]);
}

#[test]
fn doctors_filter_by_specialization() {
    let conn = open_db_in_memory().unwrap();
    let directory = SqliteDirectoryRepository::try_new(&conn).unwrap();
    let doctors = SqliteDoctorRepository::try_new(&conn).unwrap();

    let cardiology = directory
        .create_specialization(&Specialization::new("Cardiology"))
        .unwrap();
    let heart = doctors
        .create_doctor(&Doctor::new("Helen", "Heart", "LIC-1"))
        .unwrap();
    doctors
        .create_doctor(&Doctor::new("Sam", "Skin", "LIC-2"))
        .unwrap();
    doctors.assign_specialization(heart, cardiology).unwrap();

    let listed = doctors.list_doctors(Some(cardiology)).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].uuid, heart);
    assert_eq!(doctors.list_doctors(None).unwrap().len(), 2);

    let specializations = doctors.list_doctor_specializations(heart).unwrap();
    assert_eq!(specializations[0].name, "Cardiology");
}
