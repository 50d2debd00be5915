//! Subcommand handlers. Each returns the JSON document printed on success.

use crate::cli::{
    BookArgs, DoctorCommand, InvoiceCommand, PatientCommand, SpecializationCommand, StatusStep,
};
use anyhow::{anyhow, Context, Result};
use clinic_core::db::migrations::latest_version;
use clinic_core::{
    BillingService, BookingRequest, BookingService, ClinicConfig, DirectoryRepository, Doctor,
    DoctorRepository, InvoiceBalance, IssueInvoiceRequest, Patient, PatientListQuery,
    PatientRepository, PaymentRequest, Specialization, SqliteAppointmentRepository,
    SqliteBillingRepository, SqliteDirectoryRepository, SqliteDoctorRepository,
    SqlitePatientRepository,
};
use rusqlite::Connection;
use serde_json::{json, Value};
use uuid::Uuid;

pub fn init(config: &ClinicConfig) -> Value {
    json!({
        "database": config.database_path.display().to_string(),
        "schema_version": latest_version(),
    })
}

pub fn patient(conn: &Connection, command: PatientCommand) -> Result<Value> {
    let repo = SqlitePatientRepository::try_new(conn)?;
    match command {
        PatientCommand::Add {
            first_name,
            last_name,
            phone,
            email,
            date_of_birth,
            gender,
        } => {
            let mut patient = Patient::new(first_name, last_name, phone);
            patient.email = email;
            patient.date_of_birth = date_of_birth;
            patient.gender = gender;
            repo.create_patient(&patient)
                .context("failed to register patient")?;
            Ok(json!(patient))
        }
        PatientCommand::List {
            name,
            limit,
            offset,
        } => {
            let patients = repo.list_patients(&PatientListQuery {
                name_contains: name,
                limit,
                offset,
            })?;
            Ok(json!(patients))
        }
        PatientCommand::Delete { id } => {
            repo.delete_patient(id)
                .with_context(|| format!("failed to delete patient {id}"))?;
            Ok(deleted(id))
        }
    }
}

pub fn doctor(conn: &mut Connection, command: DoctorCommand) -> Result<Value> {
    match command {
        DoctorCommand::Add {
            first_name,
            last_name,
            license,
            phone,
            email,
            specializations,
        } => {
            let mut doctor = Doctor::new(first_name, last_name, license);
            doctor.phone = phone;
            doctor.email = email;

            let tx = conn.transaction()?;
            {
                let repo = SqliteDoctorRepository::try_new(&tx)?;
                repo.create_doctor(&doctor)
                    .context("failed to register doctor")?;
                for specialization_id in &specializations {
                    repo.assign_specialization(doctor.uuid, *specialization_id)
                        .with_context(|| {
                            format!("failed to link specialization {specialization_id}")
                        })?;
                }
            }
            tx.commit()?;
            Ok(json!({ "doctor": doctor, "specializations": specializations }))
        }
        DoctorCommand::List { specialization } => {
            let repo = SqliteDoctorRepository::try_new(conn)?;
            Ok(json!(repo.list_doctors(specialization)?))
        }
        DoctorCommand::Delete { id } => {
            let repo = SqliteDoctorRepository::try_new(conn)?;
            repo.delete_doctor(id)
                .with_context(|| format!("failed to delete doctor {id}"))?;
            Ok(deleted(id))
        }
    }
}

pub fn specialization(conn: &Connection, command: SpecializationCommand) -> Result<Value> {
    let repo = SqliteDirectoryRepository::try_new(conn)?;
    match command {
        SpecializationCommand::Add { name, description } => {
            let mut specialization = Specialization::new(name);
            specialization.description = description;
            repo.create_specialization(&specialization)
                .context("failed to add specialization")?;
            Ok(json!(specialization))
        }
        SpecializationCommand::List => Ok(json!(repo.list_specializations()?)),
    }
}

fn booking_service<'conn>(
    conn: &'conn Connection,
    config: &ClinicConfig,
) -> Result<BookingService<SqliteAppointmentRepository<'conn>>> {
    Ok(BookingService::with_default_duration(
        SqliteAppointmentRepository::try_new(conn)?,
        config.default_appointment_minutes,
    ))
}

pub fn book(conn: &Connection, config: &ClinicConfig, args: BookArgs) -> Result<Value> {
    let service = booking_service(conn, config)?;
    let appointment = service.book(&BookingRequest {
        patient_id: args.patient,
        doctor_id: args.doctor,
        room_id: args.room,
        scheduled_at: args.at,
        duration_minutes: args.minutes,
        reason: args.reason,
    })?;
    Ok(json!(appointment))
}

pub fn reschedule(
    conn: &Connection,
    config: &ClinicConfig,
    appointment: Uuid,
    at: i64,
) -> Result<Value> {
    let service = booking_service(conn, config)?;
    Ok(json!(service.reschedule(appointment, at)?))
}

pub fn status(
    conn: &Connection,
    config: &ClinicConfig,
    appointment: Uuid,
    step: StatusStep,
) -> Result<Value> {
    let service = booking_service(conn, config)?;
    let updated = match step {
        StatusStep::CheckIn => service.check_in(appointment)?,
        StatusStep::Complete => service.complete(appointment)?,
        StatusStep::Cancel => service.cancel(appointment)?,
        StatusStep::NoShow => service.mark_no_show(appointment)?,
    };
    Ok(json!(updated))
}

pub fn schedule(
    conn: &Connection,
    config: &ClinicConfig,
    doctor: Uuid,
    from: i64,
    to: i64,
) -> Result<Value> {
    if to <= from {
        return Err(anyhow!("schedule range end must be after its start"));
    }
    let service = booking_service(conn, config)?;
    Ok(json!(service.doctor_schedule(doctor, from, to)?))
}

pub fn invoice(
    conn: &mut Connection,
    config: &ClinicConfig,
    command: InvoiceCommand,
) -> Result<Value> {
    let mut service = BillingService::with_currency(
        SqliteBillingRepository::try_new(conn)?,
        config.currency.clone(),
    );
    match command {
        InvoiceCommand::Issue {
            appointment,
            total_cents,
            currency,
            due,
        } => {
            let invoice = service.issue_invoice(&IssueInvoiceRequest {
                appointment_id: appointment,
                total_amount_cents: total_cents,
                currency,
                due_at: due,
            })?;
            Ok(json!(invoice))
        }
        InvoiceCommand::Pay {
            invoice,
            amount_cents,
            method,
            reference,
        } => {
            let balance = service.record_payment(&PaymentRequest {
                invoice_id: invoice,
                amount_cents,
                method,
                reference,
            })?;
            Ok(balance_json(&balance))
        }
        InvoiceCommand::Show { invoice } => {
            let balance = service.invoice_summary(invoice)?;
            let payments = service.payments(invoice)?;
            let mut document = balance_json(&balance);
            document["payments"] = json!(payments);
            Ok(document)
        }
        InvoiceCommand::Void { invoice } => {
            service.void_invoice(invoice)?;
            Ok(json!({ "invoice_id": invoice, "status": "void" }))
        }
    }
}

fn balance_json(balance: &InvoiceBalance) -> Value {
    json!({
        "invoice_id": balance.invoice_id,
        "status": balance.status,
        "total_cents": balance.total_cents,
        "paid_cents": balance.paid_cents,
        "balance_cents": balance.balance_cents(),
    })
}

fn deleted(id: Uuid) -> Value {
    json!({ "deleted": id })
}
