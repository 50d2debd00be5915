mod common;

use clinic_core::db::{open_db, open_db_in_memory};
use clinic_core::{
    BillingError, BillingRepository, BillingService, ConstraintKind, Invoice, InvoiceStatus,
    IssueInvoiceRequest, PaymentMethod, PaymentRequest, RepoError, SqliteBillingRepository,
};
use common::{add_appointment, add_doctor, add_patient, count_rows, MONDAY_9AM};
use rusqlite::{params, Connection, TransactionBehavior};
use std::time::Duration;
use uuid::Uuid;

fn seeded() -> (Connection, Uuid) {
    let conn = open_db_in_memory().unwrap();
    let patient = add_patient(&conn, "+15550000001");
    let doctor = add_doctor(&conn, "LIC-1");
    let appointment = add_appointment(&conn, patient, doctor, MONDAY_9AM);
    (conn, appointment.uuid)
}

fn invoice_request(appointment_id: Uuid, total: i64) -> IssueInvoiceRequest {
    IssueInvoiceRequest {
        appointment_id,
        total_amount_cents: total,
        currency: None,
        due_at: None,
    }
}

fn pay(invoice_id: Uuid, amount: i64) -> PaymentRequest {
    PaymentRequest {
        invoice_id,
        amount_cents: amount,
        method: PaymentMethod::MobileMoney,
        reference: Some("TX-1".to_string()),
    }
}

#[test]
fn one_invoice_per_appointment() {
    let (mut conn, appointment_id) = seeded();
    let service =
        BillingService::with_currency(SqliteBillingRepository::try_new(&mut conn).unwrap(), "KES");

    let invoice = service
        .issue_invoice(&invoice_request(appointment_id, 5_000))
        .unwrap();
    assert_eq!(invoice.currency, "KES");
    assert_eq!(invoice.status, InvoiceStatus::Issued);

    let err = service
        .issue_invoice(&invoice_request(appointment_id, 7_000))
        .unwrap_err();
    assert!(matches!(err, BillingError::DuplicateInvoice(id) if id == appointment_id));

    let found = service
        .invoice_for_appointment(appointment_id)
        .unwrap()
        .unwrap();
    assert_eq!(found.uuid, invoice.uuid);
}

#[test]
fn invoice_for_missing_appointment_is_rejected() {
    let (mut conn, _) = seeded();
    let service = BillingService::new(SqliteBillingRepository::try_new(&mut conn).unwrap());

    let missing = Uuid::new_v4();
    let err = service
        .issue_invoice(&invoice_request(missing, 100))
        .unwrap_err();
    assert!(matches!(err, BillingError::AppointmentNotFound(id) if id == missing));
}

#[test]
fn payments_settle_invoice_and_overpayment_is_refused() {
    let (mut conn, appointment_id) = seeded();
    let mut service = BillingService::new(SqliteBillingRepository::try_new(&mut conn).unwrap());
    let invoice = service
        .issue_invoice(&invoice_request(appointment_id, 10_000))
        .unwrap();

    let after_first = service.record_payment(&pay(invoice.uuid, 4_000)).unwrap();
    assert_eq!(after_first.paid_cents, 4_000);
    assert_eq!(after_first.balance_cents(), 6_000);
    assert_eq!(after_first.status, InvoiceStatus::Issued);

    let err = service
        .record_payment(&pay(invoice.uuid, 6_001))
        .unwrap_err();
    assert!(matches!(
        err,
        BillingError::Overpayment {
            amount_cents: 6_001,
            balance_cents: 6_000
        }
    ));

    let settled = service.record_payment(&pay(invoice.uuid, 6_000)).unwrap();
    assert_eq!(settled.balance_cents(), 0);
    assert_eq!(settled.status, InvoiceStatus::Paid);

    let err = service.record_payment(&pay(invoice.uuid, 1)).unwrap_err();
    assert!(matches!(err, BillingError::InvoiceClosed(InvoiceStatus::Paid)));

    assert_eq!(service.payments(invoice.uuid).unwrap().len(), 2);
    assert_eq!(
        service.invoice_summary(invoice.uuid).unwrap().paid_cents,
        10_000
    );
}

#[test]
fn void_only_without_payments() {
    let (mut conn, appointment_id) = seeded();
    let mut service = BillingService::new(SqliteBillingRepository::try_new(&mut conn).unwrap());
    let invoice = service
        .issue_invoice(&invoice_request(appointment_id, 3_000))
        .unwrap();

    service.record_payment(&pay(invoice.uuid, 1_000)).unwrap();
    assert!(matches!(
        service.void_invoice(invoice.uuid).unwrap_err(),
        BillingError::HasPayments(_)
    ));
}

#[test]
fn voided_invoice_refuses_payments() {
    let (mut conn, appointment_id) = seeded();
    let mut service = BillingService::new(SqliteBillingRepository::try_new(&mut conn).unwrap());
    let invoice = service
        .issue_invoice(&invoice_request(appointment_id, 3_000))
        .unwrap();

    service.void_invoice(invoice.uuid).unwrap();
    assert!(matches!(
        service.record_payment(&pay(invoice.uuid, 100)).unwrap_err(),
        BillingError::InvoiceClosed(InvoiceStatus::Void)
    ));
}

#[test]
fn payment_against_unknown_invoice_is_not_found() {
    let (mut conn, _) = seeded();
    let mut service = BillingService::new(SqliteBillingRepository::try_new(&mut conn).unwrap());

    let missing = Uuid::new_v4();
    assert!(matches!(
        service.record_payment(&pay(missing, 100)).unwrap_err(),
        BillingError::InvoiceNotFound(id) if id == missing
    ));
    assert!(matches!(
        service.invoice_summary(missing).unwrap_err(),
        BillingError::InvoiceNotFound(_)
    ));
}

#[test]
fn zero_total_invoice_is_settled_at_issue_and_zero_payment_is_refused() {
    let (mut conn, appointment_id) = seeded();
    let mut service = BillingService::new(SqliteBillingRepository::try_new(&mut conn).unwrap());
    let invoice = service
        .issue_invoice(&invoice_request(appointment_id, 0))
        .unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);

    let summary = service.invoice_summary(invoice.uuid).unwrap();
    assert_eq!(summary.status, InvoiceStatus::Paid);
    assert_eq!(summary.balance_cents(), 0);

    let err = service.record_payment(&pay(invoice.uuid, 0)).unwrap_err();
    assert!(matches!(err, BillingError::Repo(RepoError::Validation(_))));
    assert!(matches!(
        service.record_payment(&pay(invoice.uuid, 1)).unwrap_err(),
        BillingError::InvoiceClosed(InvoiceStatus::Paid)
    ));
}

#[test]
fn deleting_invoiced_appointment_is_rejected() {
    let (mut conn, appointment_id) = seeded();
    {
        let repo = SqliteBillingRepository::try_new(&mut conn).unwrap();
        repo.create_invoice(&Invoice::new(appointment_id, 2_500, "USD", 1))
            .unwrap();
    }

    let err = conn
        .execute(
            "DELETE FROM appointments WHERE uuid = ?1;",
            [appointment_id.to_string()],
        )
        .unwrap_err();
    let err = RepoError::from(err);
    assert_eq!(err.constraint().unwrap().kind, ConstraintKind::ForeignKey);
    assert_eq!(count_rows(&conn, "invoices"), 1);
}

#[test]
fn void_is_serialized_against_payments_from_another_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.sqlite3");
    let mut voider = open_db(&path).unwrap();
    let mut payer = open_db(&path).unwrap();

    let patient = add_patient(&voider, "+15550000001");
    let doctor = add_doctor(&voider, "LIC-1");
    let appointment = add_appointment(&voider, patient, doctor, MONDAY_9AM);
    let invoice_id = {
        let service =
            BillingService::new(SqliteBillingRepository::try_new(&mut voider).unwrap());
        service
            .issue_invoice(&invoice_request(appointment.uuid, 2_000))
            .unwrap()
            .uuid
    };
    voider.busy_timeout(Duration::from_millis(50)).unwrap();

    // A payment in flight on the other connection holds the write lock.
    let pending = payer
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .unwrap();
    pending
        .execute(
            "INSERT INTO payments (uuid, invoice_uuid, amount_cents, method, paid_at)
             VALUES (?1, ?2, 500, 'cash', 0);",
            params![Uuid::new_v4().to_string(), invoice_id.to_string()],
        )
        .unwrap();

    {
        let mut service =
            BillingService::new(SqliteBillingRepository::try_new(&mut voider).unwrap());
        assert!(matches!(
            service.void_invoice(invoice_id).unwrap_err(),
            BillingError::Repo(RepoError::Db(_))
        ));
    }

    pending.commit().unwrap();

    let mut service = BillingService::new(SqliteBillingRepository::try_new(&mut voider).unwrap());
    assert!(matches!(
        service.void_invoice(invoice_id).unwrap_err(),
        BillingError::HasPayments(id) if id == invoice_id
    ));
    let summary = service.invoice_summary(invoice_id).unwrap();
    assert_eq!(summary.status, InvoiceStatus::Issued);
    assert_eq!(summary.paid_cents, 500);
}
