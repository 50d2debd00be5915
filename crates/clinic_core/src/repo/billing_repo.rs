//! Invoice/payment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist invoices (one per appointment) and payments against them.
//! - Record payments and settle invoices atomically.
//!
//! # Invariants
//! - A payment is only inserted when the invoice accepts payments and the
//!   amount does not exceed the outstanding balance, checked inside the same
//!   immediate transaction as the insert.
//! - An invoice whose balance reaches zero is moved to `paid` in that
//!   transaction.
//! - Voiding re-reads the paid total under the same write lock as the update.

use crate::model::appointment::AppointmentId;
use crate::model::billing::{
    Invoice, InvoiceId, InvoiceStatus, Payment, PaymentId, PaymentMethod,
};
use crate::repo::support::{ensure_connection_ready, parse_enum, parse_uuid};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const REQUIRED_TABLES: &[&str] = &["invoices", "payments", "appointments"];

const INVOICE_SELECT_SQL: &str = "SELECT
    uuid,
    appointment_uuid,
    total_amount_cents,
    currency,
    status,
    issued_at,
    due_at
FROM invoices";

/// Paid/outstanding view of one invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceBalance {
    pub invoice_id: InvoiceId,
    pub status: InvoiceStatus,
    pub total_cents: i64,
    pub paid_cents: i64,
}

impl InvoiceBalance {
    pub fn balance_cents(&self) -> i64 {
        self.total_cents - self.paid_cents
    }
}

/// Result of an attempted payment insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Recorded(InvoiceBalance),
    /// Invoice is `paid` or `void`; nothing was written.
    InvoiceClosed(InvoiceStatus),
    /// Amount exceeds the outstanding balance; nothing was written.
    ExceedsBalance { balance_cents: i64 },
}

/// Result of an attempted void.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoidOutcome {
    Voided,
    /// Payments exist; the status was left unchanged.
    HasPayments { paid_cents: i64 },
}

/// Repository interface for billing persistence.
pub trait BillingRepository {
    fn create_invoice(&self, invoice: &Invoice) -> RepoResult<InvoiceId>;
    fn get_invoice(&self, id: InvoiceId) -> RepoResult<Option<Invoice>>;
    fn find_invoice_for_appointment(
        &self,
        appointment_id: AppointmentId,
    ) -> RepoResult<Option<Invoice>>;
    fn invoice_balance(&self, id: InvoiceId) -> RepoResult<InvoiceBalance>;
    fn record_payment(&mut self, payment: &Payment) -> RepoResult<PaymentOutcome>;
    /// Marks the invoice `void` unless it has received any payment. The
    /// check and the write share one write-locked transaction.
    fn void_invoice(&mut self, id: InvoiceId) -> RepoResult<VoidOutcome>;
    fn list_payments(&self, invoice_id: InvoiceId) -> RepoResult<Vec<Payment>>;
}

/// SQLite-backed billing repository.
pub struct SqliteBillingRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteBillingRepository<'conn> {
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn query_invoice(&self, sql: &str, value: String) -> RepoResult<Option<Invoice>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([value])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_invoice_row(row)?)),
            None => Ok(None),
        }
    }
}

impl BillingRepository for SqliteBillingRepository<'_> {
    fn create_invoice(&self, invoice: &Invoice) -> RepoResult<InvoiceId> {
        invoice.validate()?;

        self.conn.execute(
            "INSERT INTO invoices (
                uuid,
                appointment_uuid,
                total_amount_cents,
                currency,
                status,
                issued_at,
                due_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                invoice.uuid.to_string(),
                invoice.appointment_id.to_string(),
                invoice.total_amount_cents,
                invoice.currency.as_str(),
                invoice.status.as_str(),
                invoice.issued_at,
                invoice.due_at,
            ],
        )?;
        Ok(invoice.uuid)
    }

    fn get_invoice(&self, id: InvoiceId) -> RepoResult<Option<Invoice>> {
        self.query_invoice(
            &format!("{INVOICE_SELECT_SQL} WHERE uuid = ?1;"),
            id.to_string(),
        )
    }

    fn find_invoice_for_appointment(
        &self,
        appointment_id: AppointmentId,
    ) -> RepoResult<Option<Invoice>> {
        self.query_invoice(
            &format!("{INVOICE_SELECT_SQL} WHERE appointment_uuid = ?1;"),
            appointment_id.to_string(),
        )
    }

    fn invoice_balance(&self, id: InvoiceId) -> RepoResult<InvoiceBalance> {
        load_balance(self.conn, id)
    }

    fn record_payment(&mut self, payment: &Payment) -> RepoResult<PaymentOutcome> {
        payment.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let before = load_balance(&tx, payment.invoice_id)?;

        if !before.status.accepts_payments() {
            return Ok(PaymentOutcome::InvoiceClosed(before.status));
        }
        if payment.amount_cents > before.balance_cents() {
            return Ok(PaymentOutcome::ExceedsBalance {
                balance_cents: before.balance_cents(),
            });
        }

        insert_payment(&tx, payment)?;

        let mut after = InvoiceBalance {
            paid_cents: before.paid_cents + payment.amount_cents,
            ..before
        };
        if after.balance_cents() == 0 {
            tx.execute(
                "UPDATE invoices SET status = 'paid' WHERE uuid = ?1;",
                [payment.invoice_id.to_string()],
            )?;
            after.status = InvoiceStatus::Paid;
        }

        tx.commit()?;
        Ok(PaymentOutcome::Recorded(after))
    }

    fn void_invoice(&mut self, id: InvoiceId) -> RepoResult<VoidOutcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let balance = load_balance(&tx, id)?;
        if balance.paid_cents > 0 {
            return Ok(VoidOutcome::HasPayments {
                paid_cents: balance.paid_cents,
            });
        }

        tx.execute(
            "UPDATE invoices SET status = 'void' WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        tx.commit()?;
        Ok(VoidOutcome::Voided)
    }

    fn list_payments(&self, invoice_id: InvoiceId) -> RepoResult<Vec<Payment>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, invoice_uuid, amount_cents, method, paid_at, reference
             FROM payments
             WHERE invoice_uuid = ?1
             ORDER BY paid_at ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([invoice_id.to_string()])?;
        let mut payments = Vec::new();
        while let Some(row) = rows.next()? {
            payments.push(parse_payment_row(row)?);
        }
        Ok(payments)
    }
}

fn insert_payment(tx: &Transaction<'_>, payment: &Payment) -> RepoResult<PaymentId> {
    tx.execute(
        "INSERT INTO payments (uuid, invoice_uuid, amount_cents, method, paid_at, reference)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            payment.uuid.to_string(),
            payment.invoice_id.to_string(),
            payment.amount_cents,
            payment.method.as_str(),
            payment.paid_at,
            payment.reference.as_deref(),
        ],
    )?;
    Ok(payment.uuid)
}

fn load_balance(conn: &Connection, id: InvoiceId) -> RepoResult<InvoiceBalance> {
    let mut stmt = conn.prepare(
        "SELECT
            i.status,
            i.total_amount_cents,
            COALESCE((SELECT SUM(p.amount_cents) FROM payments p WHERE p.invoice_uuid = i.uuid), 0)
                AS paid_cents
         FROM invoices i
         WHERE i.uuid = ?1;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let Some(row) = rows.next()? else {
        return Err(RepoError::not_found("invoice", id));
    };

    let status: String = row.get("status")?;
    Ok(InvoiceBalance {
        invoice_id: id,
        status: parse_enum(&status, "invoices.status", InvoiceStatus::parse)?,
        total_cents: row.get("total_amount_cents")?,
        paid_cents: row.get("paid_cents")?,
    })
}

fn parse_invoice_row(row: &Row<'_>) -> RepoResult<Invoice> {
    let uuid: String = row.get("uuid")?;
    let appointment_uuid: String = row.get("appointment_uuid")?;
    let status: String = row.get("status")?;

    let invoice = Invoice {
        uuid: parse_uuid(&uuid, "invoices.uuid")?,
        appointment_id: parse_uuid(&appointment_uuid, "invoices.appointment_uuid")?,
        total_amount_cents: row.get("total_amount_cents")?,
        currency: row.get("currency")?,
        status: parse_enum(&status, "invoices.status", InvoiceStatus::parse)?,
        issued_at: row.get("issued_at")?,
        due_at: row.get("due_at")?,
    };
    invoice.validate()?;
    Ok(invoice)
}

fn parse_payment_row(row: &Row<'_>) -> RepoResult<Payment> {
    let uuid: String = row.get("uuid")?;
    let invoice_uuid: String = row.get("invoice_uuid")?;
    let method: String = row.get("method")?;

    let payment = Payment {
        uuid: parse_uuid(&uuid, "payments.uuid")?,
        invoice_id: parse_uuid(&invoice_uuid, "payments.invoice_uuid")?,
        amount_cents: row.get("amount_cents")?,
        method: parse_enum(&method, "payments.method", PaymentMethod::parse)?,
        paid_at: row.get("paid_at")?,
        reference: row.get("reference")?,
    };
    payment.validate()?;
    Ok(payment)
}
