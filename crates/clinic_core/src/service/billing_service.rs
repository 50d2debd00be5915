//! Invoice and payment use-case service.
//!
//! # Responsibility
//! - Issue one invoice per appointment.
//! - Record payments, report balances and void unpaid invoices.
//!
//! # Invariants
//! - Overpayment and payments against closed invoices are rejected without
//!   writing anything.
//! - Only invoices without payments can be voided.

use crate::model::appointment::AppointmentId;
use crate::model::billing::{Invoice, InvoiceId, InvoiceStatus, Payment, PaymentMethod};
use crate::model::now_epoch_ms;
use crate::repo::billing_repo::{BillingRepository, InvoiceBalance, PaymentOutcome, VoidOutcome};
use crate::repo::{ConstraintKind, RepoError};
use log::{info, warn};
use thiserror::Error;

/// Currency used when a request does not name one.
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("appointment {0} already has an invoice")]
    DuplicateInvoice(AppointmentId),
    #[error("appointment not found: {0}")]
    AppointmentNotFound(AppointmentId),
    #[error("invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),
    #[error("invoice is `{0}` and accepts no payments")]
    InvoiceClosed(InvoiceStatus),
    #[error("payment of {amount_cents} exceeds outstanding balance {balance_cents}")]
    Overpayment { amount_cents: i64, balance_cents: i64 },
    #[error("invoice {0} has payments and cannot be voided")]
    HasPayments(InvoiceId),
    #[error("{0}")]
    Repo(#[from] RepoError),
}

pub type BillingResult<T> = Result<T, BillingError>;

/// Request model for issuing an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueInvoiceRequest {
    pub appointment_id: AppointmentId,
    pub total_amount_cents: i64,
    /// Falls back to the service currency when `None`.
    pub currency: Option<String>,
    pub due_at: Option<i64>,
}

/// Request model for recording a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub invoice_id: InvoiceId,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub reference: Option<String>,
}

/// Use-case service for billing.
pub struct BillingService<R: BillingRepository> {
    repo: R,
    currency: String,
}

impl<R: BillingRepository> BillingService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_currency(repo, DEFAULT_CURRENCY)
    }

    pub fn with_currency(repo: R, currency: impl Into<String>) -> Self {
        Self {
            repo,
            currency: currency.into(),
        }
    }

    /// Issues the invoice for an appointment.
    ///
    /// # Errors
    /// - `DuplicateInvoice` when the appointment is already invoiced.
    /// - `AppointmentNotFound` when the appointment does not exist.
    pub fn issue_invoice(&self, request: &IssueInvoiceRequest) -> BillingResult<Invoice> {
        let currency = request
            .currency
            .clone()
            .unwrap_or_else(|| self.currency.clone());
        let mut invoice = Invoice::new(
            request.appointment_id,
            request.total_amount_cents,
            currency,
            now_epoch_ms(),
        );
        invoice.due_at = request.due_at;

        match self.repo.create_invoice(&invoice) {
            Ok(_) => {
                info!(
                    "event=invoice_issue module=billing status=ok invoice_id={} appointment_id={}",
                    invoice.uuid, invoice.appointment_id
                );
                Ok(invoice)
            }
            Err(RepoError::Constraint(violation))
                if violation.is_unique_on("invoices", &["appointment_uuid"]) =>
            {
                Err(BillingError::DuplicateInvoice(request.appointment_id))
            }
            Err(RepoError::Constraint(violation))
                if violation.kind == ConstraintKind::ForeignKey =>
            {
                Err(BillingError::AppointmentNotFound(request.appointment_id))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Records a payment and returns the balance after it.
    pub fn record_payment(&mut self, request: &PaymentRequest) -> BillingResult<InvoiceBalance> {
        let mut payment = Payment::new(
            request.invoice_id,
            request.amount_cents,
            request.method,
            now_epoch_ms(),
        );
        payment.reference = request.reference.clone();

        let outcome = self
            .repo
            .record_payment(&payment)
            .map_err(|err| not_found_as_invoice(err, request.invoice_id))?;

        match outcome {
            PaymentOutcome::Recorded(balance) => {
                info!(
                    "event=payment_record module=billing status=ok invoice_id={} method={} settled={}",
                    request.invoice_id,
                    request.method.as_str(),
                    balance.balance_cents() == 0
                );
                Ok(balance)
            }
            PaymentOutcome::InvoiceClosed(status) => {
                warn!(
                    "event=payment_record module=billing status=rejected invoice_id={} reason=closed",
                    request.invoice_id
                );
                Err(BillingError::InvoiceClosed(status))
            }
            PaymentOutcome::ExceedsBalance { balance_cents } => {
                warn!(
                    "event=payment_record module=billing status=rejected invoice_id={} reason=overpayment",
                    request.invoice_id
                );
                Err(BillingError::Overpayment {
                    amount_cents: request.amount_cents,
                    balance_cents,
                })
            }
        }
    }

    pub fn invoice_summary(&self, invoice_id: InvoiceId) -> BillingResult<InvoiceBalance> {
        self.repo
            .invoice_balance(invoice_id)
            .map_err(|err| not_found_as_invoice(err, invoice_id))
    }

    pub fn invoice_for_appointment(
        &self,
        appointment_id: AppointmentId,
    ) -> BillingResult<Option<Invoice>> {
        Ok(self.repo.find_invoice_for_appointment(appointment_id)?)
    }

    pub fn payments(&self, invoice_id: InvoiceId) -> BillingResult<Vec<Payment>> {
        Ok(self.repo.list_payments(invoice_id)?)
    }

    /// Voids an invoice that has not received any payment.
    pub fn void_invoice(&mut self, invoice_id: InvoiceId) -> BillingResult<()> {
        let outcome = self
            .repo
            .void_invoice(invoice_id)
            .map_err(|err| not_found_as_invoice(err, invoice_id))?;

        match outcome {
            VoidOutcome::Voided => {
                info!("event=invoice_void module=billing status=ok invoice_id={invoice_id}");
                Ok(())
            }
            VoidOutcome::HasPayments { .. } => {
                warn!(
                    "event=invoice_void module=billing status=rejected invoice_id={invoice_id} reason=has_payments"
                );
                Err(BillingError::HasPayments(invoice_id))
            }
        }
    }
}

fn not_found_as_invoice(err: RepoError, invoice_id: InvoiceId) -> BillingError {
    match err {
        RepoError::NotFound {
            entity: "invoice", ..
        } => BillingError::InvoiceNotFound(invoice_id),
        other => BillingError::Repo(other),
    }
}
