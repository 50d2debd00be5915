//! Invoices and payments.
//!
//! # Invariants
//! - An appointment has at most one invoice.
//! - `total_amount_cents >= 0` and `amount_cents > 0`.
//! - `void` and `paid` invoices accept no further payments.

use crate::model::appointment::AppointmentId;
use crate::model::validation::{
    check_currency, require_non_negative, require_positive, ValidationError, ValidationResult,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type InvoiceId = Uuid;
pub type PaymentId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    #[default]
    Issued,
    Paid,
    Void,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Issued => "issued",
            Self::Paid => "paid",
            Self::Void => "void",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "issued" => Some(Self::Issued),
            "paid" => Some(Self::Paid),
            "void" => Some(Self::Void),
            _ => None,
        }
    }

    pub fn accepts_payments(self) -> bool {
        matches!(self, Self::Draft | Self::Issued)
    }
}

impl Display for InvoiceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobileMoney,
    Insurance,
    Bank,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::MobileMoney => "mobile_money",
            Self::Insurance => "insurance",
            Self::Bank => "bank",
        }
    }

    /// Parses storage text. Also accepts the hyphenated `mobile-money`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cash" => Some(Self::Cash),
            "card" => Some(Self::Card),
            "mobile_money" | "mobile-money" => Some(Self::MobileMoney),
            "insurance" => Some(Self::Insurance),
            "bank" => Some(Self::Bank),
            _ => None,
        }
    }
}

/// Billing record for one appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub uuid: InvoiceId,
    pub appointment_id: AppointmentId,
    pub total_amount_cents: i64,
    /// ISO 4217 code.
    pub currency: String,
    pub status: InvoiceStatus,
    pub issued_at: i64,
    pub due_at: Option<i64>,
}

impl Invoice {
    /// Creates an `issued` invoice. A zero total has nothing to collect and
    /// starts out `paid`.
    pub fn new(
        appointment_id: AppointmentId,
        total_amount_cents: i64,
        currency: impl Into<String>,
        issued_at: i64,
    ) -> Self {
        let status = if total_amount_cents == 0 {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::Issued
        };
        Self {
            uuid: Uuid::new_v4(),
            appointment_id,
            total_amount_cents,
            currency: currency.into(),
            status,
            issued_at,
            due_at: None,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require_non_negative("total_amount_cents", self.total_amount_cents)?;
        check_currency(&self.currency)?;
        if let Some(due_at) = self.due_at {
            if due_at < self.issued_at {
                return Err(ValidationError::OutOfOrder {
                    earlier: "issued_at",
                    later: "due_at",
                });
            }
        }
        Ok(())
    }
}

/// A monetary transaction against an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub uuid: PaymentId,
    pub invoice_id: InvoiceId,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub paid_at: i64,
    /// External receipt or transaction reference.
    pub reference: Option<String>,
}

impl Payment {
    pub fn new(
        invoice_id: InvoiceId,
        amount_cents: i64,
        method: PaymentMethod,
        paid_at: i64,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            invoice_id,
            amount_cents,
            method,
            paid_at,
            reference: None,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require_positive("amount_cents", self.amount_cents)
    }
}
