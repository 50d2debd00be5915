//! Command-line surface of the `clinic` binary.

use chrono::DateTime;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clinic_core::{Gender, PaymentMethod};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "clinic")]
#[command(about = "Clinic appointment booking store", long_about = None)]
#[command(version)]
pub struct Cli {
    /// TOML config file
    #[arg(long, global = true, env = "CLINIC_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database path (overrides the config file)
    #[arg(long, global = true, env = "CLINIC_DB")]
    pub db: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true, env = "CLINIC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files
    #[arg(long, global = true, env = "CLINIC_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and apply pending migrations
    Init,

    /// Manage patients
    #[command(subcommand)]
    Patient(PatientCommand),

    /// Manage doctors
    #[command(subcommand)]
    Doctor(DoctorCommand),

    /// Manage the specialization catalog
    #[command(subcommand)]
    Specialization(SpecializationCommand),

    /// Book an appointment slot
    Book(BookArgs),

    /// Move a scheduled appointment to another instant
    Reschedule {
        #[arg(long)]
        appointment: Uuid,

        /// New start time, RFC 3339
        #[arg(long, value_parser = parse_instant)]
        at: i64,
    },

    /// Apply a lifecycle step to an appointment
    Status {
        #[arg(long)]
        appointment: Uuid,

        #[arg(long, value_enum)]
        to: StatusStep,
    },

    /// List a doctor's appointments in `[from, to)`
    Schedule {
        #[arg(long)]
        doctor: Uuid,

        /// Range start, RFC 3339
        #[arg(long, value_parser = parse_instant)]
        from: i64,

        /// Range end (exclusive), RFC 3339
        #[arg(long, value_parser = parse_instant)]
        to: i64,
    },

    /// Issue and settle invoices
    #[command(subcommand)]
    Invoice(InvoiceCommand),
}

#[derive(Subcommand, Debug)]
pub enum PatientCommand {
    Add {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        email: Option<String>,

        /// Calendar date, YYYY-MM-DD
        #[arg(long)]
        date_of_birth: Option<String>,

        #[arg(long, value_parser = parse_gender, default_value = "unspecified")]
        gender: Gender,
    },
    List {
        /// Case-insensitive match on first or last name
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    Delete {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
pub enum DoctorCommand {
    Add {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        license: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Specialization ids to link, repeatable
        #[arg(long = "specialization")]
        specializations: Vec<Uuid>,
    },
    List {
        /// Only doctors linked to this specialization
        #[arg(long)]
        specialization: Option<Uuid>,
    },
    Delete {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
pub enum SpecializationCommand {
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,
    },
    List,
}

#[derive(Args, Debug)]
pub struct BookArgs {
    #[arg(long)]
    pub patient: Uuid,

    #[arg(long)]
    pub doctor: Uuid,

    #[arg(long)]
    pub room: Option<Uuid>,

    /// Start time, RFC 3339
    #[arg(long, value_parser = parse_instant)]
    pub at: i64,

    /// Length in minutes (config default when omitted)
    #[arg(long)]
    pub minutes: Option<u32>,

    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum InvoiceCommand {
    Issue {
        #[arg(long)]
        appointment: Uuid,

        /// Total in minor currency units
        #[arg(long)]
        total_cents: i64,

        /// ISO 4217 code (config default when omitted)
        #[arg(long)]
        currency: Option<String>,

        /// Due date, RFC 3339
        #[arg(long, value_parser = parse_instant)]
        due: Option<i64>,
    },
    Pay {
        #[arg(long)]
        invoice: Uuid,

        #[arg(long)]
        amount_cents: i64,

        #[arg(long, value_parser = parse_method)]
        method: PaymentMethod,

        #[arg(long)]
        reference: Option<String>,
    },
    Show {
        #[arg(long)]
        invoice: Uuid,
    },
    Void {
        #[arg(long)]
        invoice: Uuid,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusStep {
    CheckIn,
    Complete,
    Cancel,
    NoShow,
}

/// Parses an RFC 3339 instant into epoch milliseconds.
pub fn parse_instant(value: &str) -> Result<i64, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.timestamp_millis())
        .map_err(|err| format!("`{value}` is not an RFC 3339 timestamp: {err}"))
}

fn parse_gender(value: &str) -> Result<Gender, String> {
    Gender::parse(value).ok_or_else(|| format!("unknown gender `{value}`"))
}

fn parse_method(value: &str) -> Result<PaymentMethod, String> {
    PaymentMethod::parse(value).ok_or_else(|| {
        format!("unknown payment method `{value}` (cash, card, mobile_money, insurance, bank)")
    })
}
