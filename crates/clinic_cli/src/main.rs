//! `clinic` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from file, environment and flags.
//! - Open the store, dispatch one subcommand and print its JSON result.

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use clinic_core::{init_logging_from_config, ClinicConfig};
use log::{error, info};

fn resolve_config(cli: &Cli) -> Result<ClinicConfig> {
    let mut config = match &cli.config {
        Some(path) => ClinicConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ClinicConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.database_path = db.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<serde_json::Value> {
    let config = resolve_config(&cli)?;
    init_logging_from_config(&config)
        .map_err(anyhow::Error::msg)
        .context("failed to start logging")?;

    let mut conn = clinic_core::db::open_db(&config.database_path).with_context(|| {
        format!(
            "failed to open database {}",
            config.database_path.display()
        )
    })?;
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );

    match cli.command {
        Commands::Init => Ok(commands::init(&config)),
        Commands::Patient(command) => commands::patient(&conn, command),
        Commands::Doctor(command) => commands::doctor(&mut conn, command),
        Commands::Specialization(command) => commands::specialization(&conn, command),
        Commands::Book(args) => commands::book(&conn, &config, args),
        Commands::Reschedule { appointment, at } => {
            commands::reschedule(&conn, &config, appointment, at)
        }
        Commands::Status { appointment, to } => commands::status(&conn, &config, appointment, to),
        Commands::Schedule { doctor, from, to } => {
            commands::schedule(&conn, &config, doctor, from, to)
        }
        Commands::Invoice(command) => commands::invoice(&mut conn, &config, command),
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init => "init",
        Commands::Patient(_) => "patient",
        Commands::Doctor(_) => "doctor",
        Commands::Specialization(_) => "specialization",
        Commands::Book(_) => "book",
        Commands::Reschedule { .. } => "reschedule",
        Commands::Status { .. } => "status",
        Commands::Schedule { .. } => "schedule",
        Commands::Invoice(_) => "invoice",
    }
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(document) => println!("{document:#}"),
        Err(err) => {
            error!("event=cli_command module=cli status=error");
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
