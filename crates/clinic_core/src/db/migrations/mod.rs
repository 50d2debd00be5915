//! Clinic schema history.
//!
//! Four steps build the store bottom-up: the directory (people, rooms,
//! catalogs), then appointments, then what hangs off an appointment
//! (prescriptions, then billing). Each step lists the tables it creates,
//! parents before children, so a fresh database can be built in one pass
//! with foreign keys enforced throughout.
//!
//! # Invariants
//! - A table only references tables created before it.
//! - Versions only grow; the applied version lives in `PRAGMA user_version`.
//! - All pending steps commit together or not at all.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    /// Tables created by `sql`, in creation order.
    tables: &'static [&'static str],
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "directory",
        tables: &[
            "specializations",
            "doctors",
            "doctor_specializations",
            "rooms",
            "patients",
            "insurance_providers",
            "patient_insurance",
        ],
        sql: include_str!("0001_directory.sql"),
    },
    Migration {
        version: 2,
        name: "appointments",
        tables: &["appointments"],
        sql: include_str!("0002_appointments.sql"),
    },
    Migration {
        version: 3,
        name: "prescriptions",
        tables: &["medications", "prescriptions", "prescription_items"],
        sql: include_str!("0003_prescriptions.sql"),
    },
    Migration {
        version: 4,
        name: "billing",
        tables: &["invoices", "payments"],
        sql: include_str!("0004_billing.sql"),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Every clinic table, parents before the tables that reference them.
pub fn table_creation_order() -> impl Iterator<Item = &'static str> {
    MIGRATIONS
        .iter()
        .flat_map(|migration| migration.tables.iter().copied())
}

/// Returns the schema version currently recorded on `conn`.
pub fn current_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current = current_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }

    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        info!(
            "event=db_migrate module=db status=ok version={} name={} tables={}",
            migration.version,
            migration.name,
            migration.tables.len()
        );
    }
    tx.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, table_creation_order, MIGRATIONS};
    use rusqlite::Connection;
    use std::collections::BTreeSet;

    #[test]
    fn migration_versions_are_strictly_increasing() {
        let mut previous = 0;
        for migration in MIGRATIONS {
            assert!(migration.version > previous, "{} out of order", migration.name);
            previous = migration.version;
        }
        assert_eq!(latest_version(), previous);
    }

    #[test]
    fn declared_tables_match_the_created_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table';")
            .unwrap();
        let created = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<Result<BTreeSet<_>, _>>()
            .unwrap();
        let declared = table_creation_order()
            .map(str::to_string)
            .collect::<BTreeSet<_>>();
        assert_eq!(created, declared);
    }

    #[test]
    fn every_foreign_key_points_at_an_earlier_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();

        let order = table_creation_order().collect::<Vec<_>>();
        for (position, table) in order.iter().enumerate() {
            let mut stmt = conn
                .prepare(&format!("PRAGMA foreign_key_list({table});"))
                .unwrap();
            let parents = stmt
                .query_map([], |row| row.get::<_, String>("table"))
                .unwrap()
                .collect::<Result<Vec<_>, _>>()
                .unwrap();
            for parent in parents {
                let parent_position = order
                    .iter()
                    .position(|candidate| *candidate == parent)
                    .unwrap_or_else(|| panic!("{table} references unknown {parent}"));
                assert!(
                    parent_position < position,
                    "{table} is created before its parent {parent}"
                );
            }
        }
    }
}
