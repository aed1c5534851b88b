//! Versioned schema steps for the note store.
//!
//! # Invariants
//! - Step versions start at 1 and increase by one.
//! - Each step runs in its own transaction and stamps `PRAGMA user_version`
//!   on commit; an interrupted upgrade resumes at the first missing step.
//! - A database stamped past [`latest_version`] is never touched.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

/// One named schema step.
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep {
    pub version: u32,
    pub name: &'static str,
    sql: &'static str,
}

const STEPS: &[MigrationStep] = &[
    MigrationStep {
        version: 1,
        name: "users_notes",
        sql: include_str!("0001_users_notes.sql"),
    },
    MigrationStep {
        version: 2,
        name: "labels",
        sql: include_str!("0002_labels.sql"),
    },
    MigrationStep {
        version: 3,
        name: "checklist_items",
        sql: include_str!("0003_checklist_items.sql"),
    },
];

/// Where a connection's schema stands relative to this binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    Current,
    Behind { version: u32 },
    Ahead { version: u32 },
}

pub fn steps() -> &'static [MigrationStep] {
    STEPS
}

pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

pub fn schema_state(conn: &Connection) -> DbResult<SchemaState> {
    let version = current_user_version(conn)?;
    let latest = latest_version();
    Ok(if version == latest {
        SchemaState::Current
    } else if version < latest {
        SchemaState::Behind { version }
    } else {
        SchemaState::Ahead { version }
    })
}

/// Runs every step newer than the stamped version; returns how many ran.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let from = match schema_state(conn)? {
        SchemaState::Current => return Ok(0),
        SchemaState::Ahead { version } => {
            return Err(DbError::UnsupportedSchemaVersion {
                db_version: version,
                latest_supported: latest_version(),
            })
        }
        SchemaState::Behind { version } => version,
    };

    let mut applied = 0;
    for step in STEPS.iter().filter(|step| step.version > from) {
        run_step(conn, step)?;
        applied += 1;
    }
    Ok(applied)
}

fn run_step(conn: &mut Connection, step: &MigrationStep) -> DbResult<()> {
    let started_at = Instant::now();
    let outcome = conn.transaction().and_then(|tx| {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        tx.commit()
    });

    match outcome {
        Ok(()) => {
            info!(
                "event=db_migrate module=db status=ok step={} version={} duration_ms={}",
                step.name,
                step.version,
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(source) => {
            error!(
                "event=db_migrate module=db status=error step={} version={} duration_ms={} error={}",
                step.name,
                step.version,
                started_at.elapsed().as_millis(),
                source
            );
            Err(DbError::MigrationFailed {
                step: step.name,
                version: step.version,
                source,
            })
        }
    }
}
