//! Journal schema steps and the upgrade runner.
//!
//! # Responsibility
//! - List every schema step the journal store has gone through.
//! - Bring an older journal file up to date in one transaction.
//!
//! # Invariants
//! - Step versions start at 1 and increase by exactly one.
//! - A failed step rolls back every step of the same upgrade and leaves
//!   `user_version` untouched.
//!
//! # Steps
//! - 1 `init`: journal header, time sections, health records,
//!   achievements, anonymous identity slot.
//! - 2 `activity_notes`: per-section prompt answers (JSON object text).

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        name: "activity_notes",
        sql: include_str!("0002_activity_notes.sql"),
    },
];

/// Versions before and after one upgrade run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaUpgrade {
    pub from: u32,
    pub to: u32,
}

impl SchemaUpgrade {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Returns the schema version this build writes.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Reads the schema version stored in the file.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Runs every step newer than the stored schema version.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<SchemaUpgrade> {
    let from = schema_version(conn)?;
    let supported = latest_version();
    if from > supported {
        return Err(DbError::SchemaTooNew {
            found: from,
            supported,
        });
    }

    let upgrade = SchemaUpgrade {
        from,
        to: supported,
    };
    if upgrade.is_noop() {
        debug!("event=db_migrate module=db status=skip version={from}");
        return Ok(upgrade);
    }

    let tx = conn.transaction()?;
    for step in SCHEMA_STEPS.iter().filter(|step| step.version > from) {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| DbError::Migration {
                version: step.version,
                name: step.name,
                source,
            })?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        upgrade.from, upgrade.to
    );
    Ok(upgrade)
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, schema_version, SchemaUpgrade, SCHEMA_STEPS};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn step_versions_are_contiguous() {
        for (index, step) in SCHEMA_STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1, "step {}", step.name);
        }
    }

    #[test]
    fn fresh_database_reports_full_upgrade_then_noop() {
        let mut conn = Connection::open_in_memory().unwrap();

        let first = apply_migrations(&mut conn).unwrap();
        assert_eq!(
            first,
            SchemaUpgrade {
                from: 0,
                to: latest_version()
            }
        );

        let second = apply_migrations(&mut conn).unwrap();
        assert!(second.is_noop());
    }

    #[test]
    fn failing_step_names_its_version_and_rolls_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_STEPS[0].sql).unwrap();
        conn.execute_batch(
            "ALTER TABLE time_sections ADD COLUMN activity_notes TEXT;
             PRAGMA user_version = 1;",
        )
        .unwrap();

        match apply_migrations(&mut conn).unwrap_err() {
            DbError::Migration { version, name, .. } => {
                assert_eq!(version, 2);
                assert_eq!(name, "activity_notes");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(schema_version(&conn).unwrap(), 1);
    }
}
