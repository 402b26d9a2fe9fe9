//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: owners, delegates, audit log
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Owners (global scope)
-- =======================================================================
DEFINE TABLE owner SCHEMAFULL;
DEFINE FIELD email ON TABLE owner TYPE string;
DEFINE FIELD name ON TABLE owner TYPE string;
DEFINE FIELD created_at ON TABLE owner TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE owner TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_owner_email ON TABLE owner COLUMNS email UNIQUE;

-- =======================================================================
-- Delegates (owner scope, email unique across the table)
-- =======================================================================
DEFINE TABLE delegate SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE delegate TYPE string;
DEFINE FIELD email ON TABLE delegate TYPE string;
DEFINE FIELD name ON TABLE delegate TYPE string;
DEFINE FIELD password_hash ON TABLE delegate TYPE string DEFAULT '';
DEFINE FIELD is_password_set ON TABLE delegate TYPE bool DEFAULT false;
DEFINE FIELD requires_password_change ON TABLE delegate TYPE bool \
    DEFAULT false;
DEFINE FIELD status ON TABLE delegate TYPE string \
    ASSERT $value IN ['Active', 'Suspended'];
DEFINE FIELD grants ON TABLE delegate TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD role ON TABLE delegate TYPE string DEFAULT 'co-manager';
DEFINE FIELD last_login ON TABLE delegate TYPE option<datetime>;
DEFINE FIELD created_by ON TABLE delegate TYPE string;
DEFINE FIELD created_at ON TABLE delegate TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE delegate TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_delegate_email ON TABLE delegate COLUMNS email UNIQUE;
DEFINE INDEX idx_delegate_owner ON TABLE delegate COLUMNS owner_id;

-- =======================================================================
-- Audit log (append-only)
-- =======================================================================
DEFINE TABLE audit_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD owner_id ON TABLE audit_log TYPE string;
DEFINE FIELD actor_id ON TABLE audit_log TYPE string;
DEFINE FIELD actor_kind ON TABLE audit_log TYPE string \
    ASSERT $value IN ['Owner', 'Delegate'];
DEFINE FIELD action ON TABLE audit_log TYPE string;
DEFINE FIELD resource ON TABLE audit_log TYPE string;
DEFINE FIELD resource_id ON TABLE audit_log TYPE option<string>;
DEFINE FIELD success ON TABLE audit_log TYPE bool;
DEFINE FIELD error_detail ON TABLE audit_log TYPE option<string>;
DEFINE FIELD timestamp ON TABLE audit_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_owner_time ON TABLE audit_log \
    COLUMNS owner_id, timestamp;
DEFINE INDEX idx_audit_actor ON TABLE audit_log COLUMNS actor_id;
DEFINE INDEX idx_audit_resource ON TABLE audit_log \
    COLUMNS resource, resource_id;
";

/// Apply every migration newer than the recorded schema version.
///
/// The `_migration` tracking table is created on first use. Returns the
/// number of migrations applied by this call, so a second run against
/// the same database returns `0`.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying schema migration"
        );

        // Schema and bookkeeping in one transaction so a failed DDL
        // statement never leaves the version recorded.
        let script = format!(
            "BEGIN TRANSACTION;\n{}\nCREATE _migration SET version = $version, name = $name;\nCOMMIT TRANSACTION;",
            migration.sql
        );
        db.query(script)
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "v{} '{}': {e}",
                    migration.version, migration.name
                ))
            })?;
        applied += 1;
    }

    if applied == 0 {
        info!(version = current_version, "Schema is up to date");
    }
    Ok(applied)
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
