//! Brings `disputes` in line with the dispute workflow: reporter, reason,
//! notes, resolution timestamps and the two foreign keys.

use sqlx::AnyConnection;

use crate::db::{finish_transaction, Backend, Database};
use crate::ddl::{self, ColumnSpec};
use crate::errors::{OpsError, ResultExt};
use crate::report::{MigrationReport, StepOutcome};
use crate::schema;

pub const NAME: &str = "dispute_schema";

const TABLE: &str = "disputes";

const REPORTED_BY: ColumnSpec =
    ColumnSpec::new("reported_by", "UUID REFERENCES users(id)", "TEXT REFERENCES users(id)");

pub const COLUMNS: [ColumnSpec; 5] = [
    ColumnSpec::portable("reason", "VARCHAR(255) NOT NULL DEFAULT 'General Dispute'"),
    ColumnSpec::portable("description", "TEXT"),
    ColumnSpec::portable("admin_notes", "TEXT"),
    ColumnSpec::new("resolved_at", "TIMESTAMP WITH TIME ZONE", "DATETIME"),
    // SQLite refuses non-constant defaults in ADD COLUMN.
    ColumnSpec::new(
        "updated_at",
        "TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP",
        "DATETIME",
    ),
];

struct ForeignKey {
    name: &'static str,
    definition: &'static str,
}

const FOREIGN_KEYS: [ForeignKey; 2] = [
    ForeignKey {
        name: "disputes_review_id_fkey",
        definition: "FOREIGN KEY (review_id) REFERENCES reviews(id) ON DELETE CASCADE",
    },
    ForeignKey {
        name: "disputes_reported_by_fkey",
        definition: "FOREIGN KEY (reported_by) REFERENCES users(id)",
    },
];

/// Older databases stored the reporter in `resolved_by`; rename it when
/// that is the only candidate, otherwise add a fresh column.
async fn ensure_reported_by(conn: &mut AnyConnection, backend: Backend) -> Result<StepOutcome, OpsError> {
    let has_reported_by = schema::column_exists(conn, backend, TABLE, "reported_by").await?;
    let has_resolved_by = schema::column_exists(conn, backend, TABLE, "resolved_by").await?;

    match (has_reported_by, has_resolved_by) {
        (true, _) => Ok(StepOutcome::skipped("add column disputes.reported_by", "already exists")),
        (false, true) => {
            ddl::execute(conn, "ALTER TABLE disputes RENAME COLUMN resolved_by TO reported_by")
                .await
                .context("renaming disputes.resolved_by")?;
            Ok(StepOutcome::applied("rename disputes.resolved_by to reported_by"))
        }
        (false, false) => ddl::add_column_if_missing(conn, backend, TABLE, &REPORTED_BY).await,
    }
}

async fn fix_columns(conn: &mut AnyConnection, backend: Backend) -> Result<Vec<StepOutcome>, OpsError> {
    if !schema::table_exists(conn, backend, TABLE).await? {
        return Err(OpsError::MissingTable(TABLE.to_string()));
    }

    let mut outcomes = vec![ensure_reported_by(conn, backend).await?];
    for column in &COLUMNS {
        outcomes.push(ddl::add_column_if_missing(conn, backend, TABLE, column).await?);
    }
    Ok(outcomes)
}

/// Column fixes, all-or-nothing.
pub async fn fix_complete_dispute_schema(db: &Database) -> Result<Vec<StepOutcome>, OpsError> {
    let backend = db.backend();
    let mut tx = db.begin().await?;
    let result = fix_columns(&mut *tx, backend).await;
    finish_transaction(tx, result, "fixing dispute columns").await
}

/// Adds the missing foreign keys one at a time; each failure is logged and
/// the next one is still attempted.
pub async fn add_dispute_relationships(
    conn: &mut AnyConnection,
    backend: Backend,
) -> Result<Vec<StepOutcome>, OpsError> {
    if backend == Backend::Sqlite {
        return Ok(vec![StepOutcome::skipped(
            "add dispute foreign keys",
            "SQLite cannot add constraints to an existing table",
        )]);
    }

    let existing = schema::constraints(conn, backend, TABLE).await?;
    let mut outcomes = Vec::with_capacity(FOREIGN_KEYS.len());
    for fk in &FOREIGN_KEYS {
        let step = format!("add constraint {}", fk.name);
        if existing.iter().any(|c| c.name == fk.name) {
            outcomes.push(StepOutcome::skipped(step, "already exists"));
            continue;
        }
        let sql = format!("ALTER TABLE disputes ADD CONSTRAINT {} {}", fk.name, fk.definition);
        let result = ddl::execute(conn, &sql).await.map(|_| StepOutcome::applied(step.clone()));
        outcomes.push(ddl::best_effort(step, result));
    }
    Ok(outcomes)
}

pub async fn run(db: &Database) -> Result<MigrationReport, OpsError> {
    let backend = db.backend();
    let mut report = MigrationReport::new(NAME);

    report.extend(fix_complete_dispute_schema(db).await?);

    let mut conn = db.acquire().await?;
    report.extend(add_dispute_relationships(&mut *conn, backend).await?);

    let columns = schema::columns(&mut *conn, backend, TABLE).await?;
    schema::log_columns(TABLE, &columns);
    let complete = std::iter::once("reported_by")
        .chain(COLUMNS.iter().map(|c| c.name))
        .all(|name| columns.iter().any(|c| c.name == name));
    report.verified = Some(complete);
    Ok(report)
}
