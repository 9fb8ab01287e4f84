//! Drops the retired `branches` table together with the constraints and
//! indexes that still reference it.

use sqlx::AnyConnection;

use crate::db::{finish_transaction, Backend, Database};
use crate::ddl;
use crate::errors::{OpsError, ResultExt};
use crate::ident::Identifier;
use crate::report::{MigrationReport, StepOutcome};
use crate::schema;

pub const NAME: &str = "remove_branches";

const TABLE: &str = "branches";

async fn drop_foreign_keys(conn: &mut AnyConnection, backend: Backend) -> Result<Vec<StepOutcome>, OpsError> {
    let constraints = schema::related_foreign_keys(conn, backend, TABLE, "branch").await?;
    tracing::info!("🔍 Found {} foreign key constraints related to branches", constraints.len());

    let mut outcomes = Vec::with_capacity(constraints.len());
    for constraint in constraints {
        let step = format!("drop constraint {}.{}", constraint.table_name, constraint.name);
        let sql = match (
            Identifier::parse(&constraint.table_name),
            Identifier::parse(&constraint.name),
        ) {
            (Ok(table), Ok(name)) => {
                format!("ALTER TABLE {} DROP CONSTRAINT IF EXISTS {}", table, name)
            }
            (Err(e), _) | (_, Err(e)) => {
                outcomes.push(StepOutcome::failed(step, e));
                continue;
            }
        };
        let result = ddl::execute(conn, &sql).await.map(|_| StepOutcome::applied(step.clone()));
        outcomes.push(ddl::best_effort(step, result));
    }
    Ok(outcomes)
}

async fn drop_indexes(conn: &mut AnyConnection, backend: Backend) -> Result<Vec<StepOutcome>, OpsError> {
    let indexes = schema::indexes_on(conn, backend, TABLE).await?;

    let mut outcomes = Vec::with_capacity(indexes.len());
    for index in indexes {
        let step = format!("drop index {}", index.name);
        // Primary key and unique indexes go away with their constraint or
        // the table itself.
        if index.name.ends_with("_pkey") {
            outcomes.push(StepOutcome::skipped(step, "owned by primary key"));
            continue;
        }
        let sql = match Identifier::parse(&index.name) {
            Ok(name) => format!("DROP INDEX IF EXISTS {}", name),
            Err(e) => {
                outcomes.push(StepOutcome::failed(step, e));
                continue;
            }
        };
        let result = ddl::execute(conn, &sql).await.map(|_| StepOutcome::applied(step.clone()));
        outcomes.push(ddl::best_effort(step, result));
    }
    Ok(outcomes)
}

async fn drop_table(conn: &mut AnyConnection, backend: Backend) -> Result<StepOutcome, OpsError> {
    let sql = match backend {
        Backend::Postgres => "DROP TABLE IF EXISTS branches CASCADE",
        Backend::Sqlite => "DROP TABLE IF EXISTS branches",
    };
    ddl::execute(conn, sql).await.context("dropping branches table")?;
    Ok(StepOutcome::applied("drop table branches"))
}

/// Removes `branches`. Succeeds without doing anything when the table is
/// already gone.
pub async fn remove_branches_table(db: &Database) -> Result<MigrationReport, OpsError> {
    let backend = db.backend();
    let mut report = MigrationReport::new(NAME);

    let mut conn = db.acquire().await?;
    if !schema::table_exists(&mut *conn, backend, TABLE).await? {
        tracing::info!("✅ branches table does not exist, nothing to remove");
        report.push(StepOutcome::skipped("drop table branches", "table does not exist"));
        report.verified = Some(true);
        return Ok(report);
    }

    let rows = schema::row_count(&mut *conn, TABLE).await?;
    tracing::info!("📊 branches table has {} rows", rows);

    report.extend(drop_foreign_keys(&mut *conn, backend).await?);
    report.extend(drop_indexes(&mut *conn, backend).await?);
    drop(conn);

    let mut tx = db.begin().await?;
    let result = drop_table(&mut *tx, backend).await;
    report.push(finish_transaction(tx, result, "dropping branches table").await?);

    let mut conn = db.acquire().await?;
    let gone = !schema::table_exists(&mut *conn, backend, TABLE).await?;
    if gone {
        tracing::info!("✅ branches table successfully removed");
    } else {
        tracing::error!("❌ branches table still exists");
    }
    report.verified = Some(gone);
    Ok(report)
}
