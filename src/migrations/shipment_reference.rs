//! Adds the optional `reviews.shipment_reference` column and its lookup index.

use sqlx::AnyConnection;

use crate::db::{finish_transaction, Backend, Database};
use crate::ddl::{self, ColumnSpec, IndexSpec};
use crate::errors::OpsError;
use crate::report::{MigrationReport, StepOutcome};
use crate::schema::{self, ColumnInfo};

pub const NAME: &str = "shipment_reference";

const TABLE: &str = "reviews";
pub const EXPECTED_TYPE: &str = "VARCHAR(255)";

const COLUMN: ColumnSpec = ColumnSpec::portable("shipment_reference", "VARCHAR(255)");
const INDEX: IndexSpec =
    IndexSpec::new("idx_reviews_shipment_reference", "reviews", "shipment_reference");

/// Logs and returns the current `reviews` columns.
pub async fn check_current_reviews_schema(
    conn: &mut AnyConnection,
    backend: Backend,
) -> Result<Vec<ColumnInfo>, OpsError> {
    tracing::info!("🔍 Checking current reviews table schema...");
    let columns = schema::columns(conn, backend, TABLE).await?;
    if columns.is_empty() {
        return Err(OpsError::MissingTable(TABLE.to_string()));
    }
    schema::log_columns(TABLE, &columns);
    Ok(columns)
}

/// Adds the column in its own transaction, then the index on the plain
/// connection. The index is a nice-to-have: failing to create it is logged
/// and does not undo the column.
pub async fn add_shipment_reference_column(db: &Database) -> Result<Vec<StepOutcome>, OpsError> {
    let backend = db.backend();

    let mut tx = db.begin().await?;
    let result = ddl::add_column_if_missing(&mut *tx, backend, TABLE, &COLUMN).await;
    let column = finish_transaction(tx, result, "adding shipment_reference column").await?;

    let mut conn = db.acquire().await?;
    let index = ddl::best_effort(
        format!("create index {}", INDEX.name),
        ddl::create_index_if_missing(&mut *conn, backend, &INDEX).await,
    );

    Ok(vec![column, index])
}

/// True when the column exists as a nullable `VARCHAR(255)`.
pub async fn verify_migration(conn: &mut AnyConnection, backend: Backend) -> Result<bool, OpsError> {
    tracing::info!("🔍 Verifying migration...");
    match schema::column(conn, backend, TABLE, COLUMN.name).await? {
        Some(info) => {
            let declared = info.declared_type();
            tracing::info!(
                "  shipment_reference: {} ({})",
                declared,
                if info.is_nullable { "nullable" } else { "NOT NULL" }
            );
            let ok = declared == EXPECTED_TYPE && info.is_nullable;
            if !ok {
                tracing::error!(
                    "❌ shipment_reference has unexpected definition {} nullable={}",
                    declared,
                    info.is_nullable
                );
            }
            Ok(ok)
        }
        None => {
            tracing::error!("❌ shipment_reference column not found");
            Ok(false)
        }
    }
}

pub async fn run(db: &Database) -> Result<MigrationReport, OpsError> {
    let backend = db.backend();
    let mut report = MigrationReport::new(NAME);

    {
        let mut conn = db.acquire().await?;
        check_current_reviews_schema(&mut *conn, backend).await?;
    }

    report.extend(add_shipment_reference_column(db).await?);

    let mut conn = db.acquire().await?;
    report.verified = Some(verify_migration(&mut *conn, backend).await?);
    Ok(report)
}
