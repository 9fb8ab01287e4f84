//! Subscription and billing columns on `users`.

use std::path::Path;

use sqlx::AnyConnection;

use crate::db::{finish_transaction, Backend, Database};
use crate::ddl::{self, ColumnSpec, IndexSpec};
use crate::errors::OpsError;
use crate::report::{MigrationReport, StepOutcome};
use crate::schema;

pub const NAME: &str = "subscription_fields";

const TABLE: &str = "users";

pub const COLUMNS: [ColumnSpec; 8] = [
    ColumnSpec::portable("subscription_start_date", "TIMESTAMP"),
    ColumnSpec::portable("subscription_end_date", "TIMESTAMP"),
    ColumnSpec::new("auto_renew_enabled", "BOOLEAN DEFAULT FALSE", "BOOLEAN DEFAULT 0"),
    ColumnSpec::portable("payment_method_id", "VARCHAR(255)"),
    ColumnSpec::portable("stripe_subscription_id", "VARCHAR(255)"),
    ColumnSpec::portable("last_billing_date", "TIMESTAMP"),
    ColumnSpec::portable("next_billing_date", "TIMESTAMP"),
    ColumnSpec::portable("subscription_status", "VARCHAR(20) DEFAULT 'active'"),
];

// idx_stripe_customer_id assumes stripe_customer_id was added by the
// backend; on older databases it is reported as a warning.
pub const INDEXES: [IndexSpec; 3] = [
    IndexSpec::new("idx_subscription_end_date", "users", "subscription_end_date"),
    IndexSpec::new("idx_subscription_status", "users", "subscription_status"),
    IndexSpec::new("idx_stripe_customer_id", "users", "stripe_customer_id"),
];

async fn add_columns(
    conn: &mut AnyConnection,
    backend: Backend,
) -> Result<Vec<StepOutcome>, OpsError> {
    if !schema::table_exists(conn, backend, TABLE).await? {
        return Err(OpsError::MissingTable(TABLE.to_string()));
    }
    let mut outcomes = Vec::with_capacity(COLUMNS.len());
    for column in &COLUMNS {
        outcomes.push(ddl::add_column_if_missing(conn, backend, TABLE, column).await?);
    }
    Ok(outcomes)
}

pub async fn migrate_subscription_fields(db: &Database) -> Result<MigrationReport, OpsError> {
    let backend = db.backend();
    let mut report = MigrationReport::new(NAME);

    let mut tx = db.begin().await?;
    let result = add_columns(&mut *tx, backend).await;
    report.extend(finish_transaction(tx, result, "adding subscription fields").await?);

    let mut conn = db.acquire().await?;
    report.extend(ddl::create_indexes_best_effort(&mut *conn, backend, &INDEXES).await);

    let columns = schema::columns(&mut *conn, backend, TABLE).await?;
    let subscription_columns: Vec<_> = columns
        .into_iter()
        .filter(|c| COLUMNS.iter().any(|spec| spec.name == c.name))
        .collect();
    schema::log_columns(TABLE, &subscription_columns);
    report.verified = Some(subscription_columns.len() == COLUMNS.len());

    Ok(report)
}

/// Runs the migration against a local SQLite database file, which must
/// already exist.
pub async fn migrate_subscription_fields_sqlite(path: &Path) -> Result<MigrationReport, OpsError> {
    let db = Database::connect_sqlite_file(path).await?;
    let result = migrate_subscription_fields(&db).await;
    db.close().await;
    result
}
