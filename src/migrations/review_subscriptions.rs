//! New-review alert subscriptions and the notification queue behind them.

use sqlx::AnyConnection;

use crate::db::{finish_transaction, Backend, Database};
use crate::ddl::{self, IndexSpec, TableSpec};
use crate::errors::OpsError;
use crate::report::{MigrationReport, StepOutcome};
use crate::schema;

pub const NAME: &str = "review_subscriptions";

pub const SUBSCRIPTIONS: TableSpec = TableSpec {
    name: "review_subscriptions",
    postgres: "CREATE TABLE IF NOT EXISTS review_subscriptions (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        freight_forwarder_id UUID REFERENCES freight_forwarders(id) ON DELETE CASCADE,
        location_country VARCHAR(100),
        location_city VARCHAR(100),
        review_type VARCHAR(50),
        notification_frequency VARCHAR(20) DEFAULT 'immediate',
        is_active BOOLEAN DEFAULT TRUE,
        created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
    )",
    sqlite: "CREATE TABLE IF NOT EXISTS review_subscriptions (
        id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        freight_forwarder_id TEXT REFERENCES freight_forwarders(id) ON DELETE CASCADE,
        location_country VARCHAR(100),
        location_city VARCHAR(100),
        review_type VARCHAR(50),
        notification_frequency VARCHAR(20) DEFAULT 'immediate',
        is_active BOOLEAN DEFAULT 1,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )",
};

pub const NOTIFICATIONS: TableSpec = TableSpec {
    name: "review_notifications",
    postgres: "CREATE TABLE IF NOT EXISTS review_notifications (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        review_id UUID NOT NULL REFERENCES reviews(id) ON DELETE CASCADE,
        subscription_id UUID NOT NULL REFERENCES review_subscriptions(id) ON DELETE CASCADE,
        notification_type VARCHAR(50) DEFAULT 'new_review',
        is_sent BOOLEAN DEFAULT FALSE,
        sent_at TIMESTAMP WITH TIME ZONE,
        created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
    )",
    sqlite: "CREATE TABLE IF NOT EXISTS review_notifications (
        id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        review_id TEXT NOT NULL REFERENCES reviews(id) ON DELETE CASCADE,
        subscription_id TEXT NOT NULL REFERENCES review_subscriptions(id) ON DELETE CASCADE,
        notification_type VARCHAR(50) DEFAULT 'new_review',
        is_sent BOOLEAN DEFAULT 0,
        sent_at DATETIME,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )",
};

/// Lookup indexes used by the notification dispatcher. The composite index
/// serves its "active subscriptions for this forwarder/location" query.
pub const INDEXES: [IndexSpec; 10] = [
    IndexSpec::new("idx_review_subscriptions_user_id", "review_subscriptions", "user_id"),
    IndexSpec::new(
        "idx_review_subscriptions_freight_forwarder_id",
        "review_subscriptions",
        "freight_forwarder_id",
    ),
    IndexSpec::new(
        "idx_review_subscriptions_location",
        "review_subscriptions",
        "location_country, location_city",
    ),
    IndexSpec::new("idx_review_subscriptions_review_type", "review_subscriptions", "review_type"),
    IndexSpec::new("idx_review_subscriptions_active", "review_subscriptions", "is_active"),
    IndexSpec::new(
        "idx_review_subscriptions_composite",
        "review_subscriptions",
        "is_active, freight_forwarder_id, location_country, location_city",
    ),
    IndexSpec::new("idx_review_notifications_user_id", "review_notifications", "user_id"),
    IndexSpec::new("idx_review_notifications_review_id", "review_notifications", "review_id"),
    IndexSpec::new(
        "idx_review_notifications_subscription_id",
        "review_notifications",
        "subscription_id",
    ),
    IndexSpec::new("idx_review_notifications_sent", "review_notifications", "is_sent, sent_at"),
];

async fn create_tables(conn: &mut AnyConnection, backend: Backend) -> Result<Vec<StepOutcome>, OpsError> {
    Ok(vec![
        ddl::create_table_if_missing(conn, backend, &SUBSCRIPTIONS).await?,
        ddl::create_table_if_missing(conn, backend, &NOTIFICATIONS).await?,
    ])
}

/// Logs every index currently present on the two tables.
pub async fn check_existing_indexes(
    conn: &mut AnyConnection,
    backend: Backend,
) -> Result<usize, OpsError> {
    let mut total = 0;
    for table in [SUBSCRIPTIONS.name, NOTIFICATIONS.name] {
        let indexes = schema::indexes_on(conn, backend, table).await?;
        tracing::info!("📋 {} indexes on {}", indexes.len(), table);
        for index in &indexes {
            tracing::info!("  - {}", index.name);
        }
        total += indexes.len();
    }
    Ok(total)
}

pub async fn migrate_review_subscriptions(db: &Database) -> Result<MigrationReport, OpsError> {
    let backend = db.backend();
    let mut report = MigrationReport::new(NAME);

    let mut tx = db.begin().await?;
    let result = create_tables(&mut *tx, backend).await;
    report.extend(finish_transaction(tx, result, "creating review subscription tables").await?);

    let mut conn = db.acquire().await?;
    report.extend(ddl::create_indexes_best_effort(&mut *conn, backend, &INDEXES).await);
    check_existing_indexes(&mut *conn, backend).await?;

    let mut verified = true;
    for table in [SUBSCRIPTIONS.name, NOTIFICATIONS.name] {
        let columns = schema::columns(&mut *conn, backend, table).await?;
        if columns.is_empty() {
            tracing::error!("❌ {} table missing after migration", table);
            verified = false;
        } else {
            tracing::info!("✅ {} table has {} columns", table, columns.len());
        }
    }
    report.verified = Some(verified);
    Ok(report)
}
