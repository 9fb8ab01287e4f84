//! Score-threshold alert subscriptions and their notification log, plus the
//! later `expires_at` addition.

use sqlx::AnyConnection;

use crate::db::{finish_transaction, Backend, Database};
use crate::ddl::{self, ColumnSpec, IndexSpec, TableSpec};
use crate::errors::OpsError;
use crate::report::{MigrationReport, StepOutcome};
use crate::schema;

pub const NAME: &str = "score_threshold_tables";
pub const EXPIRES_AT_NAME: &str = "expires_at_column";

pub const SUBSCRIPTIONS: TableSpec = TableSpec {
    name: "score_threshold_subscriptions",
    postgres: "CREATE TABLE IF NOT EXISTS score_threshold_subscriptions (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        freight_forwarder_id UUID NOT NULL REFERENCES freight_forwarders(id) ON DELETE CASCADE,
        threshold_score NUMERIC(3,2) NOT NULL CHECK (threshold_score >= 0 AND threshold_score <= 5),
        notification_frequency VARCHAR(20) DEFAULT 'immediate'
            CHECK (notification_frequency IN ('immediate', 'daily', 'weekly')),
        is_active BOOLEAN DEFAULT TRUE,
        expires_at TIMESTAMP WITH TIME ZONE,
        last_notification_sent TIMESTAMP WITH TIME ZONE,
        created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
        UNIQUE(user_id, freight_forwarder_id)
    )",
    sqlite: "CREATE TABLE IF NOT EXISTS score_threshold_subscriptions (
        id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
        user_id TEXT NOT NULL,
        freight_forwarder_id TEXT NOT NULL,
        threshold_score REAL NOT NULL CHECK (threshold_score >= 0 AND threshold_score <= 5),
        notification_frequency TEXT DEFAULT 'immediate'
            CHECK (notification_frequency IN ('immediate', 'daily', 'weekly')),
        is_active BOOLEAN DEFAULT 1,
        expires_at DATETIME,
        last_notification_sent DATETIME,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        UNIQUE(user_id, freight_forwarder_id),
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (freight_forwarder_id) REFERENCES freight_forwarders(id) ON DELETE CASCADE
    )",
};

pub const NOTIFICATIONS: TableSpec = TableSpec {
    name: "score_threshold_notifications",
    postgres: "CREATE TABLE IF NOT EXISTS score_threshold_notifications (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        freight_forwarder_id UUID NOT NULL REFERENCES freight_forwarders(id) ON DELETE CASCADE,
        subscription_id UUID NOT NULL REFERENCES score_threshold_subscriptions(id) ON DELETE CASCADE,
        previous_score NUMERIC(3,2) NOT NULL,
        current_score NUMERIC(3,2) NOT NULL,
        threshold_score NUMERIC(3,2) NOT NULL,
        notification_type VARCHAR(50) DEFAULT 'score_threshold_breach'
            CHECK (notification_type IN ('score_threshold_breach', 'score_recovery')),
        is_sent BOOLEAN DEFAULT FALSE,
        sent_at TIMESTAMP WITH TIME ZONE,
        created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
    )",
    sqlite: "CREATE TABLE IF NOT EXISTS score_threshold_notifications (
        id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
        user_id TEXT NOT NULL,
        freight_forwarder_id TEXT NOT NULL,
        subscription_id TEXT NOT NULL,
        previous_score REAL NOT NULL,
        current_score REAL NOT NULL,
        threshold_score REAL NOT NULL,
        notification_type TEXT DEFAULT 'score_threshold_breach'
            CHECK (notification_type IN ('score_threshold_breach', 'score_recovery')),
        is_sent BOOLEAN DEFAULT 0,
        sent_at DATETIME,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (freight_forwarder_id) REFERENCES freight_forwarders(id) ON DELETE CASCADE,
        FOREIGN KEY (subscription_id) REFERENCES score_threshold_subscriptions(id) ON DELETE CASCADE
    )",
};

pub const INDEXES: [IndexSpec; 6] = [
    IndexSpec::new(
        "idx_score_threshold_subscriptions_user_id",
        "score_threshold_subscriptions",
        "user_id",
    ),
    IndexSpec::new(
        "idx_score_threshold_subscriptions_freight_forwarder_id",
        "score_threshold_subscriptions",
        "freight_forwarder_id",
    ),
    IndexSpec::partial(
        "idx_score_threshold_subscriptions_active",
        "score_threshold_subscriptions",
        "is_active",
        "is_active = TRUE",
    ),
    IndexSpec::new(
        "idx_score_threshold_notifications_user_id",
        "score_threshold_notifications",
        "user_id",
    ),
    IndexSpec::new(
        "idx_score_threshold_notifications_freight_forwarder_id",
        "score_threshold_notifications",
        "freight_forwarder_id",
    ),
    IndexSpec::new(
        "idx_score_threshold_notifications_created_at",
        "score_threshold_notifications",
        "created_at",
    ),
];

const EXPIRES_AT: ColumnSpec = ColumnSpec::new("expires_at", "TIMESTAMP WITH TIME ZONE", "DATETIME");

async fn create_tables_and_indexes(
    conn: &mut AnyConnection,
    backend: Backend,
) -> Result<Vec<StepOutcome>, OpsError> {
    let mut outcomes = vec![
        ddl::create_table_if_missing(conn, backend, &SUBSCRIPTIONS).await?,
        ddl::create_table_if_missing(conn, backend, &NOTIFICATIONS).await?,
    ];
    for index in &INDEXES {
        outcomes.push(ddl::create_index_if_missing(conn, backend, index).await?);
    }
    Ok(outcomes)
}

pub async fn add_score_threshold_tables(db: &Database) -> Result<MigrationReport, OpsError> {
    let backend = db.backend();
    let mut report = MigrationReport::new(NAME);

    let mut tx = db.begin().await?;
    let result = create_tables_and_indexes(&mut *tx, backend).await;
    report.extend(finish_transaction(tx, result, "creating score threshold tables").await?);

    let mut conn = db.acquire().await?;
    let mut verified = true;
    for table in [SUBSCRIPTIONS.name, NOTIFICATIONS.name] {
        verified &= schema::table_exists(&mut *conn, backend, table).await?;
    }
    report.verified = Some(verified);
    Ok(report)
}

async fn add_expires_at(conn: &mut AnyConnection, backend: Backend) -> Result<StepOutcome, OpsError> {
    if !schema::table_exists(conn, backend, SUBSCRIPTIONS.name).await? {
        return Err(OpsError::MissingTable(SUBSCRIPTIONS.name.to_string()));
    }
    ddl::add_column_if_missing(conn, backend, SUBSCRIPTIONS.name, &EXPIRES_AT).await
}

/// Adds `expires_at` to subscriptions created before the column existed.
pub async fn add_expires_at_column(db: &Database) -> Result<MigrationReport, OpsError> {
    let backend = db.backend();
    let mut report = MigrationReport::new(EXPIRES_AT_NAME);

    let mut tx = db.begin().await?;
    let result = add_expires_at(&mut *tx, backend).await;
    report.push(finish_transaction(tx, result, "adding expires_at column").await?);

    let mut conn = db.acquire().await?;
    report.verified = Some(
        schema::column_exists(&mut *conn, backend, SUBSCRIPTIONS.name, EXPIRES_AT.name).await?,
    );
    Ok(report)
}
