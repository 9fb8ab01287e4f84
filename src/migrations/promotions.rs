//! Review-reward promotion tables and their default configuration row.

use sqlx::AnyConnection;

use crate::db::{finish_transaction, Backend, Database};
use crate::ddl::{self, TableSpec};
use crate::errors::{OpsError, ResultExt};
use crate::report::{MigrationReport, StepOutcome};
use crate::schema;
use crate::seed::DEFAULT_PROMOTION;

pub const NAME: &str = "promotion_tables";

pub const PROMOTION_CONFIG: TableSpec = TableSpec {
    name: "promotion_config",
    postgres: "CREATE TABLE IF NOT EXISTS promotion_config (
        id SERIAL PRIMARY KEY,
        is_active BOOLEAN DEFAULT true,
        max_rewards_per_user INTEGER DEFAULT 3,
        reward_months INTEGER DEFAULT 1,
        description TEXT,
        created_at TIMESTAMP DEFAULT NOW(),
        updated_at TIMESTAMP DEFAULT NOW()
    )",
    sqlite: "CREATE TABLE IF NOT EXISTS promotion_config (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        is_active BOOLEAN DEFAULT 1,
        max_rewards_per_user INTEGER DEFAULT 3,
        reward_months INTEGER DEFAULT 1,
        description TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )",
};

pub const USER_REWARDS: TableSpec = TableSpec {
    name: "user_rewards",
    postgres: "CREATE TABLE IF NOT EXISTS user_rewards (
        id SERIAL PRIMARY KEY,
        user_id UUID REFERENCES users(id),
        review_id UUID REFERENCES reviews(id),
        months_awarded INTEGER NOT NULL,
        awarded_at TIMESTAMP DEFAULT NOW(),
        awarded_by UUID REFERENCES users(id),
        created_at TIMESTAMP DEFAULT NOW()
    )",
    sqlite: "CREATE TABLE IF NOT EXISTS user_rewards (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT REFERENCES users(id),
        review_id TEXT REFERENCES reviews(id),
        months_awarded INTEGER NOT NULL,
        awarded_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        awarded_by TEXT REFERENCES users(id),
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )",
};

/// Inserts the default promotion only into an empty config table, so a
/// re-run never stacks duplicate rows.
pub async fn insert_default_config(conn: &mut AnyConnection) -> Result<StepOutcome, OpsError> {
    let step = "insert default promotion config";
    let existing = schema::row_count(conn, PROMOTION_CONFIG.name).await?;
    if existing > 0 {
        return Ok(StepOutcome::skipped(step, format!("{} config rows present", existing)));
    }

    sqlx::query(
        "INSERT INTO promotion_config (is_active, max_rewards_per_user, reward_months, description) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(DEFAULT_PROMOTION.is_active)
    .bind(DEFAULT_PROMOTION.max_rewards_per_user)
    .bind(DEFAULT_PROMOTION.reward_months)
    .bind(DEFAULT_PROMOTION.description)
    .execute(&mut *conn)
    .await
    .context("inserting default promotion config")?;
    Ok(StepOutcome::applied(step))
}

async fn create_tables(conn: &mut AnyConnection, backend: Backend) -> Result<Vec<StepOutcome>, OpsError> {
    Ok(vec![
        ddl::create_table_if_missing(conn, backend, &PROMOTION_CONFIG).await?,
        ddl::create_table_if_missing(conn, backend, &USER_REWARDS).await?,
        insert_default_config(conn).await?,
    ])
}

pub async fn create_promotion_tables(db: &Database) -> Result<MigrationReport, OpsError> {
    let backend = db.backend();
    let mut report = MigrationReport::new(NAME);

    let mut tx = db.begin().await?;
    let result = create_tables(&mut *tx, backend).await;
    report.extend(finish_transaction(tx, result, "creating promotion tables").await?);

    let mut conn = db.acquire().await?;
    let mut verified = true;
    for table in [PROMOTION_CONFIG.name, USER_REWARDS.name] {
        if schema::table_exists(&mut *conn, backend, table).await? {
            tracing::info!("✅ {} table verified", table);
        } else {
            tracing::error!("❌ {} table missing after migration", table);
            verified = false;
        }
    }
    report.verified = Some(verified);
    Ok(report)
}
