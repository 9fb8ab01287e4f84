use std::env;
use uuid::Uuid;

use logiscore_ops::db::Database;
use logiscore_ops::migrations::{self, MigrationName};
use logiscore_ops::seed;

const BASE_SCHEMA: [&str; 6] = [
    "CREATE TABLE users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        email VARCHAR(255) NOT NULL,
        username VARCHAR(255),
        company_name VARCHAR(255),
        user_type VARCHAR(50),
        stripe_customer_id VARCHAR(255)
    )",
    "CREATE TABLE freight_forwarders (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL,
        global_rank INTEGER,
        is_active BOOLEAN DEFAULT TRUE,
        updated_at TIMESTAMP
    )",
    "CREATE TABLE branches (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        freight_forwarder_id UUID REFERENCES freight_forwarders(id),
        city VARCHAR(100),
        country VARCHAR(100)
    )",
    "CREATE INDEX idx_branches_forwarder ON branches (freight_forwarder_id)",
    "CREATE TABLE reviews (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        freight_forwarder_id UUID REFERENCES freight_forwarders(id),
        branch_id UUID REFERENCES branches(id),
        user_id UUID REFERENCES users(id),
        overall_rating INTEGER,
        is_anonymous BOOLEAN DEFAULT FALSE,
        is_active BOOLEAN DEFAULT TRUE,
        created_at TIMESTAMP DEFAULT NOW()
    )",
    "CREATE TABLE disputes (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        review_id UUID REFERENCES reviews(id),
        resolved_by UUID REFERENCES users(id),
        status VARCHAR(50)
    )",
];

/// Full migration run against a real PostgreSQL server, inside a throwaway
/// schema. Marked ignored; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn all_migrations_apply_once_on_postgres() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL to run this test"))?;

    let schema = format!("ops_test_{}", Uuid::new_v4().simple());
    let admin = Database::connect(&db_url).await?;
    sqlx::query(&format!("CREATE SCHEMA {}", schema))
        .execute(admin.pool())
        .await?;

    let separator = if db_url.contains('?') { '&' } else { '?' };
    let scoped_url = format!("{}{}options=-c%20search_path%3D{}", db_url, separator, schema);
    let db = Database::connect(&scoped_url).await?;

    let outcome = run_all_twice(&db).await;
    db.close().await;

    sqlx::query(&format!("DROP SCHEMA {} CASCADE", schema))
        .execute(admin.pool())
        .await?;
    admin.close().await;
    outcome
}

async fn run_all_twice(db: &Database) -> anyhow::Result<()> {
    {
        let mut conn = db.acquire().await?;
        for sql in BASE_SCHEMA {
            sqlx::query(sql).execute(&mut *conn).await?;
        }
    }

    for name in MigrationName::ALL {
        let report = migrations::run_migration(db, name).await?;
        anyhow::ensure!(report.succeeded(), "{} failed: {:?}", name.id(), report.steps);
        anyhow::ensure!(
            report.failed_steps().count() == 0,
            "{} had failed steps: {:?}",
            name.id(),
            report.steps
        );
    }

    for name in MigrationName::ALL {
        if name == MigrationName::ReviewQuestions {
            continue;
        }
        let report = migrations::run_migration(db, name).await?;
        anyhow::ensure!(report.is_noop(), "{} applied again: {:?}", name.id(), report.steps);
    }

    let forwarders = [seed::ForwarderRecord {
        name: "Expeditors".to_string(),
        logo_url: String::new(),
    }];
    let report = seed::seed_sample_data(db, &forwarders).await?;
    anyhow::ensure!(report.succeeded(), "sample data: {:?}", report.steps);
    let report = seed::seed_sample_data(db, &forwarders).await?;
    anyhow::ensure!(report.is_noop(), "sample data applied again: {:?}", report.steps);

    let mut conn = db.acquire().await?;
    let active = seed::active_question_count(&mut *conn).await?;
    anyhow::ensure!(
        active == seed::REVIEW_QUESTIONS.len() as i64,
        "expected {} active questions, found {}",
        seed::REVIEW_QUESTIONS.len(),
        active
    );
    Ok(())
}
