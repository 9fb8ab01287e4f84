//! Category-based review model: forwarder cleanup, weighted review columns,
//! the question catalogue and per-question scores.

use sqlx::AnyConnection;

use crate::db::{finish_transaction, Backend, Database};
use crate::ddl::{self, ColumnSpec, IndexSpec, TableSpec};
use crate::errors::OpsError;
use crate::report::{MigrationReport, StepOutcome};
use crate::schema;

pub const NAME: &str = "review_schema";

const RETIRED_FORWARDER_COLUMNS: [&str; 3] = ["global_rank", "is_active", "updated_at"];
const LOGO_URL: ColumnSpec = ColumnSpec::portable("logo_url", "TEXT");

pub const REVIEW_COLUMNS: [ColumnSpec; 7] = [
    ColumnSpec::portable("city", "VARCHAR(100)"),
    ColumnSpec::portable("country", "VARCHAR(100)"),
    ColumnSpec::portable("review_type", "VARCHAR(50) DEFAULT 'general'"),
    ColumnSpec::new("review_weight", "NUMERIC(3,2) DEFAULT 1.0", "REAL DEFAULT 1.0"),
    ColumnSpec::new("aggregate_rating", "NUMERIC(3,2)", "REAL"),
    ColumnSpec::new("weighted_rating", "NUMERIC(3,2)", "REAL"),
    ColumnSpec::portable("total_questions_rated", "INTEGER DEFAULT 0"),
];

const NULLABLE_REVIEW_COLUMNS: [&str; 2] = ["user_id", "overall_rating"];

pub const REVIEW_QUESTIONS: TableSpec = TableSpec {
    name: "review_questions",
    postgres: "CREATE TABLE IF NOT EXISTS review_questions (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        category_id VARCHAR(100) NOT NULL,
        category_name VARCHAR(100) NOT NULL,
        question_id VARCHAR(100) NOT NULL UNIQUE,
        question_text TEXT NOT NULL,
        rating_definitions JSONB NOT NULL,
        is_active BOOLEAN DEFAULT TRUE,
        created_at TIMESTAMPTZ DEFAULT NOW(),
        updated_at TIMESTAMPTZ DEFAULT NOW()
    )",
    sqlite: "CREATE TABLE IF NOT EXISTS review_questions (
        id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
        category_id VARCHAR(100) NOT NULL,
        category_name VARCHAR(100) NOT NULL,
        question_id VARCHAR(100) NOT NULL UNIQUE,
        question_text TEXT NOT NULL,
        rating_definitions TEXT NOT NULL,
        is_active BOOLEAN DEFAULT 1,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )",
};

pub const REVIEW_CATEGORY_SCORES: TableSpec = TableSpec {
    name: "review_category_scores",
    postgres: "CREATE TABLE IF NOT EXISTS review_category_scores (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        review_id UUID NOT NULL REFERENCES reviews(id) ON DELETE CASCADE,
        category_id VARCHAR(100) NOT NULL,
        category_name VARCHAR(100) NOT NULL,
        question_id VARCHAR(100) NOT NULL,
        question_text TEXT NOT NULL,
        rating INTEGER NOT NULL,
        rating_definition TEXT NOT NULL,
        weight NUMERIC(3,2) DEFAULT 1.0,
        created_at TIMESTAMPTZ DEFAULT NOW()
    )",
    sqlite: "CREATE TABLE IF NOT EXISTS review_category_scores (
        id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
        review_id TEXT NOT NULL REFERENCES reviews(id) ON DELETE CASCADE,
        category_id VARCHAR(100) NOT NULL,
        category_name VARCHAR(100) NOT NULL,
        question_id VARCHAR(100) NOT NULL,
        question_text TEXT NOT NULL,
        rating INTEGER NOT NULL,
        rating_definition TEXT NOT NULL,
        weight REAL DEFAULT 1.0,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )",
};

pub const INDEXES: [IndexSpec; 6] = [
    IndexSpec::new("idx_review_questions_category_id", "review_questions", "category_id"),
    IndexSpec::new("idx_review_questions_question_id", "review_questions", "question_id"),
    IndexSpec::new("idx_review_questions_active", "review_questions", "is_active"),
    IndexSpec::new(
        "idx_review_category_scores_review_id",
        "review_category_scores",
        "review_id",
    ),
    IndexSpec::new(
        "idx_review_category_scores_category_id",
        "review_category_scores",
        "category_id",
    ),
    IndexSpec::new(
        "idx_review_category_scores_question_id",
        "review_category_scores",
        "question_id",
    ),
];

async fn migrate_tables(conn: &mut AnyConnection, backend: Backend) -> Result<Vec<StepOutcome>, OpsError> {
    for table in ["freight_forwarders", "reviews"] {
        if !schema::table_exists(conn, backend, table).await? {
            return Err(OpsError::MissingTable(table.to_string()));
        }
    }

    let mut outcomes = Vec::new();

    tracing::info!("🔄 Migrating freight_forwarders table...");
    for column in RETIRED_FORWARDER_COLUMNS {
        outcomes.push(ddl::drop_column_if_present(conn, backend, "freight_forwarders", column).await?);
    }
    outcomes.push(ddl::add_column_if_missing(conn, backend, "freight_forwarders", &LOGO_URL).await?);

    tracing::info!("🔄 Migrating reviews table...");
    for column in &REVIEW_COLUMNS {
        outcomes.push(ddl::add_column_if_missing(conn, backend, "reviews", column).await?);
    }

    tracing::info!("🔄 Creating review question tables...");
    outcomes.push(ddl::create_table_if_missing(conn, backend, &REVIEW_QUESTIONS).await?);
    outcomes.push(ddl::create_table_if_missing(conn, backend, &REVIEW_CATEGORY_SCORES).await?);
    for index in &INDEXES {
        outcomes.push(ddl::create_index_if_missing(conn, backend, index).await?);
    }

    Ok(outcomes)
}

/// Drops NOT NULL from legacy review columns so category-only and
/// anonymous reviews can be stored. Best effort, PostgreSQL only.
async fn relax_review_nullability(conn: &mut AnyConnection, backend: Backend) -> Result<Vec<StepOutcome>, OpsError> {
    let mut outcomes = Vec::new();
    for column in NULLABLE_REVIEW_COLUMNS {
        let step = format!("drop NOT NULL on reviews.{}", column);
        if backend == Backend::Sqlite {
            outcomes.push(StepOutcome::skipped(step, "SQLite cannot alter column nullability"));
            continue;
        }
        match schema::column(conn, backend, "reviews", column).await? {
            None => outcomes.push(StepOutcome::skipped(step, "column not present")),
            Some(info) if info.is_nullable => {
                outcomes.push(StepOutcome::skipped(step, "already nullable"))
            }
            Some(_) => {
                let sql = format!("ALTER TABLE reviews ALTER COLUMN {} DROP NOT NULL", column);
                let result = ddl::execute(conn, &sql)
                    .await
                    .map(|_| StepOutcome::applied(step.clone()));
                outcomes.push(ddl::best_effort(step, result));
            }
        }
    }
    Ok(outcomes)
}

pub async fn migrate_schema(db: &Database) -> Result<MigrationReport, OpsError> {
    let backend = db.backend();
    let mut report = MigrationReport::new(NAME);

    {
        let mut conn = db.acquire().await?;
        for table in ["freight_forwarders", "reviews"] {
            let columns = schema::columns(&mut *conn, backend, table).await?;
            schema::log_columns(table, &columns);
        }
    }

    let mut tx = db.begin().await?;
    let result = migrate_tables(&mut *tx, backend).await;
    report.extend(finish_transaction(tx, result, "migrating review schema").await?);

    let mut conn = db.acquire().await?;
    report.extend(relax_review_nullability(&mut *conn, backend).await?);

    let mut verified = true;
    for table in [REVIEW_QUESTIONS.name, REVIEW_CATEGORY_SCORES.name] {
        verified &= schema::table_exists(&mut *conn, backend, table).await?;
    }
    for column in &REVIEW_COLUMNS {
        verified &= schema::column_exists(&mut *conn, backend, "reviews", column.name).await?;
    }
    report.verified = Some(verified);
    Ok(report)
}
