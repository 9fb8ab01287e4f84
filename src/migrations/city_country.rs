//! Denormalises review location onto `reviews` so location filters no
//! longer join through `branches`.

use sqlx::AnyConnection;

use crate::db::{finish_transaction, Backend, Database};
use crate::ddl::{self, ColumnSpec, IndexSpec};
use crate::errors::{OpsError, ResultExt};
use crate::report::{MigrationReport, StepOutcome};
use crate::schema;

pub const NAME: &str = "city_country";

const COLUMNS: [ColumnSpec; 2] = [
    ColumnSpec::portable("city", "VARCHAR(100)"),
    ColumnSpec::portable("country", "VARCHAR(100)"),
];

/// Location filter indexes. `review_indexes` creates the same three, so
/// both migrations share these definitions.
pub const LOCATION_INDEXES: [IndexSpec; 3] = [
    IndexSpec::partial(
        "idx_reviews_country",
        "reviews",
        "country",
        "country IS NOT NULL AND country != ''",
    ),
    IndexSpec::partial("idx_reviews_city", "reviews", "city", "city IS NOT NULL AND city != ''"),
    IndexSpec::partial(
        "idx_reviews_city_country",
        "reviews",
        "city, country",
        "city IS NOT NULL AND city != '' AND country IS NOT NULL AND country != ''",
    ),
];

const COMMENTS: [(&str, &str); 2] = [
    ("city", "City where the freight forwarder branch is located"),
    ("country", "Country where the freight forwarder branch is located"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationCoverage {
    pub total: i64,
    pub with_city: i64,
    pub with_country: i64,
}

async fn add_columns_and_indexes(
    conn: &mut AnyConnection,
    backend: Backend,
) -> Result<Vec<StepOutcome>, OpsError> {
    if !schema::table_exists(conn, backend, "reviews").await? {
        return Err(OpsError::MissingTable("reviews".to_string()));
    }
    let mut outcomes = Vec::new();
    for column in &COLUMNS {
        outcomes.push(ddl::add_column_if_missing(conn, backend, "reviews", column).await?);
    }
    for index in &LOCATION_INDEXES {
        outcomes.push(ddl::create_index_if_missing(conn, backend, index).await?);
    }
    Ok(outcomes)
}

/// Copies location from the linked branch into reviews that have none yet.
/// Skipped once `branches` (or `reviews.branch_id`) is gone.
pub async fn backfill_from_branches(
    conn: &mut AnyConnection,
    backend: Backend,
) -> Result<StepOutcome, OpsError> {
    let step = "backfill reviews.city/country from branches";
    if !schema::table_exists(conn, backend, "branches").await? {
        return Ok(StepOutcome::skipped(step, "branches table does not exist"));
    }
    if !schema::column_exists(conn, backend, "reviews", "branch_id").await? {
        return Ok(StepOutcome::skipped(step, "reviews.branch_id does not exist"));
    }

    let updated = ddl::execute(
        conn,
        "UPDATE reviews SET city = branches.city, country = branches.country \
         FROM branches \
         WHERE reviews.branch_id = branches.id \
           AND reviews.city IS NULL AND reviews.country IS NULL",
    )
    .await
    .context("backfilling review locations")?;

    tracing::info!("✅ Updated {} reviews with branch location", updated);
    if updated == 0 {
        Ok(StepOutcome::skipped(step, "no reviews without location"))
    } else {
        Ok(StepOutcome::applied(step))
    }
}

async fn add_comments(conn: &mut AnyConnection, backend: Backend) -> Vec<StepOutcome> {
    let mut outcomes = Vec::new();
    for (column, comment) in COMMENTS {
        let step = format!("comment on reviews.{}", column);
        if backend == Backend::Sqlite {
            outcomes.push(StepOutcome::skipped(step, "SQLite has no column comments"));
            continue;
        }
        let result = set_comment(conn, column, comment, &step).await;
        outcomes.push(ddl::best_effort(step, result));
    }
    outcomes
}

async fn set_comment(
    conn: &mut AnyConnection,
    column: &str,
    comment: &str,
    step: &str,
) -> Result<StepOutcome, OpsError> {
    let current: Option<String> = sqlx::query_scalar(
        "SELECT col_description('reviews'::regclass, ordinal_position::int) \
         FROM information_schema.columns \
         WHERE table_schema = current_schema() AND table_name = 'reviews' AND column_name = $1",
    )
    .bind(column)
    .fetch_optional(&mut *conn)
    .await?
    .flatten();
    if current.as_deref() == Some(comment) {
        return Ok(StepOutcome::skipped(step, "already set"));
    }

    let sql = format!("COMMENT ON COLUMN reviews.{} IS '{}'", column, comment);
    ddl::execute(conn, &sql).await?;
    Ok(StepOutcome::applied(step))
}

pub async fn location_coverage(conn: &mut AnyConnection) -> Result<LocationCoverage, OpsError> {
    let (total, with_city, with_country): (i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(city), COUNT(country) FROM reviews",
    )
    .fetch_one(&mut *conn)
    .await?;
    Ok(LocationCoverage {
        total,
        with_city,
        with_country,
    })
}

pub async fn migrate_add_city_country(db: &Database) -> Result<MigrationReport, OpsError> {
    let backend = db.backend();
    let mut report = MigrationReport::new(NAME);

    let mut tx = db.begin().await?;
    let result = add_columns_and_indexes(&mut *tx, backend).await;
    report.extend(finish_transaction(tx, result, "adding review location columns").await?);

    let mut tx = db.begin().await?;
    let result = backfill_from_branches(&mut *tx, backend).await;
    report.push(finish_transaction(tx, result, "backfilling review locations").await?);

    let mut conn = db.acquire().await?;
    report.extend(add_comments(&mut *conn, backend).await);

    let coverage = location_coverage(&mut *conn).await?;
    tracing::info!(
        "📊 {} reviews, {} with city, {} with country",
        coverage.total,
        coverage.with_city,
        coverage.with_country
    );

    let mut verified = true;
    for column in &COLUMNS {
        verified &= schema::column_exists(&mut *conn, backend, "reviews", column.name).await?;
    }
    report.verified = Some(verified);
    Ok(report)
}
