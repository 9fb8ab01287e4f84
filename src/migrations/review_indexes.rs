//! Search indexes behind the review listing and location endpoints.

use sqlx::AnyConnection;

use crate::db::{Backend, Database};
use super::city_country::LOCATION_INDEXES;
use crate::ddl::{self, IndexSpec};
use crate::errors::OpsError;
use crate::report::MigrationReport;
use crate::schema;

pub const NAME: &str = "review_indexes";

pub const INDEXES: [IndexSpec; 9] = [
    LOCATION_INDEXES[0],
    LOCATION_INDEXES[1],
    LOCATION_INDEXES[2],
    IndexSpec::new("idx_reviews_freight_forwarder_id", "reviews", "freight_forwarder_id"),
    IndexSpec::partial("idx_reviews_is_active", "reviews", "is_active", "is_active = true"),
    IndexSpec::new("idx_reviews_created_at", "reviews", "created_at DESC"),
    IndexSpec::partial(
        "idx_reviews_location_active",
        "reviews",
        "country, city, is_active, created_at DESC",
        "is_active = true",
    ),
    IndexSpec::new(
        "idx_review_category_scores_search",
        "review_category_scores",
        "question_text, category_name, rating_definition",
    ),
    IndexSpec::new(
        "idx_review_category_scores_review_id",
        "review_category_scores",
        "review_id",
    ),
];

const ANALYZED_TABLES: [&str; 2] = ["reviews", "review_category_scores"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStats {
    pub table: String,
    pub rows: i64,
    pub size: Option<String>,
}

/// Row counts (and on PostgreSQL, on-disk sizes) of the indexed tables.
/// Tables that are missing are left out.
pub async fn analyze_review_tables(
    conn: &mut AnyConnection,
    backend: Backend,
) -> Result<Vec<TableStats>, OpsError> {
    let mut stats = Vec::new();
    for table in ANALYZED_TABLES {
        if !schema::table_exists(conn, backend, table).await? {
            continue;
        }
        let rows = schema::row_count(conn, table).await?;
        let size = schema::table_size(conn, backend, table).await?;
        match &size {
            Some(size) => tracing::info!("  - {}: {} rows, {}", table, rows, size),
            None => tracing::info!("  - {}: {} rows", table, rows),
        }
        stats.push(TableStats {
            table: table.to_string(),
            rows,
            size,
        });
    }
    Ok(stats)
}

/// Each index is attempted on its own; the run reports which ones could not
/// be created (usually because a column is missing) instead of stopping.
pub async fn create_review_indexes(db: &Database) -> Result<MigrationReport, OpsError> {
    let backend = db.backend();
    let mut report = MigrationReport::new(NAME);

    let mut conn = db.acquire().await?;
    report.extend(ddl::create_indexes_best_effort(&mut *conn, backend, &INDEXES).await);

    let mut present = 0;
    for table in ANALYZED_TABLES {
        let indexes = schema::indexes_on(&mut *conn, backend, table).await?;
        present += indexes
            .iter()
            .filter(|i| INDEXES.iter().any(|spec| spec.name == i.name))
            .count();
    }
    tracing::info!("📋 {}/{} review indexes present", present, INDEXES.len());

    tracing::info!("📊 Table analysis:");
    analyze_review_tables(&mut *conn, backend).await?;

    report.verified = Some(present == INDEXES.len());
    Ok(report)
}
