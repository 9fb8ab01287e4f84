//! The `locations` lookup table behind `/api/locations`, and the import that
//! loads it from the `Locations.csv` export.

use std::path::Path;

use serde::Deserialize;
use sqlx::AnyConnection;
use uuid::Uuid;

use crate::db::{finish_transaction, Backend, Database};
use crate::ddl::{self, IndexSpec, TableSpec};
use crate::errors::{OpsError, ResultExt};
use crate::report::{MigrationReport, StepOutcome};
use crate::schema;

pub const NAME: &str = "locations";

pub const DEFAULT_CSV_PATH: &str = "documentation/Locations.csv";

const PROGRESS_EVERY: usize = 1000;

pub const LOCATIONS: TableSpec = TableSpec {
    name: "locations",
    postgres: "CREATE TABLE IF NOT EXISTS locations (
        id SERIAL PRIMARY KEY,
        uuid UUID DEFAULT gen_random_uuid() UNIQUE NOT NULL,
        location_name VARCHAR(500) NOT NULL,
        city VARCHAR(200),
        state VARCHAR(200),
        country VARCHAR(200) NOT NULL,
        region VARCHAR(200),
        subregion VARCHAR(200),
        created_at TIMESTAMP DEFAULT NOW(),
        updated_at TIMESTAMP DEFAULT NOW()
    )",
    sqlite: "CREATE TABLE IF NOT EXISTS locations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        uuid TEXT UNIQUE NOT NULL,
        location_name VARCHAR(500) NOT NULL,
        city VARCHAR(200),
        state VARCHAR(200),
        country VARCHAR(200) NOT NULL,
        region VARCHAR(200),
        subregion VARCHAR(200),
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )",
};

pub const INDEXES: [IndexSpec; 7] = [
    IndexSpec::new("idx_locations_uuid", "locations", "uuid"),
    IndexSpec::new("idx_locations_city", "locations", "city"),
    IndexSpec::new("idx_locations_country", "locations", "country"),
    IndexSpec::new("idx_locations_region", "locations", "region"),
    IndexSpec::new("idx_locations_state", "locations", "state"),
    IndexSpec::new("idx_locations_location_name", "locations", "location_name"),
    IndexSpec::new("idx_locations_city_country", "locations", "city, country"),
];

/// One row of `Locations.csv`. Blank cells load as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocationRecord {
    #[serde(rename = "Location")]
    pub location_name: String,
    #[serde(rename = "City", default)]
    pub city: String,
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "Country", default)]
    pub country: String,
    #[serde(rename = "Region", default)]
    pub region: String,
    #[serde(rename = "Subregion", default)]
    pub subregion: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSummary {
    pub total: i64,
    pub unique_uuids: i64,
    pub countries: i64,
    pub regions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationImport {
    /// Rows removed before loading.
    pub replaced: u64,
    pub inserted: usize,
    pub summary: LocationSummary,
}

async fn create_table_and_indexes(
    conn: &mut AnyConnection,
    backend: Backend,
) -> Result<Vec<StepOutcome>, OpsError> {
    let mut outcomes = vec![ddl::create_table_if_missing(conn, backend, &LOCATIONS).await?];
    for index in &INDEXES {
        outcomes.push(ddl::create_index_if_missing(conn, backend, index).await?);
    }
    Ok(outcomes)
}

pub async fn create_locations_table(db: &Database) -> Result<MigrationReport, OpsError> {
    let backend = db.backend();
    let mut report = MigrationReport::new(NAME);

    let mut tx = db.begin().await?;
    let result = create_table_and_indexes(&mut *tx, backend).await;
    report.extend(finish_transaction(tx, result, "creating locations table").await?);

    let mut conn = db.acquire().await?;
    let indexes = schema::indexes_on(&mut *conn, backend, LOCATIONS.name).await?;
    let present = INDEXES
        .iter()
        .filter(|spec| indexes.iter().any(|i| i.name == spec.name))
        .count();
    tracing::info!("📋 {}/{} location indexes present", present, INDEXES.len());

    report.verified = Some(
        schema::table_exists(&mut *conn, backend, LOCATIONS.name).await? && present == INDEXES.len(),
    );
    Ok(report)
}

/// Reads every record up front so a malformed file fails before the table
/// is touched.
pub fn read_locations_csv(path: &Path) -> Result<Vec<LocationRecord>, OpsError> {
    if !path.exists() {
        return Err(OpsError::Config(format!(
            "locations file not found: {}",
            path.display()
        )));
    }
    tracing::info!("📄 Reading {}", path.display());

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let records = reader
        .deserialize()
        .collect::<Result<Vec<LocationRecord>, csv::Error>>()?;

    tracing::info!("📄 {} locations found", records.len());
    Ok(records)
}

async fn replace_locations(
    conn: &mut AnyConnection,
    backend: Backend,
    records: &[LocationRecord],
) -> Result<(u64, usize), OpsError> {
    if !schema::table_exists(conn, backend, LOCATIONS.name).await? {
        return Err(OpsError::MissingTable(LOCATIONS.name.to_string()));
    }

    let replaced = sqlx::query("DELETE FROM locations")
        .execute(&mut *conn)
        .await
        .context("clearing locations")?
        .rows_affected();
    if replaced > 0 {
        tracing::info!("🗑️  Removed {} existing locations", replaced);
    }

    let insert = match backend {
        Backend::Postgres => {
            "INSERT INTO locations (uuid, location_name, city, state, country, region, subregion) \
             VALUES ($1::uuid, $2, $3, $4, $5, $6, $7)"
        }
        Backend::Sqlite => {
            "INSERT INTO locations (uuid, location_name, city, state, country, region, subregion) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)"
        }
    };

    for (i, record) in records.iter().enumerate() {
        sqlx::query(insert)
            .bind(Uuid::new_v4().to_string())
            .bind(&record.location_name)
            .bind(&record.city)
            .bind(&record.state)
            .bind(&record.country)
            .bind(&record.region)
            .bind(&record.subregion)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("inserting location {:?} (row {})", record.location_name, i + 1))?;

        if (i + 1) % PROGRESS_EVERY == 0 {
            tracing::info!("  ... {}/{} locations", i + 1, records.len());
        }
    }
    Ok((replaced, records.len()))
}

pub async fn location_summary(conn: &mut AnyConnection) -> Result<LocationSummary, OpsError> {
    let (total, unique_uuids, countries): (i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(DISTINCT uuid), COUNT(DISTINCT country) FROM locations",
    )
    .fetch_one(&mut *conn)
    .await?;
    let regions: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT region FROM locations \
         WHERE region IS NOT NULL AND region != '' ORDER BY region",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(LocationSummary {
        total,
        unique_uuids,
        countries,
        regions,
    })
}

/// Replaces the contents of `locations` with `records` in one transaction,
/// then checks the stored row count and uuid uniqueness.
pub async fn import_locations(
    db: &Database,
    records: &[LocationRecord],
) -> Result<LocationImport, OpsError> {
    let backend = db.backend();

    let mut tx = db.begin().await?;
    let result = replace_locations(&mut *tx, backend, records).await;
    let (replaced, inserted) = finish_transaction(tx, result, "importing locations").await?;

    let mut conn = db.acquire().await?;
    let summary = location_summary(&mut *conn).await?;
    tracing::info!(
        "📊 {} locations, {} countries, {} unique uuids",
        summary.total,
        summary.countries,
        summary.unique_uuids
    );
    if !summary.regions.is_empty() {
        tracing::info!("🌍 Regions: {}", summary.regions.join(", "));
    }

    if summary.total != inserted as i64 || summary.unique_uuids != summary.total {
        return Err(OpsError::Verification(format!(
            "expected {} locations with unique uuids, found {} rows and {} uuids",
            inserted, summary.total, summary.unique_uuids
        )));
    }
    Ok(LocationImport {
        replaced,
        inserted,
        summary,
    })
}
