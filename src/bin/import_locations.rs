//! Loads `Locations.csv` into the `locations` table, creating the table and
//! its indexes first when needed. Existing rows are replaced.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use logiscore_ops::config::DatabaseConfig;
use logiscore_ops::db::Database;
use logiscore_ops::migrations::locations;
use logiscore_ops::telemetry;

#[derive(Parser)]
#[command(name = "import_locations")]
#[command(about = "Import the location list into the database")]
struct Cli {
    /// CSV with Location, City, State, Country, Region and Subregion columns
    #[arg(long, default_value = locations::DEFAULT_CSV_PATH)]
    csv: PathBuf,

    /// Database URL (defaults to DATABASE_URL or the DB_* variables)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();
    let cli = Cli::parse();

    let records = locations::read_locations_csv(&cli.csv)?;

    let database_url = match cli.database_url {
        Some(url) => url,
        None => DatabaseConfig::from_env(None)?.database_url,
    };
    let db = Database::connect(&database_url).await?;

    let report = match locations::create_locations_table(&db).await {
        Ok(report) => report,
        Err(e) => {
            db.close().await;
            return Err(e.into());
        }
    };
    report.log_summary();
    if !report.succeeded() {
        db.close().await;
        return Ok(ExitCode::FAILURE);
    }

    let result = locations::import_locations(&db, &records).await;
    db.close().await;

    let import = result?;
    tracing::info!(
        "🎉 Imported {} locations ({} replaced)",
        import.inserted,
        import.replaced
    );
    Ok(ExitCode::SUCCESS)
}
