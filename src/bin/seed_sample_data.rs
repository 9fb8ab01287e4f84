//! Fills a freshly migrated database with freight forwarders from the
//! export file, two sample users and a few sample reviews.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use logiscore_ops::config::DatabaseConfig;
use logiscore_ops::db::Database;
use logiscore_ops::seed;
use logiscore_ops::telemetry;

#[derive(Parser)]
#[command(name = "seed_sample_data")]
#[command(about = "Seed a development database with sample data")]
struct Cli {
    /// Freight forwarder export with Name and Logo_URL columns
    #[arg(long, default_value = seed::DEFAULT_FORWARDERS_CSV)]
    forwarders_csv: PathBuf,

    /// Database URL (defaults to DATABASE_URL or the DB_* variables)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();
    let cli = Cli::parse();

    let forwarders = seed::read_forwarders_csv(&cli.forwarders_csv)?;

    let database_url = match cli.database_url {
        Some(url) => url,
        None => DatabaseConfig::from_env(None)?.database_url,
    };
    let db = Database::connect(&database_url).await?;

    let result = seed::seed_sample_data(&db, &forwarders).await;
    db.close().await;

    let report = result?;
    report.log_summary();
    if report.succeeded() {
        tracing::info!("🎉 Sample data ready");
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!("❌ Sample data incomplete");
        Ok(ExitCode::FAILURE)
    }
}
