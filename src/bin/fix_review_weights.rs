//! Gives every review a usable weight: 1.0 by default, 0.5 when anonymous.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use logiscore_ops::config::DatabaseConfig;
use logiscore_ops::db::Database;
use logiscore_ops::maintenance;
use logiscore_ops::telemetry;

#[derive(Parser)]
#[command(name = "fix_review_weights")]
#[command(about = "Backfill missing review weights")]
struct Cli {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    yes: bool,

    /// Database URL (defaults to DATABASE_URL or the DB_* variables)
    #[arg(long)]
    database_url: Option<String>,
}

fn confirm() -> io::Result<bool> {
    print!("Do you want to proceed with fixing review weights? (y/N): ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();
    let cli = Cli::parse();

    if !cli.yes && !confirm()? {
        tracing::info!("Aborted, no changes made");
        return Ok(ExitCode::SUCCESS);
    }

    let database_url = match cli.database_url {
        Some(url) => url,
        None => DatabaseConfig::from_env(None)?.database_url,
    };
    let db = Database::connect(&database_url).await?;

    let result = maintenance::fix_review_weights(&db).await;
    db.close().await;

    let fix = result?;
    if fix.remaining > 0 {
        return Ok(ExitCode::FAILURE);
    }
    tracing::info!(
        "🎉 Review weights fixed: {} defaulted, {} anonymous",
        fix.defaulted,
        fix.anonymous
    );
    Ok(ExitCode::SUCCESS)
}
