//! Applies LogiScore schema migrations.
//!
//! ```text
//! migrate list
//! migrate run shipment-reference
//! migrate all --database-url postgres://...
//! migrate subscription-fields-sqlite ./test.db
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use logiscore_ops::config::DatabaseConfig;
use logiscore_ops::db::Database;
use logiscore_ops::migrations::{self, subscription_fields, MigrationName};
use logiscore_ops::report::MigrationReport;
use logiscore_ops::telemetry;

#[derive(Parser)]
#[command(name = "migrate")]
#[command(about = "Apply LogiScore schema migrations")]
struct Cli {
    /// Database URL (defaults to DATABASE_URL or the DB_* variables)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available migrations in application order
    List,
    /// Run one migration
    Run {
        #[arg(value_enum)]
        name: MigrationName,
    },
    /// Run every migration in order, stopping at the first error
    All,
    /// Add the subscription columns to an existing SQLite file
    SubscriptionFieldsSqlite { path: PathBuf },
}

fn exit_code(reports: &[MigrationReport]) -> ExitCode {
    let failed: Vec<&str> = reports
        .iter()
        .filter(|r| !r.succeeded())
        .map(|r| r.name)
        .collect();
    if failed.is_empty() {
        tracing::info!("🎉 {} migration(s) completed", reports.len());
        ExitCode::SUCCESS
    } else {
        tracing::error!("❌ Verification failed for: {}", failed.join(", "));
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();
    let cli = Cli::parse();

    if let Command::List = cli.command {
        for name in MigrationName::ALL {
            println!("{}", name.id());
        }
        return Ok(ExitCode::SUCCESS);
    }

    if let Command::SubscriptionFieldsSqlite { path } = &cli.command {
        let report = subscription_fields::migrate_subscription_fields_sqlite(path).await?;
        return Ok(exit_code(&[report]));
    }

    let database_url = match cli.database_url {
        Some(url) => url,
        None => DatabaseConfig::from_env(None)?.database_url,
    };
    let db = Database::connect(&database_url).await?;

    let names: Vec<MigrationName> = match cli.command {
        Command::Run { name } => vec![name],
        _ => MigrationName::ALL.to_vec(),
    };

    let mut reports = Vec::with_capacity(names.len());
    for name in names {
        match migrations::run_migration(&db, name).await {
            Ok(report) => reports.push(report),
            Err(e) => {
                db.close().await;
                return Err(e.into());
            }
        }
    }

    db.close().await;
    Ok(exit_code(&reports))
}
