//! Utility to inspect the database schema and print table structures.

use clap::Parser;
use logiscore_ops::config::DatabaseConfig;
use logiscore_ops::db::Database;
use logiscore_ops::schema;
use logiscore_ops::telemetry;

#[derive(Parser)]
#[command(name = "inspect_schema")]
#[command(about = "Print server version, tables and columns of the LogiScore database")]
struct Cli {
    /// Database URL (defaults to DATABASE_URL or the DB_* variables)
    #[arg(long)]
    database_url: Option<String>,

    /// Only describe these tables
    #[arg(long = "table")]
    tables: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();
    let cli = Cli::parse();

    let database_url = match cli.database_url {
        Some(url) => url,
        None => DatabaseConfig::from_env(None)?.database_url,
    };
    let db = Database::connect(&database_url).await?;
    let backend = db.backend();

    {
        let mut conn = db.acquire().await?;
        println!("{} {}", backend.name(), schema::server_version(&mut *conn, backend).await?);

        let tables = schema::list_tables(&mut *conn, backend).await?;
        println!("Found {} tables:", tables.len());
        for table in &tables {
            if !cli.tables.is_empty() && !cli.tables.contains(table) {
                continue;
            }
            println!("- {}", table);
            for column in schema::columns(&mut *conn, backend, table).await? {
                println!(
                    "  - {}: {} (nullable: {}, default: {})",
                    column.name,
                    column.declared_type(),
                    column.is_nullable,
                    column.default.as_deref().unwrap_or("None")
                );
            }
        }

        if tables.iter().any(|t| t == "freight_forwarders") {
            let count = schema::row_count(&mut *conn, "freight_forwarders").await?;
            println!("freight_forwarders rows: {}", count);
        } else {
            tracing::warn!("⚠️  freight_forwarders table not found");
        }
    }

    db.close().await;
    Ok(())
}
