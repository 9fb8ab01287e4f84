//! Shows or changes the account type of one user.
//!
//! Without a type the user's current record is printed.

use std::process::ExitCode;

use clap::Parser;
use logiscore_ops::config::{DatabaseConfig, LOCAL_SQLITE_URL};
use logiscore_ops::db::Database;
use logiscore_ops::maintenance::{self, UserType, UserTypeChange};
use logiscore_ops::telemetry;

#[derive(Parser)]
#[command(name = "fix_user_type")]
#[command(about = "Show or change a user's account type")]
struct Cli {
    /// Email of the user (case and surrounding whitespace are ignored)
    email: String,

    /// New account type
    #[arg(value_enum)]
    user_type: Option<UserType>,

    /// Database URL (defaults to DATABASE_URL, the DB_* variables, then ./test.db)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();
    let cli = Cli::parse();

    let database_url = match cli.database_url {
        Some(url) => url,
        None => DatabaseConfig::from_env(Some(LOCAL_SQLITE_URL))?.database_url,
    };
    let db = Database::connect(&database_url).await?;

    let code = match cli.user_type {
        None => {
            let mut conn = db.acquire().await?;
            match maintenance::find_user_by_email(&mut *conn, &cli.email).await? {
                Some(user) => {
                    println!("Email:        {}", user.email);
                    println!("ID:           {}", user.id);
                    println!("Username:     {}", user.username.as_deref().unwrap_or("-"));
                    println!("Company:      {}", user.company_name.as_deref().unwrap_or("-"));
                    println!("User type:    {}", user.user_type.as_deref().unwrap_or("-"));
                    ExitCode::SUCCESS
                }
                None => {
                    tracing::error!("❌ No user with email {}", maintenance::normalize_email(&cli.email));
                    ExitCode::FAILURE
                }
            }
        }
        Some(new_type) => match maintenance::fix_user_type(&db, &cli.email, new_type).await {
            Ok(UserTypeChange::Unchanged(_)) => ExitCode::SUCCESS,
            Ok(UserTypeChange::Updated { user, previous }) => {
                println!(
                    "{}: {} -> {}",
                    user.email,
                    previous.as_deref().unwrap_or("-"),
                    new_type
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("❌ {}", e);
                ExitCode::FAILURE
            }
        },
    };

    db.close().await;
    Ok(code)
}
