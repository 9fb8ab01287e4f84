//! Looks up the live price of every subscription plan and writes a
//! `.env`-style file with the `STRIPE_*_PRICE_ID` assignments.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use logiscore_ops::billing::{self, ConfigTarget, PLANS};
use logiscore_ops::config::StripeConfig;
use logiscore_ops::stripe_client::StripeClient;
use logiscore_ops::telemetry;

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Local `.env` with key placeholders
    Dotenv,
    /// Values to paste into the Render dashboard
    Render,
}

#[derive(Parser)]
#[command(name = "fetch_stripe_prices")]
#[command(about = "Generate STRIPE_*_PRICE_ID settings from the Stripe catalog")]
struct Cli {
    #[arg(long, value_enum, default_value = "dotenv")]
    format: Format,

    /// Output file (defaults to .env.generated or render_stripe_config.txt)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();
    let cli = Cli::parse();

    let target = match cli.format {
        Format::Dotenv => ConfigTarget::DotEnv,
        Format::Render => ConfigTarget::Render,
    };
    let path = cli.output.unwrap_or_else(|| target.default_path());

    let config = StripeConfig::from_env()?;
    let client = StripeClient::new(&config.api_base, &config.secret_key)?;
    tracing::info!("🔄 Fetching prices for {} plans ({} mode)", PLANS.len(), client.mode());

    let report = billing::fetch_price_ids(&client, &PLANS).await?;

    let assignments = report.assignments();
    if !assignments.is_empty() {
        println!();
        for assignment in &assignments {
            println!("{}", assignment.line());
        }
        println!();
    }

    if !billing::write_config(target, &path, &report, &config.secret_key).await? {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
