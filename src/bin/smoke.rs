//! Smoke tests against a running backend.
//!
//! ```text
//! smoke all
//! smoke run auth --base-url https://staging.example.com
//! smoke run review-count --company "Nippon Express" --city "San Francisco" --country US
//! ```

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use logiscore_ops::config::SmokeConfig;
use logiscore_ops::smoke::review_count::ReviewCountCase;
use logiscore_ops::smoke::{self, SmokeClient, SuiteContext, SuiteName};
use logiscore_ops::telemetry;

#[derive(Parser)]
#[command(name = "smoke")]
#[command(about = "Run smoke tests against the LogiScore API")]
struct Cli {
    /// Backend base URL (defaults to API_BASE_URL or http://localhost:8000)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Review used for the thank-you email send
    #[arg(long, global = true)]
    review_id: Option<String>,

    #[arg(long, global = true)]
    company: Option<String>,
    #[arg(long, global = true)]
    city: Option<String>,
    #[arg(long, global = true)]
    country: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one suite
    Run {
        #[arg(value_enum)]
        suite: SuiteName,
    },
    /// Run every suite
    All,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();
    let cli = Cli::parse();

    let config = SmokeConfig::from_env()?.with_base_url(cli.base_url)?;
    let client = SmokeClient::new(config.api_base_url)?;
    tracing::info!("🚀 Testing {}", client.base_url());

    let defaults = ReviewCountCase::default();
    let ctx = SuiteContext {
        jwt_secret: config.jwt_secret,
        review_id: cli.review_id,
        review_count_case: ReviewCountCase {
            company_name: cli.company.unwrap_or(defaults.company_name),
            city: cli.city.unwrap_or(defaults.city),
            country: cli.country.unwrap_or(defaults.country),
        },
    };

    let suites: Vec<SuiteName> = match cli.command {
        Command::Run { suite } => vec![suite],
        Command::All => SuiteName::ALL.to_vec(),
    };

    let mut failed = Vec::new();
    for suite in suites {
        let report = smoke::run_suite(&client, &ctx, suite).await;
        if report.has_failures() {
            failed.push(report.suite);
        }
    }

    if failed.is_empty() {
        tracing::info!("🎉 All smoke tests passed");
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!("❌ Failures in: {}", failed.join(", "));
        Ok(ExitCode::FAILURE)
    }
}
