//! Pre-deploy check of the Stripe integration. Exits non-zero unless all
//! four checks pass.

use std::process::ExitCode;

use clap::Parser;
use logiscore_ops::config::DEFAULT_API_BASE_URL;
use logiscore_ops::stripe_client::DEFAULT_STRIPE_API_BASE;
use logiscore_ops::stripe_verify;
use logiscore_ops::telemetry;

#[derive(Parser)]
#[command(name = "verify_stripe_setup")]
#[command(about = "Verify Stripe keys, price ids and the webhook route")]
struct Cli {
    /// Backend whose webhook test route is checked
    #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    #[arg(long, env = "STRIPE_API_BASE", default_value = DEFAULT_STRIPE_API_BASE)]
    stripe_api_base: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();
    let cli = Cli::parse();

    let summary = stripe_verify::run_verification(
        |key| std::env::var(key).ok(),
        &cli.stripe_api_base,
        &cli.api_base_url,
    )
    .await;

    if summary.all_passed() {
        tracing::info!("🎉 Stripe setup is ready");
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!("❌ Stripe setup needs attention");
        Ok(ExitCode::FAILURE)
    }
}
