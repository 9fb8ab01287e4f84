//! Pre-deploy verification of the Stripe integration: environment, API
//! key, configured price ids and the backend's webhook route.

use std::time::Duration;

use crate::billing::PLANS;
use crate::stripe_client::StripeClient;

pub const WEBHOOK_TEST_PATH: &str = "/api/webhooks/stripe/webhook/test";
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

pub const REQUIRED_VARS: [&str; 8] = [
    "STRIPE_SECRET_KEY",
    "STRIPE_PUBLISHABLE_KEY",
    "STRIPE_WEBHOOK_SECRET",
    "STRIPE_SHIPPER_MONTHLY_PRICE_ID",
    "STRIPE_SHIPPER_ANNUAL_PRICE_ID",
    "STRIPE_FORWARDER_MONTHLY_PRICE_ID",
    "STRIPE_FORWARDER_ANNUAL_PRICE_ID",
    "STRIPE_FORWARDER_ANNUAL_PLUS_PRICE_ID",
];

/// Accepted value prefixes for a variable, by naming convention.
pub fn expected_prefixes(var: &str) -> &'static [&'static str] {
    if var == "STRIPE_SECRET_KEY" {
        &["sk_test_", "sk_live_"]
    } else if var == "STRIPE_PUBLISHABLE_KEY" {
        &["pk_test_", "pk_live_"]
    } else if var == "STRIPE_WEBHOOK_SECRET" {
        &["whsec_"]
    } else if var.ends_with("_PRICE_ID") {
        &["price_"]
    } else {
        &[]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvVarStatus {
    Configured,
    Missing,
    /// Present but not shaped like the convention. Reported, not fatal.
    UnexpectedFormat { expected: &'static [&'static str] },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvCheck {
    pub entries: Vec<(&'static str, EnvVarStatus)>,
}

impl EnvCheck {
    pub fn missing(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, status)| *status == EnvVarStatus::Missing)
            .map(|(var, _)| *var)
            .collect()
    }

    pub fn status(&self, var: &str) -> Option<&EnvVarStatus> {
        self.entries.iter().find(|(v, _)| *v == var).map(|(_, s)| s)
    }

    /// Only missing variables fail the check.
    pub fn passed(&self) -> bool {
        self.missing().is_empty()
    }
}

/// Checks presence and format of the required variables. Pure: reads only
/// through `lookup` and performs no network calls.
pub fn check_env_vars<F>(lookup: F) -> EnvCheck
where
    F: Fn(&str) -> Option<String>,
{
    let mut entries = Vec::with_capacity(REQUIRED_VARS.len());
    for var in REQUIRED_VARS {
        let status = match lookup(var).filter(|v| !v.trim().is_empty()) {
            None => {
                tracing::error!("❌ {}: missing", var);
                EnvVarStatus::Missing
            }
            Some(value) => {
                let expected = expected_prefixes(var);
                if expected.is_empty() || expected.iter().any(|p| value.starts_with(p)) {
                    tracing::info!("✅ {}: configured", var);
                    EnvVarStatus::Configured
                } else {
                    tracing::warn!("⚠️  {}: should start with {}", var, expected.join(" or "));
                    EnvVarStatus::UnexpectedFormat { expected }
                }
            }
        };
        entries.push((var, status));
    }
    EnvCheck { entries }
}

pub async fn test_stripe_connection(client: &StripeClient) -> bool {
    match client.list_products(1).await {
        Ok(_) => {
            tracing::info!("✅ Stripe API connection successful ({} mode)", client.mode());
            true
        }
        Err(e) if e.is_stripe_auth() => {
            tracing::error!("❌ Stripe authentication failed: {}", e);
            false
        }
        Err(e) => {
            tracing::error!("❌ Stripe API connection failed: {}", e);
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceCheck {
    pub plan_key: &'static str,
    pub price_id: String,
    /// `Ok(description)` or `Err(reason)`.
    pub result: Result<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceVerification {
    pub checks: Vec<PriceCheck>,
}

impl PriceVerification {
    pub fn configured(&self) -> usize {
        self.checks.len()
    }

    pub fn valid(&self) -> usize {
        self.checks.iter().filter(|c| c.result.is_ok()).count()
    }

    /// Every configured id resolved to a price. With nothing configured
    /// there is nothing to reject; `check_env_vars` reports the gap.
    pub fn passed(&self) -> bool {
        self.valid() == self.configured()
    }
}

/// Re-validates every configured `STRIPE_*_PRICE_ID` against Stripe.
/// Unset variables are skipped here; `check_env_vars` reports them.
pub async fn verify_price_ids<F>(client: &StripeClient, lookup: F) -> PriceVerification
where
    F: Fn(&str) -> Option<String>,
{
    let mut verification = PriceVerification::default();

    for plan in &PLANS {
        let Some(price_id) = lookup(&plan.env_var()).filter(|v| !v.trim().is_empty()) else {
            tracing::warn!("⚠️  {}: not configured", plan.key);
            continue;
        };

        let result = match client.retrieve_price(&price_id).await {
            Ok(price) => match client.retrieve_product(&price.product).await {
                Ok(product) => {
                    let description = format!("{} - {}", product.name, price.describe());
                    tracing::info!("✅ {}: {}", plan.key, description);
                    Ok(description)
                }
                Err(e) => {
                    tracing::error!("❌ {}: product lookup failed: {}", plan.key, e);
                    Err(e.to_string())
                }
            },
            Err(e) => {
                tracing::error!("❌ {}: invalid price ID {}: {}", plan.key, price_id, e);
                Err(e.to_string())
            }
        };

        verification.checks.push(PriceCheck {
            plan_key: plan.key,
            price_id,
            result,
        });
    }

    tracing::info!(
        "📊 {}/{} configured price IDs are valid",
        verification.valid(),
        verification.configured()
    );
    verification
}

/// True when the backend answers the webhook test route with a 2xx.
pub async fn test_webhook_endpoint(api_base_url: &str) -> bool {
    let url = format!("{}{}", api_base_url.trim_end_matches('/'), WEBHOOK_TEST_PATH);
    let client = match reqwest::Client::builder().timeout(WEBHOOK_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("❌ Could not build HTTP client: {}", e);
            return false;
        }
    };

    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => {
            tracing::info!("✅ Webhook endpoint reachable at {}", url);
            true
        }
        Ok(response) => {
            tracing::error!("❌ Webhook endpoint returned {}", response.status());
            false
        }
        Err(e) => {
            tracing::warn!("⚠️  Webhook endpoint not reachable ({}); is the backend running?", e);
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationSummary {
    pub env_vars: bool,
    pub connection: bool,
    pub price_ids: bool,
    pub webhook: bool,
}

impl VerificationSummary {
    pub const TOTAL: usize = 4;

    pub fn passed(&self) -> usize {
        [self.env_vars, self.connection, self.price_ids, self.webhook]
            .iter()
            .filter(|ok| **ok)
            .count()
    }

    pub fn all_passed(&self) -> bool {
        self.passed() == Self::TOTAL
    }
}

/// Runs the four checks in order. Without a secret key the two Stripe API
/// checks are counted as failed without being attempted.
pub async fn run_verification<F>(lookup: F, stripe_base_url: &str, api_base_url: &str) -> VerificationSummary
where
    F: Fn(&str) -> Option<String>,
{
    tracing::info!("🔍 Checking environment variables...");
    let env = check_env_vars(&lookup);

    let secret_key = lookup("STRIPE_SECRET_KEY").filter(|k| !k.trim().is_empty());
    let client = secret_key.and_then(|key| match StripeClient::new(stripe_base_url, key) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::error!("❌ {}", e);
            None
        }
    });

    let (connection, price_ids) = match &client {
        Some(client) => {
            tracing::info!("🔍 Testing Stripe connection...");
            let connection = test_stripe_connection(client).await;
            tracing::info!("🔍 Verifying price IDs...");
            let price_ids = verify_price_ids(client, &lookup).await.passed();
            (connection, price_ids)
        }
        None => {
            tracing::error!("❌ Skipping Stripe API checks: STRIPE_SECRET_KEY not set");
            (false, false)
        }
    };

    tracing::info!("🔍 Testing webhook endpoint...");
    let webhook = test_webhook_endpoint(api_base_url).await;

    let summary = VerificationSummary {
        env_vars: env.passed(),
        connection,
        price_ids,
        webhook,
    };
    tracing::info!(
        "📊 Results: {}/{} checks passed",
        summary.passed(),
        VerificationSummary::TOTAL
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_secret_key_fails() {
        let check = check_env_vars(lookup_from(&[("STRIPE_PUBLISHABLE_KEY", "pk_test_x")]));
        assert_eq!(check.status("STRIPE_SECRET_KEY"), Some(&EnvVarStatus::Missing));
        assert!(check.missing().contains(&"STRIPE_SECRET_KEY"));
        assert!(!check.passed());
    }

    #[test]
    fn bad_format_warns_but_passes() {
        let mut pairs: Vec<(&str, &str)> = REQUIRED_VARS
            .iter()
            .map(|var| match *var {
                "STRIPE_SECRET_KEY" => (*var, "sk_live_abc"),
                "STRIPE_PUBLISHABLE_KEY" => (*var, "pk_live_abc"),
                "STRIPE_WEBHOOK_SECRET" => (*var, "whsec_abc"),
                _ => (*var, "price_abc"),
            })
            .collect();
        pairs[3] = ("STRIPE_SHIPPER_MONTHLY_PRICE_ID", "prod_wrong");

        let check = check_env_vars(lookup_from(&pairs));
        assert!(check.passed());
        assert_eq!(
            check.status("STRIPE_SHIPPER_MONTHLY_PRICE_ID"),
            Some(&EnvVarStatus::UnexpectedFormat { expected: &["price_"] })
        );
    }

    #[test]
    fn blank_values_count_as_missing() {
        let check = check_env_vars(lookup_from(&[("STRIPE_SECRET_KEY", "   ")]));
        assert_eq!(check.status("STRIPE_SECRET_KEY"), Some(&EnvVarStatus::Missing));
    }

    #[test]
    fn nothing_configured_passes_price_check() {
        let verification = PriceVerification::default();
        assert_eq!(verification.configured(), 0);
        assert!(verification.passed());
    }

    #[test]
    fn one_invalid_price_fails_price_check() {
        let verification = PriceVerification {
            checks: vec![
                PriceCheck {
                    plan_key: "shipper_monthly",
                    price_id: "price_ok".to_string(),
                    result: Ok("Shipper Monthly - 29.00 USD/month".to_string()),
                },
                PriceCheck {
                    plan_key: "shipper_annual",
                    price_id: "price_gone".to_string(),
                    result: Err("No such price".to_string()),
                },
            ],
        };
        assert!(!verification.passed());
    }

    #[test]
    fn summary_counts() {
        let summary = VerificationSummary {
            env_vars: true,
            connection: true,
            price_ids: false,
            webhook: true,
        };
        assert_eq!(summary.passed(), 3);
        assert!(!summary.all_passed());
    }
}
