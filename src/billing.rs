//! Subscription plan catalogue and generation of the `STRIPE_*_PRICE_ID`
//! configuration from live Stripe data.

use std::path::{Path, PathBuf};

use crate::errors::{OpsError, ResultExt};
use crate::stripe_client::StripeClient;
use crate::stripe_models::Price;

/// Prices listed per product; plans carry one or two prices in practice.
pub const PRICE_LIST_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub key: &'static str,
    pub label: &'static str,
    pub product_id: &'static str,
}

impl Plan {
    /// `STRIPE_SHIPPER_MONTHLY_PRICE_ID` for `shipper_monthly`.
    pub fn env_var(&self) -> String {
        format!("STRIPE_{}_PRICE_ID", self.key.to_ascii_uppercase())
    }
}

pub const PLANS: [Plan; 5] = [
    Plan {
        key: "shipper_monthly",
        label: "Shipper Monthly",
        product_id: "prod_StYy4QPzGhoMQU",
    },
    Plan {
        key: "shipper_annual",
        label: "Shipper Annual",
        product_id: "prod_StZ0qjHzGSSZZ9",
    },
    Plan {
        key: "forwarder_monthly",
        label: "Forwarder Monthly",
        product_id: "prod_StZ1HjEEPrZ8oo",
    },
    Plan {
        key: "forwarder_annual",
        label: "Forwarder Annual",
        product_id: "prod_StZ2pVrOSMVZIn",
    },
    Plan {
        key: "forwarder_annual_plus",
        label: "Forwarder Annual Plus",
        product_id: "prod_StZ3890Xh8lQCZ",
    },
];

/// Picks the first active price in Stripe's listing order.
pub fn select_price(prices: &[Price]) -> Option<&Price> {
    prices.iter().find(|p| p.active)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceAssignment {
    pub env_var: String,
    pub price_id: String,
}

impl PriceAssignment {
    pub fn line(&self) -> String {
        format!("{}={}", self.env_var, self.price_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    Assigned(PriceAssignment),
    NoPrices,
    NoActivePrice,
    /// The product lookup was rejected (e.g. unknown product id).
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct PriceFetchReport {
    pub outcomes: Vec<(Plan, PlanOutcome)>,
}

impl PriceFetchReport {
    pub fn assignments(&self) -> Vec<&PriceAssignment> {
        self.outcomes
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                PlanOutcome::Assigned(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    pub fn outcome(&self, plan_key: &str) -> Option<&PlanOutcome> {
        self.outcomes
            .iter()
            .find(|(plan, _)| plan.key == plan_key)
            .map(|(_, outcome)| outcome)
    }
}

async fn fetch_plan(client: &StripeClient, plan: &Plan) -> Result<PlanOutcome, OpsError> {
    let product = client.retrieve_product(plan.product_id).await?;
    tracing::info!("📦 {}: {} ({})", plan.label, product.name, product.id);

    let prices = client.list_prices(plan.product_id, PRICE_LIST_LIMIT).await?;
    if prices.is_empty() {
        tracing::warn!("⚠️  No prices found for {}", plan.label);
        return Ok(PlanOutcome::NoPrices);
    }

    for price in &prices {
        tracing::info!(
            "  💰 {}: {} (active: {})",
            price.id,
            price.describe(),
            price.active
        );
    }

    match select_price(&prices) {
        Some(price) => {
            let assignment = PriceAssignment {
                env_var: plan.env_var(),
                price_id: price.id.clone(),
            };
            tracing::info!("  ✅ Selected {}", assignment.line());
            Ok(PlanOutcome::Assigned(assignment))
        }
        None => {
            tracing::warn!("⚠️  {} has prices but none are active", plan.label);
            Ok(PlanOutcome::NoActivePrice)
        }
    }
}

/// Looks up the price to use for every plan.
///
/// A rejected product lookup is logged and the remaining plans are still
/// processed. An authentication failure aborts, since every other call
/// would fail the same way.
pub async fn fetch_price_ids(client: &StripeClient, plans: &[Plan]) -> Result<PriceFetchReport, OpsError> {
    let mut report = PriceFetchReport::default();

    for plan in plans {
        let outcome = match fetch_plan(client, plan).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_stripe_auth() => {
                tracing::error!("❌ Stripe authentication failed, check STRIPE_SECRET_KEY");
                return Err(OpsError::WithContext {
                    source: Box::new(e),
                    context: format!("fetching prices for {}", plan.key),
                });
            }
            Err(e) => {
                tracing::error!("❌ Error fetching {}: {}", plan.label, e);
                PlanOutcome::Failed(e.to_string())
            }
        };
        report.outcomes.push((*plan, outcome));
    }

    Ok(report)
}

/// Where the generated assignments are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigTarget {
    /// `.env.generated`, a complete local `.env` with key placeholders.
    DotEnv,
    /// `render_stripe_config.txt`, values to paste into Render.
    Render,
}

impl ConfigTarget {
    pub fn default_path(self) -> PathBuf {
        match self {
            ConfigTarget::DotEnv => PathBuf::from(".env.generated"),
            ConfigTarget::Render => PathBuf::from("render_stripe_config.txt"),
        }
    }

    pub fn render(self, assignments: &[&PriceAssignment], secret_key: &str) -> String {
        let mut out = String::new();
        match self {
            ConfigTarget::DotEnv => {
                out.push_str("# Generated Stripe Configuration\n");
                out.push_str(&format!("STRIPE_SECRET_KEY={}\n", secret_key));
                out.push_str("STRIPE_PUBLISHABLE_KEY=pk_test_your_publishable_key_here\n");
                out.push_str("STRIPE_WEBHOOK_SECRET=whsec_your_webhook_secret_here\n");
                out.push('\n');
                out.push_str("# Stripe Price IDs\n");
            }
            ConfigTarget::Render => {
                out.push_str("# Stripe Price IDs for Render Environment\n");
                out.push_str("# Copy these to your Render environment variables\n");
                out.push('\n');
            }
        }
        for assignment in assignments {
            out.push_str(&assignment.line());
            out.push('\n');
        }
        out
    }
}

/// Writes the generated file. Returns `false` and writes nothing when there
/// are no assignments, so an existing file is never replaced by an empty one.
pub async fn write_config(
    target: ConfigTarget,
    path: &Path,
    report: &PriceFetchReport,
    secret_key: &str,
) -> Result<bool, OpsError> {
    let assignments = report.assignments();
    if assignments.is_empty() {
        tracing::warn!("⚠️  No price IDs found, not writing {}", path.display());
        return Ok(false);
    }

    let contents = target.render(&assignments, secret_key);
    tokio::fs::write(path, contents)
        .await
        .map_err(OpsError::from)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!("💾 Wrote {} price IDs to {}", assignments.len(), path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(id: &str, active: bool) -> Price {
        Price {
            id: id.to_string(),
            active,
            currency: "usd".to_string(),
            unit_amount: Some(2900),
            recurring: None,
            product: "prod_x".to_string(),
        }
    }

    #[test]
    fn env_var_names() {
        assert_eq!(PLANS[0].env_var(), "STRIPE_SHIPPER_MONTHLY_PRICE_ID");
        assert_eq!(PLANS[4].env_var(), "STRIPE_FORWARDER_ANNUAL_PLUS_PRICE_ID");
    }

    #[test]
    fn selects_first_active_price() {
        let prices = vec![price("price_old", false), price("price_a", true), price("price_b", true)];
        assert_eq!(select_price(&prices).map(|p| p.id.as_str()), Some("price_a"));
        assert!(select_price(&[price("price_old", false)]).is_none());
        assert!(select_price(&[]).is_none());
    }

    #[test]
    fn renders_both_targets() {
        let a = PriceAssignment {
            env_var: "STRIPE_SHIPPER_MONTHLY_PRICE_ID".into(),
            price_id: "price_123".into(),
        };
        let dotenv = ConfigTarget::DotEnv.render(&[&a], "sk_test_abc");
        assert!(dotenv.starts_with("# Generated Stripe Configuration\nSTRIPE_SECRET_KEY=sk_test_abc\n"));
        assert!(dotenv.ends_with("# Stripe Price IDs\nSTRIPE_SHIPPER_MONTHLY_PRICE_ID=price_123\n"));

        let render = ConfigTarget::Render.render(&[&a], "sk_test_abc");
        assert!(!render.contains("sk_test_abc"));
        assert_eq!(
            render,
            "# Stripe Price IDs for Render Environment\n\
             # Copy these to your Render environment variables\n\
             \n\
             STRIPE_SHIPPER_MONTHLY_PRICE_ID=price_123\n"
        );
    }
}
