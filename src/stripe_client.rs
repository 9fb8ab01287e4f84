use crate::errors::OpsError;
use crate::stripe_models::{ErrorBody, List, Price, Product};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Minimal read-only client for the Stripe REST API.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl StripeClient {
    /// Creates a new `StripeClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, `https://api.stripe.com` outside of tests.
    /// * `secret_key` - `sk_test_...` or `sk_live_...` key.
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Result<Self, OpsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| OpsError::ExternalApi(format!("Failed to create Stripe client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }

    /// Key mode for log lines: `test`, `live` or `unknown`.
    pub fn mode(&self) -> &'static str {
        if self.secret_key.starts_with("sk_test_") {
            "test"
        } else if self.secret_key.starts_with("sk_live_") {
            "live"
        } else {
            "unknown"
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, OpsError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Stripe GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.secret_key)
            .query(query)
            .send()
            .await
            .map_err(|e| OpsError::Http(format!("Stripe request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(error_from_response(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| OpsError::ExternalApi(format!("Failed to parse Stripe response: {}", e)))
    }

    pub async fn retrieve_product(&self, product_id: &str) -> Result<Product, OpsError> {
        self.get(&format!("/v1/products/{}", product_id), &[]).await
    }

    pub async fn list_products(&self, limit: u32) -> Result<Vec<Product>, OpsError> {
        let list: List<Product> = self.get("/v1/products", &[("limit", limit.to_string())]).await?;
        Ok(list.data)
    }

    /// First page of a product's prices. Stripe lists newest first.
    pub async fn list_prices(&self, product_id: &str, limit: u32) -> Result<Vec<Price>, OpsError> {
        let list: List<Price> = self
            .get(
                "/v1/prices",
                &[("product", product_id.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        if list.has_more {
            tracing::warn!(
                "⚠️  {} has more than {} prices; only the newest {} are considered",
                product_id,
                limit,
                limit
            );
        }
        Ok(list.data)
    }

    pub async fn retrieve_price(&self, price_id: &str) -> Result<Price, OpsError> {
        self.get(&format!("/v1/prices/{}", price_id), &[]).await
    }
}

/// Maps a Stripe error response onto the error taxonomy: bad keys abort the
/// whole run, invalid requests only affect the item being looked up.
fn error_from_response(status: StatusCode, body: &str) -> OpsError {
    let detail = serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.error);
    let authentication = detail.as_ref().is_some_and(|d| d.is_authentication());
    let message = detail
        .and_then(|d| d.describe())
        .unwrap_or_else(|| body.to_string());

    if authentication {
        return OpsError::StripeAuth(message);
    }
    match status {
        StatusCode::UNAUTHORIZED => OpsError::StripeAuth(message),
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => OpsError::StripeInvalidRequest(message),
        _ => OpsError::ExternalApi(format!("Stripe returned {}: {}", status, message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_status_codes_to_error_kinds() {
        let body = r#"{"error":{"type":"invalid_request_error","message":"No such product: 'prod_x'"}}"#;
        match error_from_response(StatusCode::NOT_FOUND, body) {
            OpsError::StripeInvalidRequest(msg) => assert_eq!(msg, "No such product: 'prod_x'"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            error_from_response(StatusCode::UNAUTHORIZED, "{}"),
            OpsError::StripeAuth(_)
        ));
        assert!(matches!(
            error_from_response(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            OpsError::ExternalApi(_)
        ));
    }

    #[test]
    fn authentication_error_type_is_auth_whatever_the_status() {
        let body = r#"{"error":{"type":"authentication_error","message":"Expired API Key provided"}}"#;
        match error_from_response(StatusCode::FORBIDDEN, body) {
            OpsError::StripeAuth(msg) => assert_eq!(msg, "Expired API Key provided"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn key_mode() {
        assert_eq!(StripeClient::new(DEFAULT_STRIPE_API_BASE, "sk_test_abc").unwrap().mode(), "test");
        assert_eq!(StripeClient::new(DEFAULT_STRIPE_API_BASE, "sk_live_abc").unwrap().mode(), "live");
        assert_eq!(StripeClient::new(DEFAULT_STRIPE_API_BASE, "abc").unwrap().mode(), "unknown");
    }
}
