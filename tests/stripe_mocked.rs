/// Stripe tooling against a mocked Stripe API.
use logiscore_ops::billing::{self, ConfigTarget, PlanOutcome, PLANS};
use logiscore_ops::stripe_client::StripeClient;
use logiscore_ops::stripe_verify::{self, test_stripe_connection, verify_price_ids};
use serde_json::json;
use std::collections::HashMap;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn price(id: &str, product: &str, active: bool, amount: i64, interval: &str) -> serde_json::Value {
    json!({
        "id": id,
        "object": "price",
        "active": active,
        "currency": "usd",
        "unit_amount": amount,
        "recurring": {"interval": interval, "interval_count": 1},
        "product": product
    })
}

async fn mock_product(server: &MockServer, product_id: &str, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/products/{}", product_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": product_id,
            "object": "product",
            "name": name,
            "active": true
        })))
        .mount(server)
        .await;
}

async fn mock_prices(server: &MockServer, product_id: &str, prices: Vec<serde_json::Value>) {
    Mock::given(method("GET"))
        .and(path("/v1/prices"))
        .and(query_param("product", product_id))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": prices,
            "has_more": false
        })))
        .mount(server)
        .await;
}

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[tokio::test]
async fn test_fetch_price_ids_selects_first_active_and_skips_empty() {
    let server = MockServer::start().await;
    let plans = &PLANS[..3];

    mock_product(&server, plans[0].product_id, "Shipper Monthly").await;
    mock_prices(
        &server,
        plans[0].product_id,
        vec![
            price("price_retired", plans[0].product_id, false, 1900, "month"),
            price("price_current", plans[0].product_id, true, 2900, "month"),
            price("price_newer", plans[0].product_id, true, 3900, "month"),
        ],
    )
    .await;

    mock_product(&server, plans[1].product_id, "Shipper Annual").await;
    mock_prices(&server, plans[1].product_id, vec![]).await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/products/{}", plans[2].product_id)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"type": "invalid_request_error", "message": "No such product"}
        })))
        .mount(&server)
        .await;

    let client = StripeClient::new(server.uri(), "sk_test_123").unwrap();
    let report = billing::fetch_price_ids(&client, plans).await.unwrap();

    let assignments = report.assignments();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].line(), "STRIPE_SHIPPER_MONTHLY_PRICE_ID=price_current");
    assert_eq!(report.outcome("shipper_annual"), Some(&PlanOutcome::NoPrices));
    assert!(matches!(
        report.outcome("forwarder_monthly"),
        Some(PlanOutcome::Failed(msg)) if msg.contains("No such product")
    ));
}

#[tokio::test]
async fn test_fetch_price_ids_aborts_on_bad_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"type": "invalid_request_error", "message": "Invalid API Key provided"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = StripeClient::new(server.uri(), "sk_test_wrong").unwrap();
    let err = billing::fetch_price_ids(&client, &PLANS).await.unwrap_err();
    assert!(err.is_stripe_auth());
}

#[tokio::test]
async fn test_write_config_only_with_assignments() {
    let server = MockServer::start().await;
    let plan = PLANS[2];
    mock_product(&server, plan.product_id, "Forwarder Monthly").await;
    mock_prices(
        &server,
        plan.product_id,
        vec![price("price_fwd", plan.product_id, true, 4900, "month")],
    )
    .await;

    let client = StripeClient::new(server.uri(), "sk_test_123").unwrap();
    let dir = tempfile::tempdir().unwrap();

    let report = billing::fetch_price_ids(&client, &[plan]).await.unwrap();
    let env_path = dir.path().join(".env.generated");
    assert!(billing::write_config(ConfigTarget::DotEnv, &env_path, &report, "sk_test_123")
        .await
        .unwrap());
    let written = std::fs::read_to_string(&env_path).unwrap();
    assert!(written.contains("STRIPE_SECRET_KEY=sk_test_123\n"));
    assert!(written.contains("STRIPE_FORWARDER_MONTHLY_PRICE_ID=price_fwd\n"));

    let empty = billing::fetch_price_ids(&client, &[]).await.unwrap();
    let render_path = dir.path().join("render_stripe_config.txt");
    assert!(!billing::write_config(ConfigTarget::Render, &render_path, &empty, "sk_test_123")
        .await
        .unwrap());
    assert!(!render_path.exists());
}

#[tokio::test]
async fn test_connection_check_uses_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .and(query_param("limit", "1"))
        .and(header("authorization", "Bearer sk_test_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"object": "list", "data": []})))
        .mount(&server)
        .await;

    let good = StripeClient::new(server.uri(), "sk_test_123").unwrap();
    assert!(test_stripe_connection(&good).await);

    let bad = StripeClient::new(server.uri(), "sk_test_other").unwrap();
    assert!(!test_stripe_connection(&bad).await);
}

#[tokio::test]
async fn test_verify_price_ids_counts_invalid_ids() {
    let server = MockServer::start().await;
    let product = PLANS[0].product_id;

    Mock::given(method("GET"))
        .and(path("/v1/prices/price_good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(price("price_good", product, true, 2900, "month")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/prices/price_gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"type": "invalid_request_error", "message": "No such price: 'price_gone'"}
        })))
        .mount(&server)
        .await;
    mock_product(&server, product, "Shipper Monthly").await;

    let client = StripeClient::new(server.uri(), "sk_test_123").unwrap();

    let all_good = verify_price_ids(&client, lookup(&[("STRIPE_SHIPPER_MONTHLY_PRICE_ID", "price_good")])).await;
    assert_eq!(all_good.configured(), 1);
    assert!(all_good.passed());
    assert_eq!(
        all_good.checks[0].result.as_deref(),
        Ok("Shipper Monthly - 29.00 USD/month")
    );

    let mixed = verify_price_ids(
        &client,
        lookup(&[
            ("STRIPE_SHIPPER_MONTHLY_PRICE_ID", "price_good"),
            ("STRIPE_SHIPPER_ANNUAL_PRICE_ID", "price_gone"),
        ]),
    )
    .await;
    assert_eq!(mixed.configured(), 2);
    assert_eq!(mixed.valid(), 1);
    assert!(!mixed.passed());
}

#[tokio::test]
async fn test_run_verification_without_secret_key() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(stripe_verify::WEBHOOK_TEST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&backend)
        .await;

    let summary = stripe_verify::run_verification(lookup(&[]), "http://127.0.0.1:9", &backend.uri()).await;
    assert!(!summary.env_vars);
    assert!(!summary.connection);
    assert!(!summary.price_ids);
    assert!(summary.webhook);
    assert_eq!(summary.passed(), 1);
}

#[tokio::test]
async fn test_verify_price_ids_with_nothing_configured_passes() {
    let server = MockServer::start().await;
    let client = StripeClient::new(server.uri(), "sk_test_123").unwrap();

    let verification = verify_price_ids(&client, lookup(&[("STRIPE_SECRET_KEY", "sk_test_123")])).await;
    assert_eq!(verification.configured(), 0);
    assert!(verification.passed());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_price_check_runs_when_connection_check_fails() {
    let server = MockServer::start().await;
    let product = PLANS[0].product_id;
    Mock::given(method("GET"))
        .and(path("/v1/products"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/prices/price_good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(price("price_good", product, true, 2900, "month")))
        .expect(1)
        .mount(&server)
        .await;
    mock_product(&server, product, "Shipper Monthly").await;

    let backend = MockServer::start().await;
    let summary = stripe_verify::run_verification(
        lookup(&[
            ("STRIPE_SECRET_KEY", "sk_test_123"),
            ("STRIPE_SHIPPER_MONTHLY_PRICE_ID", "price_good"),
        ]),
        &server.uri(),
        &backend.uri(),
    )
    .await;

    assert!(!summary.connection);
    assert!(summary.price_ids);
    assert!(!summary.webhook);
}
