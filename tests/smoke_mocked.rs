/// Smoke suites against a mocked backend.
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use logiscore_ops::smoke::auth::{Claims, REFRESH_PATH, TEST_USER_ID, UNKNOWN_USER_ID};
use logiscore_ops::smoke::review_count::{ReviewCountCase, FORWARDERS_PATH};
use logiscore_ops::smoke::{self, CheckStatus, SmokeClient, SuiteContext, SuiteName};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const SECRET: &str = "smoke-secret";

fn context() -> SuiteContext {
    SuiteContext {
        jwt_secret: SECRET.to_string(),
        review_id: None,
        review_count_case: ReviewCountCase::default(),
    }
}

fn forwarder(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "average_rating": 4.3,
        "review_count": 12,
        "category_scores_summary": {
            "responsiveness": {"category_name": "Responsiveness", "average_rating": 4.5, "total_reviews": 12}
        }
    })
}

/// Matches refresh requests whose token was issued for `sub`.
struct TokenSubject(&'static str);

impl Match for TokenSubject {
    fn matches(&self, request: &Request) -> bool {
        let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
            return false;
        };
        let Some(token) = body.get("token").and_then(Value::as_str) else {
            return false;
        };
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        decode::<Claims>(token, &DecodingKey::from_secret(SECRET.as_bytes()), &validation)
            .map(|data| data.claims.sub == self.0)
            .unwrap_or(false)
    }
}

#[tokio::test]
async fn test_forwarders_suite_passes_on_complete_listing() {
    let server = MockServer::start().await;
    let listing = json!([forwarder(1, "Acme Logistics"), forwarder(2, "Blue Freight")]);
    for route in ["/freight-forwarders/aggregated/", "/freight-forwarders/"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing.clone()))
            .mount(&server)
            .await;
    }

    let client = SmokeClient::new(server.uri()).unwrap();
    let report = smoke::run_suite(&client, &context(), SuiteName::Forwarders).await;

    assert!(!report.has_failures(), "{:?}", report.checks);
    assert_eq!(report.count(CheckStatus::Pass), 4);
}

#[tokio::test]
async fn test_forwarders_suite_flags_missing_fields_and_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/freight-forwarders/aggregated/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "Acme"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/freight-forwarders/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = SmokeClient::new(server.uri()).unwrap();
    let report = smoke::run_suite(&client, &context(), SuiteName::Forwarders).await;

    let fields = report.check("aggregated forwarders fields").unwrap();
    assert_eq!(fields.status, CheckStatus::Fail);
    assert!(fields.detail.contains("average_rating"));
    assert_eq!(report.check("forwarder list").unwrap().status, CheckStatus::Warn);
}

#[tokio::test]
async fn test_auth_suite_checks_each_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(TokenSubject(TEST_USER_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new-token",
            "token_type": "bearer",
            "expires_in": 1800
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(TokenSubject(UNKNOWN_USER_ID))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "User not found"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({"token": "invalid.token.format"})))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid token"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"detail": "field required"})))
        .mount(&server)
        .await;

    let client = SmokeClient::new(server.uri()).unwrap();
    let report = smoke::run_suite(&client, &context(), SuiteName::Auth).await;

    assert_eq!(report.checks.len(), 4);
    assert!(!report.has_failures(), "{:?}", report.checks);
    assert!(report
        .check("refresh expired token")
        .unwrap()
        .detail
        .contains("bearer"));
}

#[tokio::test]
async fn test_auth_suite_fails_when_refresh_body_is_incomplete() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(TokenSubject(TEST_USER_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "x"})))
        .mount(&server)
        .await;

    let client = SmokeClient::new(server.uri()).unwrap();
    let report = smoke::run_suite(&client, &context(), SuiteName::Auth).await;

    let refresh = report.check("refresh expired token").unwrap();
    assert!(refresh.is_fail());
    assert!(refresh.detail.contains("token_type, expires_in"));
}

#[tokio::test]
async fn test_email_suite_without_review_id_warns() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/email/review-thank-you"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/email/review-thank-you"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Review not found"})))
        .mount(&server)
        .await;

    let client = SmokeClient::new(server.uri()).unwrap();
    let report = smoke::run_suite(&client, &context(), SuiteName::Email).await;

    assert!(!report.has_failures(), "{:?}", report.checks);
    assert_eq!(report.check("send thank-you email").unwrap().status, CheckStatus::Warn);
    assert_eq!(report.count(CheckStatus::Pass), 2);
}

#[tokio::test]
async fn test_unreachable_backend_fails_every_check() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = SmokeClient::new(format!("http://127.0.0.1:{}", port)).unwrap();
    let report = smoke::run_suite(&client, &context(), SuiteName::Email).await;

    assert_eq!(report.count(CheckStatus::Fail), 2);
    assert!(report
        .check("reject missing review_id")
        .unwrap()
        .detail
        .contains("is the backend running?"));
}

#[tokio::test]
async fn test_review_count_suite_detects_inflated_categories() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FORWARDERS_PATH))
        .and(query_param("search", "Nippon Express"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "ff-1", "name": "Nippon Express USA"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}ff-1", FORWARDERS_PATH)))
        .and(query_param("city", "San Francisco"))
        .and(query_param("country", "US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ff-1",
            "review_count": 9,
            "category_scores_summary": {
                "pricing": {"category_name": "Pricing", "average_rating": 3.9, "total_reviews": 45},
                "tracking": {"category_name": "Tracking", "average_rating": 4.1, "total_reviews": 9}
            }
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}ff-1", FORWARDERS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ff-1",
            "review_count": 60,
            "category_scores_summary": {}
        })))
        .mount(&server)
        .await;

    let client = SmokeClient::new(server.uri()).unwrap();
    let report = smoke::run_suite(&client, &context(), SuiteName::ReviewCount).await;

    assert_eq!(report.check("find company").unwrap().detail, "id ff-1");
    assert_eq!(report.check("location filter").unwrap().status, CheckStatus::Pass);
    let totals = report.check("category totals").unwrap();
    assert!(totals.is_fail());
    assert!(totals.detail.contains("Pricing (45)"));
    assert!(report.check("category max").unwrap().is_fail());
}

#[tokio::test]
async fn test_review_count_suite_fails_when_company_is_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FORWARDERS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7, "name": "Other Co"}])))
        .mount(&server)
        .await;

    let client = SmokeClient::new(server.uri()).unwrap();
    let report = smoke::run_suite(&client, &context(), SuiteName::ReviewCount).await;

    assert_eq!(report.checks.len(), 1);
    assert!(report.check("find company").unwrap().is_fail());
}
