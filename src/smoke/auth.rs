use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{expect_status, CheckOutcome, SmokeClient, SuiteReport};
use crate::errors::OpsError;

pub const REFRESH_PATH: &str = "/api/auth/refresh";
pub const TEST_USER_ID: &str = "test-user-123";
pub const UNKNOWN_USER_ID: &str = "non-existent-user-456";

/// How long ago test tokens expired; past the backend's 30 minute lifetime.
pub const EXPIRED_MINUTES_AGO: i64 = 35;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// HS256 token for `user_id` that expired `minutes_ago` minutes ago.
pub fn create_expired_token(user_id: &str, secret: &str, minutes_ago: i64) -> Result<String, OpsError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now - Duration::minutes(minutes_ago)).timestamp(),
        iat: (now - Duration::minutes(minutes_ago + 5)).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| OpsError::Config(format!("could not sign test token: {}", e)))
}

const REFRESH_FIELDS: [&str; 3] = ["access_token", "token_type", "expires_in"];

async fn check_refresh_succeeds(client: &SmokeClient, report: &mut SuiteReport, secret: &str) {
    let name = "refresh expired token";
    let token = match create_expired_token(TEST_USER_ID, secret, EXPIRED_MINUTES_AGO) {
        Ok(token) => token,
        Err(e) => return report.push(CheckOutcome::fail(name, e.to_string())),
    };

    let result = client.post_json(REFRESH_PATH, &json!({ "token": token })).await;
    let outcome = expect_status(name, &result, 200);
    let response = match result {
        Ok(response) if !outcome.is_fail() => response,
        _ => return report.push(outcome),
    };

    let body = response.json().unwrap_or_default();
    let missing: Vec<&str> = REFRESH_FIELDS
        .iter()
        .copied()
        .filter(|field| body.get(field).is_none())
        .collect();
    if missing.is_empty() {
        report.push(CheckOutcome::pass(
            name,
            format!(
                "new {} token, expires in {}s",
                body["token_type"].as_str().unwrap_or("?"),
                body["expires_in"]
            ),
        ));
    } else {
        report.push(CheckOutcome::fail(
            name,
            format!("response missing {}", missing.join(", ")),
        ));
    }
}

pub async fn run(client: &SmokeClient, jwt_secret: &str) -> SuiteReport {
    let mut report = SuiteReport::new("auth");

    check_refresh_succeeds(client, &mut report, jwt_secret).await;

    let result = client
        .post_json(REFRESH_PATH, &json!({ "token": "invalid.token.format" }))
        .await;
    report.push(expect_status("reject malformed token", &result, 401));

    let result = client.post_json(REFRESH_PATH, &json!({})).await;
    report.push(expect_status("reject missing token", &result, 422));

    let unknown = match create_expired_token(UNKNOWN_USER_ID, jwt_secret, EXPIRED_MINUTES_AGO) {
        Ok(token) => {
            let result = client.post_json(REFRESH_PATH, &json!({ "token": token })).await;
            expect_status("reject unknown user", &result, 401)
        }
        Err(e) => CheckOutcome::fail("reject unknown user", e.to_string()),
    };
    report.push(unknown);

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    #[test]
    fn token_is_signed_and_expired() {
        let token = create_expired_token("user-1", "secret", 35).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let data = decode::<Claims>(&token, &DecodingKey::from_secret(b"secret"), &validation).unwrap();
        assert_eq!(data.claims.sub, "user-1");
        assert!(data.claims.exp < Utc::now().timestamp() - 30 * 60);
        assert_eq!(data.claims.exp - data.claims.iat, 5 * 60);

        let strict = Validation::new(Algorithm::HS256);
        assert!(decode::<Claims>(&token, &DecodingKey::from_secret(b"secret"), &strict).is_err());
    }
}
