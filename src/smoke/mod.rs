//! Smoke tests against a running LogiScore backend.
//!
//! Each suite issues a handful of requests and records one [`CheckOutcome`]
//! per assertion. Transport errors become failed checks, so a suite always
//! runs to the end and reports everything it could not reach.

pub mod auth;
pub mod client;
pub mod email;
pub mod forwarders;
pub mod locations;
pub mod review_count;
pub mod reviews;

use std::fmt;

use clap::ValueEnum;

use crate::errors::OpsError;
pub use client::{SmokeClient, SmokeResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    /// Reachable and well-formed, but not conclusive (e.g. no data).
    Warn,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "✅ PASS"),
            CheckStatus::Warn => write!(f, "⚠️  WARN"),
            CheckStatus::Fail => write!(f, "❌ FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

impl CheckOutcome {
    pub fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Pass, detail)
    }

    pub fn warn(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Warn, detail)
    }

    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Fail, detail)
    }

    fn new(name: impl Into<String>, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            detail: detail.into(),
        }
    }

    pub fn is_fail(&self) -> bool {
        self.status == CheckStatus::Fail
    }

    fn log(&self) {
        match self.status {
            CheckStatus::Pass => tracing::info!("{} {}: {}", self.status, self.name, self.detail),
            CheckStatus::Warn => tracing::warn!("{} {}: {}", self.status, self.name, self.detail),
            CheckStatus::Fail => tracing::error!("{} {}: {}", self.status, self.name, self.detail),
        }
    }
}

/// Passes when the request reached the server and returned `expected`.
pub fn expect_status(
    name: &str,
    result: &Result<SmokeResponse, OpsError>,
    expected: u16,
) -> CheckOutcome {
    match result {
        Ok(response) if response.status == expected => {
            CheckOutcome::pass(name, format!("status {}", response.status))
        }
        Ok(response) => CheckOutcome::fail(
            name,
            format!(
                "expected status {}, got {}: {}",
                expected,
                response.status,
                response.excerpt()
            ),
        ),
        Err(e) => connection_failure(name, e),
    }
}

pub fn connection_failure(name: &str, error: &OpsError) -> CheckOutcome {
    CheckOutcome::fail(name, format!("request failed ({}); is the backend running?", error))
}

/// Array body of a 200 response, or the failed check explaining why not.
pub fn expect_json_array(
    name: &str,
    result: &Result<SmokeResponse, OpsError>,
) -> Result<Vec<serde_json::Value>, CheckOutcome> {
    let response = match result {
        Ok(response) if response.status == 200 => response,
        other => return Err(expect_status(name, other, 200)),
    };
    match response.json() {
        Some(serde_json::Value::Array(items)) => Ok(items),
        _ => Err(CheckOutcome::fail(
            name,
            format!("expected a JSON array: {}", response.excerpt()),
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteReport {
    pub suite: &'static str,
    pub checks: Vec<CheckOutcome>,
}

impl SuiteReport {
    pub fn new(suite: &'static str) -> Self {
        tracing::info!("🧪 Running {} smoke tests", suite);
        Self {
            suite,
            checks: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: CheckOutcome) {
        outcome.log();
        self.checks.push(outcome);
    }

    pub fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    pub fn has_failures(&self) -> bool {
        self.checks.iter().any(CheckOutcome::is_fail)
    }

    pub fn check(&self, name: &str) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn log_summary(&self) {
        let line = format!(
            "🏁 {}: {} passed, {} warnings, {} failed",
            self.suite,
            self.count(CheckStatus::Pass),
            self.count(CheckStatus::Warn),
            self.count(CheckStatus::Fail)
        );
        if self.has_failures() {
            tracing::error!("{}", line);
        } else {
            tracing::info!("{}", line);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SuiteName {
    /// Aggregated and plain freight forwarder listings.
    Forwarders,
    /// Location search, regions and countries.
    Locations,
    /// Token refresh endpoint.
    Auth,
    /// Review search and location statistics.
    Reviews,
    /// Review thank-you email endpoint.
    Email,
    /// Per-location review counts of one forwarder.
    ReviewCount,
}

impl SuiteName {
    pub const ALL: [SuiteName; 6] = [
        SuiteName::Forwarders,
        SuiteName::Locations,
        SuiteName::Auth,
        SuiteName::Reviews,
        SuiteName::Email,
        SuiteName::ReviewCount,
    ];
}

/// Inputs shared by the suites besides the HTTP client.
#[derive(Debug, Clone)]
pub struct SuiteContext {
    pub jwt_secret: String,
    /// Existing review used for the thank-you email send.
    pub review_id: Option<String>,
    pub review_count_case: review_count::ReviewCountCase,
}

pub async fn run_suite(client: &SmokeClient, ctx: &SuiteContext, name: SuiteName) -> SuiteReport {
    let report = match name {
        SuiteName::Forwarders => forwarders::run(client).await,
        SuiteName::Locations => locations::run(client).await,
        SuiteName::Auth => auth::run(client, &ctx.jwt_secret).await,
        SuiteName::Reviews => reviews::run(client).await,
        SuiteName::Email => email::run(client, ctx.review_id.as_deref()).await,
        SuiteName::ReviewCount => review_count::run(client, &ctx.review_count_case).await,
    };
    report.log_summary();
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_status_distinguishes_outcomes() {
        let ok = Ok(SmokeResponse {
            status: 401,
            body: String::new(),
        });
        assert_eq!(expect_status("x", &ok, 401).status, CheckStatus::Pass);
        assert_eq!(expect_status("x", &ok, 200).status, CheckStatus::Fail);

        let err: Result<SmokeResponse, OpsError> = Err(OpsError::Http("connection refused".into()));
        let outcome = expect_status("x", &err, 200);
        assert!(outcome.is_fail());
        assert!(outcome.detail.contains("connection refused"));
    }

    #[test]
    fn warnings_do_not_fail_a_suite() {
        let mut report = SuiteReport::new("test");
        report.push(CheckOutcome::pass("a", ""));
        report.push(CheckOutcome::warn("b", "no data"));
        assert!(!report.has_failures());
        report.push(CheckOutcome::fail("c", "boom"));
        assert!(report.has_failures());
        assert_eq!(report.count(CheckStatus::Warn), 1);
    }
}
