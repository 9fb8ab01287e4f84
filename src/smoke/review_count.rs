//! Consistency of a forwarder's review count with its per-category totals
//! when the listing is narrowed to one location.

use serde_json::Value;

use super::{expect_json_array, expect_status, CheckOutcome, SmokeClient, SuiteReport};

pub const FORWARDERS_PATH: &str = "/api/freight-forwarders/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCountCase {
    pub company_name: String,
    pub city: String,
    pub country: String,
}

impl Default for ReviewCountCase {
    fn default() -> Self {
        Self {
            company_name: "Nippon Express".to_string(),
            city: "San Francisco".to_string(),
            country: "US".to_string(),
        }
    }
}

fn review_count(forwarder: &Value) -> i64 {
    forwarder.get("review_count").and_then(Value::as_i64).unwrap_or(0)
}

fn category_totals(forwarder: &Value) -> Vec<(String, i64)> {
    forwarder
        .get("category_scores_summary")
        .and_then(Value::as_object)
        .map(|categories| {
            categories
                .iter()
                .map(|(id, score)| {
                    let name = score
                        .get("category_name")
                        .and_then(Value::as_str)
                        .unwrap_or(id)
                        .to_string();
                    let total = score.get("total_reviews").and_then(Value::as_i64).unwrap_or(0);
                    (name, total)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Compares the unfiltered and location-filtered detail responses.
pub fn assess_review_counts(unfiltered: &Value, filtered: &Value) -> Vec<CheckOutcome> {
    let mut outcomes = Vec::new();
    let total = review_count(unfiltered);
    let local = review_count(filtered);

    outcomes.push(if local < total {
        CheckOutcome::pass("location filter", format!("{} of {} reviews", local, total))
    } else {
        CheckOutcome::warn(
            "location filter",
            format!("filtered count {} is not below unfiltered {}", local, total),
        )
    });

    let totals = category_totals(filtered);
    if totals.is_empty() {
        outcomes.push(CheckOutcome::warn("category totals", "no category scores to verify"));
        return outcomes;
    }

    let inflated: Vec<String> = totals
        .iter()
        .filter(|(_, n)| *n > local)
        .map(|(name, n)| format!("{} ({})", name, n))
        .collect();
    outcomes.push(if inflated.is_empty() {
        CheckOutcome::pass("category totals", format!("all within {} reviews", local))
    } else {
        CheckOutcome::fail(
            "category totals",
            format!("exceed review count {}: {}", local, inflated.join(", ")),
        )
    });

    let max = totals.iter().map(|(_, n)| *n).max().unwrap_or(0);
    outcomes.push(if max == local {
        CheckOutcome::pass("category max", format!("matches review count {}", local))
    } else {
        CheckOutcome::fail(
            "category max",
            format!("largest category total {} differs from review count {}", max, local),
        )
    });

    outcomes
}

async fn fetch_detail(
    client: &SmokeClient,
    report: &mut SuiteReport,
    name: &str,
    id: &str,
    query: &[(&str, String)],
) -> Option<Value> {
    let result = client.get(&format!("{}{}", FORWARDERS_PATH, id), query).await;
    let outcome = expect_status(name, &result, 200);
    match result.ok().filter(|_| !outcome.is_fail()).and_then(|r| r.json()) {
        Some(body) => {
            report.push(CheckOutcome::pass(
                name,
                format!("{} reviews", review_count(&body)),
            ));
            Some(body)
        }
        None if outcome.is_fail() => {
            report.push(outcome);
            None
        }
        None => {
            report.push(CheckOutcome::fail(name, "body is not JSON"));
            None
        }
    }
}

pub async fn run(client: &SmokeClient, case: &ReviewCountCase) -> SuiteReport {
    let mut report = SuiteReport::new("review-count");

    let search = client
        .get(FORWARDERS_PATH, &[("search", case.company_name.clone())])
        .await;
    let companies = match expect_json_array("find company", &search) {
        Ok(companies) => companies,
        Err(outcome) => {
            report.push(outcome);
            return report;
        }
    };

    let needle = case.company_name.to_lowercase();
    let found = companies.iter().find(|c| {
        c.get("name")
            .and_then(Value::as_str)
            .is_some_and(|name| name.to_lowercase().contains(&needle))
    });
    let Some(id) = found.and_then(|c| c.get("id")).map(|id| match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }) else {
        report.push(CheckOutcome::fail(
            "find company",
            format!("'{}' not in search results", case.company_name),
        ));
        return report;
    };
    report.push(CheckOutcome::pass("find company", format!("id {}", id)));

    let Some(unfiltered) = fetch_detail(client, &mut report, "unfiltered detail", &id, &[]).await else {
        return report;
    };
    let location = [("city", case.city.clone()), ("country", case.country.clone())];
    let Some(filtered) = fetch_detail(client, &mut report, "filtered detail", &id, &location).await else {
        return report;
    };

    for outcome in assess_review_counts(&unfiltered, &filtered) {
        report.push(outcome);
    }
    report
}
