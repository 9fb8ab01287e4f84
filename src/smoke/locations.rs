use serde_json::Value;

use super::{expect_json_array, expect_status, CheckOutcome, SmokeClient, SuiteReport};

pub const LOCATIONS_PATH: &str = "/api/locations";

struct Search {
    name: &'static str,
    query: &'static [(&'static str, &'static str)],
    limit: Option<usize>,
}

const SEARCHES: [Search; 5] = [
    Search {
        name: "all locations",
        query: &[],
        limit: None,
    },
    Search {
        name: "search 'new york'",
        query: &[("q", "new york")],
        limit: None,
    },
    Search {
        name: "region Europe",
        query: &[("region", "Europe")],
        limit: None,
    },
    Search {
        name: "country USA",
        query: &[("country", "USA")],
        limit: None,
    },
    Search {
        name: "search 'london' limit 5",
        query: &[("q", "london"), ("limit", "5")],
        limit: Some(5),
    },
];

fn sample_names(items: &[Value]) -> String {
    items
        .iter()
        .take(3)
        .filter_map(|loc| loc.get("name").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Checks a `{"<key>": [...]}` listing such as `/regions`.
async fn check_keyed_list(client: &SmokeClient, report: &mut SuiteReport, key: &str) {
    let name = format!("location {}", key);
    let result = client.get(&format!("{}/{}", LOCATIONS_PATH, key), &[]).await;
    let outcome = expect_status(&name, &result, 200);
    let response = match result {
        Ok(response) if !outcome.is_fail() => response,
        _ => return report.push(outcome),
    };

    match response.json().as_ref().and_then(|body| body.get(key)).and_then(Value::as_array) {
        Some(values) => {
            let sample: Vec<&str> = values.iter().take(10).filter_map(Value::as_str).collect();
            report.push(CheckOutcome::pass(
                &name,
                format!("{} {}: {}", values.len(), key, sample.join(", ")),
            ))
        }
        None => report.push(CheckOutcome::fail(
            &name,
            format!("response has no '{}' array: {}", key, response.excerpt()),
        )),
    }
}

pub async fn run(client: &SmokeClient) -> SuiteReport {
    let mut report = SuiteReport::new("locations");

    for search in &SEARCHES {
        let query: Vec<(&str, String)> = search
            .query
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect();
        let result = client.get(LOCATIONS_PATH, &query).await;
        let items = match expect_json_array(search.name, &result) {
            Ok(items) => items,
            Err(outcome) => {
                report.push(outcome);
                continue;
            }
        };

        let outcome = match search.limit {
            Some(limit) if items.len() > limit => CheckOutcome::fail(
                search.name,
                format!("{} results despite limit {}", items.len(), limit),
            ),
            _ if items.is_empty() => CheckOutcome::warn(search.name, "no locations found"),
            _ => CheckOutcome::pass(
                search.name,
                format!("{} locations, e.g. {}", items.len(), sample_names(&items)),
            ),
        };
        report.push(outcome);
    }

    check_keyed_list(client, &mut report, "regions").await;
    check_keyed_list(client, &mut report, "countries").await;
    report
}
