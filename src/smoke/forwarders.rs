use serde_json::Value;

use super::{expect_json_array, CheckOutcome, SmokeClient, SuiteReport};

pub const AGGREGATED_PATH: &str = "/freight-forwarders/aggregated/";
pub const LIST_PATH: &str = "/freight-forwarders/";

pub const REQUIRED_FIELDS: [&str; 5] = [
    "id",
    "name",
    "average_rating",
    "review_count",
    "category_scores_summary",
];
pub const CATEGORY_FIELDS: [&str; 3] = ["category_name", "average_rating", "total_reviews"];

pub fn missing_fields(forwarder: &Value) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| forwarder.get(field).is_none())
        .collect()
}

/// Problems with `category_scores_summary`, one entry per category.
pub fn category_problems(forwarder: &Value) -> Vec<String> {
    let Some(summary) = forwarder.get("category_scores_summary") else {
        return Vec::new();
    };
    let Some(categories) = summary.as_object() else {
        return vec!["category_scores_summary is not an object".to_string()];
    };

    categories
        .iter()
        .filter_map(|(category_id, score)| {
            let missing: Vec<&str> = CATEGORY_FIELDS
                .iter()
                .copied()
                .filter(|field| score.get(field).is_none())
                .collect();
            (!missing.is_empty()).then(|| format!("{} missing {}", category_id, missing.join(", ")))
        })
        .collect()
}

fn describe(forwarder: &Value) -> String {
    format!(
        "{} (rating {}, {} reviews, {} categories)",
        forwarder.get("name").and_then(Value::as_str).unwrap_or("?"),
        forwarder.get("average_rating").unwrap_or(&Value::Null),
        forwarder.get("review_count").unwrap_or(&Value::Null),
        forwarder
            .get("category_scores_summary")
            .and_then(Value::as_object)
            .map(|c| c.len())
            .unwrap_or(0)
    )
}

async fn check_listing(client: &SmokeClient, report: &mut SuiteReport, name: &str, path: &str) {
    let result = client.get(path, &[]).await;
    let items = match expect_json_array(name, &result) {
        Ok(items) => items,
        Err(outcome) => return report.push(outcome),
    };

    let Some(first) = items.first() else {
        return report.push(CheckOutcome::warn(name, "no freight forwarders in the database"));
    };

    report.push(CheckOutcome::pass(
        name,
        format!("{} forwarders, first: {}", items.len(), describe(first)),
    ));

    let fields_check = format!("{} fields", name);
    let missing = missing_fields(first);
    if missing.is_empty() {
        report.push(CheckOutcome::pass(&fields_check, "all required fields present"));
    } else {
        report.push(CheckOutcome::fail(
            &fields_check,
            format!("missing required fields: {}", missing.join(", ")),
        ));
    }

    let problems = category_problems(first);
    if !problems.is_empty() {
        report.push(CheckOutcome::fail(
            format!("{} category scores", name),
            problems.join("; "),
        ));
    }
}

pub async fn run(client: &SmokeClient) -> SuiteReport {
    let mut report = SuiteReport::new("forwarders");
    check_listing(client, &mut report, "aggregated forwarders", AGGREGATED_PATH).await;
    check_listing(client, &mut report, "forwarder list", LIST_PATH).await;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_missing_fields() {
        let ff = json!({"id": "1", "name": "Acme", "average_rating": 4.2});
        assert_eq!(missing_fields(&ff), vec!["review_count", "category_scores_summary"]);
    }

    #[test]
    fn reports_incomplete_categories() {
        let ff = json!({
            "category_scores_summary": {
                "responsiveness": {"category_name": "Responsiveness", "average_rating": 4.0, "total_reviews": 3},
                "pricing": {"category_name": "Pricing"}
            }
        });
        assert_eq!(
            category_problems(&ff),
            vec!["pricing missing average_rating, total_reviews".to_string()]
        );
    }
}
