use super::{expect_status, CheckOutcome, SmokeClient, SuiteReport};

pub const REVIEWS_PATH: &str = "/api/reviews";

struct ReviewQuery {
    name: &'static str,
    path: &'static str,
    query: &'static [(&'static str, &'static str)],
}

const QUERIES: [ReviewQuery; 10] = [
    ReviewQuery {
        name: "all reviews",
        path: "/",
        query: &[],
    },
    ReviewQuery {
        name: "reviews in Australia",
        path: "/",
        query: &[("country", "australia"), ("page", "1"), ("page_size", "10")],
    },
    ReviewQuery {
        name: "reviews in Berlin, Germany",
        path: "/",
        query: &[("city", "berlin"), ("country", "germany"), ("page", "1"), ("page_size", "10")],
    },
    ReviewQuery {
        name: "reviews in Sydney",
        path: "/",
        query: &[("city", "sydney"), ("page", "1"), ("page_size", "10")],
    },
    ReviewQuery {
        name: "review countries",
        path: "/countries",
        query: &[],
    },
    ReviewQuery {
        name: "review cities",
        path: "/cities",
        query: &[],
    },
    ReviewQuery {
        name: "review cities in Australia",
        path: "/cities",
        query: &[("country", "australia")],
    },
    ReviewQuery {
        name: "statistics for Australia",
        path: "/statistics/location",
        query: &[("country", "australia")],
    },
    ReviewQuery {
        name: "statistics for Sydney, Australia",
        path: "/statistics/location",
        query: &[("city", "sydney"), ("country", "australia")],
    },
    ReviewQuery {
        name: "search 'service'",
        path: "/",
        query: &[("search", "service"), ("page", "1"), ("page_size", "10")],
    },
];

pub async fn run(client: &SmokeClient) -> SuiteReport {
    let mut report = SuiteReport::new("reviews");

    for q in &QUERIES {
        let query: Vec<(&str, String)> = q.query.iter().map(|(k, v)| (*k, v.to_string())).collect();
        let result = client.get(&format!("{}{}", REVIEWS_PATH, q.path), &query).await;
        let outcome = expect_status(q.name, &result, 200);

        let outcome = match &result {
            Ok(response) if !outcome.is_fail() => {
                tracing::debug!("{}: {}", q.name, response.body);
                if response.json().is_some() {
                    CheckOutcome::pass(q.name, response.excerpt())
                } else {
                    CheckOutcome::fail(q.name, format!("body is not JSON: {}", response.excerpt()))
                }
            }
            _ => outcome,
        };
        report.push(outcome);
    }

    report
}
