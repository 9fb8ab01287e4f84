use serde_json::json;
use uuid::Uuid;

use super::{expect_status, CheckOutcome, SmokeClient, SuiteReport};

pub const THANK_YOU_PATH: &str = "/api/email/review-thank-you";

/// Exercises the thank-you email endpoint. Without `review_id` the
/// successful send is reported as a warning, since it needs real data.
pub async fn run(client: &SmokeClient, review_id: Option<&str>) -> SuiteReport {
    let mut report = SuiteReport::new("email");

    match review_id {
        Some(review_id) => {
            let result = client
                .post_json(THANK_YOU_PATH, &json!({ "review_id": review_id }))
                .await;
            report.push(expect_status("send thank-you email", &result, 200));
        }
        None => report.push(CheckOutcome::warn(
            "send thank-you email",
            "skipped: pass --review-id with an existing review",
        )),
    }

    let result = client.post_json(THANK_YOU_PATH, &json!({})).await;
    report.push(expect_status("reject missing review_id", &result, 400));

    let fake = Uuid::new_v4().to_string();
    let result = client
        .post_json(THANK_YOU_PATH, &json!({ "review_id": fake }))
        .await;
    report.push(expect_status("reject unknown review", &result, 404));

    report
}
