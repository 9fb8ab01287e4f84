//! Reference data that ships with the schema: the five-point review
//! question catalogue and the default review-reward promotion. Also the
//! sample forwarders, users and reviews used to stand up a dev database.
//!
//! Seeding is kept apart from DDL. The schema migrations only create
//! tables; these constants are loaded by the explicit `review-questions`
//! migration, the promotion table setup and `seed_sample_data`.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::AnyConnection;
use uuid::Uuid;

use crate::db::{finish_transaction, Backend, Database};
use crate::errors::{OpsError, ResultExt};
use crate::maintenance::UserType;
use crate::report::{MigrationReport, StepOutcome};
use crate::schema;

pub const REVIEW_QUESTIONS_NAME: &str = "review_questions";

/// Labels for ratings 0 through 5. Rating 0 is always "Not applicable".
pub type RatingScale = [&'static str; 6];

pub const FREQUENCY: RatingScale = [
    "Not applicable",
    "Never",
    "Seldom",
    "Usually",
    "Most of the time",
    "Every time",
];

const VERTICAL_KNOWLEDGE: RatingScale = [
    "Not applicable",
    "None",
    "Some",
    "Aware but not knowledgable",
    "Knowledgable",
    "Very knowledgable",
];

const TRACK_AND_TRACE: RatingScale = [
    "Not applicable",
    "Not available",
    "Only via phone, messaging or email",
    "Provided via the website, however data doesn't seem dynamic nor current",
    "Provided via the website and data seems dynamic and current",
    "Provided via web or mobile app, data is dynamic and current, able to schedule reports and triggered by milestones",
];

const DOCUMENT_PORTAL: RatingScale = [
    "Not applicable",
    "Not available",
    "Limited availability - only for selected customers",
    "Basic availability - documents are not current or complete",
    "On demand access - documents are available on scheduled basis",
    "Available via web or mobile app on demand, with download and notification options",
];

const SYSTEM_INTEGRATION: RatingScale = [
    "Not applicable",
    "Not available",
    "Limited availability - only for selected customers",
    "Available however Forwarder lacks experience; project management and frequent technical issues",
    "Standard capability - available and able to implement effortlessly",
    "Advanced integration capabilities offering mature, flexible and secure integration services to a variety of ERP/TMS/WMS systems",
];

const REPORTING: RatingScale = [
    "Not applicable",
    "Not available",
    "Reporting is manual",
    "Limited available - only select customers",
    "Standardized access for all customers. Available and setup either by provider or via a web portal.",
    "Advances, customizable reporting via interactive dashboards on the web or mobile devices with advances analytical functions",
];

const PUNCTUALITY: RatingScale = [
    "Not applicable",
    "Seldom",
    "Occasionally",
    "Usually",
    "Often",
    "Always",
];

const SOP_COMPLIANCE: RatingScale = [
    "Not applicable",
    "Does not define SOP's and has no quality system (ISO 9001)",
    "Follows quality system, SOP's for large customers",
    "Defines and usually follows",
    "Defines and follows most of the time",
    "Always follows clients' SOP",
];

const CUSTOMS_ERRORS: RatingScale = [
    "Not applicable",
    "Very often",
    "Frequent errors",
    "Occasional errors",
    "Seldom errors",
    "No errors",
];

const CLAIMS: RatingScale = [
    "Not applicable",
    "Often",
    "Regularly",
    "Occasionally",
    "Rarely",
    "Never",
];

const ADVISORY: RatingScale = [
    "Not applicable",
    "Not able to provide any information",
    "Provides some information when requested",
    "Provides detailed updates when requested",
    "Proactively provides regular periodic updates",
    "Proactive and advisory - acts as a trusted advisor that actively monitors and proactively updates and recommendations",
];

const HELPDESK: RatingScale = [
    "Not applicable",
    "Not available",
    "Helpdesk/control tower only responds during working hours",
    "Provides a helpdesk/control tower however responds only after 2-4 hours",
    "Provides a helpdesk/control tower that responds within 1-2 hours",
    "Provides 24/7 helpdesk/control tower",
];

const HOLIDAY_CONTACT: RatingScale = [
    "Not applicable",
    "Not available",
    "No contact available on weekends or holidays",
    "Contact responds within 2-4 hours",
    "Contact responds within 1-2 hours",
    "Provides 24/7 contact",
];

#[derive(Debug, Clone, Copy)]
pub struct ReviewQuestion {
    pub category_id: &'static str,
    pub category_name: &'static str,
    pub question_id: &'static str,
    pub question_text: &'static str,
    pub scale: &'static RatingScale,
}

impl ReviewQuestion {
    /// `{"0": "...", ..., "5": "..."}` as stored in `rating_definitions`.
    pub fn rating_definitions(&self) -> Value {
        let mut map = Map::with_capacity(self.scale.len());
        for (rating, label) in self.scale.iter().enumerate() {
            map.insert(rating.to_string(), Value::String((*label).to_string()));
        }
        Value::Object(map)
    }
}

const fn q(
    category_id: &'static str,
    category_name: &'static str,
    question_id: &'static str,
    question_text: &'static str,
    scale: &'static RatingScale,
) -> ReviewQuestion {
    ReviewQuestion {
        category_id,
        category_name,
        question_id,
        question_text,
        scale,
    }
}

const RESP: (&str, &str) = ("responsiveness", "Responsiveness");
const SHIP: (&str, &str) = ("shipment_management", "Shipment Management");
const DOC: (&str, &str) = ("documentation", "Documentation");
const CUST: (&str, &str) = ("customer_experience", "Customer Experience");
const TECH: (&str, &str) = ("technology_process", "Technology Process");
const REL: (&str, &str) = ("reliability_execution", "Reliability & Execution");
const PRO: (&str, &str) = ("proactivity_insight", "Proactivity & Insight");
const AFTER: (&str, &str) = ("after_hours_support", "After Hours Support");

pub const REVIEW_QUESTIONS: [ReviewQuestion; 35] = [
    q(RESP.0, RESP.1, "resp_001", "Acknowledges receipt of requests (for quotation or information) within 30 minutes (even if full response comes later)", &FREQUENCY),
    q(RESP.0, RESP.1, "resp_002", "Provides clear estimated response time if immediate resolution is not possible", &FREQUENCY),
    q(RESP.0, RESP.1, "resp_003", "Responds within 6 hours to rate requests to/from locations within the same region", &FREQUENCY),
    q(RESP.0, RESP.1, "resp_004", "Responds within 24 hours to rate requests to/from other regions (e.g. Asia to US, US to Europe)", &FREQUENCY),
    q(RESP.0, RESP.1, "resp_005", "Responds to emergency requests (e.g., urgent shipment delay, customs issues) within 30 minutes", &FREQUENCY),
    q(SHIP.0, SHIP.1, "ship_001", "Proactively sends shipment milestones (e.g., pickup, departure, arrival, delivery) without being asked", &FREQUENCY),
    q(SHIP.0, SHIP.1, "ship_002", "Sends pre-alerts before vessel ETA", &FREQUENCY),
    q(SHIP.0, SHIP.1, "ship_003", "Provides POD (proof of delivery) within 24 hours of delivery", &FREQUENCY),
    q(SHIP.0, SHIP.1, "ship_004", "Proactively notifies delays or disruptions", &FREQUENCY),
    q(SHIP.0, SHIP.1, "ship_005", "Offers recovery plans in case of delays or missed transshipments", &FREQUENCY),
    q(DOC.0, DOC.1, "doc_001", "Issues draft B/L or HAWB within 24 hours of cargo departure", &FREQUENCY),
    q(DOC.0, DOC.1, "doc_002", "Sends final invoices within 48 hours of shipment completion", &FREQUENCY),
    q(DOC.0, DOC.1, "doc_003", "Ensures documentation is accurate and complete on first submission", &FREQUENCY),
    q(DOC.0, DOC.1, "doc_004", "Final invoice matches quotation (no hidden costs and all calculations and volumes are correct)", &FREQUENCY),
    q(CUST.0, CUST.1, "cust_001", "Follows up on pending issues without the need for reminders", &FREQUENCY),
    q(CUST.0, CUST.1, "cust_002", "Rectifies documentation (shipping documents and invoices/credit notes) within 48 hours", &FREQUENCY),
    q(CUST.0, CUST.1, "cust_003", "Provides named contact person(s) for operations and customer service", &FREQUENCY),
    q(CUST.0, CUST.1, "cust_004", "Offers single point of contact for issue escalation", &FREQUENCY),
    q(CUST.0, CUST.1, "cust_005", "Replies in professional tone, avoids jargon unless relevant", &FREQUENCY),
    q(CUST.0, CUST.1, "cust_006", "Customer Service and Operations have vertical specific knowledge (e.g. Chemicals, Pharma, Hightech)", &VERTICAL_KNOWLEDGE),
    q(TECH.0, TECH.1, "tech_001", "Offers online track-and-trace", &TRACK_AND_TRACE),
    q(TECH.0, TECH.1, "tech_002", "Has an online document portal to access shipment documents and invoices", &DOCUMENT_PORTAL),
    q(TECH.0, TECH.1, "tech_003", "Integrates with customer systems (e.g., EDI/API) where required", &SYSTEM_INTEGRATION),
    q(TECH.0, TECH.1, "tech_004", "Able to provides regular reporting (e.g., weekly shipment report, KPI report)", &REPORTING),
    q(REL.0, REL.1, "rel_001", "On-time pickup", &PUNCTUALITY),
    q(REL.0, REL.1, "rel_002", "Shipped as promised", &PUNCTUALITY),
    q(REL.0, REL.1, "rel_003", "On-time delivery", &PUNCTUALITY),
    q(REL.0, REL.1, "rel_004", "Compliance with clients' SOP", &SOP_COMPLIANCE),
    q(REL.0, REL.1, "rel_005", "Customs declaration errors", &CUSTOMS_ERRORS),
    q(REL.0, REL.1, "rel_006", "Claims ratio (number of claims / total shipments)", &CLAIMS),
    q(PRO.0, PRO.1, "pro_001", "Provides trends relating to rates, capacities, carriers, customs and geopolitical issues that might impact global trade and the client and mitigation options the client could consider", &ADVISORY),
    q(PRO.0, PRO.1, "pro_002", "Notifies customer of upcoming GRI or BAF changes in advance and mitigation options", &ADVISORY),
    q(PRO.0, PRO.1, "pro_003", "Provides suggestions for consolidation, better routings, or mode shifts", &ADVISORY),
    q(AFTER.0, AFTER.1, "after_001", "Has 24/7 support or provides emergency contact for after-hours escalation", &HELPDESK),
    q(AFTER.0, AFTER.1, "after_002", "Weekend or holiday contact provided in advance for critical shipments", &HOLIDAY_CONTACT),
];

#[derive(Debug, Clone, Copy)]
pub struct PromotionDefaults {
    pub is_active: bool,
    pub max_rewards_per_user: i32,
    pub reward_months: i32,
    pub description: &'static str,
}

pub const DEFAULT_PROMOTION: PromotionDefaults = PromotionDefaults {
    is_active: true,
    max_rewards_per_user: 3,
    reward_months: 1,
    description: "Get 1 month free subscription for each review submitted (max 3 months)",
};

async fn replace_questions(
    conn: &mut AnyConnection,
    backend: Backend,
    questions: &[ReviewQuestion],
) -> Result<Vec<StepOutcome>, OpsError> {
    if !schema::table_exists(conn, backend, "review_questions").await? {
        return Err(OpsError::MissingTable("review_questions".to_string()));
    }

    tracing::info!("Clearing existing review questions...");
    let deleted = sqlx::query("DELETE FROM review_questions")
        .execute(&mut *conn)
        .await
        .context("clearing review questions")?
        .rows_affected();

    let insert = match backend {
        Backend::Postgres => {
            "INSERT INTO review_questions \
             (category_id, category_name, question_id, question_text, rating_definitions, is_active) \
             VALUES ($1, $2, $3, $4, $5::jsonb, $6)"
        }
        Backend::Sqlite => {
            "INSERT INTO review_questions \
             (category_id, category_name, question_id, question_text, rating_definitions, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6)"
        }
    };

    tracing::info!("Inserting {} review questions...", questions.len());
    for question in questions {
        sqlx::query(insert)
            .bind(question.category_id)
            .bind(question.category_name)
            .bind(question.question_id)
            .bind(question.question_text)
            .bind(question.rating_definitions().to_string())
            .bind(true)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("inserting question {}", question.question_id))?;
        tracing::debug!("✓ Inserted question: {} - {}", question.question_id, question.category_name);
    }

    Ok(vec![
        StepOutcome::applied(format!("delete {} existing questions", deleted)),
        StepOutcome::applied(format!("insert {} questions", questions.len())),
    ])
}

pub async fn active_question_count(conn: &mut AnyConnection) -> Result<i64, OpsError> {
    Ok(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM review_questions WHERE is_active = $1")
            .bind(true)
            .fetch_one(&mut *conn)
            .await?,
    )
}

/// Replaces the whole question catalogue in one transaction.
pub async fn seed_review_questions(db: &Database) -> Result<MigrationReport, OpsError> {
    let backend = db.backend();
    let mut report = MigrationReport::new(REVIEW_QUESTIONS_NAME);

    let mut tx = db.begin().await?;
    let result = replace_questions(&mut *tx, backend, &REVIEW_QUESTIONS).await;
    report.extend(finish_transaction(tx, result, "updating review questions").await?);

    let mut conn = db.acquire().await?;
    let active = active_question_count(&mut *conn).await?;
    tracing::info!("✓ Total active questions in database: {}", active);
    report.verified = Some(active == REVIEW_QUESTIONS.len() as i64);
    Ok(report)
}

pub const SAMPLE_DATA_NAME: &str = "sample_data";

pub const DEFAULT_FORWARDERS_CSV: &str = "assets/LogiScore_table_freight_forwarders_data.csv";

/// Sample reviews are written for this many forwarders, alphabetically.
const REVIEWED_FORWARDERS: i64 = 3;

const SAMPLE_TABLES: [&str; 3] = ["users", "freight_forwarders", "reviews"];

/// One row of the freight forwarder export. Other columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForwarderRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Logo_URL", default)]
    pub logo_url: String,
}

#[derive(Debug, Clone, Copy)]
pub struct SampleUser {
    pub email: &'static str,
    pub username: &'static str,
    pub user_type: UserType,
}

pub const SAMPLE_USERS: [SampleUser; 2] = [
    SampleUser {
        email: "test@logiscore.net",
        username: "testuser",
        user_type: UserType::Shipper,
    },
    SampleUser {
        email: "admin@logiscore.net",
        username: "admin",
        user_type: UserType::Admin,
    },
];

#[derive(Debug, Clone, Copy)]
pub struct SampleReview {
    pub overall_rating: i32,
    pub is_anonymous: bool,
}

impl SampleReview {
    /// Anonymous reviews count half, as `fix_review_weights` enforces.
    pub fn review_weight(&self) -> f64 {
        if self.is_anonymous {
            0.5
        } else {
            1.0
        }
    }
}

pub const SAMPLE_REVIEWS: [SampleReview; 2] = [
    SampleReview {
        overall_rating: 5,
        is_anonymous: false,
    },
    SampleReview {
        overall_rating: 4,
        is_anonymous: true,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleCounts {
    pub users: i64,
    pub freight_forwarders: i64,
    pub reviews: i64,
}

pub fn read_forwarders_csv(path: &Path) -> Result<Vec<ForwarderRecord>, OpsError> {
    if !path.exists() {
        return Err(OpsError::Config(format!(
            "freight forwarder file not found: {}",
            path.display()
        )));
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let records = reader
        .deserialize()
        .collect::<Result<Vec<ForwarderRecord>, csv::Error>>()?;
    tracing::info!("📄 {} freight forwarders in {}", records.len(), path.display());
    Ok(records)
}

/// Inserts forwarders whose name is not taken yet. Blank names are skipped.
async fn insert_forwarders(
    conn: &mut AnyConnection,
    backend: Backend,
    records: &[ForwarderRecord],
) -> Result<StepOutcome, OpsError> {
    let step = "load freight forwarders";
    let insert = match backend {
        Backend::Postgres => {
            "INSERT INTO freight_forwarders (id, name, logo_url) VALUES ($1::uuid, $2, $3)"
        }
        Backend::Sqlite => "INSERT INTO freight_forwarders (id, name, logo_url) VALUES ($1, $2, $3)",
    };

    let mut inserted = 0;
    for record in records.iter().filter(|r| !r.name.is_empty()) {
        let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM freight_forwarders WHERE name = $1")
            .bind(&record.name)
            .fetch_one(&mut *conn)
            .await?;
        if taken > 0 {
            continue;
        }
        let logo_url = Some(record.logo_url.as_str()).filter(|u| !u.is_empty());
        sqlx::query(insert)
            .bind(Uuid::new_v4().to_string())
            .bind(&record.name)
            .bind(logo_url)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("inserting freight forwarder {}", record.name))?;
        inserted += 1;
    }

    tracing::info!("📦 {} new freight forwarders", inserted);
    if inserted == 0 {
        Ok(StepOutcome::skipped(step, "no new forwarders"))
    } else {
        Ok(StepOutcome::applied(step))
    }
}

async fn insert_users(conn: &mut AnyConnection, backend: Backend) -> Result<Vec<StepOutcome>, OpsError> {
    let insert = match backend {
        Backend::Postgres => {
            "INSERT INTO users (id, email, username, user_type) VALUES ($1::uuid, $2, $3, $4)"
        }
        Backend::Sqlite => "INSERT INTO users (id, email, username, user_type) VALUES ($1, $2, $3, $4)",
    };

    let mut outcomes = Vec::with_capacity(SAMPLE_USERS.len());
    for user in &SAMPLE_USERS {
        let step = format!("create sample user {}", user.email);
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE LOWER(TRIM(email)) = $1")
            .bind(user.email)
            .fetch_one(&mut *conn)
            .await?;
        if existing > 0 {
            outcomes.push(StepOutcome::skipped(step, "already exists"));
            continue;
        }
        sqlx::query(insert)
            .bind(Uuid::new_v4().to_string())
            .bind(user.email)
            .bind(user.username)
            .bind(user.user_type.as_str())
            .execute(&mut *conn)
            .await
            .with_context(|| format!("inserting sample user {}", user.email))?;
        tracing::info!("👥 Created {} ({})", user.email, user.user_type);
        outcomes.push(StepOutcome::applied(step));
    }
    Ok(outcomes)
}

/// Writes `SAMPLE_REVIEWS` by the first sample user for the first few
/// forwarders, unless that user has reviewed anything already.
async fn insert_reviews(conn: &mut AnyConnection, backend: Backend) -> Result<StepOutcome, OpsError> {
    let step = "create sample reviews";
    let reviewer = SAMPLE_USERS[0];

    let user_id: Option<String> = sqlx::query_scalar("SELECT CAST(id AS TEXT) FROM users WHERE email = $1")
        .bind(reviewer.email)
        .fetch_optional(&mut *conn)
        .await?;
    let forwarder_ids: Vec<String> =
        sqlx::query_scalar("SELECT CAST(id AS TEXT) FROM freight_forwarders ORDER BY name LIMIT $1")
            .bind(REVIEWED_FORWARDERS)
            .fetch_all(&mut *conn)
            .await?;
    let Some(user_id) = user_id.filter(|_| !forwarder_ids.is_empty()) else {
        tracing::warn!("⚠️  No users or freight forwarders found for sample reviews");
        return Ok(StepOutcome::skipped(step, "no users or freight forwarders"));
    };

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE CAST(user_id AS TEXT) = $1")
        .bind(&user_id)
        .fetch_one(&mut *conn)
        .await?;
    if existing > 0 {
        return Ok(StepOutcome::skipped(step, format!("{} has {} reviews", reviewer.email, existing)));
    }

    let insert = match backend {
        Backend::Postgres => {
            "INSERT INTO reviews (id, user_id, freight_forwarder_id, overall_rating, is_anonymous, review_weight) \
             VALUES ($1::uuid, $2::uuid, $3::uuid, $4, $5, $6)"
        }
        Backend::Sqlite => {
            "INSERT INTO reviews (id, user_id, freight_forwarder_id, overall_rating, is_anonymous, review_weight) \
             VALUES ($1, $2, $3, $4, $5, $6)"
        }
    };
    for forwarder_id in &forwarder_ids {
        for review in &SAMPLE_REVIEWS {
            sqlx::query(insert)
                .bind(Uuid::new_v4().to_string())
                .bind(&user_id)
                .bind(forwarder_id)
                .bind(review.overall_rating)
                .bind(review.is_anonymous)
                .bind(review.review_weight())
                .execute(&mut *conn)
                .await
                .context("inserting sample review")?;
        }
    }
    tracing::info!(
        "⭐ Created {} sample reviews",
        forwarder_ids.len() * SAMPLE_REVIEWS.len()
    );
    Ok(StepOutcome::applied(step))
}

async fn insert_sample_data(
    conn: &mut AnyConnection,
    backend: Backend,
    forwarders: &[ForwarderRecord],
) -> Result<Vec<StepOutcome>, OpsError> {
    for table in SAMPLE_TABLES {
        if !schema::table_exists(conn, backend, table).await? {
            return Err(OpsError::MissingTable(table.to_string()));
        }
    }
    let mut outcomes = vec![insert_forwarders(conn, backend, forwarders).await?];
    outcomes.extend(insert_users(conn, backend).await?);
    outcomes.push(insert_reviews(conn, backend).await?);
    Ok(outcomes)
}

pub async fn sample_data_counts(conn: &mut AnyConnection) -> Result<SampleCounts, OpsError> {
    Ok(SampleCounts {
        users: schema::row_count(conn, "users").await?,
        freight_forwarders: schema::row_count(conn, "freight_forwarders").await?,
        reviews: schema::row_count(conn, "reviews").await?,
    })
}

/// Loads `forwarders`, the sample users and their sample reviews into a
/// migrated database in one transaction. Rows already present are left
/// alone, so re-running applies nothing.
pub async fn seed_sample_data(
    db: &Database,
    forwarders: &[ForwarderRecord],
) -> Result<MigrationReport, OpsError> {
    let backend = db.backend();
    let mut report = MigrationReport::new(SAMPLE_DATA_NAME);

    let mut tx = db.begin().await?;
    let result = insert_sample_data(&mut *tx, backend, forwarders).await;
    report.extend(finish_transaction(tx, result, "seeding sample data").await?);

    let mut conn = db.acquire().await?;
    let counts = sample_data_counts(&mut *conn).await?;
    tracing::info!("📊 Users: {} records", counts.users);
    tracing::info!("📊 Freight forwarders: {} records", counts.freight_forwarders);
    tracing::info!("📊 Reviews: {} records", counts.reviews);

    report.verified = Some(
        counts.users >= SAMPLE_USERS.len() as i64
            && counts.freight_forwarders > 0
            && counts.reviews > 0,
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn question_ids_are_unique() {
        let ids: HashSet<_> = REVIEW_QUESTIONS.iter().map(|q| q.question_id).collect();
        assert_eq!(ids.len(), REVIEW_QUESTIONS.len());
    }

    #[test]
    fn question_ids_share_category_prefix() {
        for question in &REVIEW_QUESTIONS {
            let prefix = question.question_id.split('_').next().unwrap();
            let expected = match question.category_id {
                "responsiveness" => "resp",
                "shipment_management" => "ship",
                "documentation" => "doc",
                "customer_experience" => "cust",
                "technology_process" => "tech",
                "reliability_execution" => "rel",
                "proactivity_insight" => "pro",
                "after_hours_support" => "after",
                other => panic!("unknown category {other}"),
            };
            assert_eq!(prefix, expected, "{}", question.question_id);
        }
    }

    #[test]
    fn anonymous_sample_reviews_count_half() {
        assert!(SAMPLE_REVIEWS.iter().any(|r| r.is_anonymous));
        for review in &SAMPLE_REVIEWS {
            let expected = if review.is_anonymous { 0.5 } else { 1.0 };
            assert!((review.review_weight() - expected).abs() < f64::EPSILON);
            assert!((0..=5).contains(&review.overall_rating));
        }
    }

    #[test]
    fn forwarder_csv_ignores_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forwarders.csv");
        std::fs::write(
            &path,
            "Name,Website,Logo_URL\nDHL Global Forwarding,https://dhl.com,https://cdn/dhl.png\n  ,,\nKuehne+Nagel,,\n",
        )
        .unwrap();

        let records = read_forwarders_csv(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].logo_url, "https://cdn/dhl.png");
        assert_eq!(records[1].name, "");
        assert_eq!(records[2].logo_url, "");
    }

    #[test]
    fn rating_definitions_cover_zero_to_five() {
        let defs = REVIEW_QUESTIONS[0].rating_definitions();
        let obj = defs.as_object().unwrap();
        assert_eq!(obj.len(), 6);
        assert_eq!(obj["0"], "Not applicable");
        assert_eq!(obj["5"], "Every time");
        for question in &REVIEW_QUESTIONS {
            assert_eq!(question.scale[0], "Not applicable");
        }
    }
}
