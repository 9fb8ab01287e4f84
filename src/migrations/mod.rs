//! Schema migrations, one module per change.
//!
//! Every migration follows the same discipline:
//!
//! - guarded DDL (check the catalog, then change) runs in one transaction
//!   that rolls back on the first error,
//! - best-effort steps (constraint reconciliation, optional indexes) run on
//!   the plain connection afterwards and are recorded as warnings,
//! - a final verification query sets [`MigrationReport::verified`].
//!
//! Running any migration a second time applies nothing.

pub mod city_country;
pub mod disputes;
pub mod locations;
pub mod promotions;
pub mod rating_constraint;
pub mod remove_branches;
pub mod review_indexes;
pub mod review_schema;
pub mod review_subscriptions;
pub mod score_thresholds;
pub mod shipment_reference;
pub mod subscription_fields;

use clap::ValueEnum;

use crate::db::Database;
use crate::errors::{OpsError, ResultExt};
use crate::report::MigrationReport;
use crate::seed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MigrationName {
    /// Core review model: question catalogue, category scores, weights
    ReviewSchema,
    /// reviews.city / reviews.country with branch backfill
    CityCountry,
    /// reviews.shipment_reference
    ShipmentReference,
    /// Subscription and billing columns on users
    SubscriptionFields,
    /// Dispute reporter, reason, notes and foreign keys
    DisputeSchema,
    /// Review reward promotion tables
    PromotionTables,
    /// Score threshold alert tables
    ScoreThresholdTables,
    /// score_threshold_subscriptions.expires_at
    ExpiresAtColumn,
    /// Review alert subscriptions and notification indexes
    ReviewSubscriptions,
    /// Search indexes on reviews and category scores
    ReviewIndexes,
    /// Location lookup table and its search indexes
    Locations,
    /// 0-5 check on review_category_scores.rating
    RatingConstraint,
    /// Drop the retired branches table
    RemoveBranches,
    /// Reload the five-point review question catalogue
    ReviewQuestions,
}

impl MigrationName {
    /// Every migration in the order a fresh database needs them.
    pub const ALL: [MigrationName; 14] = [
        MigrationName::ReviewSchema,
        MigrationName::CityCountry,
        MigrationName::ShipmentReference,
        MigrationName::SubscriptionFields,
        MigrationName::DisputeSchema,
        MigrationName::PromotionTables,
        MigrationName::ScoreThresholdTables,
        MigrationName::ExpiresAtColumn,
        MigrationName::ReviewSubscriptions,
        MigrationName::ReviewIndexes,
        MigrationName::Locations,
        MigrationName::RatingConstraint,
        MigrationName::RemoveBranches,
        MigrationName::ReviewQuestions,
    ];

    pub fn id(self) -> &'static str {
        match self {
            MigrationName::ReviewSchema => review_schema::NAME,
            MigrationName::CityCountry => city_country::NAME,
            MigrationName::ShipmentReference => shipment_reference::NAME,
            MigrationName::SubscriptionFields => subscription_fields::NAME,
            MigrationName::DisputeSchema => disputes::NAME,
            MigrationName::PromotionTables => promotions::NAME,
            MigrationName::ScoreThresholdTables => score_thresholds::NAME,
            MigrationName::ExpiresAtColumn => score_thresholds::EXPIRES_AT_NAME,
            MigrationName::ReviewSubscriptions => review_subscriptions::NAME,
            MigrationName::ReviewIndexes => review_indexes::NAME,
            MigrationName::Locations => locations::NAME,
            MigrationName::RatingConstraint => rating_constraint::NAME,
            MigrationName::RemoveBranches => remove_branches::NAME,
            MigrationName::ReviewQuestions => seed::REVIEW_QUESTIONS_NAME,
        }
    }
}

pub async fn run_migration(db: &Database, name: MigrationName) -> Result<MigrationReport, OpsError> {
    tracing::info!("🚀 Running migration {} on {}", name.id(), db.backend().name());

    let result = match name {
        MigrationName::ReviewSchema => review_schema::migrate_schema(db).await,
        MigrationName::CityCountry => city_country::migrate_add_city_country(db).await,
        MigrationName::ShipmentReference => shipment_reference::run(db).await,
        MigrationName::SubscriptionFields => {
            subscription_fields::migrate_subscription_fields(db).await
        }
        MigrationName::DisputeSchema => disputes::run(db).await,
        MigrationName::PromotionTables => promotions::create_promotion_tables(db).await,
        MigrationName::ScoreThresholdTables => {
            score_thresholds::add_score_threshold_tables(db).await
        }
        MigrationName::ExpiresAtColumn => score_thresholds::add_expires_at_column(db).await,
        MigrationName::ReviewSubscriptions => {
            review_subscriptions::migrate_review_subscriptions(db).await
        }
        MigrationName::ReviewIndexes => review_indexes::create_review_indexes(db).await,
        MigrationName::Locations => locations::create_locations_table(db).await,
        MigrationName::RatingConstraint => rating_constraint::fix_rating_constraint(db).await,
        MigrationName::RemoveBranches => remove_branches::remove_branches_table(db).await,
        MigrationName::ReviewQuestions => seed::seed_review_questions(db).await,
    };

    let report = result.with_context(|| format!("migration {} failed", name.id()))?;
    report.log_summary();
    Ok(report)
}
