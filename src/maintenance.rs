//! One-off data repairs run by an operator against live data.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use sqlx::AnyConnection;

use crate::db::{finish_transaction, Database};
use crate::errors::{OpsError, ResultExt};
use crate::schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeightCounts {
    pub total: i64,
    pub missing_weight: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewWeightFix {
    pub before: WeightCounts,
    pub defaulted: u64,
    pub anonymous: u64,
    pub remaining: i64,
}

pub async fn count_review_weights(conn: &mut AnyConnection) -> Result<WeightCounts, OpsError> {
    let (total, missing_weight): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), \
                COALESCE(SUM(CASE WHEN review_weight IS NULL OR review_weight = 0 THEN 1 ELSE 0 END), 0) \
         FROM reviews",
    )
    .fetch_one(&mut *conn)
    .await?;
    Ok(WeightCounts {
        total,
        missing_weight,
    })
}

async fn apply_weights(conn: &mut AnyConnection, has_anonymous: bool) -> Result<(u64, u64), OpsError> {
    let defaulted = sqlx::query(
        "UPDATE reviews SET review_weight = 1.0 WHERE review_weight IS NULL OR review_weight = 0",
    )
    .execute(&mut *conn)
    .await
    .context("defaulting review weights")?
    .rows_affected();

    let anonymous = if has_anonymous {
        sqlx::query(
            "UPDATE reviews SET review_weight = 0.5 \
             WHERE is_anonymous = $1 AND review_weight <> 0.5",
        )
        .bind(true)
        .execute(&mut *conn)
        .await
        .context("weighting anonymous reviews")?
        .rows_affected()
    } else {
        0
    };

    Ok((defaulted, anonymous))
}

/// Gives unweighted reviews the default weight 1.0 and anonymous reviews
/// 0.5, in one transaction.
pub async fn fix_review_weights(db: &Database) -> Result<ReviewWeightFix, OpsError> {
    let backend = db.backend();

    let (before, has_anonymous) = {
        let mut conn = db.acquire().await?;
        if !schema::column_exists(&mut *conn, backend, "reviews", "review_weight").await? {
            return Err(OpsError::Verification(
                "reviews.review_weight does not exist; run the review-schema migration first".to_string(),
            ));
        }
        let counts = count_review_weights(&mut *conn).await?;
        let has_anonymous = schema::column_exists(&mut *conn, backend, "reviews", "is_anonymous").await?;
        (counts, has_anonymous)
    };
    tracing::info!(
        "📊 {} reviews, {} without a usable weight",
        before.total,
        before.missing_weight
    );

    let mut tx = db.begin().await?;
    let result = apply_weights(&mut *tx, has_anonymous).await;
    let (defaulted, anonymous) = finish_transaction(tx, result, "fixing review weights").await?;
    tracing::info!("✅ Set weight 1.0 on {} reviews", defaulted);
    tracing::info!("✅ Set weight 0.5 on {} anonymous reviews", anonymous);

    let mut conn = db.acquire().await?;
    let remaining = count_review_weights(&mut *conn).await?.missing_weight;
    if remaining > 0 {
        tracing::error!("❌ {} reviews still have no weight", remaining);
    }

    Ok(ReviewWeightFix {
        before,
        defaulted,
        anonymous,
        remaining,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UserType {
    Shipper,
    Forwarder,
    Admin,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Shipper => "shipper",
            UserType::Forwarder => "forwarder",
            UserType::Admin => "admin",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shipper" => Ok(UserType::Shipper),
            "forwarder" => Ok(UserType::Forwarder),
            "admin" => Ok(UserType::Admin),
            other => Err(OpsError::Config(format!(
                "invalid user type '{}': expected shipper, forwarder or admin",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub username: Option<String>,
    pub company_name: Option<String>,
    pub user_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserTypeChange {
    Unchanged(UserRecord),
    Updated { user: UserRecord, previous: Option<String> },
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn find_user_by_email(
    conn: &mut AnyConnection,
    email: &str,
) -> Result<Option<UserRecord>, OpsError> {
    let row: Option<(String, String, Option<String>, Option<String>, Option<String>)> = sqlx::query_as(
        "SELECT CAST(id AS TEXT), email, username, company_name, CAST(user_type AS TEXT) \
         FROM users WHERE LOWER(TRIM(email)) = $1",
    )
    .bind(normalize_email(email))
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|(id, email, username, company_name, user_type)| UserRecord {
        id,
        email,
        username,
        company_name,
        user_type,
    }))
}

/// Sets the account type of the user with `email`, leaving it alone when it
/// already matches.
pub async fn fix_user_type(
    db: &Database,
    email: &str,
    new_type: UserType,
) -> Result<UserTypeChange, OpsError> {
    let mut tx = db.begin().await?;
    let result = update_user_type(&mut *tx, email, new_type).await;
    let change = finish_transaction(tx, result, "updating user type").await?;

    if let UserTypeChange::Updated { user, .. } = &change {
        let mut conn = db.acquire().await?;
        let stored = find_user_by_email(&mut *conn, &user.email)
            .await?
            .and_then(|u| u.user_type);
        if stored.as_deref() != Some(new_type.as_str()) {
            return Err(OpsError::Verification(format!(
                "user_type for {} reads back as {:?}",
                user.email, stored
            )));
        }
    }
    Ok(change)
}

async fn update_user_type(
    conn: &mut AnyConnection,
    email: &str,
    new_type: UserType,
) -> Result<UserTypeChange, OpsError> {
    let user = find_user_by_email(conn, email)
        .await?
        .ok_or_else(|| OpsError::NotFound(format!("no user with email {}", normalize_email(email))))?;

    tracing::info!(
        "👤 {} ({}) username={} company={} type={}",
        user.email,
        user.id,
        user.username.as_deref().unwrap_or("-"),
        user.company_name.as_deref().unwrap_or("-"),
        user.user_type.as_deref().unwrap_or("-")
    );

    if user.user_type.as_deref() == Some(new_type.as_str()) {
        tracing::info!("✅ User is already a {}, nothing to change", new_type);
        return Ok(UserTypeChange::Unchanged(user));
    }

    sqlx::query("UPDATE users SET user_type = $1 WHERE LOWER(TRIM(email)) = $2")
        .bind(new_type.as_str())
        .bind(normalize_email(email))
        .execute(&mut *conn)
        .await
        .context("updating user_type")?;
    tracing::info!(
        "✅ Changed user type from {} to {}",
        user.user_type.as_deref().unwrap_or("-"),
        new_type
    );

    let previous = user.user_type.clone();
    Ok(UserTypeChange::Updated {
        user: UserRecord {
            user_type: Some(new_type.as_str().to_string()),
            ..user
        },
        previous,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_type_parses_case_insensitively() {
        assert_eq!(" Forwarder ".parse::<UserType>().unwrap(), UserType::Forwarder);
        assert_eq!("ADMIN".parse::<UserType>().unwrap(), UserType::Admin);
        assert!("carrier".parse::<UserType>().is_err());
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ops@LogiScore.io "), "ops@logiscore.io");
    }
}
