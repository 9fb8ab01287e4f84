//! Widens the category rating check to the five-point scale with 0 meaning
//! "not applicable".

use sqlx::AnyConnection;

use crate::db::{finish_transaction, Backend, Database};
use crate::ddl;
use crate::errors::{OpsError, ResultExt};
use crate::report::{MigrationReport, StepOutcome};
use crate::schema;

pub const NAME: &str = "rating_constraint";

const TABLE: &str = "review_category_scores";
const CONSTRAINT: &str = "review_category_scores_rating_check";
const CHECK: &str = "CHECK (rating >= 0 AND rating <= 5)";

async fn replace_constraint(conn: &mut AnyConnection, backend: Backend) -> Result<Vec<StepOutcome>, OpsError> {
    let mut outcomes = Vec::new();

    match schema::check_constraint_definition(conn, backend, TABLE, CONSTRAINT).await? {
        Some(definition) => {
            tracing::info!("Current constraint: {}", definition);
            ddl::execute(
                conn,
                &format!("ALTER TABLE {} DROP CONSTRAINT {}", TABLE, CONSTRAINT),
            )
            .await
            .context("dropping old rating constraint")?;
            outcomes.push(StepOutcome::applied(format!("drop constraint {}", CONSTRAINT)));
        }
        None => outcomes.push(StepOutcome::skipped(
            format!("drop constraint {}", CONSTRAINT),
            "not present",
        )),
    }

    ddl::execute(
        conn,
        &format!("ALTER TABLE {} ADD CONSTRAINT {} {}", TABLE, CONSTRAINT, CHECK),
    )
    .await
    .context("adding rating constraint")?;
    outcomes.push(StepOutcome::applied(format!("add constraint {}", CONSTRAINT)));
    Ok(outcomes)
}

/// True when the definition already accepts 0 through 5.
pub fn accepts_zero_to_five(definition: &str) -> bool {
    let compact: String = definition.chars().filter(|c| !c.is_whitespace()).collect();
    compact.contains("rating>=0") && compact.contains("rating<=5")
}

pub async fn fix_rating_constraint(db: &Database) -> Result<MigrationReport, OpsError> {
    let backend = db.backend();
    let mut report = MigrationReport::new(NAME);

    let mut conn = db.acquire().await?;
    if !schema::table_exists(&mut *conn, backend, TABLE).await? {
        return Err(OpsError::MissingTable(TABLE.to_string()));
    }

    if backend == Backend::Sqlite {
        // Constraints live in the CREATE TABLE text; ratings are range
        // checked by the application there.
        report.push(StepOutcome::skipped(
            format!("replace constraint {}", CONSTRAINT),
            "SQLite cannot alter table constraints",
        ));
        report.verified = Some(true);
        return Ok(report);
    }

    let current = schema::check_constraint_definition(&mut *conn, backend, TABLE, CONSTRAINT).await?;
    drop(conn);
    if current.as_deref().is_some_and(accepts_zero_to_five) {
        report.push(StepOutcome::skipped(
            format!("replace constraint {}", CONSTRAINT),
            "already allows 0-5",
        ));
    } else {
        let mut tx = db.begin().await?;
        let result = replace_constraint(&mut *tx, backend).await;
        report.extend(finish_transaction(tx, result, "replacing rating constraint").await?);
    }

    let mut conn = db.acquire().await?;
    let definition = schema::check_constraint_definition(&mut *conn, backend, TABLE, CONSTRAINT).await?;
    report.verified = Some(definition.as_deref().is_some_and(accepts_zero_to_five));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::accepts_zero_to_five;

    #[test]
    fn recognizes_pg_constraint_definitions() {
        assert!(accepts_zero_to_five("CHECK (((rating >= 0) AND (rating <= 5)))"));
        assert!(!accepts_zero_to_five("CHECK (((rating >= 1) AND (rating <= 5)))"));
        assert!(!accepts_zero_to_five("CHECK (((rating >= 0) AND (rating <= 4)))"));
    }
}
