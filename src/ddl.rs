//! Guarded DDL: every helper checks the catalog first and reports whether it
//! changed anything, which is what makes the migrations safe to re-run.

use sqlx::AnyConnection;

use crate::db::Backend;
use crate::errors::{OpsError, ResultExt};
use crate::report::StepOutcome;
use crate::schema;

/// A column definition with per-engine type and default clauses.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub postgres: &'static str,
    pub sqlite: &'static str,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, postgres: &'static str, sqlite: &'static str) -> Self {
        Self {
            name,
            postgres,
            sqlite,
        }
    }

    /// Same definition on both engines.
    pub const fn portable(name: &'static str, definition: &'static str) -> Self {
        Self::new(name, definition, definition)
    }

    pub fn definition(&self, backend: Backend) -> &'static str {
        match backend {
            Backend::Postgres => self.postgres,
            Backend::Sqlite => self.sqlite,
        }
    }
}

/// `CREATE TABLE IF NOT EXISTS` statements for both engines.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub postgres: &'static str,
    pub sqlite: &'static str,
}

impl TableSpec {
    pub fn ddl(&self, backend: Backend) -> &'static str {
        match backend {
            Backend::Postgres => self.postgres,
            Backend::Sqlite => self.sqlite,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IndexSpec {
    pub name: &'static str,
    pub table: &'static str,
    pub columns: &'static str,
    pub predicate: Option<&'static str>,
}

impl IndexSpec {
    pub const fn new(name: &'static str, table: &'static str, columns: &'static str) -> Self {
        Self {
            name,
            table,
            columns,
            predicate: None,
        }
    }

    pub const fn partial(
        name: &'static str,
        table: &'static str,
        columns: &'static str,
        predicate: &'static str,
    ) -> Self {
        Self {
            name,
            table,
            columns,
            predicate: Some(predicate),
        }
    }

    pub fn create_sql(&self) -> String {
        let mut sql = format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            self.name, self.table, self.columns
        );
        if let Some(predicate) = self.predicate {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        sql
    }

    /// Whether a stored index definition agrees with this one on being
    /// partial. Column lists are not compared: PostgreSQL rewrites them.
    pub fn matches_definition(&self, stored: &str) -> bool {
        stored.to_ascii_uppercase().contains(" WHERE ") == self.predicate.is_some()
    }
}

/// Runs one statement without caching it as a prepared statement, since DDL
/// changes the shapes cached plans depend on.
pub async fn execute(conn: &mut AnyConnection, sql: &str) -> Result<u64, OpsError> {
    let result = sqlx::query(sql).persistent(false).execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

pub async fn add_column_if_missing(
    conn: &mut AnyConnection,
    backend: Backend,
    table: &str,
    column: &ColumnSpec,
) -> Result<StepOutcome, OpsError> {
    let step = format!("add column {}.{}", table, column.name);
    if schema::column_exists(conn, backend, table, column.name).await? {
        return Ok(StepOutcome::skipped(step, "already exists"));
    }

    let sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        table,
        column.name,
        column.definition(backend)
    );
    execute(conn, &sql)
        .await
        .with_context(|| format!("adding column {}.{}", table, column.name))?;
    Ok(StepOutcome::applied(step))
}

pub async fn drop_column_if_present(
    conn: &mut AnyConnection,
    backend: Backend,
    table: &str,
    column: &str,
) -> Result<StepOutcome, OpsError> {
    let step = format!("drop column {}.{}", table, column);
    if !schema::column_exists(conn, backend, table, column).await? {
        return Ok(StepOutcome::skipped(step, "not present"));
    }

    execute(conn, &format!("ALTER TABLE {} DROP COLUMN {}", table, column))
        .await
        .with_context(|| format!("dropping column {}.{}", table, column))?;
    Ok(StepOutcome::applied(step))
}

pub async fn create_table_if_missing(
    conn: &mut AnyConnection,
    backend: Backend,
    table: &TableSpec,
) -> Result<StepOutcome, OpsError> {
    let step = format!("create table {}", table.name);
    if schema::table_exists(conn, backend, table.name).await? {
        return Ok(StepOutcome::skipped(step, "already exists"));
    }

    execute(conn, table.ddl(backend))
        .await
        .with_context(|| format!("creating table {}", table.name))?;
    Ok(StepOutcome::applied(step))
}

pub async fn create_index_if_missing(
    conn: &mut AnyConnection,
    backend: Backend,
    index: &IndexSpec,
) -> Result<StepOutcome, OpsError> {
    let step = format!("create index {}", index.name);
    match schema::index_definition(conn, backend, index.name).await? {
        Some(stored) if index.matches_definition(&stored) => {
            return Ok(StepOutcome::skipped(step, "already exists"));
        }
        Some(_) => {
            tracing::info!("♻️  Rebuilding index {}: stored predicate differs", index.name);
            execute(conn, &format!("DROP INDEX IF EXISTS {}", index.name))
                .await
                .with_context(|| format!("dropping index {}", index.name))?;
        }
        None => {}
    }

    execute(conn, &index.create_sql())
        .await
        .with_context(|| format!("creating index {}", index.name))?;
    Ok(StepOutcome::applied(step))
}

/// Turns an error from a best-effort step into a `Failed` outcome so the
/// caller can move on to the next statement.
pub fn best_effort(step: impl Into<String>, result: Result<StepOutcome, OpsError>) -> StepOutcome {
    match result {
        Ok(outcome) => outcome,
        Err(err) => StepOutcome::failed(step, err),
    }
}

/// Creates each index independently; a failure is recorded and the rest
/// still run. Must be called outside a transaction on PostgreSQL, where one
/// failed statement aborts the whole transaction.
pub async fn create_indexes_best_effort(
    conn: &mut AnyConnection,
    backend: Backend,
    indexes: &[IndexSpec],
) -> Vec<StepOutcome> {
    let mut outcomes = Vec::with_capacity(indexes.len());
    for index in indexes {
        let result = create_index_if_missing(conn, backend, index).await;
        outcomes.push(best_effort(format!("create index {}", index.name), result));
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_sql_includes_predicate() {
        let plain = IndexSpec::new("idx_reviews_city", "reviews", "city");
        assert_eq!(
            plain.create_sql(),
            "CREATE INDEX IF NOT EXISTS idx_reviews_city ON reviews (city)"
        );

        let partial = IndexSpec::partial(
            "idx_reviews_is_active",
            "reviews",
            "is_active",
            "is_active = true",
        );
        assert_eq!(
            partial.create_sql(),
            "CREATE INDEX IF NOT EXISTS idx_reviews_is_active ON reviews (is_active) WHERE is_active = true"
        );
    }

    #[test]
    fn stored_definition_must_agree_on_predicate() {
        let partial = IndexSpec::partial("idx_reviews_city", "reviews", "city", "city IS NOT NULL");
        assert!(partial.matches_definition(
            "CREATE INDEX idx_reviews_city ON public.reviews USING btree (city) WHERE (city IS NOT NULL)"
        ));
        assert!(!partial.matches_definition("CREATE INDEX idx_reviews_city ON reviews (city)"));

        let plain = IndexSpec::new("idx_reviews_city", "reviews", "city");
        assert!(plain.matches_definition("CREATE INDEX idx_reviews_city ON reviews (city)"));
        assert!(!plain.matches_definition(&partial.create_sql()));
    }

    #[test]
    fn column_definition_per_backend() {
        let spec = ColumnSpec::new("auto_renew_enabled", "BOOLEAN DEFAULT FALSE", "BOOLEAN DEFAULT 0");
        assert_eq!(spec.definition(Backend::Postgres), "BOOLEAN DEFAULT FALSE");
        assert_eq!(spec.definition(Backend::Sqlite), "BOOLEAN DEFAULT 0");
    }
}
