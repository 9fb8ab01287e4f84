//! Catalog introspection for PostgreSQL and SQLite.
//!
//! PostgreSQL answers come from `information_schema` and `pg_catalog`,
//! always scoped to `current_schema()`. SQLite answers come from
//! `sqlite_master` and `pragma_table_info`. Catalog columns of type `name`
//! are cast to `text` so the `Any` driver can decode them.

use sqlx::AnyConnection;

use crate::db::Backend;
use crate::errors::OpsError;
use crate::ident::Identifier;

/// One column as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub default: Option<String>,
    pub max_length: Option<i64>,
}

impl ColumnInfo {
    /// SQL type as it would be written in DDL, e.g. `VARCHAR(255)`.
    pub fn declared_type(&self) -> String {
        match (self.data_type.to_ascii_lowercase().as_str(), self.max_length) {
            ("character varying", Some(len)) => format!("VARCHAR({})", len),
            ("character varying", None) => "VARCHAR".to_string(),
            ("character", Some(len)) => format!("CHAR({})", len),
            (other, _) => other.to_ascii_uppercase(),
        }
    }

    /// Default expression with PostgreSQL's `::type` casts removed and
    /// quotes kept, so `'active'::character varying` reads `'active'`.
    pub fn default_literal(&self) -> Option<&str> {
        self.default
            .as_deref()
            .map(|d| d.split("::").next().unwrap_or(d).trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub name: String,
    pub definition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintInfo {
    pub table_name: String,
    pub name: String,
    pub kind: String,
}

pub async fn server_version(conn: &mut AnyConnection, backend: Backend) -> Result<String, OpsError> {
    let sql = match backend {
        Backend::Postgres => "SELECT version()",
        Backend::Sqlite => "SELECT 'SQLite ' || sqlite_version()",
    };
    Ok(sqlx::query_scalar::<_, String>(sql).fetch_one(&mut *conn).await?)
}

pub async fn list_tables(conn: &mut AnyConnection, backend: Backend) -> Result<Vec<String>, OpsError> {
    let sql = match backend {
        Backend::Postgres => {
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
             ORDER BY table_name"
        }
        Backend::Sqlite => {
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
        }
    };
    Ok(sqlx::query_scalar::<_, String>(sql).fetch_all(&mut *conn).await?)
}

pub async fn table_exists(
    conn: &mut AnyConnection,
    backend: Backend,
    table: &str,
) -> Result<bool, OpsError> {
    let sql = match backend {
        Backend::Postgres => {
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1"
        }
        Backend::Sqlite => "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = $1",
    };
    let count: i64 = sqlx::query_scalar(sql)
        .bind(table)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

/// Columns of `table` in declaration order. Empty when the table is missing.
pub async fn columns(
    conn: &mut AnyConnection,
    backend: Backend,
    table: &str,
) -> Result<Vec<ColumnInfo>, OpsError> {
    match backend {
        Backend::Postgres => {
            let rows: Vec<(String, String, String, Option<String>, Option<i64>)> = sqlx::query_as(
                "SELECT column_name::text, data_type::text, is_nullable::text, \
                        column_default::text, character_maximum_length::bigint \
                 FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name = $1 \
                 ORDER BY ordinal_position",
            )
            .bind(table)
            .fetch_all(&mut *conn)
            .await?;

            Ok(rows
                .into_iter()
                .map(|(name, data_type, nullable, default, max_length)| ColumnInfo {
                    name,
                    data_type,
                    is_nullable: nullable.eq_ignore_ascii_case("YES"),
                    default,
                    max_length,
                })
                .collect())
        }
        Backend::Sqlite => {
            let rows: Vec<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
                "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info($1) ORDER BY cid",
            )
            .bind(table)
            .fetch_all(&mut *conn)
            .await?;

            Ok(rows
                .into_iter()
                .map(|(name, data_type, not_null, default, pk)| ColumnInfo {
                    name,
                    data_type,
                    is_nullable: not_null == 0 && pk == 0,
                    default,
                    max_length: None,
                })
                .collect())
        }
    }
}

pub async fn column(
    conn: &mut AnyConnection,
    backend: Backend,
    table: &str,
    column: &str,
) -> Result<Option<ColumnInfo>, OpsError> {
    Ok(columns(conn, backend, table)
        .await?
        .into_iter()
        .find(|c| c.name == column))
}

pub async fn column_exists(
    conn: &mut AnyConnection,
    backend: Backend,
    table: &str,
    column_name: &str,
) -> Result<bool, OpsError> {
    Ok(column(conn, backend, table, column_name).await?.is_some())
}

/// Stored definition of an index, `None` when no index has that name.
/// SQLite keeps no SQL for implicit indexes; those come back empty.
pub async fn index_definition(
    conn: &mut AnyConnection,
    backend: Backend,
    index: &str,
) -> Result<Option<String>, OpsError> {
    let sql = match backend {
        Backend::Postgres => {
            "SELECT indexdef::text FROM pg_indexes \
             WHERE schemaname = current_schema() AND indexname = $1"
        }
        Backend::Sqlite => "SELECT sql FROM sqlite_master WHERE type = 'index' AND name = $1",
    };
    let row: Option<(Option<String>,)> = sqlx::query_as(sql)
        .bind(index)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(|(definition,)| definition.unwrap_or_default()))
}

/// Explicit indexes on `table`. SQLite's implicit `sqlite_autoindex_*`
/// entries are left out since they cannot be dropped.
pub async fn indexes_on(
    conn: &mut AnyConnection,
    backend: Backend,
    table: &str,
) -> Result<Vec<IndexInfo>, OpsError> {
    let sql = match backend {
        Backend::Postgres => {
            "SELECT indexname::text, indexdef::text FROM pg_indexes \
             WHERE schemaname = current_schema() AND tablename = $1 ORDER BY indexname"
        }
        Backend::Sqlite => {
            "SELECT name, sql FROM sqlite_master \
             WHERE type = 'index' AND tbl_name = $1 AND name NOT LIKE 'sqlite_autoindex%' \
             ORDER BY name"
        }
    };
    let rows: Vec<(String, Option<String>)> = sqlx::query_as(sql)
        .bind(table)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(name, definition)| IndexInfo { name, definition })
        .collect())
}

/// Named constraints declared on `table`. SQLite keeps constraints inside
/// the table definition, so the list is always empty there.
pub async fn constraints(
    conn: &mut AnyConnection,
    backend: Backend,
    table: &str,
) -> Result<Vec<ConstraintInfo>, OpsError> {
    if backend == Backend::Sqlite {
        return Ok(Vec::new());
    }
    let rows: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT table_name::text, constraint_name::text, constraint_type::text \
         FROM information_schema.table_constraints \
         WHERE table_schema = current_schema() AND table_name = $1 \
         ORDER BY constraint_name",
    )
    .bind(table)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(table_name, name, kind)| ConstraintInfo {
            table_name,
            name,
            kind,
        })
        .collect())
}

/// Foreign keys that belong to `table`, point at it, or whose name contains
/// `name_fragment`. PostgreSQL only.
pub async fn related_foreign_keys(
    conn: &mut AnyConnection,
    backend: Backend,
    table: &str,
    name_fragment: &str,
) -> Result<Vec<ConstraintInfo>, OpsError> {
    if backend == Backend::Sqlite {
        return Ok(Vec::new());
    }
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT DISTINCT tc.table_name::text, tc.constraint_name::text \
         FROM information_schema.table_constraints tc \
         LEFT JOIN information_schema.constraint_column_usage ccu \
           ON ccu.constraint_name = tc.constraint_name \
          AND ccu.constraint_schema = tc.constraint_schema \
         WHERE tc.constraint_type = 'FOREIGN KEY' \
           AND tc.table_schema = current_schema() \
           AND (tc.table_name = $1 OR ccu.table_name = $1 OR tc.constraint_name LIKE $2) \
         ORDER BY 1, 2",
    )
    .bind(table)
    .bind(format!("%{}%", name_fragment))
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(table_name, name)| ConstraintInfo {
            table_name,
            name,
            kind: "FOREIGN KEY".to_string(),
        })
        .collect())
}

/// Definition of a named CHECK constraint (PostgreSQL only).
pub async fn check_constraint_definition(
    conn: &mut AnyConnection,
    backend: Backend,
    table: &str,
    constraint: &str,
) -> Result<Option<String>, OpsError> {
    if backend == Backend::Sqlite {
        return Ok(None);
    }
    Ok(sqlx::query_scalar::<_, String>(
        "SELECT pg_get_constraintdef(c.oid) FROM pg_constraint c \
         JOIN pg_class t ON t.oid = c.conrelid \
         WHERE c.contype = 'c' AND t.relname = $1 AND c.conname = $2",
    )
    .bind(table)
    .bind(constraint)
    .fetch_optional(&mut *conn)
    .await?)
}

pub async fn row_count(conn: &mut AnyConnection, table: &str) -> Result<i64, OpsError> {
    let table = Identifier::parse(table)?;
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    Ok(sqlx::query_scalar::<_, i64>(&sql).fetch_one(&mut *conn).await?)
}

/// Human-readable on-disk size including indexes (PostgreSQL only).
pub async fn table_size(
    conn: &mut AnyConnection,
    backend: Backend,
    table: &str,
) -> Result<Option<String>, OpsError> {
    if backend == Backend::Sqlite {
        return Ok(None);
    }
    Ok(Some(
        sqlx::query_scalar::<_, String>("SELECT pg_size_pretty(pg_total_relation_size($1::regclass))")
            .bind(table)
            .fetch_one(&mut *conn)
            .await?,
    ))
}

/// Logs one line per column, the way every migration prints its before and
/// after picture.
pub fn log_columns(table: &str, columns: &[ColumnInfo]) {
    tracing::info!("📋 {} has {} columns:", table, columns.len());
    for col in columns {
        let nullable = if col.is_nullable { "NULL" } else { "NOT NULL" };
        match col.default.as_deref() {
            Some(default) => tracing::info!(
                "  - {}: {} {} DEFAULT {}",
                col.name,
                col.declared_type(),
                nullable,
                default
            ),
            None => tracing::info!("  - {}: {} {}", col.name, col.declared_type(), nullable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(data_type: &str, max_length: Option<i64>, default: Option<&str>) -> ColumnInfo {
        ColumnInfo {
            name: "c".into(),
            data_type: data_type.into(),
            is_nullable: true,
            default: default.map(String::from),
            max_length,
        }
    }

    #[test]
    fn declared_type_renders_postgres_catalog_types() {
        assert_eq!(col("character varying", Some(255), None).declared_type(), "VARCHAR(255)");
        assert_eq!(col("character", Some(2), None).declared_type(), "CHAR(2)");
        assert_eq!(
            col("timestamp with time zone", None, None).declared_type(),
            "TIMESTAMP WITH TIME ZONE"
        );
    }

    #[test]
    fn declared_type_keeps_sqlite_declarations() {
        assert_eq!(col("VARCHAR(255)", None, None).declared_type(), "VARCHAR(255)");
        assert_eq!(col("varchar(20)", None, None).declared_type(), "VARCHAR(20)");
    }

    #[test]
    fn default_literal_strips_casts() {
        assert_eq!(
            col("character varying", Some(20), Some("'active'::character varying")).default_literal(),
            Some("'active'")
        );
        assert_eq!(col("VARCHAR(20)", None, Some("'active'")).default_literal(), Some("'active'"));
        assert_eq!(col("BOOLEAN", None, None).default_literal(), None);
    }
}
