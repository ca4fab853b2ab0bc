//! # Live Schema
//!
//! The columns the open database actually has.
//!
//! A column-adding migration that fails leaves the database usable but
//! without that column. Statements over optional columns are built from
//! a [`ColumnSet`] so that:
//!
//! ```text
//!   SELECT ... customer_phone ...       (column present)
//!   SELECT ... NULL AS customer_phone   (column missing, reads as None)
//!   INSERT / UPDATE                     (missing columns left out)
//! ```

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::error::DbResult;

/// Column names per table, as reported by `pragma_table_info`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSet {
    tables: HashMap<String, HashSet<String>>,
}

impl ColumnSet {
    /// Reads every table's columns in one query.
    pub(crate) async fn load(pool: &SqlitePool) -> DbResult<Self> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT m.name, p.name
            FROM sqlite_master m
            JOIN pragma_table_info(m.name) p
            WHERE m.type = 'table'
            "#,
        )
        .fetch_all(pool)
        .await?;

        let mut tables: HashMap<String, HashSet<String>> = HashMap::new();
        for (table, column) in rows {
            tables.entry(table).or_default().insert(column);
        }

        Ok(ColumnSet { tables })
    }

    pub fn has(&self, table: &str, column: &str) -> bool {
        self.tables
            .get(table)
            .is_some_and(|columns| columns.contains(column))
    }

    /// `column` when present, otherwise `fallback`.
    pub(crate) fn or<'a>(&self, table: &str, column: &'a str, fallback: &'a str) -> &'a str {
        if self.has(table, column) {
            column
        } else {
            fallback
        }
    }

    /// Comma-separated select list with `NULL AS <column>` for missing
    /// columns, so row mapping sees every field.
    pub(crate) fn select_list(&self, table: &str, columns: &[&str]) -> String {
        columns
            .iter()
            .map(|column| {
                if self.has(table, column) {
                    column.to_string()
                } else {
                    format!("NULL AS {}", column)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `INSERT INTO <table> (...) VALUES (...)` over the present columns.
    pub(crate) fn insert(&self, table: &str, values: Vec<Column>) -> QueryBuilder<'static, Sqlite> {
        let values = self.present(table, values);

        let mut builder = QueryBuilder::new(format!("INSERT INTO {} (", table));
        let mut names = builder.separated(", ");
        for (column, _) in &values {
            names.push(*column);
        }

        builder.push(") VALUES (");
        let mut binds = builder.separated(", ");
        for (_, value) in values {
            match value {
                SqlValue::Text(v) => binds.push_bind(v),
                SqlValue::Integer(v) => binds.push_bind(v),
            };
        }
        builder.push(")");

        builder
    }

    /// `UPDATE <table> SET ... WHERE <key> = ?` over the present columns.
    pub(crate) fn update(
        &self,
        table: &str,
        values: Vec<Column>,
        key: &'static str,
        id: &str,
    ) -> QueryBuilder<'static, Sqlite> {
        let values = self.present(table, values);

        let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", table));
        let mut assignments = builder.separated(", ");
        for (column, value) in values {
            assignments.push(format!("{} = ", column));
            match value {
                SqlValue::Text(v) => assignments.push_bind_unseparated(v),
                SqlValue::Integer(v) => assignments.push_bind_unseparated(v),
            };
        }

        builder.push(format!(" WHERE {} = ", key));
        builder.push_bind(id.to_string());

        builder
    }

    fn present(&self, table: &str, values: Vec<Column>) -> Vec<Column> {
        values
            .into_iter()
            .filter(|(column, value)| {
                let present = self.has(table, column);
                if !present && !value.is_null() {
                    warn!(table, column, "Column missing; value not stored");
                }
                present
            })
            .collect()
    }
}

/// A named value for [`ColumnSet::insert`] and [`ColumnSet::update`].
pub(crate) type Column = (&'static str, SqlValue);

/// The SQLite storage classes written by the repositories.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SqlValue {
    Text(Option<String>),
    Integer(Option<i64>),
}

impl SqlValue {
    fn is_null(&self) -> bool {
        matches!(self, SqlValue::Text(None) | SqlValue::Integer(None))
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(Some(value.to_string()))
    }
}

impl From<Option<&str>> for SqlValue {
    fn from(value: Option<&str>) -> Self {
        SqlValue::Text(value.map(str::to_string))
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(Some(value))
    }
}

impl From<Option<i64>> for SqlValue {
    fn from(value: Option<i64>) -> Self {
        SqlValue::Integer(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn sparse() -> (Database, ColumnSet) {
        let db = Database::new(DbConfig::in_memory().run_migrations(false));
        let pool = db.pool().await.unwrap();
        sqlx::raw_sql("CREATE TABLE people (id TEXT PRIMARY KEY, name TEXT NOT NULL)")
            .execute(pool)
            .await
            .unwrap();
        let columns = ColumnSet::load(pool).await.unwrap();
        (db, columns)
    }

    #[tokio::test]
    async fn test_load_lists_columns() {
        let (_db, columns) = sparse().await;
        assert!(columns.has("people", "id"));
        assert!(columns.has("people", "name"));
        assert!(!columns.has("people", "nickname"));
        assert!(!columns.has("ghosts", "id"));
    }

    #[tokio::test]
    async fn test_select_list_nulls_missing_columns() {
        let (_db, columns) = sparse().await;
        assert_eq!(
            columns.select_list("people", &["id", "nickname", "name"]),
            "id, NULL AS nickname, name"
        );
        assert_eq!(columns.or("people", "nickname", "NULL"), "NULL");
        assert_eq!(columns.or("people", "name", "NULL"), "name");
    }

    #[tokio::test]
    async fn test_writes_skip_missing_columns() {
        let (db, columns) = sparse().await;
        let pool = db.pool().await.unwrap();

        let values = || -> Vec<Column> {
            vec![
                ("id", "p1".into()),
                ("name", "Ada".into()),
                ("nickname", Some("A").into()),
            ]
        };

        let mut insert = columns.insert("people", values());
        assert_eq!(insert.sql(), "INSERT INTO people (id, name) VALUES (?, ?)");
        insert.build().execute(pool).await.unwrap();

        let mut update = columns.update("people", values()[1..].to_vec(), "id", "p1");
        assert_eq!(update.sql(), "UPDATE people SET name = ? WHERE id = ?");
        update.build().execute(pool).await.unwrap();

        let name: String = sqlx::query_scalar("SELECT name FROM people WHERE id = 'p1'")
            .fetch_one(pool)
            .await
            .unwrap();
        assert_eq!(name, "Ada");
    }
}
