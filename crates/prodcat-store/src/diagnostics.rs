//! Raw SQL execution for local troubleshooting.
//!
//! Compiled only with the `diagnostics` feature, and only constructible
//! for a development environment. Production builds must not enable the
//! feature.

use std::sync::Arc;

use serde_json::{Map, Number, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row};
use tracing::warn;

use prodcat_core::{CatalogError, CatalogResult, QueryConfig, RuntimeEnvironment};

use crate::executor::{FromCatalogRow, QueryExecutor};
use crate::pool::ConnectionPoolManager;
use crate::statement::{BoundStatement, SqlValue};

/// Default row cap for ad-hoc statements.
pub const DIAGNOSTIC_ROW_CAP: usize = 1_000;

/// One result row as a JSON object keyed by column name.
pub struct JsonRow(pub Map<String, Value>);

impl FromCatalogRow for JsonRow {
    fn from_row(row: &SqliteRow) -> CatalogResult<Self> {
        let mut object = Map::new();
        for column in row.columns() {
            let name = column.name();
            let value = if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
                Value::Number(n.into())
            } else if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
                Number::from_f64(n).map_or(Value::Null, Value::Number)
            } else if let Ok(Some(text)) = row.try_get::<Option<String>, _>(name) {
                Value::String(text)
            } else if let Ok(Some(bytes)) = row.try_get::<Option<Vec<u8>>, _>(name) {
                Value::String(format!("<{} bytes>", bytes.len()))
            } else {
                Value::Null
            };
            object.insert(name.to_string(), value);
        }
        Ok(JsonRow(object))
    }
}

/// Executes caller-written SQL with positional parameters.
pub struct DiagnosticExecutor {
    executor: QueryExecutor,
}

impl DiagnosticExecutor {
    /// Returns an executor only when `environment` allows diagnostics.
    pub fn for_environment(
        environment: RuntimeEnvironment,
        pool: Arc<ConnectionPoolManager>,
        config: &QueryConfig,
    ) -> Option<Self> {
        if !environment.allows_diagnostics() {
            return None;
        }
        warn!("raw SQL diagnostics enabled; never expose this build in production");
        Some(Self {
            executor: QueryExecutor::new(pool, config.statement_timeout()),
        })
    }

    /// Runs `sql`, binding `params` to `?1`, `?2`, ... in order.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> CatalogResult<Vec<Map<String, Value>>> {
        if sql.trim().is_empty() {
            return Err(CatalogError::validation("SQL text is required"));
        }

        // Positional markers are given names so the statement goes through
        // the same binding path as built statements.
        let mut statement = BoundStatement::new(number_placeholders(sql));
        for (index, param) in params.iter().enumerate() {
            statement = statement.bind(format!("p{}", index + 1), to_sql_value(param)?);
        }

        let rows: Vec<JsonRow> = self.executor.run(&statement, DIAGNOSTIC_ROW_CAP).await?;
        Ok(rows.into_iter().map(|row| row.0).collect())
    }
}

/// Turns bare `?` markers into `:p1`, `:p2`, ... outside quoted literals.
fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut quote: Option<char> = None;
    let mut next = 1;

    for ch in sql.chars() {
        match quote {
            Some(open) => {
                if ch == open {
                    quote = None;
                }
                out.push(ch);
            }
            None if ch == '\'' || ch == '"' => {
                quote = Some(ch);
                out.push(ch);
            }
            None if ch == '?' => {
                out.push_str(&format!(":p{next}"));
                next += 1;
            }
            None => out.push(ch),
        }
    }
    out
}

fn to_sql_value(value: &Value) -> CatalogResult<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(flag) => Ok(SqlValue::Integer(i64::from(*flag))),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real))
            .ok_or_else(|| CatalogError::validation(format!("unsupported number {n}"))),
        Value::String(text) => Ok(SqlValue::Text(text.clone())),
        Value::Array(_) | Value::Object(_) => Err(CatalogError::validation(
            "parameters must be scalars",
        )),
    }
}
