//! Statement execution against pooled connections.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use futures::TryStreamExt;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, warn};

use prodcat_core::{
    CatalogError, CatalogResult, FamilyRecord, ProductRecord, UserRecord,
};

use crate::pool::{ConnectionPoolManager, PooledConnection};
use crate::statement::{BoundStatement, SqlValue};

/// Maps one result row to a record by column name.
pub trait FromCatalogRow: Sized {
    fn from_row(row: &SqliteRow) -> CatalogResult<Self>;
}

/// Runs bound statements with a row cap and a time budget.
///
/// Every execution takes exactly one connection and releases it on all
/// exit paths.
#[derive(Clone)]
pub struct QueryExecutor {
    pool: Arc<ConnectionPoolManager>,
    statement_timeout: Duration,
}

impl QueryExecutor {
    pub fn new(pool: Arc<ConnectionPoolManager>, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    pub fn pool(&self) -> &Arc<ConnectionPoolManager> {
        &self.pool
    }

    /// Executes `statement` and maps at most `row_cap` rows.
    ///
    /// An empty result is `Ok(vec![])`. A statement that outlives the
    /// timeout yields `QueryTimeout`; its connection is closed rather than
    /// returned to the pool.
    #[tracing::instrument(skip(self, statement), fields(params = statement.params().len()))]
    pub async fn run<T: FromCatalogRow>(
        &self,
        statement: &BoundStatement,
        row_cap: usize,
    ) -> CatalogResult<Vec<T>> {
        let (sql, values) = statement.to_positional()?;
        let mut connection = self.pool.acquire().await?;

        let outcome = tokio::time::timeout(
            self.statement_timeout,
            fetch_capped(&mut connection, &sql, &values, row_cap),
        )
        .await;

        let result: CatalogResult<Vec<T>> = match outcome {
            Ok(Ok(rows)) => rows.iter().map(T::from_row).collect(),
            Ok(Err(e)) => {
                if matches!(e, sqlx::Error::Io(_) | sqlx::Error::Protocol(_)) {
                    connection.mark_broken();
                }
                warn!(error = %e, "statement execution failed");
                Err(self.pool.map_error(e))
            }
            Err(_) => {
                connection.mark_broken();
                let timeout_ms = timeout_millis(self.statement_timeout);
                warn!(timeout_ms, "statement timed out");
                Err(CatalogError::QueryTimeout { timeout_ms })
            }
        };

        self.pool.release(connection).await;

        if let Ok(records) = &result {
            debug!(rows = records.len(), "statement completed");
        }
        result
    }
}

fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

async fn fetch_capped(
    connection: &mut PooledConnection,
    sql: &str,
    values: &[&SqlValue],
    row_cap: usize,
) -> Result<Vec<SqliteRow>, sqlx::Error> {
    if row_cap == 0 {
        return Ok(Vec::new());
    }

    let mut query = sqlx::query(sql);
    for value in values {
        query = match value {
            SqlValue::Integer(n) => query.bind(*n),
            SqlValue::Real(n) => query.bind(*n),
            SqlValue::Text(text) => query.bind(text.clone()),
            SqlValue::Null => query.bind(Option::<i64>::None),
        };
    }

    let mut rows = Vec::new();
    let mut stream = query.fetch(&mut **connection);
    while let Some(row) = stream.try_next().await? {
        rows.push(row);
        if rows.len() >= row_cap {
            break;
        }
    }
    Ok(rows)
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> CatalogResult<T>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| CatalogError::query_execution(format!("column {name}: {e}")))
}

/// Reads a numeric column that the store may hold as REAL or INTEGER.
fn decimal(row: &SqliteRow, name: &str) -> CatalogResult<Option<f64>> {
    match row.try_get::<Option<f64>, _>(name) {
        Ok(value) => Ok(value),
        Err(_) => column::<Option<i64>>(row, name).map(|value| value.map(|n| n as f64)),
    }
}

/// Reads an integer column that the store may hold as INTEGER or REAL.
fn integer(row: &SqliteRow, name: &str) -> CatalogResult<i64> {
    match row.try_get::<i64, _>(name) {
        Ok(value) => Ok(value),
        Err(_) => column::<f64>(row, name).map(|n| n as i64),
    }
}

/// `S`/`N` flag columns.
fn flag(row: &SqliteRow, name: &str) -> CatalogResult<Option<bool>> {
    let raw: Option<String> = column(row, name)?;
    Ok(raw.map(|value| value.trim().eq_ignore_ascii_case("S")))
}

impl FromCatalogRow for ProductRecord {
    fn from_row(row: &SqliteRow) -> CatalogResult<Self> {
        Ok(Self {
            barcode: column(row, "EAN")?,
            product_code: integer(row, "CODIGO_PRODUTO")?,
            family_code: integer(row, "CODIGO_FAMILIA")?,
            description: column(row, "DESCRICAO")?,
            stock_quantity: decimal(row, "ESTOQUE")?,
            company_number: integer(row, "NRO_EMPRESA")?,
            icms_rate: decimal(row, "ALIQUOTA_ICMS")?,
            pis_percent: decimal(row, "PERCENT_PIS")?,
            cofins_percent: decimal(row, "PERCENT_COFINS")?,
            billing_state: column(row, "ESTADO_FATUR")?,
            package_quantity: decimal(row, "EMBALAGEM")?,
            supplier_name: column(row, "FORNECEDOR")?,
            included_at: column::<Option<NaiveDateTime>>(row, "DIA_DA_INCLUSAO")?,
            weighable: flag(row, "ITEM_PESAVEL")?,
            registered_by: column(row, "QUEM_CADASTROU")?,
            registering_user_id: integer(row, "NUMERO_USUARIO")?,
            registering_user_name: column(row, "NOME_DE_QUEM_CADASTROU")?,
        })
    }
}

impl FromCatalogRow for FamilyRecord {
    fn from_row(row: &SqliteRow) -> CatalogResult<Self> {
        Ok(Self {
            family_code: integer(row, "CODIGO_FAMILIA")?,
            description: column(row, "DESCRICAO")?,
        })
    }
}

impl FromCatalogRow for UserRecord {
    fn from_row(row: &SqliteRow) -> CatalogResult<Self> {
        Ok(Self {
            user_code: column(row, "CODUSUARIO")?,
            name: column(row, "NOME")?,
        })
    }
}
