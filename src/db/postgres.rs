//! Postgres-backed [`Database`] using `tokio-postgres`.
//!
//! Reflection goes through a parameterized `information_schema` query.
//! Raw execution uses the simple query protocol so arbitrary operator SQL
//! comes back as text without type mapping.

use crate::db::{Database, TableResult};
use crate::error::QuillError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

const REFLECT_SQL: &str = "SELECT column_name FROM information_schema.columns \
     WHERE table_schema = $1 AND table_name = $2 \
     ORDER BY ordinal_position";

pub struct PgDatabase {
    client: Client,
}

impl PgDatabase {
    /// Connect with a libpq-style connection string. The connection task is
    /// spawned onto the runtime and logs on unexpected termination.
    pub async fn connect(url: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(url, NoTls)
            .await
            .context("failed to connect to Postgres")?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("postgres connection error: {e}");
            }
        });

        tracing::debug!("connected to Postgres");
        Ok(Self { client })
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn reflect(&self, schema: &str, table: &str) -> Result<Vec<String>, QuillError> {
        let qualified = format!("{schema}.{table}");
        let rows = self
            .client
            .query(REFLECT_SQL, &[&schema, &table])
            .await
            .map_err(|e| QuillError::reflection(&qualified, e))?;

        let columns: Vec<String> = rows.iter().map(|r| r.get::<_, String>(0)).collect();
        if columns.is_empty() {
            return Err(QuillError::reflection(&qualified, "table not found"));
        }
        Ok(columns)
    }

    async fn execute(&self, sql: &str) -> Result<TableResult, QuillError> {
        let messages = self
            .client
            .simple_query(sql)
            .await
            .map_err(QuillError::execution)?;

        let mut result = TableResult::default();
        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                if result.columns.is_empty() {
                    result.columns = row
                        .columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect();
                }
                let values = (0..row.len())
                    .map(|i| row.get(i).map(String::from))
                    .collect();
                result.rows.push(values);
            }
        }
        Ok(result)
    }
}
