use async_trait::async_trait;
use sqlx::postgres::PgExecutor;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::db::store::{descending_indexes, Row, TableStore};
use crate::error::StoreError;

const INSERT_CHUNK: usize = 1000;

/// Table store emulating named sheets in PostgreSQL.
///
/// `lunch_sheets` holds one row per sheet with its header; `lunch_sheet_rows`
/// holds the data rows ordered by `position`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing tables if they are missing
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS lunch_sheets (
                name   TEXT PRIMARY KEY,
                header TEXT[] NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS lunch_sheet_rows (
                sheet    TEXT NOT NULL REFERENCES lunch_sheets(name) ON DELETE CASCADE,
                position BIGINT NOT NULL,
                cells    TEXT[] NOT NULL,
                PRIMARY KEY (sheet, position)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        tracing::info!("Sheet tables ready");
        Ok(())
    }
}

/// Fails with NotFound unless the sheet exists; locks it inside a transaction
async fn lock_sheet<'e, E>(executor: E, name: &str) -> Result<(), StoreError>
where
    E: PgExecutor<'e>,
{
    let found = sqlx::query_scalar::<_, String>(
        r#"
        SELECT name
        FROM lunch_sheets
        WHERE name = $1
        FOR UPDATE
        "#,
    )
    .bind(name)
    .fetch_optional(executor)
    .await?;

    match found {
        Some(_) => Ok(()),
        None => Err(StoreError::NotFound(name.to_string())),
    }
}

async fn row_positions(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT position
        FROM lunch_sheet_rows
        WHERE sheet = $1
        ORDER BY position
        "#,
    )
    .bind(name)
    .fetch_all(&mut **tx)
    .await
}

/// Batch insert rows starting at `first_position`
async fn insert_rows(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    first_position: i64,
    rows: &[Row],
) -> Result<(), sqlx::Error> {
    for (chunk_no, chunk) in rows.chunks(INSERT_CHUNK).enumerate() {
        let base = first_position + (chunk_no * INSERT_CHUNK) as i64;
        let mut query_builder =
            QueryBuilder::<Postgres>::new("INSERT INTO lunch_sheet_rows (sheet, position, cells) ");

        query_builder.push_values(chunk.iter().enumerate(), |mut b, (offset, row)| {
            b.push_bind(name.to_string())
                .push_bind(base + offset as i64)
                .push_bind(row.clone());
        });

        let result = query_builder.build().execute(&mut **tx).await?;
        tracing::debug!("Inserted {} rows into {}", result.rows_affected(), name);
    }
    Ok(())
}

#[async_trait]
impl TableStore for PgStore {
    async fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        let names = sqlx::query_scalar::<_, String>("SELECT name FROM lunch_sheets ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    async fn ensure_table(&self, name: &str, header: &[&str]) -> Result<bool, StoreError> {
        let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
        let result = sqlx::query(
            r#"
            INSERT INTO lunch_sheets (name, header)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(header)
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() == 1;
        if created {
            tracing::info!("Created sheet {}", name);
        }
        Ok(created)
    }

    async fn read_all(&self, name: &str) -> Result<Vec<Row>, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM lunch_sheets WHERE name = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        if !exists {
            return Err(StoreError::NotFound(name.to_string()));
        }

        let rows = sqlx::query_scalar::<_, Vec<String>>(
            r#"
            SELECT cells
            FROM lunch_sheet_rows
            WHERE sheet = $1
            ORDER BY position
            "#,
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn replace_range(&self, name: &str, rows: &[Row]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_sheet(&mut *tx, name).await?;

        sqlx::query("DELETE FROM lunch_sheet_rows WHERE sheet = $1")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        insert_rows(&mut tx, name, 0, rows).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_rows(&self, name: &str, indexes: &[usize]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_sheet(&mut *tx, name).await?;

        let positions = row_positions(&mut tx, name).await?;
        let doomed: Vec<i64> = descending_indexes(name, indexes, positions.len())?
            .into_iter()
            .map(|i| positions[i])
            .collect();

        if !doomed.is_empty() {
            let result = sqlx::query(
                "DELETE FROM lunch_sheet_rows WHERE sheet = $1 AND position = ANY($2)",
            )
            .bind(name)
            .bind(doomed)
            .execute(&mut *tx)
            .await?;
            tracing::debug!("Deleted {} rows from {}", result.rows_affected(), name);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn append_rows(&self, name: &str, rows: &[Row]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_sheet(&mut *tx, name).await?;

        let next = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM lunch_sheet_rows WHERE sheet = $1",
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;
        insert_rows(&mut tx, name, next, rows).await?;

        tx.commit().await?;
        Ok(())
    }
}
