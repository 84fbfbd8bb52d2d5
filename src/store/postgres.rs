use super::{Identity, Insert, Store, StoreError, Value};
use crate::path::NodePath;
use async_trait::async_trait;
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    Postgres, QueryBuilder, Row,
};
use tracing::debug;

/// Postgres caps one statement at `u16::MAX` bind parameters; sqlx panics
/// past it.
const MAX_BIND_PARAMS: usize = u16::MAX as usize;

/// [`Store`] backed by a Postgres connection pool.
///
/// Values are always sent as bind parameters; only the table and column
/// names, which are compile-time constants, are spliced into the SQL text.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A single-connection pool: the generators never run two statements
    /// at once.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Splits `insert` into statements that each stay under the bind
    /// parameter limit, keeping row order.
    fn statements<'a>(insert: &Insert<'a>) -> impl Iterator<Item = Insert<'a>> {
        let Insert {
            table,
            columns,
            rows,
        } = *insert;
        let rows_per_statement = (MAX_BIND_PARAMS / columns.len().max(1)).max(1);
        rows.chunks(rows_per_statement).map(move |rows| Insert {
            table,
            columns,
            rows,
        })
    }

    fn values_query(insert: &Insert<'_>) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) ",
            insert.table,
            insert.columns.join(", ")
        ));
        query.push_values(insert.rows.iter(), |mut b, row| {
            for value in row {
                match value {
                    Value::Int(value) => {
                        b.push_bind(*value);
                    }
                    Value::Text(value) => {
                        b.push_bind(value.clone());
                    }
                    Value::Path(path) => {
                        b.push_bind(path.to_string()).push_unseparated("::ltree");
                    }
                }
            }
        });
        query
    }
}

#[async_trait]
impl Store for PgStore {
    async fn truncate(&mut self, tables: &[&'static str]) -> Result<(), StoreError> {
        if tables.is_empty() {
            return Ok(());
        }
        let statement = format!("TRUNCATE {} RESTART IDENTITY CASCADE", tables.join(", "));
        debug!("{statement}");
        sqlx::query(&statement).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert(&mut self, insert: Insert<'_>) -> Result<(), StoreError> {
        for statement in Self::statements(&insert) {
            Self::values_query(&statement)
                .build()
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    async fn insert_returning_ids(
        &mut self,
        insert: Insert<'_>,
    ) -> Result<Vec<Identity>, StoreError> {
        let mut ids = Vec::with_capacity(insert.rows.len());
        for statement in Self::statements(&insert) {
            let mut query = Self::values_query(&statement);
            query.push(" RETURNING id");

            for row in query.build().fetch_all(&self.pool).await? {
                ids.push(row.try_get::<i32, _>("id")?);
            }
        }
        Ok(ids)
    }

    async fn insert_returning_named(
        &mut self,
        insert: Insert<'_>,
        name_column: &'static str,
    ) -> Result<Vec<(Identity, String)>, StoreError> {
        let mut named: Vec<(Identity, String)> = Vec::with_capacity(insert.rows.len());
        for statement in Self::statements(&insert) {
            let mut query = Self::values_query(&statement);
            query.push(format!(" RETURNING id, {name_column}"));

            for row in query.build().fetch_all(&self.pool).await? {
                named.push((row.try_get("id")?, row.try_get(name_column)?));
            }
        }
        Ok(named)
    }

    async fn allocate_ids(
        &mut self,
        table: &'static str,
        count: usize,
    ) -> Result<Vec<Identity>, StoreError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let count = i64::try_from(count).map_err(|_| StoreError::Rejected {
            table,
            reason: format!("cannot allocate {count} identities at once"),
        })?;

        let mut ids = sqlx::query_scalar::<_, Identity>(
            "SELECT nextval(pg_get_serial_sequence($1, 'id'))::int4 FROM generate_series(1, $2::int8)",
        )
        .bind(table)
        .bind(count)
        .fetch_all(&self.pool)
        .await?;
        ids.sort_unstable();
        Ok(ids)
    }

    async fn root_id(&mut self, table: &'static str) -> Result<Identity, StoreError> {
        let statement = format!("SELECT id FROM {table} WHERE name = 'all' AND level = 0 LIMIT 1");
        let id = sqlx::query_scalar::<_, Identity>(&statement)
            .fetch_optional(&self.pool)
            .await?;
        id.ok_or(StoreError::MissingRoot { table })
    }

    async fn root_path(&mut self, table: &'static str) -> Result<(Identity, NodePath), StoreError> {
        let statement = format!(
            "SELECT id, path::text AS path FROM {table} WHERE name = 'all' AND level = 0 LIMIT 1"
        );
        let row = sqlx::query(&statement)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::MissingRoot { table })?;

        let id: i32 = row.try_get("id")?;
        let text: String = row.try_get("path")?;
        let path = text
            .parse::<NodePath>()
            .map_err(|source| StoreError::MalformedPath {
                table,
                value: text.clone(),
                source,
            })?;
        Ok((id, path))
    }
}
