use crate::schema::{NamedRow, TableRow};
use crate::store::{Identity, Insert, Store, StoreError, Value};
use std::num::NonZeroUsize;
use tracing::debug;

/// Splits row sequences into chunks of at most `batch_size` rows and
/// submits each chunk as one multi-row insert.
#[derive(Clone, Copy, Debug)]
pub struct BatchLoader {
    batch_size: NonZeroUsize,
}

impl BatchLoader {
    pub fn new(batch_size: NonZeroUsize) -> Self {
        Self { batch_size }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    /// Inserts `rows` without asking for identities back.
    pub async fn insert<S, R>(&self, store: &mut S, rows: Vec<R>) -> Result<(), StoreError>
    where
        S: Store + ?Sized,
        R: TableRow,
    {
        let values = into_values(rows);
        for chunk in values.chunks(self.batch_size()) {
            debug!("{}: inserting {} rows", R::TABLE, chunk.len());
            store.insert(request::<R>(chunk)).await?;
        }
        Ok(())
    }

    /// Inserts `rows` and returns one identity per row, in input order.
    pub async fn insert_returning_ids<S, R>(
        &self,
        store: &mut S,
        rows: Vec<R>,
    ) -> Result<Vec<Identity>, StoreError>
    where
        S: Store + ?Sized,
        R: TableRow,
    {
        let values = into_values(rows);
        let mut ids = Vec::with_capacity(values.len());
        for chunk in values.chunks(self.batch_size()) {
            debug!("{}: inserting {} rows returning ids", R::TABLE, chunk.len());
            let returned = store.insert_returning_ids(request::<R>(chunk)).await?;
            check_alignment::<R>(chunk.len(), returned.len())?;
            ids.extend(returned);
        }
        Ok(ids)
    }

    /// Inserts `rows` and returns `(identity, name)` pairs for every row.
    pub async fn insert_returning_named<S, R>(
        &self,
        store: &mut S,
        rows: Vec<R>,
    ) -> Result<Vec<(Identity, String)>, StoreError>
    where
        S: Store + ?Sized,
        R: NamedRow,
    {
        let values = into_values(rows);
        let mut named = Vec::with_capacity(values.len());
        for chunk in values.chunks(self.batch_size()) {
            debug!("{}: inserting {} named rows", R::TABLE, chunk.len());
            let returned = store
                .insert_returning_named(request::<R>(chunk), R::NAME_COLUMN)
                .await?;
            check_alignment::<R>(chunk.len(), returned.len())?;
            named.extend(returned);
        }
        Ok(named)
    }
}

fn into_values<R: TableRow>(rows: Vec<R>) -> Vec<Vec<Value>> {
    rows.into_iter().map(TableRow::into_values).collect()
}

fn request<R: TableRow>(rows: &[Vec<Value>]) -> Insert<'_> {
    Insert {
        table: R::TABLE,
        columns: R::COLUMNS,
        rows,
    }
}

fn check_alignment<R: TableRow>(expected: usize, returned: usize) -> Result<(), StoreError> {
    if expected == returned {
        Ok(())
    } else {
        Err(StoreError::Misaligned {
            table: R::TABLE,
            expected,
            returned,
        })
    }
}
