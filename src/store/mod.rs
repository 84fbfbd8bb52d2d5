//! The boundary to the relational store: keyed bulk inserts, identity
//! allocation and root lookups.

use crate::path::{NodePath, PathParseError};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::{MemoryRow, MemoryStore};
pub use postgres::PgStore;

/// Surrogate key assigned by the store (`serial` columns).
pub type Identity = i32;

/// A single bound column value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Text(String),
    Path(NodePath),
}

impl Value {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&NodePath> {
        match self {
            Value::Path(value) => Some(value),
            _ => None,
        }
    }
}

/// One multi-row insert request against a single table.
#[derive(Clone, Copy, Debug)]
pub struct Insert<'a> {
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub rows: &'a [Vec<Value>],
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{table}: store returned {returned} identities for {expected} rows")]
    Misaligned {
        table: &'static str,
        expected: usize,
        returned: usize,
    },
    #[error("{table}: store assigned identity {returned}, expected {expected}")]
    IdentityMismatch {
        table: &'static str,
        expected: Identity,
        returned: Identity,
    },
    #[error("{table}: root node 'all' not found")]
    MissingRoot { table: &'static str },
    #[error("{table}: malformed path {value:?}: {source}")]
    MalformedPath {
        table: &'static str,
        value: String,
        #[source]
        source: PathParseError,
    },
    #[error("{table}: insert rejected: {reason}")]
    Rejected { table: &'static str, reason: String },
}

/// Opaque keyed-insert service the generators write through.
///
/// Every call is a blocking round-trip from the caller's point of view; the
/// generators never issue a second request before the first completes.
#[async_trait]
pub trait Store: Send {
    /// Destroys every row in `tables` and restarts their identity sequences.
    async fn truncate(&mut self, tables: &[&'static str]) -> Result<(), StoreError>;

    async fn insert(&mut self, insert: Insert<'_>) -> Result<(), StoreError>;

    /// Inserts the rows and returns their `id`s in statement order.
    async fn insert_returning_ids(&mut self, insert: Insert<'_>)
        -> Result<Vec<Identity>, StoreError>;

    /// Inserts the rows and returns `(id, name_column)` for each of them.
    async fn insert_returning_named(
        &mut self,
        insert: Insert<'_>,
        name_column: &'static str,
    ) -> Result<Vec<(Identity, String)>, StoreError>;

    /// Draws `count` fresh identities from `table`'s identity sequence, in
    /// ascending order, without inserting anything.
    async fn allocate_ids(
        &mut self,
        table: &'static str,
        count: usize,
    ) -> Result<Vec<Identity>, StoreError>;

    /// Identity of the seeded root node (`name = 'all'`).
    async fn root_id(&mut self, table: &'static str) -> Result<Identity, StoreError>;

    /// Identity and path of the seeded root node of a path-encoded table.
    async fn root_path(&mut self, table: &'static str) -> Result<(Identity, NodePath), StoreError>;
}
