//! Level-by-level generation of the company → subsystem → web id → player →
//! record tree, one module per schema encoding.

use crate::balance::BalanceSource;
use crate::config::{GeneratorConfig, TreeShape};
use crate::error::{AtLevel, Error};
use crate::loader::BatchLoader;
use crate::resolver::compose_key;
use crate::schema::{LtreeRelationRow, RelationRow, TableRow, ALL_TABLES};
use crate::store::{Store, StoreError};
use serde::Serialize;
use std::fmt;
use tracing::info;

mod adjacency;
mod flattened;
mod hierarchy;
mod materialized;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Clear,
    Flattened,
    Adjacency,
    MaterializedPath,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Clear => "clear",
            Phase::Flattened => "flattened",
            Phase::Adjacency => "adjacency",
            Phase::MaterializedPath => "materialized-path",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Root,
    Company,
    Subsystem,
    WebId,
    Player,
    Record,
}

impl Level {
    /// Value of the `level` column for node levels.
    pub fn depth(self) -> i32 {
        match self {
            Level::Root => 0,
            Level::Company => 1,
            Level::Subsystem => 2,
            Level::WebId => 3,
            Level::Player => 4,
            Level::Record => 5,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Root => "root",
            Level::Company => "company",
            Level::Subsystem => "subsystem",
            Level::WebId => "web-id",
            Level::Player => "player",
            Level::Record => "record",
        })
    }
}

/// Rows generated by one phase, per level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RowCounts {
    pub companies: usize,
    pub subsystems: usize,
    pub web_ids: usize,
    pub players: usize,
    pub records: usize,
}

impl RowCounts {
    /// What a full pass over `shape` produces.
    pub fn expected(shape: &TreeShape) -> Self {
        Self {
            companies: shape.companies,
            subsystems: shape.subsystems(),
            web_ids: shape.web_ids(),
            players: shape.players(),
            records: shape.records(),
        }
    }
}

pub fn company_name(c: usize) -> String {
    format!("Company{c}")
}

pub fn subsystem_name(s: usize) -> String {
    format!("Subsystem{s}")
}

pub fn web_id_name(w: usize) -> String {
    format!("WebId{w}")
}

/// Globally unique: every index of the ancestor chain is part of the name.
pub fn player_name(c: usize, s: usize, w: usize, p: usize) -> String {
    format!("Player{c}_{s}_{w}_{p}")
}

/// Resolver key of `name` under the node keyed `parent_key` (empty for the
/// root's children).
fn key_under(parent_key: &str, name: &str) -> String {
    if parent_key.is_empty() {
        name.to_string()
    } else {
        compose_key(&[parent_key, name])
    }
}

/// Drives the batch loader and resolvers over one store.
pub struct Generator<'a, S: Store + ?Sized> {
    store: &'a mut S,
    shape: TreeShape,
    loader: BatchLoader,
    balances: BalanceSource,
}

impl<'a, S: Store + ?Sized> Generator<'a, S> {
    pub fn new(store: &'a mut S, config: &GeneratorConfig) -> Self {
        Self {
            store,
            shape: config.shape,
            loader: BatchLoader::new(config.batch_size),
            balances: BalanceSource::new(config.balance, config.balance_seed),
        }
    }

    pub fn shape(&self) -> &TreeShape {
        &self.shape
    }

    /// Truncates every table and reseeds the root node of both node tables.
    pub async fn clear(&mut self) -> Result<(), Error> {
        const PHASE: Phase = Phase::Clear;

        info!("Clearing existing data...");
        self.store.truncate(ALL_TABLES).await.at(PHASE, Level::Root)?;

        self.loader
            .insert(&mut *self.store, vec![RelationRow::root()])
            .await
            .at(PHASE, Level::Root)?;

        let ids = self
            .store
            .allocate_ids(LtreeRelationRow::TABLE, 1)
            .await
            .at(PHASE, Level::Root)?;
        let root_id = match ids.as_slice() {
            [id] => *id,
            _ => {
                return Err(Error::Store {
                    phase: PHASE,
                    level: Level::Root,
                    source: StoreError::Misaligned {
                        table: LtreeRelationRow::TABLE,
                        expected: 1,
                        returned: ids.len(),
                    },
                })
            }
        };
        self.loader
            .insert(&mut *self.store, vec![LtreeRelationRow::root(root_id)])
            .await
            .at(PHASE, Level::Root)
    }
}

fn player_names(c: usize, s: usize, w: usize, players: usize) -> Vec<String> {
    (1..=players).map(|p| player_name(c, s, w, p)).collect()
}
