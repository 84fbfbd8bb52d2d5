//! Synthetic data generator for comparing three encodings of the same
//! company → subsystem → web id → player → record hierarchy in Postgres:
//! a flattened table, an adjacency list, and an `ltree` materialized path.

pub mod balance;
pub mod config;
pub mod error;
pub mod loader;
pub mod path;
pub mod resolver;
pub mod run;
pub mod schema;
pub mod store;
pub mod tree;

pub use balance::{BalanceMode, BalanceSource};
pub use config::{ConfigError, GeneratorConfig, GeneratorConfigBuilder, Phases, TreeShape};
pub use error::Error;
pub use loader::BatchLoader;
pub use path::NodePath;
pub use resolver::{KeyResolver, PathNode, ResolveError};
pub use run::{run, PhaseSummary, RunSummary};
pub use store::{Identity, MemoryStore, PgStore, Store, StoreError};
pub use tree::{Generator, Level, Phase, RowCounts};
