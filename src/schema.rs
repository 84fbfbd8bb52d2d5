//! Row types for the seven benchmark tables.
//!
//! `flattening_records` carries literal names only. The `hierarchy_*`
//! tables are the adjacency-list encoding; the `*_ltree` tables are the
//! materialized-path encoding.

use crate::path::NodePath;
use crate::store::{Identity, Value};

/// Name and level of the single root node seeded into each node table.
pub const ROOT_NAME: &str = "all";
pub const ROOT_LEVEL: i32 = 0;

/// Every table touched by a run, in truncation order.
pub const ALL_TABLES: &[&str] = &[
    FlattenedRow::TABLE,
    RelationRow::TABLE,
    PlayerRow::TABLE,
    RecordRow::TABLE,
    LtreeRelationRow::TABLE,
    LtreePlayerRow::TABLE,
    LtreeRecordRow::TABLE,
];

/// A row type bound to one table.
pub trait TableRow {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    /// Column values in `COLUMNS` order.
    fn into_values(self) -> Vec<Value>;
}

/// A row whose insert returns a name column next to the identity.
pub trait NamedRow: TableRow {
    const NAME_COLUMN: &'static str;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlattenedRow {
    pub company: String,
    pub sub_system: String,
    pub web_id: String,
    pub player_name: String,
    pub balance: i32,
}

impl TableRow for FlattenedRow {
    const TABLE: &'static str = "flattening_records";
    const COLUMNS: &'static [&'static str] =
        &["company", "sub_system", "web_id", "player_name", "balance"];

    fn into_values(self) -> Vec<Value> {
        vec![
            Value::Text(self.company),
            Value::Text(self.sub_system),
            Value::Text(self.web_id),
            Value::Text(self.player_name),
            Value::Int(self.balance),
        ]
    }
}

/// Adjacency-list node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationRow {
    pub parent_id: Identity,
    pub level: i32,
    pub name: String,
}

impl RelationRow {
    pub fn root() -> Self {
        Self {
            parent_id: 0,
            level: ROOT_LEVEL,
            name: ROOT_NAME.to_string(),
        }
    }
}

impl TableRow for RelationRow {
    const TABLE: &'static str = "hierarchy_relation";
    const COLUMNS: &'static [&'static str] = &["parent_id", "level", "name"];

    fn into_values(self) -> Vec<Value> {
        vec![
            Value::Int(self.parent_id),
            Value::Int(self.level),
            Value::Text(self.name),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerRow {
    pub relation_id: Identity,
    pub player_name: String,
}

impl TableRow for PlayerRow {
    const TABLE: &'static str = "hierarchy_player";
    const COLUMNS: &'static [&'static str] = &["relation_id", "player_name"];

    fn into_values(self) -> Vec<Value> {
        vec![Value::Int(self.relation_id), Value::Text(self.player_name)]
    }
}

impl NamedRow for PlayerRow {
    const NAME_COLUMN: &'static str = "player_name";
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordRow {
    pub relation_id: Identity,
    pub player_id: Identity,
    pub balance: i32,
}

impl TableRow for RecordRow {
    const TABLE: &'static str = "hierarchy_records";
    const COLUMNS: &'static [&'static str] = &["relation_id", "player_id", "balance"];

    fn into_values(self) -> Vec<Value> {
        vec![
            Value::Int(self.relation_id),
            Value::Int(self.player_id),
            Value::Int(self.balance),
        ]
    }
}

/// Materialized-path node. The identity is allocated before the insert so
/// that the path can end with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LtreeRelationRow {
    pub id: Identity,
    pub level: i32,
    pub path: NodePath,
    pub name: String,
}

impl LtreeRelationRow {
    pub fn root(id: Identity) -> Self {
        Self {
            id,
            level: ROOT_LEVEL,
            path: NodePath::root(id),
            name: ROOT_NAME.to_string(),
        }
    }
}

impl TableRow for LtreeRelationRow {
    const TABLE: &'static str = "hierarchy_relation_ltree";
    const COLUMNS: &'static [&'static str] = &["id", "level", "path", "name"];

    fn into_values(self) -> Vec<Value> {
        vec![
            Value::Int(self.id),
            Value::Int(self.level),
            Value::Path(self.path),
            Value::Text(self.name),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LtreePlayerRow {
    pub relation_id: Identity,
    pub player_name: String,
}

impl TableRow for LtreePlayerRow {
    const TABLE: &'static str = "hierarchy_player_ltree";
    const COLUMNS: &'static [&'static str] = &["relation_id", "player_name"];

    fn into_values(self) -> Vec<Value> {
        vec![Value::Int(self.relation_id), Value::Text(self.player_name)]
    }
}

impl NamedRow for LtreePlayerRow {
    const NAME_COLUMN: &'static str = "player_name";
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LtreeRecordRow {
    pub path: NodePath,
    pub player_id: Identity,
    pub balance: i32,
}

impl TableRow for LtreeRecordRow {
    const TABLE: &'static str = "hierarchy_records_ltree";
    const COLUMNS: &'static [&'static str] = &["path", "player_id", "balance"];

    fn into_values(self) -> Vec<Value> {
        vec![
            Value::Path(self.path),
            Value::Int(self.player_id),
            Value::Int(self.balance),
        ]
    }
}
