use super::hierarchy::Encoding;
use super::{Generator, Level, Phase, RowCounts};
use crate::error::Error;
use crate::loader::BatchLoader;
use crate::resolver::PathNode;
use crate::schema::{LtreePlayerRow, LtreeRecordRow, LtreeRelationRow, TableRow};
use crate::store::{Identity, Store, StoreError};
use async_trait::async_trait;
use tracing::{debug, info};

/// `ltree` encoding: a node's path is its parent's path followed by the
/// node's own identity, so segments are unique across the whole tree and
/// records address their web id by path.
struct MaterializedPath;

#[async_trait]
impl Encoding for MaterializedPath {
    const PHASE: Phase = Phase::MaterializedPath;

    type Node = PathNode;
    type NodeRow = LtreeRelationRow;
    type Player = LtreePlayerRow;
    type Record = LtreeRecordRow;

    async fn root<S>(&self, store: &mut S) -> Result<PathNode, StoreError>
    where
        S: Store + ?Sized,
    {
        let (id, path) = store.root_path(LtreeRelationRow::TABLE).await?;
        Ok(PathNode { id, path })
    }

    /// Allocates the identities first so every path can name its own
    /// segment, then checks the store kept them.
    async fn insert_children<S>(
        &self,
        store: &mut S,
        loader: BatchLoader,
        parent: &PathNode,
        level: Level,
        names: &[String],
    ) -> Result<Vec<PathNode>, StoreError>
    where
        S: Store + ?Sized,
    {
        let ids = store
            .allocate_ids(LtreeRelationRow::TABLE, names.len())
            .await?;
        if ids.len() != names.len() {
            return Err(StoreError::Misaligned {
                table: LtreeRelationRow::TABLE,
                expected: names.len(),
                returned: ids.len(),
            });
        }

        let nodes: Vec<PathNode> = ids
            .iter()
            .map(|&id| PathNode {
                id,
                path: parent.path.child(id),
            })
            .collect();
        let rows: Vec<LtreeRelationRow> = nodes
            .iter()
            .zip(names)
            .map(|(node, name)| LtreeRelationRow {
                id: node.id,
                level: level.depth(),
                path: node.path.clone(),
                name: name.clone(),
            })
            .collect();

        let returned = loader.insert_returning_ids(store, rows).await?;
        if let Some((&expected, &returned)) = ids.iter().zip(&returned).find(|(a, b)| a != b) {
            return Err(StoreError::IdentityMismatch {
                table: LtreeRelationRow::TABLE,
                expected,
                returned,
            });
        }
        debug!("{}: {} {level} nodes under {}", LtreeRelationRow::TABLE, nodes.len(), parent.path);
        Ok(nodes)
    }

    fn player_row(&self, web_id: &PathNode, player_name: String) -> LtreePlayerRow {
        LtreePlayerRow {
            relation_id: web_id.id,
            player_name,
        }
    }

    fn record_row(&self, web_id: &PathNode, player_id: Identity, balance: i32) -> LtreeRecordRow {
        LtreeRecordRow {
            path: web_id.path.clone(),
            player_id,
            balance,
        }
    }
}

impl<S: Store + ?Sized> Generator<'_, S> {
    pub async fn materialized_path(&mut self) -> Result<RowCounts, Error> {
        info!("Generating ltree hierarchical data...");
        self.walk(&MaterializedPath).await
    }
}
