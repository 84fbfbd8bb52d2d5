use super::hierarchy::Encoding;
use super::{Generator, Level, Phase, RowCounts};
use crate::error::Error;
use crate::loader::BatchLoader;
use crate::schema::{PlayerRow, RecordRow, RelationRow, TableRow};
use crate::store::{Identity, Store, StoreError};
use async_trait::async_trait;
use tracing::{debug, info};

/// Parent-pointer encoding: every node row carries its parent's id.
struct Adjacency;

#[async_trait]
impl Encoding for Adjacency {
    const PHASE: Phase = Phase::Adjacency;

    type Node = Identity;
    type NodeRow = RelationRow;
    type Player = PlayerRow;
    type Record = RecordRow;

    async fn root<S>(&self, store: &mut S) -> Result<Identity, StoreError>
    where
        S: Store + ?Sized,
    {
        store.root_id(RelationRow::TABLE).await
    }

    async fn insert_children<S>(
        &self,
        store: &mut S,
        loader: BatchLoader,
        parent: &Identity,
        level: Level,
        names: &[String],
    ) -> Result<Vec<Identity>, StoreError>
    where
        S: Store + ?Sized,
    {
        let parent_id = *parent;
        let rows: Vec<RelationRow> = names
            .iter()
            .map(|name| RelationRow {
                parent_id,
                level: level.depth(),
                name: name.clone(),
            })
            .collect();
        let ids = loader.insert_returning_ids(store, rows).await?;
        debug!("{}: {} {level} nodes under {parent_id}", RelationRow::TABLE, ids.len());
        Ok(ids)
    }

    fn player_row(&self, web_id: &Identity, player_name: String) -> PlayerRow {
        PlayerRow {
            relation_id: *web_id,
            player_name,
        }
    }

    fn record_row(&self, web_id: &Identity, player_id: Identity, balance: i32) -> RecordRow {
        RecordRow {
            relation_id: *web_id,
            player_id,
            balance,
        }
    }
}

impl<S: Store + ?Sized> Generator<'_, S> {
    pub async fn adjacency(&mut self) -> Result<RowCounts, Error> {
        info!("Generating hierarchical data (adjacency list)...");
        self.walk(&Adjacency).await
    }
}
