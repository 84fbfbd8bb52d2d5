use super::{
    company_name, key_under, player_names, subsystem_name, web_id_name, Generator, Level, Phase,
    RowCounts,
};
use crate::error::{AtLevel, Error};
use crate::loader::BatchLoader;
use crate::resolver::KeyResolver;
use crate::schema::{NamedRow, TableRow};
use crate::store::{Identity, Store, StoreError};
use async_trait::async_trait;

/// How one keyed schema encodes the node tree. The walk over companies,
/// subsystems, web ids and players is shared; only the rows differ.
#[async_trait]
pub(super) trait Encoding: Sync {
    const PHASE: Phase;

    /// What a child row needs to know about its parent node.
    type Node: Send + Sync;
    type NodeRow: TableRow + Send;
    type Player: NamedRow + Send;
    type Record: TableRow + Send;

    async fn root<S>(&self, store: &mut S) -> Result<Self::Node, StoreError>
    where
        S: Store + ?Sized;

    /// Inserts one node per name under `parent` and returns the inserted
    /// nodes in input order.
    async fn insert_children<S>(
        &self,
        store: &mut S,
        loader: BatchLoader,
        parent: &Self::Node,
        level: Level,
        names: &[String],
    ) -> Result<Vec<Self::Node>, StoreError>
    where
        S: Store + ?Sized;

    fn player_row(&self, web_id: &Self::Node, player_name: String) -> Self::Player;

    fn record_row(&self, web_id: &Self::Node, player_id: Identity, balance: i32) -> Self::Record;
}

impl<S: Store + ?Sized> Generator<'_, S> {
    pub(super) async fn walk<E: Encoding>(&mut self, encoding: &E) -> Result<RowCounts, Error> {
        let root = encoding
            .root(&mut *self.store)
            .await
            .at(E::PHASE, Level::Root)?;

        let companies: Vec<String> = (1..=self.shape.companies).map(company_name).collect();
        let subsystems: Vec<String> = (1..=self.shape.subsystems_per_company)
            .map(subsystem_name)
            .collect();
        let web_ids: Vec<String> = (1..=self.shape.web_ids_per_subsystem)
            .map(web_id_name)
            .collect();

        let mut counts = RowCounts::default();
        let company_nodes = self
            .insert_level(encoding, &root, Level::Company, "", &companies)
            .await?;
        counts.companies += companies.len();

        for (c, company) in (1..).zip(&companies) {
            let company_node = company_nodes
                .resolve(company)
                .at(E::PHASE, Level::Company)?;
            let subsystem_nodes = self
                .insert_level(encoding, company_node, Level::Subsystem, company, &subsystems)
                .await?;
            counts.subsystems += subsystems.len();

            for (s, subsystem) in (1..).zip(&subsystems) {
                let subsystem_key = key_under(company, subsystem);
                let subsystem_node = subsystem_nodes
                    .resolve(&subsystem_key)
                    .at(E::PHASE, Level::Subsystem)?;
                let web_id_nodes = self
                    .insert_level(encoding, subsystem_node, Level::WebId, &subsystem_key, &web_ids)
                    .await?;
                counts.web_ids += web_ids.len();

                for (w, web_id) in (1..).zip(&web_ids) {
                    let web_id_node = web_id_nodes
                        .resolve(&key_under(&subsystem_key, web_id))
                        .at(E::PHASE, Level::WebId)?;
                    self.insert_players(encoding, (c, s, w), web_id_node, &mut counts)
                        .await?;
                }
            }
        }
        Ok(counts)
    }

    /// Inserts the children of `parent` and maps their composed keys to the
    /// nodes the store assigned.
    async fn insert_level<E: Encoding>(
        &mut self,
        encoding: &E,
        parent: &E::Node,
        level: Level,
        parent_key: &str,
        names: &[String],
    ) -> Result<KeyResolver<E::Node>, Error> {
        let nodes = encoding
            .insert_children(&mut *self.store, self.loader, parent, level, names)
            .await
            .at(E::PHASE, level)?;
        if nodes.len() != names.len() {
            return Err(Error::Store {
                phase: E::PHASE,
                level,
                source: StoreError::Misaligned {
                    table: <E::NodeRow as TableRow>::TABLE,
                    expected: names.len(),
                    returned: nodes.len(),
                },
            });
        }

        let mut resolver = KeyResolver::with_capacity(nodes.len());
        for (name, node) in names.iter().zip(nodes) {
            resolver
                .register(key_under(parent_key, name), node)
                .at(E::PHASE, level)?;
        }
        Ok(resolver)
    }

    /// Inserts the players of one web id, resolves them by name and inserts
    /// their records.
    async fn insert_players<E: Encoding>(
        &mut self,
        encoding: &E,
        (c, s, w): (usize, usize, usize),
        web_id: &E::Node,
        counts: &mut RowCounts,
    ) -> Result<(), Error> {
        let names = player_names(c, s, w, self.shape.players_per_web_id);
        let rows: Vec<E::Player> = names
            .iter()
            .map(|name| encoding.player_row(web_id, name.clone()))
            .collect();
        let inserted = self
            .loader
            .insert_returning_named(&mut *self.store, rows)
            .await
            .at(E::PHASE, Level::Player)?;

        let mut players = KeyResolver::with_capacity(inserted.len());
        for (id, name) in inserted {
            players.register(name, id).at(E::PHASE, Level::Player)?;
        }
        counts.players += names.len();

        let per_player = self.shape.records_per_player;
        let mut records = Vec::with_capacity(names.len() * per_player);
        for name in &names {
            let player_id = *players.resolve(name).at(E::PHASE, Level::Player)?;
            for _ in 0..per_player {
                records.push(encoding.record_row(web_id, player_id, self.balances.next_balance()));
            }
        }
        counts.records += records.len();

        self.loader
            .insert(&mut *self.store, records)
            .await
            .at(E::PHASE, Level::Record)
    }
}
