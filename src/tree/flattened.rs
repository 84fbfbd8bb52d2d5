use super::{company_name, player_name, subsystem_name, web_id_name, Generator, Level, Phase, RowCounts};
use crate::error::{AtLevel, Error};
use crate::schema::FlattenedRow;
use crate::store::Store;
use std::mem;
use tracing::info;

const PHASE: Phase = Phase::Flattened;

impl<S: Store + ?Sized> Generator<'_, S> {
    /// Writes one self-describing row per record into `flattening_records`.
    ///
    /// Rows are flushed whenever a full batch has accumulated, so the
    /// statements issued are the same as partitioning the whole table at
    /// once, without holding it in memory.
    pub async fn flattened(&mut self) -> Result<RowCounts, Error> {
        info!("Generating flattening records...");
        let shape = self.shape;
        let batch_size = self.loader.batch_size();
        let mut counts = RowCounts::default();
        let mut pending = Vec::with_capacity(batch_size.min(shape.records()));

        for c in 1..=shape.companies {
            let company = company_name(c);
            counts.companies += 1;

            for s in 1..=shape.subsystems_per_company {
                let subsystem = subsystem_name(s);
                counts.subsystems += 1;

                for w in 1..=shape.web_ids_per_subsystem {
                    let web_id = web_id_name(w);
                    counts.web_ids += 1;

                    for p in 1..=shape.players_per_web_id {
                        let player = player_name(c, s, w, p);
                        counts.players += 1;

                        for _ in 0..shape.records_per_player {
                            pending.push(FlattenedRow {
                                company: company.clone(),
                                sub_system: subsystem.clone(),
                                web_id: web_id.clone(),
                                player_name: player.clone(),
                                balance: self.balances.next_balance(),
                            });
                            counts.records += 1;

                            if pending.len() == batch_size {
                                let batch = mem::replace(&mut pending, Vec::with_capacity(batch_size));
                                self.loader
                                    .insert(&mut *self.store, batch)
                                    .await
                                    .at(PHASE, Level::Record)?;
                            }
                        }
                    }
                }
            }
        }

        self.loader
            .insert(&mut *self.store, pending)
            .await
            .at(PHASE, Level::Record)?;
        Ok(counts)
    }
}
