use crate::config::GeneratorConfig;
use crate::error::Error;
use crate::store::Store;
use crate::tree::{Generator, Phase, RowCounts};
use serde::Serialize;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct PhaseSummary {
    pub phase: Phase,
    pub counts: RowCounts,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub phases: Vec<PhaseSummary>,
    pub elapsed_seconds: f64,
}

impl RunSummary {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseSummary> {
        self.phases.iter().find(|summary| summary.phase == phase)
    }
}

/// Clears the store, then runs every enabled generation phase in order:
/// flattened, adjacency list, materialized path.
pub async fn run<S: Store + ?Sized>(config: &GeneratorConfig, store: &mut S) -> Result<RunSummary, Error> {
    let started = Instant::now();
    let mut summary = RunSummary::default();
    if !config.phases.any() {
        info!("No generation phase enabled, nothing to do");
        return Ok(summary);
    }

    let shape = config.shape;
    info!(
        "Starting data generation: {} companies x {} subsystems x {} web ids x {} players x {} records, batch size {}",
        shape.companies,
        shape.subsystems_per_company,
        shape.web_ids_per_subsystem,
        shape.players_per_web_id,
        shape.records_per_player,
        config.batch_size
    );

    let mut generator = Generator::new(store, config);

    let phase_started = Instant::now();
    generator.clear().await?;
    summary.phases.push(finished(Phase::Clear, RowCounts::default(), phase_started));

    if config.phases.flattened {
        let phase_started = Instant::now();
        let counts = generator.flattened().await?;
        summary.phases.push(finished(Phase::Flattened, counts, phase_started));
    }
    if config.phases.adjacency {
        let phase_started = Instant::now();
        let counts = generator.adjacency().await?;
        summary.phases.push(finished(Phase::Adjacency, counts, phase_started));
    }
    if config.phases.materialized_path {
        let phase_started = Instant::now();
        let counts = generator.materialized_path().await?;
        summary.phases.push(finished(Phase::MaterializedPath, counts, phase_started));
    }

    summary.elapsed_seconds = started.elapsed().as_secs_f64();
    info!("Data generation completed in {:.3} seconds", summary.elapsed_seconds);
    Ok(summary)
}

fn finished(phase: Phase, counts: RowCounts, started: Instant) -> PhaseSummary {
    let elapsed_seconds = started.elapsed().as_secs_f64();
    info!(
        "{phase} phase finished in {elapsed_seconds:.3} seconds ({} records, {} players)",
        counts.records, counts.players
    );
    PhaseSummary {
        phase,
        counts,
        elapsed_seconds,
    }
}
