// Monte Carlo Infrastructure — N runs per preset with statistical aggregation
// Run i uses seed base+i for both the network draw and the engine stream

use std::time::Instant;

use contagion_engine::presets::Preset;
use contagion_engine::{ConfigError, SimulationEngine, SimulationMode};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::report::*;

/// Run one preset to completion or `max_ticks`, whichever comes first.
pub fn run_single(preset: &Preset, seed: u64, max_ticks: u64) -> Result<RunResult, ConfigError> {
    let start = Instant::now();

    let mut network_rng = ChaCha8Rng::seed_from_u64(seed);
    let mut engine_rng = ChaCha8Rng::seed_from_u64(seed);
    engine_rng.set_stream(1);
    let mut engine = SimulationEngine::with_rng(engine_rng);

    preset.apply(&mut engine, &mut network_rng)?;

    let n = engine.nodes().len() as u32;
    let link_count = engine.nodes().iter().map(|node| node.degree as usize).sum::<usize>() / 2;
    let mut violations = 0u32;
    let mut last_tick = engine.current_tick();
    let mut stats = engine.stats();

    while stats.tick < max_ticks {
        stats = engine.tick();
        if stats.epidemic.total() != n || stats.financial.total() != n {
            violations += 1;
        }
        if stats.tick != last_tick + 1 {
            violations += 1;
        }
        last_tick = stats.tick;
        if engine.is_complete() {
            break;
        }
    }

    if violations > 0 {
        warn!(preset = preset.id, seed, violations, "count conservation violated");
    }
    debug!(preset = preset.id, seed, tick = stats.tick, "run finished");

    Ok(RunResult {
        preset: preset.id.to_string(),
        seed,
        pass: violations == 0,
        completed: engine.is_complete(),
        final_tick: stats.tick,
        node_count: n as usize,
        link_count,
        peak_infected: stats.epidemic.peak_infected,
        total_infected: stats.epidemic.total_infected,
        deceased: stats.epidemic.deceased,
        vaccinated: stats.epidemic.vaccinated,
        defaulted: stats.financial.defaulted,
        bailed_out: stats.financial.bailed_out,
        total_losses: stats.financial.total_losses,
        systemic_risk: stats.financial.systemic_risk,
        cascade_depth: stats.financial.cascade_depth,
        conservation_violations: violations,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}

/// Run Monte Carlo: N runs of a preset, aggregate stats.
pub fn run_monte_carlo(
    preset: &Preset,
    n_runs: usize,
    base_seed: u64,
    max_ticks: u64,
) -> Result<PresetReport, ConfigError> {
    let results = (0..n_runs)
        .map(|i| run_single(preset, base_seed.wrapping_add(i as u64), max_ticks))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(aggregate(preset, results))
}

fn aggregate(preset: &Preset, results: Vec<RunResult>) -> PresetReport {
    let n = results.len();
    let rate = |count: usize| if n > 0 { count as f64 / n as f64 } else { 0.0 };
    let metric = |f: fn(&RunResult) -> f64| {
        Stats::from_samples(&results.iter().map(f).collect::<Vec<_>>())
    };

    PresetReport {
        preset: preset.id.to_string(),
        name: preset.name.to_string(),
        mode: match preset.mode {
            SimulationMode::Epidemic => "epidemic".to_string(),
            SimulationMode::Financial => "financial".to_string(),
        },
        n_runs: n,
        pass_rate: rate(results.iter().filter(|r| r.pass).count()),
        completion_rate: rate(results.iter().filter(|r| r.completed).count()),
        final_tick: metric(|r| r.final_tick as f64),
        peak_infected: metric(|r| r.peak_infected as f64),
        total_infected: metric(|r| r.total_infected as f64),
        deceased: metric(|r| r.deceased as f64),
        defaulted: metric(|r| r.defaulted as f64),
        total_losses: metric(|r| r.total_losses),
        systemic_risk: metric(|r| r.systemic_risk),
        elapsed_ms: metric(|r| r.elapsed_ms),
        individual_runs: results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contagion_engine::presets;

    #[test]
    fn test_single_run_is_reproducible() {
        let preset = presets::by_id("rapid-recovery").unwrap();
        let a = run_single(&preset, 3, 200).unwrap();
        let b = run_single(&preset, 3, 200).unwrap();
        assert!(a.pass);
        assert_eq!(a.final_tick, b.final_tick);
        assert_eq!(a.total_infected, b.total_infected);
        assert_eq!(a.node_count, 120);
    }

    #[test]
    fn test_aggregate_counts_runs() {
        let preset = presets::by_id("isolated-failure").unwrap();
        let report = run_monte_carlo(&preset, 3, 0, 50).unwrap();
        assert_eq!(report.n_runs, 3);
        assert_eq!(report.individual_runs.len(), 3);
        assert_eq!(report.pass_rate, 1.0);
        assert!(report.final_tick.max <= 50.0);
    }
}
