// Benchmark Report Types
// Structured JSON output for offline analysis of preset behaviour

use serde::Serialize;

// ─── Statistics (per-metric Monte Carlo aggregation) ────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    /// Mean with a normal-approximation 95% confidence interval.
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let half_width = 1.96 * std_dev / (n as f64).sqrt();
        Self {
            mean,
            std_dev,
            ci_lower: mean - half_width,
            ci_upper: mean + half_width,
            min: samples.iter().copied().fold(f64::INFINITY, f64::min),
            max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }

    pub fn half_width(&self) -> f64 {
        (self.ci_upper - self.ci_lower) / 2.0
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub preset: String,
    pub seed: u64,
    /// Every tick kept both state counts equal to the node count.
    pub pass: bool,
    pub completed: bool,
    pub final_tick: u64,
    pub node_count: usize,
    pub link_count: usize,
    pub peak_infected: u32,
    pub total_infected: u32,
    pub deceased: u32,
    pub vaccinated: u32,
    pub defaulted: u32,
    pub bailed_out: u32,
    pub total_losses: f64,
    pub systemic_risk: f64,
    pub cascade_depth: u64,
    pub conservation_violations: u32,
    pub elapsed_ms: f64,
}

// ─── Monte Carlo Report (per-preset aggregation) ────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PresetReport {
    pub preset: String,
    pub name: String,
    pub mode: String,
    pub n_runs: usize,
    pub pass_rate: f64,
    pub completion_rate: f64,
    pub final_tick: Stats,
    pub peak_infected: Stats,
    pub total_infected: Stats,
    pub deceased: Stats,
    pub defaulted: Stats,
    pub total_losses: Stats,
    pub systemic_risk: Stats,
    pub elapsed_ms: Stats,
    pub individual_runs: Vec<RunResult>,
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub base_seed: u64,
    pub max_ticks: u64,
    pub n_runs_per_preset: usize,
    pub summary: Summary,
    pub presets: Vec<PresetReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}
