// Contagion Benchmark Runner — Monte Carlo over the demo presets
// Seedable ChaCha8 PRNG, mean ± 95% CI per metric, JSON report
//
// Usage:
//   cargo run --release --bin bench                        # All presets (30 runs each)
//   cargo run --release --bin bench -- --runs 5            # Quick mode
//   cargo run --release --bin bench -- too-big             # Filter by id, name or mode
//   cargo run --release --bin bench -- --seed 42           # Custom base seed
//   cargo run --release --bin bench -- --max-ticks 2000    # Longer horizon
//   cargo run --release --bin bench -- --out report.json   # Write JSON to a file
//
// The table goes to stderr; the JSON report goes to stdout unless --out is set.
// Log verbosity follows RUST_LOG (default: warn,contagion_engine=info).

mod monte_carlo;
mod report;

use std::process::ExitCode;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use contagion_engine::presets::{self, Preset};
use report::*;
use tracing_subscriber::EnvFilter;

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    runs: usize,
    seed: u64,
    max_ticks: u64,
    out: Option<String>,
    filter: Option<String>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        runs: 30,
        seed: 0,
        max_ticks: 1000,
        out: None,
        filter: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" => {
                i += 1;
                if i < args.len() {
                    cli.runs = args[i].parse().unwrap_or(30);
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    cli.seed = args[i].parse().unwrap_or(0);
                }
            }
            "--max-ticks" => {
                i += 1;
                if i < args.len() {
                    cli.max_ticks = args[i].parse().unwrap_or(1000);
                }
            }
            "--out" => {
                i += 1;
                if i < args.len() {
                    cli.out = Some(args[i].clone());
                }
            }
            arg if !arg.starts_with('-') => {
                cli.filter = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    cli
}

fn matches_filter(preset: &Preset, filter: &str) -> bool {
    let f = filter.to_lowercase();
    let mode = format!("{:?}", preset.mode).to_lowercase();
    preset.id.contains(&f) || preset.name.to_lowercase().contains(&f) || mode == f
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,contagion_engine=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    init_tracing();
    let cli = parse_args();

    let to_run: Vec<Preset> = presets::all()
        .into_iter()
        .filter(|p| cli.filter.as_deref().map_or(true, |f| matches_filter(p, f)))
        .collect();

    if to_run.is_empty() {
        eprintln!("No presets match filter: {:?}", cli.filter);
        return ExitCode::FAILURE;
    }

    eprintln!("\n  Contagion Benchmark Runner v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("  PRNG: ChaCha8Rng | Runs/preset: {} | Base seed: {} | Max ticks: {}",
        cli.runs, cli.seed, cli.max_ticks);
    eprintln!("  Running {} preset(s)...\n", to_run.len());
    eprintln!("  {:<22} {:>5} {:>6} {:>12} {:>12} {:>10} {:>10} {:>12} {:>8}",
        "Preset", "Pass%", "Done%", "Ticks", "Peak inf", "Deceased", "Defaulted", "Losses", "Risk");
    eprintln!("  {}", "-".repeat(106));

    let suite_start = Instant::now();
    let mut reports = Vec::new();

    for preset in &to_run {
        let report = match monte_carlo::run_monte_carlo(preset, cli.runs, cli.seed, cli.max_ticks) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("  {:<22} generator produced an invalid network: {}", preset.id, e);
                return ExitCode::FAILURE;
            }
        };

        eprintln!("  {:<22} {:>4}% {:>5}% {:>6.1}±{:<5.1} {:>6.1}±{:<5.1} {:>10.1} {:>10.1} {:>12.1} {:>7.1}%",
            report.preset,
            (report.pass_rate * 100.0) as u32,
            (report.completion_rate * 100.0) as u32,
            report.final_tick.mean, report.final_tick.half_width(),
            report.peak_infected.mean, report.peak_infected.half_width(),
            report.deceased.mean,
            report.defaulted.mean,
            report.total_losses.mean,
            report.systemic_risk.mean * 100.0,
        );

        reports.push(report);
    }

    // ─── Summary ────────────────────────────────────────────────────────

    let total = reports.len();
    let passed = reports.iter().filter(|r| r.pass_rate >= 1.0).count();
    let failed = total - passed;

    eprintln!("  {}", "-".repeat(106));
    eprintln!("  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s\n",
        total, passed, failed, suite_start.elapsed().as_secs_f64());

    // ─── Write JSON Report ──────────────────────────────────────────────

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().to_string())
        .unwrap_or_default();

    let report = BenchReport {
        timestamp,
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        base_seed: cli.seed,
        max_ticks: cli.max_ticks,
        n_runs_per_preset: cli.runs,
        summary: Summary {
            total,
            passed,
            failed,
            pass_rate: passed as f64 / total as f64,
        },
        presets: reports,
    };

    let json = match serde_json::to_string_pretty(&report) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("  Failed to serialize report: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match &cli.out {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &json) {
                eprintln!("  Failed to write {}: {}", path, e);
                return ExitCode::FAILURE;
            }
            eprintln!("  Results saved to: {}\n", path);
        }
        None => println!("{}", json),
    }

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
