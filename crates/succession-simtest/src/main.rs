//! Succession Headless Simulation Harness
//!
//! Runs one scenario through the pure model and checks the properties the
//! model guarantees. Optionally writes the trajectory table for plotting.
//! No rendering, no report generation.
//!
//! Usage:
//!   cargo run -p succession-simtest
//!   cargo run -p succession-simtest -- --verbose --csv out/trajectory.csv
//!   cargo run -p succession-simtest -- --scenario data/reference_scenario.json

use std::path::PathBuf;

use clap::Parser;
use succession_logic::derivative::resource_level;
use succession_logic::equilibrium::{self, monoculture_equilibrium};
use succession_logic::grid::TimeGrid;
use succession_logic::params::{plausibility_warnings, ModelConfig, PopulationState};
use succession_logic::scenario::Scenario;
use succession_logic::simulator;
use succession_logic::trajectory::Trajectory;

#[derive(Parser)]
#[command(name = "succession-simtest")]
#[command(version)]
#[command(about = "Run a resource-ratio succession scenario and validate the trajectory")]
struct Cli {
    /// Scenario file (JSON). Defaults to the built-in reference community.
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Write the trajectory table as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the full trajectory as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Print every check, not just failures
    #[arg(short, long)]
    verbose: bool,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let scenario = match &cli.scenario {
        Some(path) => Scenario::from_path(path)?,
        None => Scenario::reference(),
    };
    let label = if scenario.name.is_empty() {
        "unnamed".to_string()
    } else {
        scenario.name.clone()
    };
    println!("=== Succession Simulation Harness ({}) ===\n", label);

    let (config, initial, grid) = scenario.into_parts()?;
    log::info!(
        "{} species, Rmax = {}, {} grid points",
        config.species_count(),
        config.global.resource_max,
        grid.len()
    );

    let trajectory = simulator::run(&config, &initial, &grid)?;

    let mut results = Vec::new();

    // 1. Run shape
    results.extend(validate_run_shape(&trajectory, &grid));

    // 2. Derived quantities
    results.extend(validate_derived_quantities(&config, &trajectory));

    // 3. Determinism
    results.extend(validate_determinism(&config, &initial, &grid, &trajectory));

    // 4. Competitive outcome
    results.extend(validate_outcome(&config, &initial, &trajectory));

    print_summary(&config, &trajectory);

    if let Some(path) = &cli.csv {
        std::fs::write(path, trajectory.to_csv())?;
        log::info!("Wrote trajectory table to {}", path.display());
    }
    if let Some(path) = &cli.json {
        std::fs::write(path, serde_json::to_string_pretty(&trajectory)?)?;
        log::info!("Wrote trajectory JSON to {}", path.display());
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || cli.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

// ── 1. Run shape ────────────────────────────────────────────────────────

fn validate_run_shape(trajectory: &Trajectory, grid: &TimeGrid) -> Vec<TestResult> {
    println!("--- Run Shape ---");
    let mut results = Vec::new();

    results.push(TestResult {
        name: "snapshot_count".into(),
        passed: trajectory.len() == grid.len(),
        detail: format!(
            "{} snapshots for {} grid points",
            trajectory.len(),
            grid.len()
        ),
    });

    let times = trajectory.times();
    let increasing = times.windows(2).all(|w| w[1] > w[0]);
    results.push(TestResult {
        name: "time_strictly_increasing".into(),
        passed: increasing,
        detail: format!(
            "t = {} .. {}",
            times.first().copied().unwrap_or(f64::NAN),
            times.last().copied().unwrap_or(f64::NAN)
        ),
    });

    let bad_spacing = times
        .windows(2)
        .filter(|w| ((w[1] - w[0]) - grid.step).abs() > 1e-9 * grid.step.max(1.0))
        .count();
    results.push(TestResult {
        name: "uniform_step".into(),
        passed: bad_spacing == 0,
        detail: if bad_spacing == 0 {
            format!("every interval is {}", grid.step)
        } else {
            format!("{} intervals differ from step {}", bad_spacing, grid.step)
        },
    });

    results
}

// ── 2. Derived quantities ───────────────────────────────────────────────

fn validate_derived_quantities(config: &ModelConfig, trajectory: &Trajectory) -> Vec<TestResult> {
    println!("--- Derived Quantities ---");
    let mut results = Vec::new();

    let resource_mismatches = trajectory
        .iter()
        .filter(|s| s.resource != resource_level(config, &s.populations))
        .count();
    results.push(TestResult {
        name: "resource_identity".into(),
        passed: resource_mismatches == 0,
        detail: if resource_mismatches == 0 {
            "R = Rmax - sum(u_i N_i) at every snapshot".into()
        } else {
            format!("{} snapshots with a drifting resource", resource_mismatches)
        },
    });

    let rate_mismatches = trajectory
        .iter()
        .filter(|s| {
            config
                .species
                .iter()
                .zip(&s.growth_rates)
                .any(|(sp, r)| (r - sp.m * (s.resource - sp.r_star)).abs() > 1e-12)
        })
        .count();
    results.push(TestResult {
        name: "growth_rate_identity".into(),
        passed: rate_mismatches == 0,
        detail: if rate_mismatches == 0 {
            "r_i = m_i (R - R*_i) at every snapshot".into()
        } else {
            format!("{} snapshots with inconsistent rates", rate_mismatches)
        },
    });

    let sign_violations = trajectory
        .iter()
        .filter(|s| {
            config
                .species
                .iter()
                .zip(&s.growth_rates)
                .filter(|(sp, _)| sp.m > 0.0)
                .any(|(sp, r)| (*r > 0.0) != (s.resource > sp.r_star))
        })
        .count();
    results.push(TestResult {
        name: "growth_sign".into(),
        passed: sign_violations == 0,
        detail: format!("{} sign violations", sign_violations),
    });

    let negatives = trajectory
        .iter()
        .filter(|s| s.populations.iter().any(|n| *n < 0.0))
        .count();
    results.push(TestResult {
        name: "populations_non_negative".into(),
        passed: negatives == 0,
        detail: format!("{} snapshots with a negative population", negatives),
    });

    results
}

// ── 3. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(
    config: &ModelConfig,
    initial: &PopulationState,
    grid: &TimeGrid,
    trajectory: &Trajectory,
) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let mut results = Vec::new();

    match simulator::run(config, initial, grid) {
        Ok(second) => results.push(TestResult {
            name: "repeat_run_identical".into(),
            passed: &second == trajectory,
            detail: "second run compared snapshot by snapshot".into(),
        }),
        Err(e) => results.push(TestResult {
            name: "repeat_run_identical".into(),
            passed: false,
            detail: format!("second run failed: {}", e),
        }),
    }

    results
}

// ── 4. Competitive outcome ──────────────────────────────────────────────

fn validate_outcome(
    config: &ModelConfig,
    initial: &PopulationState,
    trajectory: &Trajectory,
) -> Vec<TestResult> {
    println!("--- Competitive Outcome ---");
    let mut results = Vec::new();

    let warnings = plausibility_warnings(config, initial);
    results.push(TestResult {
        name: "plausible_configuration".into(),
        // Informational: implausible scenarios still run
        passed: true,
        detail: if warnings.is_empty() {
            "no plausibility warnings".into()
        } else {
            warnings
                .iter()
                .map(|w| w.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        },
    });

    let Some(last) = trajectory.final_snapshot() else {
        return results;
    };
    let predicted = equilibrium::predicted_winner(config);
    let observed = last.dominant_species();

    results.push(TestResult {
        name: "dominant_matches_prediction".into(),
        passed: predicted.is_none() || predicted == observed,
        detail: format!(
            "predicted {}, observed {} at t = {}",
            species_label(config, predicted),
            species_label(config, observed),
            last.time
        ),
    });

    results
}

fn species_label(config: &ModelConfig, index: Option<usize>) -> String {
    match index {
        Some(i) => config.species_name(i),
        None => "none".into(),
    }
}

fn print_summary(config: &ModelConfig, trajectory: &Trajectory) {
    let peaks = trajectory.peak_times();
    let Some(last) = trajectory.final_snapshot() else {
        return;
    };
    let shares = last.shares();
    println!("\n  {:<16} {:>10} {:>14} {:>10}", "species", "peak t", "final N", "share");
    for i in 0..config.species_count() {
        println!(
            "  {:<16} {:>10.1} {:>14.4e} {:>10.4}",
            config.species_name(i),
            peaks[i],
            last.populations[i],
            shares[i]
        );
    }
    println!("  final resource R = {:.4}", last.resource);

    if let Some(winner) = equilibrium::predicted_winner(config) {
        if let Some(n_star) = monoculture_equilibrium(&config.global, &config.species[winner]) {
            println!(
                "  predicted winner {} (R* = {}), monoculture N* = {:.3}",
                config.species_name(winner),
                config.species[winner].r_star,
                n_star
            );
        }
    }
}
