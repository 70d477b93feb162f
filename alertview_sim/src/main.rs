//! AlertView simulation CLI.
//!
//! Run deterministic stress scenarios against the clustering engine.

use alertview_sim::{ScenarioId, ScenarioRunner};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "alertview-sim", about = "Deterministic scenario harness for AlertView")]
struct Cli {
    /// Seed for the deterministic alert feed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Alerts per feed batch
    #[arg(long, default_value_t = 120)]
    alerts: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one scenario
    Run {
        /// Scenario name (see `list`)
        scenario: String,

        /// Write frame-by-frame render plans as JSON
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Run every scenario
    All,

    /// List available scenarios
    List,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::List => {
            for scenario in ScenarioId::all() {
                println!("{:<14} {}", scenario.name(), scenario.description());
            }
            ExitCode::SUCCESS
        }
        Command::Run { scenario, export } => {
            let Some(scenario) = ScenarioId::from_name(&scenario) else {
                error!("unknown scenario '{}'; try `alertview-sim list`", scenario);
                return ExitCode::FAILURE;
            };

            let mut runner = ScenarioRunner::new(cli.seed, cli.alerts);
            if export.is_some() {
                runner = runner.with_export(scenario);
            }
            let result = runner.run(scenario);

            if let (Some(path), Some(frames)) = (export, runner.take_export()) {
                match frames.write_to(&path) {
                    Ok(()) => info!("wrote {} frames to {}", frames.frames.len(), path.display()),
                    Err(e) => {
                        error!("export failed: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            }

            report(&[result])
        }
        Command::All => {
            let results: Vec<_> = ScenarioId::all()
                .into_iter()
                .map(|scenario| ScenarioRunner::new(cli.seed, cli.alerts).run(scenario))
                .collect();
            report(&results)
        }
    }
}

fn report(results: &[alertview_sim::ScenarioResult]) -> ExitCode {
    let mut failed = 0;
    for result in results {
        if result.passed {
            info!(
                "PASS {} (seed={}, recomputes={}, restyles={}, peak shapes={})",
                result.scenario.name(),
                result.seed,
                result.metrics.full_recomputes,
                result.metrics.restyles,
                result.metrics.peak_descriptors,
            );
        } else {
            failed += 1;
            error!(
                "FAIL {} (seed={}): {}",
                result.scenario.name(),
                result.seed,
                result.failure_reason.as_deref().unwrap_or("unknown"),
            );
        }
    }
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
