//! tqs-bench — drives the task queue scheduler over a generated task pool.
//!
//! Pool flow: generate pool → drain in `queue_size` windows → verify output
//! against the closed-form accumulation → report timing and imbalance.
//!
//! Configuration layers, lowest to highest: defaults, TOML file (`--config`),
//! `TQS_*` environment variables (a `.env` file is honoured), CLI flags.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use tqs_core::config::load_dotenv;
use tqs_core::{Operation, RunConfig, TaskPattern, TaskQueue};
use tqs_scheduler::{run_batches, verify_values, BatchOutcome, Scheduler};

// ── CLI ─────────────────────────────────────────────────────────────

/// Task queue scheduler benchmark — HEAVY/LIGHT load-imbalance study.
#[derive(Parser, Debug)]
#[command(name = "tqs-bench", version, about)]
struct Cli {
    /// Path to a TOML run config.
    #[arg(long, env = "TQS_CONFIG")]
    config: Option<String>,

    /// Number of execution groups (0 = available parallelism).
    #[arg(short = 'g', long)]
    groups: Option<usize>,

    /// Lanes per group.
    #[arg(short = 'l', long)]
    group_size: Option<usize>,

    /// Inner iterations of each HEAVY task.
    #[arg(short = 'n', long)]
    iterations: Option<u32>,

    /// Tasks drained per scheduling run.
    #[arg(short = 'q', long)]
    queue_size: Option<usize>,

    /// Total tasks in the pool.
    #[arg(short = 's', long)]
    tasks: Option<usize>,

    /// Workload mix: alternating, all_heavy, all_light, or heavy_every:N.
    #[arg(short = 'p', long)]
    pattern: Option<TaskPattern>,

    /// Untimed repetitions before measuring.
    #[arg(short = 'w', long, default_value_t = 1)]
    warmup: usize,

    /// Timed repetitions.
    #[arg(short = 'r', long, default_value_t = 1)]
    reps: usize,

    /// Print the last repetition's run reports as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn apply(&self, mut config: RunConfig) -> RunConfig {
        if let Some(v) = self.groups {
            config.group_count = v;
        }
        if let Some(v) = self.group_size {
            config.group_size = v;
        }
        if let Some(v) = self.iterations {
            config.iterations = v;
        }
        if let Some(v) = self.queue_size {
            config.queue_size = v;
        }
        if let Some(v) = self.tasks {
            config.total_tasks = v;
        }
        if let Some(v) = self.pattern {
            config.pattern = v;
        }
        config
    }
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let base = match cli.config.as_deref() {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("failed to load run config from {}", path))?
            .with_env_overrides(),
        None => RunConfig::from_env(),
    };
    let config = cli.apply(base);
    config.validate().context("invalid run config")?;
    config.log_summary();

    if cli.reps == 0 {
        warn!("reps = 0, nothing will be timed");
    }

    let scheduler = Scheduler::from_config(&config).context("failed to start scheduler")?;
    let pool = TaskQueue::generate(0, config.total_tasks, config.pattern)
        .context("failed to generate task pool")?;
    info!(
        tasks = pool.len(),
        heavy = pool.count(Operation::Heavy),
        light = pool.count(Operation::Light),
        "task pool generated"
    );

    let mut timed = Vec::with_capacity(cli.reps);
    let mut last: Option<BatchOutcome> = None;

    for rep in 0..cli.warmup + cli.reps {
        let outcome = run_batches(&scheduler, &pool, config.queue_size, config.iterations)
            .with_context(|| format!("repetition {} failed", rep))?;

        if let Err(mismatch) =
            verify_values(&pool, &outcome.values, config.group_size, config.iterations)
        {
            bail!("verification failed on repetition {}: {}", rep, mismatch);
        }

        if rep >= cli.warmup {
            timed.push(outcome.elapsed());
            let slowest = outcome.slowest_group();
            info!(
                rep = rep - cli.warmup,
                elapsed_ms = outcome.elapsed().as_secs_f64() * 1000.0,
                max_imbalance = outcome.max_imbalance(),
                slowest_group = slowest.map(|g| g.group),
                slowest_busy_ms = slowest.map(|g| g.busy.as_secs_f64() * 1000.0),
                "repetition complete"
            );
        }
        last = Some(outcome);
    }

    if !timed.is_empty() {
        let total: Duration = timed.iter().sum();
        let mean = total / timed.len() as u32;
        info!(
            reps = timed.len(),
            mean_ms = mean.as_secs_f64() * 1000.0,
            "results verified"
        );
    }

    if cli.json {
        if let Some(outcome) = &last {
            let json = serde_json::to_string_pretty(&outcome.reports)
                .context("failed to serialize run reports")?;
            println!("{}", json);
        }
    }

    Ok(())
}
