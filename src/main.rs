//! stability-demo
//!
//! Drives a simulated flaky dependency through a configurable pipeline and
//! reports how each call ended.
//!
//! ```text
//! retry → breaker → throttle → [debounce] → timeout → simulated blocking call
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;

use stability_patterns::admission::debounce;
use stability_patterns::config::{load_config, StabilityConfig};
use stability_patterns::observability::init_logging;
use stability_patterns::{
    BoxOperation, Breaker, CallError, Context, ContextError, Operation, OperationExt, Outcome,
    Retry, Throttle, Timeout,
};

#[derive(Parser, Debug)]
#[command(name = "stability-demo", about = "Exercise the call-admission wrappers")]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Total calls to issue.
    #[arg(long, default_value_t = 100)]
    calls: usize,

    /// Calls in flight at once.
    #[arg(long, default_value_t = 8)]
    concurrency: usize,

    /// Probability that a simulated call fails.
    #[arg(long, default_value_t = 0.3)]
    failure_rate: f64,

    /// Mean latency of a simulated call in milliseconds.
    #[arg(long, default_value_t = 20)]
    latency_ms: u64,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Error)]
#[error("simulated failure after {0:?}")]
struct SimulatedFailure(Duration);

/// A blocking call with random latency and failures.
#[derive(Debug, Clone, Copy)]
struct SimulatedCall {
    failure_rate: f64,
    latency_ms: u64,
}

impl SimulatedCall {
    fn run(&self) -> Result<Duration, SimulatedFailure> {
        let latency = Duration::from_millis(fastrand::u64(0..=self.latency_ms.saturating_mul(2)));
        std::thread::sleep(latency);
        if fastrand::f64() < self.failure_rate {
            Err(SimulatedFailure(latency))
        } else {
            Ok(latency)
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    ok: usize,
    upstream_failures: usize,
    service_unavailable: usize,
    rate_limited: usize,
    cancelled: usize,
    deadline_exceeded: usize,
}

impl Summary {
    fn record<T, E>(&mut self, outcome: &Outcome<T, E>) {
        match outcome {
            Ok(_) => self.ok += 1,
            Err(CallError::Upstream(_)) => self.upstream_failures += 1,
            Err(CallError::ServiceUnavailable) => self.service_unavailable += 1,
            Err(CallError::RateLimited) => self.rate_limited += 1,
            Err(CallError::Context(ContextError::Cancelled)) => self.cancelled += 1,
            Err(CallError::Context(ContextError::DeadlineExceeded)) => self.deadline_exceeded += 1,
        }
    }
}

fn build_pipeline(
    config: &StabilityConfig,
    call: SimulatedCall,
) -> BoxOperation<Duration, SimulatedFailure> {
    let mut op = Timeout::from_config(move || call.run(), &config.timeout).boxed();

    if config.debounce.enabled {
        op = debounce::from_config(op, &config.debounce);
    }
    if config.throttle.enabled {
        op = Throttle::from_config(op, &config.throttle).boxed();
    }
    if config.breaker.enabled {
        op = Breaker::from_config(op, &config.breaker).boxed();
    }
    if config.retry.enabled {
        op = Retry::from_config(op, &config.retry).boxed();
    }
    op
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => StabilityConfig::default(),
    };
    init_logging(&config.observability)?;

    tracing::info!(
        calls = cli.calls,
        concurrency = cli.concurrency,
        failure_rate = cli.failure_rate,
        breaker = config.breaker.enabled,
        throttle = config.throttle.enabled,
        debounce = config.debounce.enabled,
        retry = config.retry.enabled,
        "stability-demo starting"
    );

    let root = Context::background();
    let shutdown = root.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling outstanding calls");
            shutdown.cancel();
        }
    });

    let pipeline = build_pipeline(
        &config,
        SimulatedCall {
            failure_rate: cli.failure_rate,
            latency_ms: cli.latency_ms,
        },
    );

    let outcomes: Vec<_> = stream::iter(0..cli.calls)
        .map(|_| {
            let ctx = if config.timeout.enabled {
                root.with_timeout(config.timeout.deadline())
            } else {
                root.child()
            };
            pipeline.call(ctx)
        })
        .buffer_unordered(cli.concurrency.max(1))
        .collect()
        .await;

    let mut summary = Summary::default();
    for outcome in &outcomes {
        summary.record(outcome);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        tracing::info!(?summary, "Run complete");
        println!(
            "ok={} upstream={} unavailable={} rate_limited={} cancelled={} deadline={}",
            summary.ok,
            summary.upstream_failures,
            summary.service_unavailable,
            summary.rate_limited,
            summary.cancelled,
            summary.deadline_exceeded
        );
    }

    Ok(())
}
