//! strand - traverse the example binary tree, one task per node

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use strand_core::app::{ExecutorBuilder, RunReport, run_top_level};
use strand_core::config::ExecutorConfig;
use strand_core::impls::MemoryEventSink;
use strand_core::observability::{LogLevel, init_logging};
use strand_core::queue::QueuePolicy;
use strand_core::traversal::{self, StdoutKeys, TraversalMode, example_tree};

const EXIT_READY: u8 = 0;
const EXIT_FAILED: u8 = 1;
const EXIT_STARTUP: u8 = 2;

/// Print the keys of a 15-node binary tree, launching one task per node
#[derive(Parser, Debug)]
#[command(name = "strand")]
#[command(version, long_about = None)]
struct Args {
    /// Number of tasks allowed to run at the same time
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// OS threads backing the async runtime
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Dequeue order: fifo, lifo or random
    #[arg(long, value_name = "POLICY")]
    policy: Option<QueuePolicy>,

    /// JSON config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Wait for every launched task before launching the next one
    #[arg(long)]
    await_children: bool,

    /// Write executor events to FILE as JSON lines
    #[arg(long, value_name = "FILE")]
    events: Option<PathBuf>,

    /// trace, debug, info, warn or error
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: LogLevel,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level);

    let result = run(&args);
    match &result {
        Ok(RunReport { outcome: Err(e), .. }) => eprintln!("error: {e}"),
        Err(e) => eprintln!("error: {e:#}"),
        Ok(_) => {}
    }
    ExitCode::from(exit_code(&result))
}

/// 0 when the top-level task is Ready, 1 when it Failed, 2 when it never ran.
fn exit_code(result: &Result<RunReport>) -> u8 {
    match result {
        Ok(RunReport { outcome: Ok(_), .. }) => EXIT_READY,
        Ok(RunReport { outcome: Err(_), .. }) => EXIT_FAILED,
        Err(_) => EXIT_STARTUP,
    }
}

fn run(args: &Args) -> Result<RunReport> {
    let config = resolve_config(args, |var| std::env::var(var).ok())?;
    let runtime = build_runtime(&config)?;

    let sink = args.events.as_ref().map(|_| Arc::new(MemoryEventSink::new()));
    let mode = if args.await_children {
        TraversalMode::AwaitChildren
    } else {
        TraversalMode::FireAndForget
    };

    let report = runtime.block_on(async {
        let mut builder = ExecutorBuilder::new().config(config);
        if let Some(sink) = &sink {
            builder = builder.event_sink(sink.clone());
        }
        let builder = traversal::register(
            builder,
            Arc::new(example_tree()),
            Arc::new(StdoutKeys),
            mode,
        )?;
        let report = run_top_level(builder, traversal::top_level()).await?;
        Ok::<_, anyhow::Error>(report)
    })?;

    // Every key is out once the executor has drained.
    println!();

    tracing::info!(
        status = %serde_json::to_string(&report.status)?,
        "finished"
    );

    if let (Some(sink), Some(path)) = (&sink, &args.events) {
        let file = File::create(path)
            .with_context(|| format!("Failed to create: {}", path.display()))?;
        sink.write_json_lines(BufWriter::new(file))
            .with_context(|| format!("Failed to write events: {}", path.display()))?;
    }

    Ok(report)
}

/// CLI flags > environment > config file > defaults.
fn resolve_config(
    args: &Args,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ExecutorConfig> {
    let config = match &args.config {
        Some(path) => ExecutorConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ExecutorConfig::default(),
    };
    let mut config = config.with_env_from(env)?;

    if let Some(workers) = args.workers {
        config.worker_slots = workers;
    }
    if let Some(threads) = args.threads {
        config.worker_threads = Some(threads);
    }
    if let Some(policy) = args.policy {
        config.queue_policy = policy;
    }

    config.validate()?;
    Ok(config)
}

fn build_runtime(config: &ExecutorConfig) -> Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = config.worker_threads {
        builder.worker_threads(threads);
    }
    builder.build().context("Failed to start the async runtime")
}
