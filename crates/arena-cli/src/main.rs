//! Regex Arena CLI
//!
//! The `regex-arena` command scores patterns and drives arena runs against
//! remote generator and challenger endpoints.
//!
//! ## Commands
//!
//! - `evaluate`: Score one pattern against a corpus file
//! - `run`: Drive a full refinement run and print the final report

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};

use arena_core::{
    cancel_pair, render_report_markdown, write_report_json, ArenaConfig, CancelSignal, Corpus,
    ExecutionRequest, HttpChallenger, HttpGenerator, IsolatedExecutor, LocalSandbox,
    MemoryArenaStore, Orchestrator, RunStatus, RunStatusView,
};

#[derive(Parser)]
#[command(name = "regex-arena")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Adversarial round-based regex refinement", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Arena configuration file (JSON)
    #[arg(long, global = true, env = "ARENA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a pattern against a corpus file
    Evaluate {
        /// Pattern to evaluate (full-string match semantics)
        #[arg(short, long)]
        pattern: String,

        /// Corpus file: {"valid": [...], "invalid": [...]}
        #[arg(short, long)]
        corpus: PathBuf,

        /// Wall-clock limit for the evaluation (milliseconds)
        #[arg(long, env = "ARENA_EVAL_TIMEOUT_MS")]
        timeout_ms: Option<u64>,
    },

    /// Drive a full arena run
    Run {
        /// Problem statement the pattern must solve
        #[arg(short, long)]
        problem: String,

        /// Generator endpoint (repeat for several generators)
        #[arg(
            short,
            long = "generator",
            env = "ARENA_GENERATORS",
            value_delimiter = ',',
            required = true
        )]
        generators: Vec<String>,

        /// Challenger endpoint
        #[arg(short, long, env = "ARENA_CHALLENGER_URL")]
        challenger: String,

        /// Bearer token sent to generator and challenger endpoints
        #[arg(long, env = "ARENA_API_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Maximum number of rounds
        #[arg(long, env = "ARENA_MAX_ROUNDS")]
        max_rounds: Option<u32>,

        /// Per-call generator timeout (milliseconds)
        #[arg(long, env = "ARENA_GENERATOR_TIMEOUT_MS")]
        generator_timeout_ms: Option<u64>,

        /// Per-call challenger timeout (milliseconds)
        #[arg(long, env = "ARENA_CHALLENGER_TIMEOUT_MS")]
        challenger_timeout_ms: Option<u64>,

        /// Wall-clock limit per evaluation (milliseconds)
        #[arg(long, env = "ARENA_EVAL_TIMEOUT_MS")]
        eval_timeout_ms: Option<u64>,

        /// Write the final report JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print a markdown summary instead of JSON
        #[arg(long)]
        markdown: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    arena_core::telemetry::init_tracing(cli.json, level);

    let mut config = match &cli.config {
        Some(path) => ArenaConfig::from_json_file(path)
            .with_context(|| format!("load config {:?}", path))?,
        None => ArenaConfig::default(),
    };

    match cli.command {
        Commands::Evaluate {
            pattern,
            corpus,
            timeout_ms,
        } => {
            if let Some(ms) = timeout_ms {
                config.sandbox.timeout_ms = ms;
            }
            cmd_evaluate(&config, &pattern, &corpus).await
        }
        Commands::Run {
            problem,
            generators,
            challenger,
            token,
            max_rounds,
            generator_timeout_ms,
            challenger_timeout_ms,
            eval_timeout_ms,
            output,
            markdown,
        } => {
            let overrides = Overrides {
                max_rounds,
                generator_timeout_ms,
                challenger_timeout_ms,
                eval_timeout_ms,
            };
            overrides.apply(&mut config);
            cmd_run(
                config,
                &problem,
                &generators,
                &challenger,
                token.as_deref(),
                output.as_deref(),
                markdown,
            )
            .await
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
struct Overrides {
    max_rounds: Option<u32>,
    generator_timeout_ms: Option<u64>,
    challenger_timeout_ms: Option<u64>,
    eval_timeout_ms: Option<u64>,
}

impl Overrides {
    fn apply(&self, config: &mut ArenaConfig) {
        if let Some(n) = self.max_rounds {
            config.max_rounds = n;
        }
        if let Some(ms) = self.generator_timeout_ms {
            config.generator_timeout_ms = ms;
        }
        if let Some(ms) = self.challenger_timeout_ms {
            config.challenger_timeout_ms = ms;
        }
        if let Some(ms) = self.eval_timeout_ms {
            config.sandbox.timeout_ms = ms;
        }
    }
}

fn load_corpus(path: &Path) -> Result<Corpus> {
    let content = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
    let corpus: Corpus =
        serde_json::from_str(&content).with_context(|| format!("parse corpus {:?}", path))?;
    Ok(corpus.normalize()?)
}

async fn cmd_evaluate(config: &ArenaConfig, pattern: &str, corpus_path: &Path) -> Result<()> {
    let corpus = load_corpus(corpus_path)?;
    let sandbox = LocalSandbox::new(config.sandbox.clone())?;
    let result = sandbox
        .execute(
            ExecutionRequest {
                candidate_id: "cli".to_string(),
                pattern: pattern.to_string(),
                corpus: Arc::new(corpus),
            },
            CancelSignal::never(),
        )
        .await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn cmd_run(
    config: ArenaConfig,
    problem: &str,
    generator_urls: &[String],
    challenger_url: &str,
    token: Option<&str>,
    output: Option<&Path>,
    markdown: bool,
) -> Result<()> {
    config.validate().context("invalid arena configuration")?;

    let mut challenger = HttpChallenger::new(challenger_url)?;
    if let Some(t) = token {
        challenger = challenger.with_token(t);
    }
    let sandbox = LocalSandbox::new(config.sandbox.clone())?;
    let store = Arc::new(MemoryArenaStore::new());

    let mut orchestrator =
        Orchestrator::new(config, Arc::new(challenger), Arc::new(sandbox), store)?;
    for (i, url) in generator_urls.iter().enumerate() {
        let mut generator = HttpGenerator::new(format!("http{}", i), url.as_str())?;
        if let Some(t) = token {
            generator = generator.with_token(t);
        }
        orchestrator = orchestrator.with_generator(Arc::new(generator));
    }

    let run_id = orchestrator.create_run(problem).await?;
    info!(run_id = %run_id, generators = generator_urls.len(), "starting arena run");

    let (cancel, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling run");
            cancel.cancel();
        }
    });

    let run = orchestrator.run(&run_id, signal).await?;
    let view = RunStatusView::from_run(&run)?;

    if run.status != RunStatus::Completed {
        let reason = run
            .failure
            .as_ref()
            .map(|f| f.message.clone())
            .unwrap_or_else(|| format!("run ended in status {}", run.status));
        eprintln!("{}", serde_json::to_string_pretty(&view)?);
        bail!("arena run {} failed: {}", run_id, reason);
    }

    let report = run
        .report
        .as_ref()
        .context("completed run has no report")?;
    if let Some(path) = output {
        write_report_json(path, report)?;
        info!(path = ?path, "report written");
    }
    if markdown {
        println!("{}", render_report_markdown(report));
    } else {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    Ok(())
}
