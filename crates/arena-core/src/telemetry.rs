//! Tracing setup for arena binaries.
//!
//! Diagnostics always go to stderr; stdout is reserved for reports and
//! evaluation results. `RUST_LOG` wins when set. Otherwise the arena crates
//! log at the requested level and everything else (HTTP client internals,
//! the runtime) at `warn`.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Crates whose events follow the requested level.
const ARENA_TARGETS: &[&str] = &["arena_core", "regex_arena"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// Newline-delimited JSON objects.
    Json,
}

/// Filter used when `RUST_LOG` is absent or unparsable.
pub fn fallback_filter(level: Level) -> EnvFilter {
    let level = level.as_str().to_ascii_lowercase();
    let directives = ARENA_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .fold(String::from("warn"), |acc, d| acc + "," + &d);
    EnvFilter::new(directives)
}

fn stderr_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    match format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

/// Install the global subscriber. Only the first call in a process wins.
pub fn init_tracing(json: bool, level: Level) {
    let format = if json { LogFormat::Json } else { LogFormat::Text };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback_filter(level));
    tracing_subscriber::registry()
        .with(stderr_layer(format).with_filter(filter))
        .try_init()
        .ok();
}
