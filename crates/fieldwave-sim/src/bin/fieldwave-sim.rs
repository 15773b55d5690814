//! Runs the diameter evaluation and prints one JSON snapshot per line
//!
//! Usage: `fieldwave-sim [config.json]`. Logs go to stderr, filtered by
//! `RUST_LOG`.

use std::env;
use std::io::{self, Write};

use fieldwave_sim::{run_evaluation_with, EvaluationConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fieldwave_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = match env::args().nth(1) {
        Some(path) => EvaluationConfig::from_json_file(path)?,
        None => EvaluationConfig::default(),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut write_error = None;
    run_evaluation_with(&config, |snapshot| {
        if write_error.is_some() {
            return;
        }
        let line = serde_json::to_string(&snapshot).map_err(io::Error::from);
        if let Err(e) = line.and_then(|line| writeln!(out, "{}", line)) {
            write_error = Some(e);
        }
    })?;

    match write_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
