// minisql shell entry point

use anyhow::Context;
use clap::Parser;
use minisql::backend::MemoryBackend;
use minisql::cli::{Cli, DEFAULT_LOG_FILTER};
use minisql::repl::Repl;
use std::fs;
use std::io::{self, IsTerminal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level")?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let script = match (&cli.execute, &cli.file) {
        (Some(sql), _) => Some(sql.clone()),
        (None, Some(path)) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
        ),
        (None, None) => None,
    };

    let mut repl = Repl::new(MemoryBackend::new(), cli.repl_config());

    match script {
        Some(source) => repl.execute_script(&source, &mut io::stdout().lock())?,
        None if io::stdin().is_terminal() => repl.run_interactive(&mut io::stdout())?,
        None => repl.run(io::stdin().lock(), &mut io::stdout().lock())?,
    }

    Ok(())
}
