//! Command-line configuration for the `minisql` shell.
//!
//! # Usage
//!
//! ```bash
//! # Interactive session
//! minisql
//!
//! # Run one command and exit
//! minisql -e "CREATE TABLE t (a INT); INSERT INTO t VALUES (1); SELECT a FROM t;"
//!
//! # Run a script, echoing each parsed statement
//! minisql -f schema.sql --show-ast
//! ```

use crate::repl::ReplConfig;
use clap::Parser;
use std::path::PathBuf;

/// Log filter used when neither `--log-level` nor `RUST_LOG` is given
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// minisql command line interface
#[derive(Parser, Debug)]
#[command(name = "minisql")]
#[command(author, version, about = "A minimal SQL shell over an in-memory table store")]
pub struct Cli {
    /// Run the given SQL and exit
    #[arg(short, long, conflicts_with = "file")]
    pub execute: Option<String>,

    /// Run a SQL script file and exit
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Prompt shown before each new statement
    #[arg(long, default_value = "# ")]
    pub prompt: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print each parsed statement before executing it
    #[arg(long)]
    pub show_ast: bool,

    /// Log filter (e.g. `debug`, `minisql=trace`); overrides RUST_LOG
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    pub fn repl_config(&self) -> ReplConfig {
        ReplConfig {
            prompt: self.prompt.clone(),
            show_ast: self.show_ast,
        }
    }
}
