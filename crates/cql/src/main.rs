//! Command-line interface for parsing and checking CQL queries.

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use cql_query::parse_cql;
use env_logger::Env;
use log::{debug, info};

#[derive(Parser)]
#[command(name = "cql")]
#[command(about = "Parse and validate CQL content queries")]
/// Top-level CLI options.
struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    command: Commands,
}

#[derive(Subcommand)]
/// Supported `cql` subcommands.
enum Commands {
    /// Parse a query and print its syntax tree
    Parse {
        /// Query to parse
        query: String,

        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether queries are valid
    Check {
        /// Queries to check
        #[arg(required_unless_present = "file")]
        queries: Vec<String>,

        /// Read further queries from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { query, json } => cmd_parse(&query, json),
        Commands::Check { queries, file } => cmd_check(queries, file.as_deref()),
    }
}

/// Exit codes for `cql check`.
mod exit_codes {
    use std::process::ExitCode;

    /// Every query is valid.
    pub const OK: ExitCode = ExitCode::SUCCESS;
    /// At least one query was rejected.
    pub const INVALID: ExitCode = ExitCode::FAILURE;
    /// The queries could not be read.
    pub const ERROR: ExitCode = ExitCode::FAILURE;
}

/// Implements the `cql parse` command.
fn cmd_parse(query: &str, json: bool) -> ExitCode {
    let term = match parse_cql(query) {
        Ok(term) => term,
        Err(e) => {
            eprintln!("error: {}", e.format_with_context());
            return ExitCode::FAILURE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&term) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("error: failed to serialize query: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{term}");
    }

    ExitCode::SUCCESS
}

/// Implements the `cql check` command.
fn cmd_check(mut queries: Vec<String>, file: Option<&Path>) -> ExitCode {
    if let Some(path) = file {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                eprintln!("error: failed to read {}: {e}", path.display());
                return exit_codes::ERROR;
            }
        };
        info!("read queries from {}", path.display());
        queries.extend(
            contents
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_owned),
        );
    }

    let mut invalid = 0;
    for query in &queries {
        match parse_cql(query) {
            Ok(_) => println!("ok       {query}"),
            Err(e) => {
                debug!("{}", e.format_with_context());
                println!("invalid  {query}");
                invalid += 1;
            }
        }
    }

    if invalid > 0 {
        eprintln!("{invalid} of {} queries invalid", queries.len());
        return exit_codes::INVALID;
    }
    exit_codes::OK
}
