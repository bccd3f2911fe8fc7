//! dataclients CLI: one command per invocation against the configured
//! vector store.
//!
//! ```text
//! dataclients --config clients.toml upsert docs --id a --text "hello"
//! dataclients --config clients.toml search docs --text "greeting" -n 5 --json
//! ```
//!
//! Exits 0 on success, 2 on unusable arguments and 1 on any other failure.
//! With `--json` errors are printed as JSON objects carrying the error kind.

mod commands;
mod format;
mod parse;
mod run;

use std::process;

use dataclients::ClientsConfig;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{format_error, format_output, OutputMode};
use parse::matches_to_action;

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(matches: &clap::ArgMatches) -> dataclients::Result<ClientsConfig> {
    match matches.get_one::<String>("config") {
        Some(path) => ClientsConfig::load(path),
        None => Ok(ClientsConfig::default()),
    }
}

fn main() {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_count("verbose"));

    let mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("(error) {}", e);
            process::exit(2);
        }
    };

    let config = match load_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            process::exit(1);
        }
    };

    match run::execute(action, config) {
        Ok(output) => {
            let formatted = format_output(&output, mode);
            if !formatted.is_empty() {
                println!("{}", formatted);
            }
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            process::exit(1);
        }
    }
}
