// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! mnemos - memory-and-routing core for a conversational agent.
//!
//! This is the binary entry point: it loads and validates configuration,
//! initializes tracing, builds the object graph once, and dispatches to
//! the selected subcommand.

mod graph_cmd;
mod shell;
mod wiring;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// mnemos - memory-and-routing core for a conversational agent.
#[derive(Parser, Debug)]
#[command(name = "mnemos", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch an interactive conversation REPL.
    Shell,
    /// Inspect the persisted knowledge graph.
    Graph {
        #[command(subcommand)]
        action: graph_cmd::GraphAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match mnemos_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            mnemos_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.agent.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Some(Commands::Shell) => {
            if let Err(e) = shell::run(&config).await {
                eprintln!("mnemos shell: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Graph { action }) => {
            if let Err(e) = graph_cmd::run(&config, action).await {
                eprintln!("mnemos graph: {e}");
                std::process::exit(1);
            }
        }
        None => {
            println!("mnemos: use --help for available commands");
        }
    }
}
