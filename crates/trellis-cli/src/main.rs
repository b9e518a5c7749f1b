// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trellis_cli::commands;

#[derive(Parser)]
#[command(name = "trellis")]
#[command(author = "Maravilla Labs")]
#[command(version)]
#[command(about = "File-system routing for Rust web apps", long_about = None)]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Quiet mode: only show errors (useful for CI)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List discovered routes, middleware and problems
    Routes {
        /// Print the full scan result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Scan the app directory and report problems
    Validate {
        /// Fail when two files define the same route
        #[arg(long)]
        strict: bool,
    },
    /// Write the generated handlers and route registration
    Generate,
    /// Generate, then build the project with cargo
    Build {
        /// Build in debug mode even if trellis.toml asks for release
        #[arg(long)]
        debug: bool,
    },
    /// Run the app and regenerate on changes
    Dev {
        /// Port passed to the app
        #[arg(short, long)]
        port: Option<u16>,
        /// Host passed to the app
        #[arg(long)]
        host: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with the specified log level
    let filter = EnvFilter::try_new(&cli.log_level)
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Routes { json } => commands::routes::run(json),
        Commands::Validate { strict } => commands::validate::run(strict),
        Commands::Generate => commands::generate::run(cli.quiet),
        Commands::Build { debug } => {
            let release = if debug { Some(false) } else { None };
            commands::build::run(release, cli.quiet).await
        }
        Commands::Dev { port, host } => commands::dev::run(host, port, cli.quiet).await,
    }
}
