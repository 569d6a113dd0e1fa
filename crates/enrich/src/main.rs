// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Enrich - a data enrichment API.
//!
//! This is the binary entry point for the enrichment server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Enrich - turns messy company, person, address, and domain strings into
/// structured records.
#[derive(Parser, Debug)]
#[command(name = "enrich", version, about, long_about = None)]
struct Cli {
    /// Load this config file instead of the standard hierarchy.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API server (the default).
    Serve,
    /// Validate the configuration and exit.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => enrich_config::load_and_validate_path(path),
        None => enrich_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            enrich_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::CheckConfig => {
            println!(
                "enrich: config ok (listen={}:{}, store={})",
                config.server.host,
                config.server.port,
                config.storage.database_path.as_deref().unwrap_or("in-memory")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_defaults_to_serve() {
        let cli = Cli::try_parse_from(["enrich"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn cli_accepts_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["enrich", "check-config", "--config", "/tmp/enrich.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/enrich.toml")));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = enrich_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.server.port, 8000);
    }
}
