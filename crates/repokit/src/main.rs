// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repokit - plugin host for repository tooling.
//!
//! This is the binary entry point. Every command discovers plugins, runs the
//! requested inspection and unloads every loaded plugin before exiting.

mod analyze;
mod builtin;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use repokit_config::RepokitConfig;
use repokit_core::RepokitError;
use repokit_plugin::{PluginRegistry, PluginSource, directory_sources};

/// Repokit - plugin host for repository tooling.
#[derive(Parser, Debug)]
#[command(name = "repokit", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List discovered plugins and their status.
    List {
        /// Output JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Show one plugin's metadata, state and last error.
    Info {
        id: String,
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
    /// Exit non-zero if any plugin failed.
    Check {
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Run every enabled analysis plugin against a project directory.
    Analyze {
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => repokit_config::load_and_validate_path(path),
        None => repokit_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            repokit_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.log.level);

    let registry = build_registry(&config).await;
    let command = cli.command.unwrap_or(Commands::List {
        json: false,
        plain: false,
    });
    let code = match command {
        Commands::List { json, plain } => {
            status::run_list(&registry, json, plain);
            0
        }
        Commands::Info { id, json } => exit_code(status::run_info(&registry, &id, json)),
        Commands::Check { plain } => {
            if status::run_check(&registry, plain) {
                0
            } else {
                1
            }
        }
        Commands::Analyze { path, json } => {
            exit_code(analyze::run_analyze(&registry, &path, json).await)
        }
    };

    registry.shutdown().await;
    std::process::exit(code);
}

/// Compiled-in plugins plus the builtin, user and project directories.
async fn build_registry(config: &RepokitConfig) -> PluginRegistry {
    let mut sources: Vec<Box<dyn PluginSource>> = vec![Box::new(builtin::builtin_source())];
    sources.extend(directory_sources(
        &config.plugins,
        Arc::new(builtin::factory_table()),
    ));
    PluginRegistry::start(config.plugins.clone(), sources).await
}

fn exit_code(result: Result<(), RepokitError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("repokit: {e}");
            1
        }
    }
}

/// Initializes the tracing subscriber with the given log level. Logs go to
/// stderr so `--json` output stays parseable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "repokit={log_level},repokit_plugin={log_level},repokit_config={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
