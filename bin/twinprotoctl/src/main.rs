//! ---
//! tp_section: "05-operator-tooling"
//! tp_subsection: "binary"
//! tp_type: "source"
//! tp_scope: "code"
//! tp_description: "Inspection CLI for operators working with protocol adaptables."
//! tp_version: "v0.0.0-prealpha"
//! tp_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use twinproto_common::{init_tracing, AdapterConfig};

mod inspect;

#[derive(Debug, Parser)]
#[command(author, version, about = "twinproto inspection utility", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse a topic string and print its parts.
    Topic {
        /// Topic string, e.g. `org.acme/lamp/things/twin/commands/modify`.
        topic: String,
        #[command(flatten)]
        options: CommonOptions,
    },
    /// Translate each adaptable in FILE to a signal and back and report mismatches.
    Roundtrip {
        /// File with one adaptable JSON document per line.
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        options: CommonOptions,
    },
    /// Parse aggregated acknowledgements and print their combined status and entity.
    Acks {
        /// File holding the aggregated acknowledgements JSON.
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        options: CommonOptions,
    },
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
struct CommonOptions {
    /// Path to the adapter configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn load_config(options: &CommonOptions) -> Result<AdapterConfig> {
    let mut candidates = Vec::new();
    if let Some(path) = &options.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/twinproto.toml"));
    let loaded = AdapterConfig::load_with_source(&candidates)?;
    init_tracing("twinprotoctl", &loaded.config.logging)?;
    match &loaded.source {
        Some(path) => tracing::debug!(config_path = %path.display(), "configuration loaded"),
        None => tracing::debug!("using built-in configuration defaults"),
    }
    Ok(loaded.config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Topic { topic, options } => {
            load_config(&options)?;
            inspect::topic(&topic)
        }
        Commands::Roundtrip { file, options } => inspect::roundtrip(&load_config(&options)?, &file),
        Commands::Acks { file, options } => inspect::acks(&load_config(&options)?, &file),
    }
}
