// Copyright (c) 2024 Botho Foundation

use anyhow::{Context, Result};
use bth_ledger_types::Config;
use clap::{Parser, Subcommand};
use std::{fs, path::PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod error;

#[derive(Parser)]
#[command(name = "bth-ledger-inspect")]
#[command(about = "Convert, hash and check Botho ledger records", long_about = None)]
struct Cli {
    /// Path to config file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a binary genesis record as JSON
    GenesisToJson {
        /// Binary genesis file
        input: PathBuf,

        /// The file holds hex text instead of raw bytes
        #[arg(long)]
        hex: bool,
    },

    /// Encode a JSON genesis record in binary
    GenesisFromJson {
        /// JSON genesis file
        input: PathBuf,

        /// Write raw bytes here instead of printing hex
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the version, shape and canonical hash of a genesis record
    GenesisHash {
        /// Genesis file
        input: PathBuf,

        /// The file holds JSON instead of the binary encoding
        #[arg(long, conflicts_with = "hex")]
        json: bool,

        /// The file holds hex text instead of raw bytes
        #[arg(long)]
        hex: bool,
    },

    /// Print a binary block summary as JSON
    SummaryToJson {
        /// Binary block summary file
        input: PathBuf,

        /// Protocol version of the block the summary belongs to
        #[arg(short, long)]
        protocol_version: u64,

        /// The file holds hex text instead of raw bytes
        #[arg(long)]
        hex: bool,
    },

    /// Check a JSON encrypted-balance window against the configured limits
    CheckWindow {
        /// JSON window file
        input: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::GenesisToJson { input, hex } => {
            let bytes = commands::read_binary(&input, hex)?;
            println!("{}", commands::genesis_to_json(&bytes, &config.json)?);
        }
        Commands::GenesisFromJson { input, output } => {
            let text = commands::read_text(&input)?;
            let bytes = commands::genesis_from_json(&text)?;
            match output {
                Some(path) => fs::write(&path, bytes)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{}", hex::encode(bytes)),
            }
        }
        Commands::GenesisHash { input, json, hex } => {
            let report = if json {
                let text = commands::read_text(&input)?;
                let genesis =
                    serde_json::from_str(&text).context("Failed to parse genesis JSON")?;
                commands::genesis_report(&genesis)
            } else {
                commands::genesis_hash(&commands::read_binary(&input, hex)?)?
            };
            println!("{report}");
        }
        Commands::SummaryToJson {
            input,
            protocol_version,
            hex,
        } => {
            let bytes = commands::read_binary(&input, hex)?;
            println!(
                "{}",
                commands::summary_to_json(protocol_version, &bytes, &config.json)?
            );
        }
        Commands::CheckWindow { input } => {
            let text = commands::read_text(&input)?;
            let report = commands::check_window(&text, &config.encrypted_balance)?;
            println!("{report}");
        }
    }

    Ok(())
}
