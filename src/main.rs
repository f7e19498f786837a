//! tagflow - command-line entry point
//!
//! Builds a flow from a tag file, drives it from its source, and reports the
//! input typing of every sink.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tagflow::{
    config::{EngineConfig, DEFAULT_LOG_FILTER},
    data::SchemaRegistry,
    pipeline::{FlowBuilder, OperatorRegistry, PrintTarget},
    tag::{parse_str, TagWriter},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Typed dataflow engine driven by tag-format flow descriptions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a flow, run it and print the sink input schemas
    Run {
        /// Flow description (Operators and Streams tags)
        flow: PathBuf,

        /// Engine configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write values reaching Print sinks to stdout
        #[arg(long)]
        print: bool,
    },
    /// Parse a flow file and re-emit it in normalised tag form
    Describe {
        flow: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.command {
        Command::Run {
            config: Some(path), ..
        } => EngineConfig::load(path),
        _ => Ok(EngineConfig::default()),
    };
    let filter = config
        .as_ref()
        .map(|c| c.logging.filter.as_str())
        .unwrap_or(DEFAULT_LOG_FILTER);

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = config.map_err(anyhow::Error::from).and_then(|config| match &cli.command {
        Command::Run { flow, print, .. } => run(flow, &config, *print),
        Command::Describe { flow } => describe(flow),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(path: &Path, config: &EngineConfig, print: bool) -> Result<()> {
    tracing::info!("Running flow {:?}", path);
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read flow file {:?}", path))?;

    let operators = OperatorRegistry::with_builtins();
    let schemas = SchemaRegistry::with_builtins();
    let builder = FlowBuilder::new(&operators, &schemas)
        .buffer_capacity(config.buffer.initial_capacity)
        .tag_id(config.transport.tag_id)
        .print_to(if print {
            PrintTarget::Stdout
        } else {
            PrintTarget::Discard
        });

    let objects = parse_str(&text).with_context(|| format!("Failed to parse {:?}", path))?;
    let typings = builder
        .build_and_run(&objects)
        .with_context(|| format!("Flow {:?} failed", path))?;

    let writer = TagWriter::pretty();
    for typing in &typings {
        println!("{}", writer.write_to_string(&typing.describe()));
    }
    tracing::info!("Flow finished with {} sink(s)", typings.len());
    Ok(())
}

fn describe(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read flow file {:?}", path))?;
    let objects = parse_str(&text).with_context(|| format!("Failed to parse {:?}", path))?;
    let writer = TagWriter::pretty();
    for object in &objects {
        println!("{}", writer.write_to_string(object));
    }
    Ok(())
}
