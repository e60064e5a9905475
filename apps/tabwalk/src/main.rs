// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: CLI entry point for the tabwalk management client.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! CLI entry point for the tabwalk management client.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use env_logger::Env;
use log::{debug, LevelFilter};
use tabwalk::render::render_result;
use tabwalk::{
    build_engine, default_config_path, load_config, AgentKind, ClientConfig, ConfigOverrides,
};
use tabwalk_core::{Manager, Oid, Query};

/// tabwalk command-line arguments.
#[derive(Debug, Parser)]
#[command(author = "Lukas Bower", version, about = "Agent table walker", long_about = None)]
struct Cli {
    /// Path to the tabwalk configuration TOML.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Agent backend.
    #[arg(long, value_enum, default_value_t = AgentKind::Tcp)]
    agent: AgentKind,

    /// Object dump served by the memory agent.
    #[arg(long, value_name = "FILE")]
    mib: Option<PathBuf>,

    /// Override the agent host.
    #[arg(long)]
    host: Option<String>,

    /// Override the agent port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the community string.
    #[arg(long)]
    community: Option<String>,

    /// Override the request timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Override the objects requested per scan round.
    #[arg(long)]
    max_repetitions: Option<u32>,

    /// Override the number of tables walked concurrently.
    #[arg(long)]
    workers: Option<usize>,

    /// Override the highest row index a walk will materialise.
    #[arg(long)]
    max_row_index: Option<usize>,

    /// Raise log verbosity (`-v` debug, `-vv` wire trace).
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch one or more objects.
    Get {
        /// Object identifiers.
        #[arg(required = true)]
        oids: Vec<Oid>,
    },
    /// Fetch the object following an identifier.
    Next {
        /// Object identifier.
        oid: Oid,
    },
    /// Issue a single bulk scan round.
    Bulk {
        /// Starting identifier.
        oid: Oid,
    },
    /// Reconstruct one or more tables.
    Table {
        /// Table root identifiers.
        #[arg(required = true)]
        roots: Vec<Oid>,
    },
}

impl Command {
    fn into_query(self) -> Query {
        match self {
            Self::Get { mut oids } if oids.len() == 1 => Query::Get(oids.remove(0)),
            Self::Get { oids } => Query::GetMany(oids),
            Self::Next { oid } => Query::GetNext(oid),
            Self::Bulk { oid } => Query::Bulk(oid),
            Self::Table { mut roots } if roots.len() == 1 => Query::Table(roots.remove(0)),
            Self::Table { roots } => Query::Tables(roots),
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let base = match cli.config.clone().or_else(default_config_path) {
        Some(path) => {
            debug!("loading config from {}", path.display());
            load_config(&path)?
        }
        None => ClientConfig::default(),
    };
    let overrides = ConfigOverrides {
        host: cli.host.clone(),
        port: cli.port,
        community: cli.community.clone(),
        timeout_ms: cli.timeout_ms,
        max_repetitions: cli.max_repetitions,
        workers: cli.workers,
        max_row_index: cli.max_row_index,
    }
    .or_env()?;
    base.with_overrides(&overrides)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = resolve_config(&cli)?;
    let engine = build_engine(cli.agent, &config, cli.mib.as_deref())?;
    let manager = Manager::new(engine, config.walk.walk_config()).with_workers(config.walk.workers);

    let query = cli.command.into_query();
    debug!("executing {query:?} against {}:{}", config.target.host, config.target.port);
    let result = manager
        .execute(&query)
        .ok_or_else(|| anyhow!("no response from agent {}:{}", config.target.host, config.target.port))?;

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    for line in render_result(&result) {
        writeln!(writer, "{line}").context("failed to write output")?;
    }
    Ok(())
}
