// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Host-side management client wiring for tabwalk.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! tabwalk client library: configuration, agent backends and rendering around
//! the `tabwalk-core` table reconstruction engine.

use std::fmt;
use std::path::Path;

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use tabwalk_core::AgentEngine;

pub mod agent;
pub mod config;
pub mod render;

pub use agent::{MemoryAgent, TcpAgent};
pub use config::{
    default_config_path, load_config, AgentVersion, ClientConfig, ConfigOverrides,
};

/// Shared engine handle usable by concurrent table walks.
pub type SharedEngine = Box<dyn AgentEngine + Send + Sync>;

/// Clap-compatible agent backend selector.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum AgentKind {
    /// Line-oriented TCP agent bridge.
    Tcp,
    /// In-memory agent loaded from an object dump.
    Memory,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Construct the engine selected by `kind`.
///
/// The memory backend requires an object dump path.
pub fn build_engine(
    kind: AgentKind,
    config: &ClientConfig,
    dump: Option<&Path>,
) -> Result<SharedEngine> {
    match kind {
        AgentKind::Tcp => Ok(Box::new(TcpAgent::from_config(config))),
        AgentKind::Memory => {
            let path = dump.ok_or_else(|| anyhow!("the memory agent requires --mib <FILE>"))?;
            Ok(Box::new(MemoryAgent::load_dump(path)?))
        }
    }
}
