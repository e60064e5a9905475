// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Group the agent engine backends used by the tabwalk client.
// Author: Lukas Bower

//! Agent engine backends for the tabwalk client.

pub mod memory;
pub mod tcp;

pub use memory::MemoryAgent;
pub use tcp::TcpAgent;
