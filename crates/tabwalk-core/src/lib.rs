// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Table reconstruction engine layered over bulk-scan agent queries.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Rebuild multi-row agent tables out of flat bulk-scan results.
//!
//! The crate never speaks a wire protocol itself. Callers supply an
//! [`AgentEngine`] that performs single fetches, next fetches and bulk scans;
//! the [`TableWalker`] drives repeated scans below a subtree root and folds the
//! returned columns into positional [`Table`] rows, while the
//! [`TableCoordinator`] runs one walker per requested root.

pub mod coordinator;
pub mod engine;
pub mod extract;
pub mod path;
pub mod query;
pub mod table;
pub mod walker;

pub use coordinator::{CancelToken, TableCoordinator};
pub use engine::{AgentEngine, EngineError, Varbind};
pub use extract::{classify, classify_text, Placement};
pub use path::{Oid, PathError};
pub use query::{Manager, Query, QueryResult};
pub use table::{Row, Table, TableError, TableSet};
pub use walker::{
    Round, TableWalker, WalkConfig, WalkError, DEFAULT_MAX_REPETITIONS, DEFAULT_MAX_ROW_INDEX,
};
