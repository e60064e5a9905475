// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Drive repeated bulk scans below a table root and assemble rows.
// Author: Lukas Bower

//! Single-table walker.
//!
//! Each round issues one bulk scan starting at the cursor, folds every
//! in-subtree column into the table and moves the cursor to the last column
//! consumed. The walk ends when a column falls outside the root, the agent
//! returns an empty page, or a scan fails.
//!
//! A failure on the first round is reported as [`WalkError::NoResponse`]. A
//! failure after rows were assembled ends the walk successfully with the rows
//! gathered so far and flags the table as truncated.

use log::{debug, trace, warn};
use thiserror::Error;

use crate::coordinator::CancelToken;
use crate::engine::{AgentEngine, EngineError};
use crate::extract::{classify, Placement};
use crate::path::Oid;
use crate::table::{Table, TableError};

/// Default number of objects requested per scan round.
pub const DEFAULT_MAX_REPETITIONS: u32 = 500;

/// Default ceiling on the row index a walk will materialise.
pub const DEFAULT_MAX_ROW_INDEX: usize = 1 << 20;

/// Tunables for a table walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkConfig {
    /// Objects requested per scan round.
    pub max_repetitions: u32,
    /// Highest row index accepted; a larger index ends the walk.
    pub max_row_index: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_repetitions: DEFAULT_MAX_REPETITIONS,
            max_row_index: DEFAULT_MAX_ROW_INDEX,
        }
    }
}

impl WalkConfig {
    /// Build a configuration requesting `max_repetitions` objects per round (at least one).
    #[must_use]
    pub fn with_max_repetitions(max_repetitions: u32) -> Self {
        Self {
            max_repetitions: max_repetitions.max(1),
            ..Self::default()
        }
    }

    /// Override the row index ceiling (at least one).
    #[must_use]
    pub fn with_row_limit(mut self, max_row_index: usize) -> Self {
        self.max_row_index = max_row_index.max(1);
        self
    }
}

/// Outcome of a single [`TableWalker::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Round {
    /// More rounds are required.
    Pending,
    /// The walk has stopped; the table is final.
    Finished,
}

/// Errors that end a walk without a table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalkError {
    /// The first scan failed, so no row was ever assembled.
    #[error("no response while walking {root}: {source}")]
    NoResponse {
        /// Table root being walked.
        root: Oid,
        /// Engine failure.
        source: EngineError,
    },
    /// The caller cancelled the walk between rounds.
    #[error("walk of {root} cancelled")]
    Cancelled {
        /// Table root being walked.
        root: Oid,
    },
}

/// Reconstructs one table from repeated bulk scans.
pub struct TableWalker<E> {
    engine: E,
    root: Oid,
    config: WalkConfig,
    cursor: Oid,
    table: Option<Table>,
    done: bool,
    rounds: u32,
}

impl<E: AgentEngine> TableWalker<E> {
    /// Prepare a walk of the subtree below `root`.
    pub fn new(engine: E, root: Oid, config: WalkConfig) -> Self {
        Self {
            engine,
            cursor: root.clone(),
            root,
            config,
            table: None,
            done: false,
            rounds: 0,
        }
    }

    /// Identifier the next scan will start from.
    #[must_use]
    pub fn cursor(&self) -> &Oid {
        &self.cursor
    }

    /// True once the walk has stopped.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Number of scan rounds issued.
    #[must_use]
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Table assembled so far, if any cell has arrived.
    #[must_use]
    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// Issue one scan round and fold its columns into the table.
    pub fn advance(&mut self) -> Result<Round, WalkError> {
        if self.done {
            return Ok(Round::Finished);
        }
        self.rounds = self.rounds.saturating_add(1);
        let page = match self.engine.scan(&self.cursor, self.config.max_repetitions) {
            Ok(page) => page,
            Err(err) => {
                self.done = true;
                return match self.table.as_mut() {
                    None => {
                        debug!("walk of {} failed on round {}: {err}", self.root, self.rounds);
                        Err(WalkError::NoResponse {
                            root: self.root.clone(),
                            source: err,
                        })
                    }
                    Some(table) => {
                        warn!(
                            "walk of {} truncated at {} after {} rows: {err}",
                            self.root,
                            self.cursor,
                            table.len()
                        );
                        table.mark_truncated();
                        Ok(Round::Finished)
                    }
                };
            }
        };
        debug!(
            "walk of {} round {} from {}: {} objects",
            self.root,
            self.rounds,
            self.cursor,
            page.len()
        );
        if page.is_empty() {
            self.done = true;
            return Ok(Round::Finished);
        }

        for varbind in page {
            if varbind.oid <= self.cursor {
                warn!(
                    "walk of {} stopped: {} does not follow {}",
                    self.root, varbind.oid, self.cursor
                );
                self.done = true;
                break;
            }
            match classify(&varbind.oid, &self.root) {
                Placement::NotInSubtree => {
                    trace!("walk of {} left subtree at {}", self.root, varbind.oid);
                    self.done = true;
                    break;
                }
                Placement::Scalar => {
                    trace!("skipping scalar {}", varbind.oid);
                    self.cursor = varbind.oid;
                }
                Placement::Cell { row, column } => {
                    if let Err(err) = self.place(row, column, varbind.value) {
                        warn!("walk of {} stopped at {}: {err}", self.root, varbind.oid);
                        if let Some(table) = self.table.as_mut() {
                            table.mark_truncated();
                        }
                        self.done = true;
                        break;
                    }
                    self.cursor = varbind.oid;
                }
            }
        }

        Ok(if self.done {
            Round::Finished
        } else {
            Round::Pending
        })
    }

    fn place(&mut self, row: usize, column: Oid, value: String) -> Result<(), TableError> {
        let limit = self.config.max_row_index;
        if row > limit {
            return Err(TableError::RowLimit { row, limit });
        }
        match self.table.as_mut() {
            Some(table) => table.place(row, column, value),
            None => {
                let mut table = Table::new();
                table.place(row, column, value)?;
                self.table = Some(table);
                Ok(())
            }
        }
    }

    /// Run the walk to completion, checking `cancel` before every round.
    ///
    /// `Ok(None)` means the subtree held no table cells.
    pub fn run(mut self, cancel: &CancelToken) -> Result<Option<Table>, WalkError> {
        while !self.done {
            if cancel.is_cancelled() {
                debug!("walk of {} cancelled after {} rounds", self.root, self.rounds);
                return Err(WalkError::Cancelled { root: self.root });
            }
            self.advance()?;
        }
        Ok(self.table)
    }

    /// Stop walking and return whatever was assembled.
    #[must_use]
    pub fn into_table(self) -> Option<Table> {
        self.table
    }
}
