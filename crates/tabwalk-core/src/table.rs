// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Hold reconstructed rows, tables and table sets.
// Author: Lukas Bower

//! Positional table storage.
//!
//! A [`Table`] is an arena of optional rows indexed by `row - 1`. Rows that
//! were never observed stay as explicit `None` placeholders so that the table
//! length always equals the highest row index seen.

use thiserror::Error;

use crate::path::Oid;

/// Errors raised while placing a cell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The row index lies beyond the configured ceiling.
    #[error("row index {row} exceeds the limit of {limit}")]
    RowLimit {
        /// Offending one-based row index.
        row: usize,
        /// Highest accepted row index.
        limit: usize,
    },
    /// The row arena could not grow to hold the row.
    #[error("cannot allocate {row} row positions")]
    Capacity {
        /// Offending one-based row index.
        row: usize,
    },
}

/// One table row: columns in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(Oid, String)>,
}

impl Row {
    /// Create an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a column, overwriting the value in place if the column already exists.
    pub fn insert(&mut self, column: Oid, value: String) {
        if let Some(slot) = self.columns.iter_mut().find(|(oid, _)| *oid == column) {
            slot.1 = value;
        } else {
            self.columns.push((column, value));
        }
    }

    /// Look up a column value.
    #[must_use]
    pub fn get(&self, column: &Oid) -> Option<&str> {
        self.columns
            .iter()
            .find(|(oid, _)| oid == column)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate columns in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&Oid, &str)> {
        self.columns.iter().map(|(oid, value)| (oid, value.as_str()))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Reconstructed table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Option<Row>>,
    truncated: bool,
}

impl Table {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a cell at the one-based `row`, padding with placeholders as needed.
    ///
    /// Row `0` has no position and is ignored. Growth that cannot be
    /// allocated fails with [`TableError::Capacity`] and leaves the table as is.
    pub fn place(&mut self, row: usize, column: Oid, value: String) -> Result<(), TableError> {
        let Some(slot) = row.checked_sub(1) else {
            return Ok(());
        };
        if slot >= self.rows.len() {
            self.rows
                .try_reserve_exact(row - self.rows.len())
                .map_err(|_| TableError::Capacity { row })?;
            self.rows.resize_with(row, || None);
        }
        self.rows[slot]
            .get_or_insert_with(Row::new)
            .insert(column, value);
        Ok(())
    }

    /// Highest row index observed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no row position exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Borrow the row at one-based `index`; `None` for placeholders and out-of-range.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row> {
        index
            .checked_sub(1)
            .and_then(|slot| self.rows.get(slot))
            .and_then(Option::as_ref)
    }

    /// All row positions, placeholders included.
    #[must_use]
    pub fn rows(&self) -> &[Option<Row>] {
        &self.rows
    }

    /// Iterate materialised rows with their one-based indices.
    pub fn present_rows(&self) -> impl Iterator<Item = (usize, &Row)> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(slot, row)| row.as_ref().map(|row| (slot + 1, row)))
    }

    /// Whether the walk that produced this table stopped on a failure mid-way.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub(crate) fn mark_truncated(&mut self) {
        self.truncated = true;
    }
}

/// Tables in request order; `None` marks a root that yielded nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSet {
    tables: Vec<Option<Table>>,
}

impl TableSet {
    /// Wrap per-root results.
    #[must_use]
    pub fn new(tables: Vec<Option<Table>>) -> Self {
        Self { tables }
    }

    /// Number of requested roots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when no roots were requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Table for the root at `position`; `None` when absent or out of range.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Table> {
        self.tables.get(position).and_then(Option::as_ref)
    }

    /// Iterate slots in request order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&Table>> {
        self.tables.iter().map(Option::as_ref)
    }

    /// Count of roots that produced a table.
    #[must_use]
    pub fn present(&self) -> usize {
        self.tables.iter().filter(|table| table.is_some()).count()
    }
}
