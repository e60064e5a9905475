// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Expose caller-facing queries and their result shapes.
// Author: Lukas Bower

//! Caller-facing query surface.
//!
//! Every query shape maps to one [`QueryResult`] variant. Engine failures are
//! logged and collapse to `None`; callers that need the cause use the engine
//! or [`TableCoordinator::walk`] directly.

use log::debug;

use crate::coordinator::{CancelToken, TableCoordinator};
use crate::engine::{AgentEngine, Varbind};
use crate::path::Oid;
use crate::table::{Table, TableSet};
use crate::walker::WalkConfig;

/// A request against the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Fetch one object.
    Get(Oid),
    /// Fetch several objects in one request.
    GetMany(Vec<Oid>),
    /// Fetch the object following an identifier.
    GetNext(Oid),
    /// Issue a single bulk scan round.
    Bulk(Oid),
    /// Reconstruct one table.
    Table(Oid),
    /// Reconstruct several tables.
    Tables(Vec<Oid>),
}

/// Result shapes returned by [`Manager::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    /// One identifier/value pair.
    Value(Varbind),
    /// Ordered identifier/value pairs.
    ValueList(Vec<Varbind>),
    /// One reconstructed table.
    Table(Table),
    /// Tables in request order.
    TableSet(TableSet),
}

/// Management client front end over a protocol engine.
pub struct Manager<E> {
    tables: TableCoordinator<E>,
}

impl<E: AgentEngine> Manager<E> {
    /// Create a manager with sequential table walks.
    pub fn new(engine: E, config: WalkConfig) -> Self {
        Self {
            tables: TableCoordinator::new(engine, config),
        }
    }

    /// Allow up to `workers` tables to be walked concurrently.
    #[must_use]
    pub fn with_workers(self, workers: usize) -> Self {
        Self {
            tables: self.tables.with_workers(workers),
        }
    }

    /// Share a cancellation token with all table walks.
    #[must_use]
    pub fn with_cancel(self, cancel: CancelToken) -> Self {
        Self {
            tables: self.tables.with_cancel(cancel),
        }
    }

    /// Borrow the engine.
    #[must_use]
    pub fn engine(&self) -> &E {
        self.tables.engine()
    }

    /// Fetch one value.
    #[must_use]
    pub fn get(&self, oid: &Oid) -> Option<String> {
        match self.engine().fetch(oid) {
            Ok(value) => value,
            Err(err) => {
                debug!("get {oid} failed: {err}");
                None
            }
        }
    }

    /// Fetch several values at once; all or nothing.
    #[must_use]
    pub fn get_many(&self, oids: &[Oid]) -> Option<Vec<Varbind>> {
        if oids.is_empty() {
            return None;
        }
        match self.engine().fetch_many(oids) {
            Ok(values) => Some(values),
            Err(err) => {
                debug!("get of {} objects failed: {err}", oids.len());
                None
            }
        }
    }

    /// Fetch the object following `oid`.
    #[must_use]
    pub fn get_next(&self, oid: &Oid) -> Option<Varbind> {
        match self.engine().fetch_next(oid) {
            Ok(varbind) => Some(varbind),
            Err(err) => {
                debug!("get-next {oid} failed: {err}");
                None
            }
        }
    }

    /// Issue one bulk scan round from `oid`.
    #[must_use]
    pub fn bulk(&self, oid: &Oid) -> Option<Vec<Varbind>> {
        let max = self.tables.config().max_repetitions;
        match self.engine().scan(oid, max) {
            Ok(values) => Some(values),
            Err(err) => {
                debug!("bulk scan from {oid} failed: {err}");
                None
            }
        }
    }

    /// Reconstruct the table below `root`.
    #[must_use]
    pub fn get_table(&self, root: &Oid) -> Option<Table> {
        self.tables.get_table(root)
    }
}

impl<E: AgentEngine + Sync> Manager<E> {
    /// Reconstruct every table; `None` only if all are absent.
    #[must_use]
    pub fn get_tables(&self, roots: &[Oid]) -> Option<TableSet> {
        self.tables.get_tables(roots)
    }

    /// Run a query and wrap the answer in its result shape.
    #[must_use]
    pub fn execute(&self, query: &Query) -> Option<QueryResult> {
        match query {
            Query::Get(oid) => self
                .get(oid)
                .map(|value| QueryResult::Value(Varbind::new(oid.clone(), value))),
            Query::GetMany(oids) => self.get_many(oids).map(QueryResult::ValueList),
            Query::GetNext(oid) => self.get_next(oid).map(QueryResult::Value),
            Query::Bulk(oid) => self.bulk(oid).map(QueryResult::ValueList),
            Query::Table(root) => self.get_table(root).map(QueryResult::Table),
            Query::Tables(roots) => self.get_tables(roots).map(QueryResult::TableSet),
        }
    }
}
