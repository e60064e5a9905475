// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Run one table walk per requested root and aggregate the results.
// Author: Lukas Bower

//! Multi-table coordination and cooperative cancellation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use log::{debug, warn};

use crate::engine::AgentEngine;
use crate::path::Oid;
use crate::table::{Table, TableSet};
use crate::walker::{TableWalker, WalkConfig, WalkError};

/// Shared cancellation flag observed by walkers between scan rounds.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the running state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every walk sharing this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// True once [`CancelToken::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Runs table walks for a batch of roots against one shared engine.
pub struct TableCoordinator<E> {
    engine: E,
    config: WalkConfig,
    workers: usize,
    cancel: CancelToken,
}

impl<E: AgentEngine> TableCoordinator<E> {
    /// Create a sequential coordinator.
    pub fn new(engine: E, config: WalkConfig) -> Self {
        Self {
            engine,
            config,
            workers: 1,
            cancel: CancelToken::new(),
        }
    }

    /// Bound the number of concurrent walks; `1` walks roots in order.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Share an externally owned cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Borrow the underlying engine.
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Walk configuration applied to each root.
    #[must_use]
    pub fn config(&self) -> WalkConfig {
        self.config
    }

    /// Walk one root, surfacing the reason a table is missing.
    pub fn walk(&self, root: &Oid) -> Result<Option<Table>, WalkError> {
        TableWalker::new(&self.engine, root.clone(), self.config).run(&self.cancel)
    }

    /// Walk one root; `None` when the root yielded no table.
    #[must_use]
    pub fn get_table(&self, root: &Oid) -> Option<Table> {
        match self.walk(root) {
            Ok(table) => {
                if table.is_none() {
                    debug!("root {root} holds no table cells");
                }
                table
            }
            Err(err) => {
                debug!("root {root} yielded no table: {err}");
                None
            }
        }
    }
}

impl<E: AgentEngine + Sync> TableCoordinator<E> {
    /// Walk every root, keeping request order.
    ///
    /// Returns `None` only when every root yielded no table.
    #[must_use]
    pub fn get_tables(&self, roots: &[Oid]) -> Option<TableSet> {
        let tables = if self.workers > 1 && roots.len() > 1 {
            self.walk_parallel(roots)
        } else {
            roots.iter().map(|root| self.get_table(root)).collect()
        };
        let set = TableSet::new(tables);
        if set.present() == 0 {
            debug!("all {} requested tables are absent", set.len());
            return None;
        }
        Some(set)
    }

    fn walk_parallel(&self, roots: &[Oid]) -> Vec<Option<Table>> {
        let counter = AtomicUsize::new(0);
        let next = &counter;
        let workers = self.workers.min(roots.len());
        let mut slots: Vec<Option<Table>> = (0..roots.len()).map(|_| None).collect();
        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(move || {
                        let mut finished = Vec::new();
                        loop {
                            let index = next.fetch_add(1, Ordering::Relaxed);
                            let Some(root) = roots.get(index) else {
                                break;
                            };
                            finished.push((index, self.get_table(root)));
                        }
                        finished
                    })
                })
                .collect();
            for handle in handles {
                match handle.join() {
                    Ok(finished) => {
                        for (index, table) in finished {
                            slots[index] = table;
                        }
                    }
                    Err(_) => warn!("table walk worker panicked; its roots are reported absent"),
                }
            }
        });
        slots
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::engine::{EngineError, Varbind};

    /// Engine serving a static sorted object list, failing scans below `dead`.
    struct Static {
        objects: Vec<Varbind>,
        dead: Option<Oid>,
        scans: Mutex<u32>,
    }

    impl AgentEngine for Static {
        fn fetch(&self, _oid: &Oid) -> Result<Option<String>, EngineError> {
            Ok(None)
        }

        fn fetch_many(&self, _oids: &[Oid]) -> Result<Vec<Varbind>, EngineError> {
            Ok(Vec::new())
        }

        fn fetch_next(&self, _oid: &Oid) -> Result<Varbind, EngineError> {
            Err(EngineError::Timeout)
        }

        fn scan(&self, start: &Oid, max: u32) -> Result<Vec<Varbind>, EngineError> {
            *self.scans.lock().unwrap() += 1;
            if let Some(dead) = &self.dead {
                if start == dead {
                    return Err(EngineError::Timeout);
                }
            }
            Ok(self
                .objects
                .iter()
                .filter(|vb| vb.oid > *start)
                .take(max as usize)
                .cloned()
                .collect())
        }
    }

    fn oid(text: &str) -> Oid {
        text.parse().unwrap()
    }

    fn engine(dead: Option<&str>) -> Static {
        let objects = [
            ("1.1.1.1", "a1"),
            ("1.1.1.2", "a2"),
            ("1.1.2.1", "b1"),
            ("1.1.2.2", "b2"),
            ("1.2.0", "scalar"),
            ("1.3.1.5", "c5"),
        ]
        .iter()
        .map(|(oid_text, value)| Varbind::new(oid(oid_text), *value))
        .collect();
        Static {
            objects,
            dead: dead.map(oid),
            scans: Mutex::new(0),
        }
    }

    #[test]
    fn table_set_keeps_request_order_and_absent_slots() {
        let coordinator = TableCoordinator::new(engine(None), WalkConfig::with_max_repetitions(2));
        let roots = [oid("1.3"), oid("1.2"), oid("1.1")];
        let set = coordinator.get_tables(&roots).expect("some tables");
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(0).unwrap().len(), 5);
        assert!(set.get(1).is_none());
        assert_eq!(set.get(2).unwrap().len(), 2);
    }

    #[test]
    fn every_slot_absent_is_batch_failure() {
        let coordinator = TableCoordinator::new(engine(Some("1.2")), WalkConfig::default());
        assert!(coordinator.get_tables(&[oid("1.2"), oid("1.9")]).is_none());
        assert!(coordinator.get_tables(&[]).is_none());
    }

    #[test]
    fn parallel_matches_sequential() {
        let roots = [oid("1.1"), oid("1.2"), oid("1.3"), oid("1.4")];
        let sequential = TableCoordinator::new(engine(None), WalkConfig::with_max_repetitions(1))
            .get_tables(&roots);
        let parallel = TableCoordinator::new(engine(None), WalkConfig::with_max_repetitions(1))
            .with_workers(3)
            .get_tables(&roots);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn cancelled_coordinator_issues_no_scans() {
        let cancel = CancelToken::new();
        let coordinator =
            TableCoordinator::new(engine(None), WalkConfig::default()).with_cancel(cancel.clone());
        cancel.cancel();
        assert!(coordinator.get_tables(&[oid("1.1"), oid("1.3")]).is_none());
        assert_eq!(*coordinator.engine().scans.lock().unwrap(), 0);
    }
}
