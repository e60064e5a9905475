// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Serve agent queries from an in-memory object dump.
// Author: Lukas Bower

//! In-memory agent used for offline inspection of object dumps and for tests.

use std::collections::BTreeMap;
use std::fs;
use std::ops::Bound;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::{anyhow, Context, Result};
use tabwalk_core::{AgentEngine, EngineError, Oid, Varbind};

const NO_SUCH_NAME: u32 = 2;

/// Agent answering from a sorted object map.
#[derive(Debug, Default)]
pub struct MemoryAgent {
    objects: BTreeMap<Oid, String>,
    fail_scans_after: Option<u32>,
    scans: AtomicU32,
}

impl MemoryAgent {
    /// Build an agent from identifier/value pairs.
    pub fn from_objects<I, S>(objects: I) -> Self
    where
        I: IntoIterator<Item = (Oid, S)>,
        S: Into<String>,
    {
        Self {
            objects: objects
                .into_iter()
                .map(|(oid, value)| (oid, value.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Parse a dump with one `oid = value` entry per line; `#` starts a comment line.
    pub fn from_dump(text: &str) -> Result<Self> {
        let mut objects = BTreeMap::new();
        for (number, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (oid_text, value) = line
                .split_once('=')
                .ok_or_else(|| anyhow!("line {}: expected 'oid = value'", number + 1))?;
            let oid = oid_text
                .trim()
                .parse::<Oid>()
                .with_context(|| format!("line {}: invalid identifier", number + 1))?;
            objects.insert(oid, value.trim().to_owned());
        }
        Ok(Self {
            objects,
            ..Self::default()
        })
    }

    /// Load a dump file.
    pub fn load_dump(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read object dump {}", path.display()))?;
        Self::from_dump(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Let the first `scans` scans succeed and time out every later one.
    #[must_use]
    pub fn fail_scans_after(mut self, scans: u32) -> Self {
        self.fail_scans_after = Some(scans);
        self
    }

    /// Number of objects held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when the agent holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Scans served so far, failed ones included.
    #[must_use]
    pub fn scan_count(&self) -> u32 {
        self.scans.load(Ordering::SeqCst)
    }

    fn after(&self, oid: &Oid) -> impl Iterator<Item = (&Oid, &String)> {
        self.objects
            .range((Bound::Excluded(oid.clone()), Bound::Unbounded))
    }
}

impl AgentEngine for MemoryAgent {
    fn fetch(&self, oid: &Oid) -> Result<Option<String>, EngineError> {
        Ok(self.objects.get(oid).cloned())
    }

    fn fetch_many(&self, oids: &[Oid]) -> Result<Vec<Varbind>, EngineError> {
        oids.iter()
            .enumerate()
            .map(|(position, oid)| match self.objects.get(oid) {
                Some(value) => Ok(Varbind::new(oid.clone(), value.clone())),
                None => Err(EngineError::Agent {
                    status: NO_SUCH_NAME,
                    index: u32::try_from(position + 1).unwrap_or(u32::MAX),
                    text: "noSuchName".to_owned(),
                }),
            })
            .collect()
    }

    fn fetch_next(&self, oid: &Oid) -> Result<Varbind, EngineError> {
        self.after(oid)
            .next()
            .map(|(next, value)| Varbind::new(next.clone(), value.clone()))
            .ok_or_else(|| EngineError::Agent {
                status: NO_SUCH_NAME,
                index: 1,
                text: "endOfMibView".to_owned(),
            })
    }

    fn scan(&self, start: &Oid, max_repetitions: u32) -> Result<Vec<Varbind>, EngineError> {
        let served = self.scans.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.fail_scans_after {
            if served >= limit {
                return Err(EngineError::Timeout);
            }
        }
        let take = usize::try_from(max_repetitions).unwrap_or(usize::MAX);
        Ok(self
            .after(start)
            .take(take)
            .map(|(oid, value)| Varbind::new(oid.clone(), value.clone()))
            .collect())
    }
}
