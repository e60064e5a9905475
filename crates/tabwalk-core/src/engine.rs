// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Define the protocol engine contract consumed by table reconstruction.
// Author: Lukas Bower

//! Collaborator contract for the external protocol engine.
//!
//! Implementations own transport, encoding, credentials and timeouts. Every
//! method takes `&self` so a single engine can be shared by concurrent table
//! walkers; implementations synchronise internally.

use std::sync::Arc;

use thiserror::Error;

use crate::path::Oid;

/// Identifier/value pair returned by an agent. The value is already rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varbind {
    /// Object identifier.
    pub oid: Oid,
    /// Rendered value.
    pub value: String,
}

impl Varbind {
    /// Construct a varbind.
    pub fn new(oid: Oid, value: impl Into<String>) -> Self {
        Self {
            oid,
            value: value.into(),
        }
    }
}

/// Failure signal returned by the protocol engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The agent did not answer within the engine's timeout.
    #[error("agent timeout")]
    Timeout,
    /// The agent answered with a protocol error status.
    #[error("agent error status {status} at index {index}: {text}")]
    Agent {
        /// Protocol error status.
        status: u32,
        /// Index of the offending request entry.
        index: u32,
        /// Human-readable status text.
        text: String,
    },
    /// The transport failed before an answer arrived.
    #[error("transport error: {0}")]
    Transport(String),
    /// The answer could not be interpreted.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Primitive operations provided by the external protocol engine.
pub trait AgentEngine {
    /// Fetch one object. `Ok(None)` means the agent answered without a value.
    fn fetch(&self, oid: &Oid) -> Result<Option<String>, EngineError>;

    /// Fetch several objects in one request; any per-object error fails the call.
    fn fetch_many(&self, oids: &[Oid]) -> Result<Vec<Varbind>, EngineError>;

    /// Fetch the object that follows `oid` in walk order.
    fn fetch_next(&self, oid: &Oid) -> Result<Varbind, EngineError>;

    /// Return up to `max_repetitions` objects following `start`, in increasing order.
    fn scan(&self, start: &Oid, max_repetitions: u32) -> Result<Vec<Varbind>, EngineError>;
}

impl<E: AgentEngine + ?Sized> AgentEngine for &E {
    fn fetch(&self, oid: &Oid) -> Result<Option<String>, EngineError> {
        (**self).fetch(oid)
    }

    fn fetch_many(&self, oids: &[Oid]) -> Result<Vec<Varbind>, EngineError> {
        (**self).fetch_many(oids)
    }

    fn fetch_next(&self, oid: &Oid) -> Result<Varbind, EngineError> {
        (**self).fetch_next(oid)
    }

    fn scan(&self, start: &Oid, max_repetitions: u32) -> Result<Vec<Varbind>, EngineError> {
        (**self).scan(start, max_repetitions)
    }
}

impl<E: AgentEngine + ?Sized> AgentEngine for Arc<E> {
    fn fetch(&self, oid: &Oid) -> Result<Option<String>, EngineError> {
        (**self).fetch(oid)
    }

    fn fetch_many(&self, oids: &[Oid]) -> Result<Vec<Varbind>, EngineError> {
        (**self).fetch_many(oids)
    }

    fn fetch_next(&self, oid: &Oid) -> Result<Varbind, EngineError> {
        (**self).fetch_next(oid)
    }

    fn scan(&self, start: &Oid, max_repetitions: u32) -> Result<Vec<Varbind>, EngineError> {
        (**self).scan(start, max_repetitions)
    }
}

impl<E: AgentEngine + ?Sized> AgentEngine for Box<E> {
    fn fetch(&self, oid: &Oid) -> Result<Option<String>, EngineError> {
        (**self).fetch(oid)
    }

    fn fetch_many(&self, oids: &[Oid]) -> Result<Vec<Varbind>, EngineError> {
        (**self).fetch_many(oids)
    }

    fn fetch_next(&self, oid: &Oid) -> Result<Varbind, EngineError> {
        (**self).fetch_next(oid)
    }

    fn scan(&self, start: &Oid, max_repetitions: u32) -> Result<Vec<Varbind>, EngineError> {
        (**self).scan(start, max_repetitions)
    }
}
