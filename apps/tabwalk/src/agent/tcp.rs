// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Speak the line-oriented agent bridge protocol over TCP.
// Author: Lukas Bower

//! TCP agent bridge backend.
//!
//! Each request is one line, `<id> <VERB> <version> <community> <args...>`.
//! The bridge answers `<id> OK` followed by `<oid> = <value>` lines and a
//! closing `END`, or a single `<id> ERR <status> <index> <text>` line.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use log::{debug, trace};
use tabwalk_core::{AgentEngine, EngineError, Oid, Varbind};

use crate::config::{AgentVersion, ClientConfig, DEFAULT_COMMUNITY, DEFAULT_TIMEOUT_MS};

/// End-of-answer marker.
pub const END_LINE: &str = "END";

struct Connection {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
    /// Set once any byte of the current answer arrived.
    answered: bool,
}

impl Connection {
    fn round_trip(&mut self, id: u32, line: &str) -> Result<Vec<Varbind>, EngineError> {
        self.answered = false;
        self.stream.write_all(line.as_bytes()).map_err(map_io)?;
        self.stream.write_all(b"\n").map_err(map_io)?;
        self.stream.flush().map_err(map_io)?;

        let status = self.read_line()?;
        let mut parts = status.splitn(3, ' ');
        let answer_id = parts
            .next()
            .and_then(|token| token.parse::<u32>().ok())
            .ok_or_else(|| EngineError::Malformed(format!("status line '{status}'")))?;
        if answer_id != id {
            return Err(EngineError::Malformed(format!(
                "response id {answer_id} for request {id}"
            )));
        }
        match parts.next() {
            Some("OK") => {}
            Some("ERR") => return Err(parse_agent_error(parts.next().unwrap_or(""))),
            _ => return Err(EngineError::Malformed(format!("status line '{status}'"))),
        }

        let mut varbinds = Vec::new();
        loop {
            let line = self.read_line()?;
            if line == END_LINE {
                break;
            }
            let (oid_text, value) = line
                .split_once('=')
                .ok_or_else(|| EngineError::Malformed(format!("binding '{line}'")))?;
            let oid = oid_text
                .trim()
                .parse::<Oid>()
                .map_err(|err| EngineError::Malformed(format!("binding '{line}': {err}")))?;
            varbinds.push(Varbind::new(oid, value.trim()));
        }
        Ok(varbinds)
    }

    fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        let bytes = self.reader.read_line(&mut line).map_err(map_io)?;
        if bytes == 0 {
            return Err(EngineError::Transport("connection closed by agent".to_owned()));
        }
        self.answered = true;
        Ok(line.trim_end_matches(['\r', '\n']).to_owned())
    }
}

/// Agent engine backed by a TCP bridge.
///
/// Request identifiers come from a per-agent counter. Connections are kept in
/// an idle list; each request checks one out, so concurrent walks never wait
/// on each other's round trips. A connection that failed is dropped. An idle
/// connection the bridge closed in the meantime is replaced by a fresh one and
/// the request is sent again.
pub struct TcpAgent {
    address: String,
    port: u16,
    timeout: Duration,
    community: String,
    version: AgentVersion,
    next_request: AtomicU32,
    idle: Mutex<VecDeque<Connection>>,
}

impl TcpAgent {
    /// Create an agent targeting `address:port` with default credentials.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            community: DEFAULT_COMMUNITY.to_owned(),
            version: AgentVersion::V2c,
            next_request: AtomicU32::new(1),
            idle: Mutex::new(VecDeque::new()),
        }
    }

    /// Create an agent from client configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.target.host.clone(), config.target.port)
            .with_timeout(config.transport.timeout())
            .with_community(config.target.community.clone())
            .with_version(config.target.version)
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the community string.
    #[must_use]
    pub fn with_community(mut self, community: impl Into<String>) -> Self {
        self.community = community.into();
        self
    }

    /// Override the protocol version label.
    #[must_use]
    pub fn with_version(mut self, version: AgentVersion) -> Self {
        self.version = version;
        self
    }

    /// Number of requests issued so far.
    #[must_use]
    pub fn requests_issued(&self) -> u32 {
        self.next_request.load(Ordering::SeqCst).wrapping_sub(1)
    }

    fn connect(&self) -> Result<Connection, EngineError> {
        let socket_addr = (self.address.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|err| EngineError::Transport(format!("invalid agent endpoint: {err}")))?
            .next()
            .ok_or_else(|| EngineError::Transport("no agent addresses resolved".to_owned()))?;
        let stream = TcpStream::connect_timeout(&socket_addr, self.timeout).map_err(map_io)?;
        stream.set_read_timeout(Some(self.timeout)).map_err(map_io)?;
        stream.set_write_timeout(Some(self.timeout)).map_err(map_io)?;
        let reader = BufReader::new(stream.try_clone().map_err(map_io)?);
        debug!("connected to agent bridge {socket_addr}");
        Ok(Connection {
            stream,
            reader,
            answered: false,
        })
    }

    fn checkout(&self) -> Result<Option<Connection>, EngineError> {
        Ok(self
            .idle
            .lock()
            .map_err(|_| EngineError::Transport("connection list lock poisoned".to_owned()))?
            .pop_front())
    }

    fn checkin(&self, connection: Connection) {
        if let Ok(mut idle) = self.idle.lock() {
            idle.push_back(connection);
        }
    }

    fn fresh_round_trip(
        &self,
        id: u32,
        line: &str,
    ) -> Result<(Connection, Result<Vec<Varbind>, EngineError>), EngineError> {
        let mut connection = self.connect()?;
        let result = connection.round_trip(id, line);
        Ok((connection, result))
    }

    fn request(&self, verb: &str, args: &str) -> Result<Vec<Varbind>, EngineError> {
        let id = self.next_request.fetch_add(1, Ordering::SeqCst);
        let line = format!("{id} {verb} {} {} {args}", self.version, self.community);
        trace!("-> {line}");
        let (connection, result) = match self.checkout()? {
            Some(mut idle) => match idle.round_trip(id, &line) {
                Err(EngineError::Transport(reason)) if !idle.answered => {
                    debug!("idle agent connection went stale ({reason}); reconnecting");
                    self.fresh_round_trip(id, &line)?
                }
                result => (idle, result),
            },
            None => self.fresh_round_trip(id, &line)?,
        };
        match &result {
            Ok(varbinds) => {
                trace!("<- {id} OK ({} bindings)", varbinds.len());
                self.checkin(connection);
            }
            Err(EngineError::Agent { .. }) => self.checkin(connection),
            Err(err) => debug!("dropping agent connection after request {id}: {err}"),
        }
        result
    }
}

impl AgentEngine for TcpAgent {
    fn fetch(&self, oid: &Oid) -> Result<Option<String>, EngineError> {
        let varbinds = self.request("GET", &oid.to_string())?;
        Ok(varbinds.into_iter().next().map(|varbind| varbind.value))
    }

    fn fetch_many(&self, oids: &[Oid]) -> Result<Vec<Varbind>, EngineError> {
        if oids.is_empty() {
            return Ok(Vec::new());
        }
        let args = oids
            .iter()
            .map(Oid::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        let varbinds = self.request("GET", &args)?;
        if varbinds.len() != oids.len() {
            return Err(EngineError::Malformed(format!(
                "{} bindings for {} requested objects",
                varbinds.len(),
                oids.len()
            )));
        }
        Ok(varbinds)
    }

    fn fetch_next(&self, oid: &Oid) -> Result<Varbind, EngineError> {
        self.request("GETNEXT", &oid.to_string())?
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::Malformed("empty GETNEXT answer".to_owned()))
    }

    fn scan(&self, start: &Oid, max_repetitions: u32) -> Result<Vec<Varbind>, EngineError> {
        self.request("GETBULK", &format!("{max_repetitions} {start}"))
    }
}

fn parse_agent_error(rest: &str) -> EngineError {
    let mut parts = rest.splitn(3, ' ');
    let status = parts.next().and_then(|value| value.parse().ok());
    let index = parts.next().and_then(|value| value.parse().ok());
    match (status, index) {
        (Some(status), Some(index)) => EngineError::Agent {
            status,
            index,
            text: parts.next().unwrap_or("").to_owned(),
        },
        _ => EngineError::Malformed(format!("error line '{rest}'")),
    }
}

fn map_io(err: io::Error) -> EngineError {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => EngineError::Timeout,
        _ => EngineError::Transport(err.to_string()),
    }
}
