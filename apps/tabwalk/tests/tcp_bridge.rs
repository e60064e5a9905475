// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Exercise the TCP agent bridge against loopback listeners.
// Author: Lukas Bower

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use tabwalk::TcpAgent;
use tabwalk_core::{AgentEngine, EngineError, Manager, Oid, WalkConfig};

fn oid(text: &str) -> Oid {
    text.parse().expect("valid oid")
}

fn read_request(reader: &mut BufReader<TcpStream>) -> Option<String> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end().to_owned()),
    }
}

fn spawn_bridge<F>(handler: F) -> (u16, thread::JoinHandle<()>)
where
    F: FnOnce(&mut TcpStream, &mut BufReader<TcpStream>) + Send + 'static,
{
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind bridge");
    let port = listener.local_addr().expect("local addr").port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept client");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        handler(&mut stream, &mut reader);
    });
    (port, handle)
}

#[test]
fn bulk_walk_over_bridge() {
    let (port, bridge) = spawn_bridge(|stream, reader| {
        let first = read_request(reader).expect("first scan");
        assert_eq!(first, "1 GETBULK v2c public 2 1.3.6.1.2.1.2.2.1");
        writeln!(stream, "1 OK").unwrap();
        writeln!(stream, "1.3.6.1.2.1.2.2.1.1.1 = 1").unwrap();
        writeln!(stream, "1.3.6.1.2.1.2.2.1.1.2 = 2").unwrap();
        writeln!(stream, "END").unwrap();

        let second = read_request(reader).expect("second scan");
        assert_eq!(second, "2 GETBULK v2c public 2 1.3.6.1.2.1.2.2.1.1.2");
        writeln!(stream, "2 OK").unwrap();
        writeln!(stream, "1.3.6.1.2.1.2.2.1.2.1 = lo").unwrap();
        writeln!(stream, "1.3.6.1.2.1.4.1.0 = 2").unwrap();
        writeln!(stream, "END").unwrap();
    });

    let agent = TcpAgent::new("127.0.0.1", port).with_timeout(Duration::from_secs(2));
    let manager = Manager::new(&agent, WalkConfig::with_max_repetitions(2));
    let table = manager
        .get_table(&oid("1.3.6.1.2.1.2.2.1"))
        .expect("table present");
    bridge.join().expect("bridge thread");

    assert_eq!(table.len(), 2);
    assert!(!table.is_truncated());
    let first = table.row(1).expect("row 1");
    assert_eq!(first.get(&oid("1.3.6.1.2.1.2.2.1.2.1")), Some("lo"));
    assert_eq!(agent.requests_issued(), 2);
}

#[test]
fn bridge_closing_after_each_answer_is_reconnected() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind bridge");
    let port = listener.local_addr().expect("local addr").port();
    let bridge = thread::spawn(move || {
        let pages = [
            vec!["1.3.6.1.2.1.2.2.1.1.1 = 1"],
            vec!["1.3.6.1.2.1.2.2.1.1.2 = 2"],
            vec!["1.3.6.1.2.1.4.1.0 = 2"],
        ];
        let mut ids = Vec::new();
        for page in pages {
            let (mut stream, _) = listener.accept().expect("accept client");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let request = read_request(&mut reader).expect("scan request");
            let id = request.split(' ').next().expect("request id").to_owned();
            let mut answer = format!("{id} OK\n");
            for binding in page {
                answer.push_str(binding);
                answer.push('\n');
            }
            answer.push_str("END\n");
            stream.write_all(answer.as_bytes()).expect("write answer");
            ids.push(id);
        }
        ids
    });

    let agent = TcpAgent::new("127.0.0.1", port).with_timeout(Duration::from_secs(2));
    let manager = Manager::new(&agent, WalkConfig::with_max_repetitions(1));
    let table = manager
        .get_table(&oid("1.3.6.1.2.1.2.2.1"))
        .expect("table present");
    let ids = bridge.join().expect("bridge thread");

    assert_eq!(table.len(), 2);
    assert!(!table.is_truncated());
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[test]
fn silent_bridge_truncates_walk() {
    let (port, bridge) = spawn_bridge(|stream, reader| {
        read_request(reader).expect("first scan");
        writeln!(stream, "1 OK").unwrap();
        writeln!(stream, "1.3.6.1.2.1.2.2.1.1.1 = 1").unwrap();
        writeln!(stream, "END").unwrap();
        read_request(reader).expect("second scan");
        thread::sleep(Duration::from_millis(600));
    });

    let agent = TcpAgent::new("127.0.0.1", port).with_timeout(Duration::from_millis(200));
    let manager = Manager::new(&agent, WalkConfig::with_max_repetitions(1));
    let table = manager
        .get_table(&oid("1.3.6.1.2.1.2.2.1"))
        .expect("partial table kept");
    bridge.join().expect("bridge thread");

    assert!(table.is_truncated());
    assert_eq!(table.len(), 1);
}

#[test]
fn agent_error_is_reported() {
    let (port, bridge) = spawn_bridge(|stream, reader| {
        let request = read_request(reader).expect("get request");
        assert_eq!(request, "1 GET v2c public 1.3.6.1.2.1.1.5.0 1.3.6.1.2.1.1.9.0");
        writeln!(stream, "1 ERR 2 2 noSuchName").unwrap();
    });

    let agent = TcpAgent::new("127.0.0.1", port).with_timeout(Duration::from_secs(2));
    let err = agent
        .fetch_many(&[oid("1.3.6.1.2.1.1.5.0"), oid("1.3.6.1.2.1.1.9.0")])
        .unwrap_err();
    bridge.join().expect("bridge thread");

    assert_eq!(
        err,
        EngineError::Agent {
            status: 2,
            index: 2,
            text: "noSuchName".to_owned()
        }
    );
}

#[test]
fn mismatched_response_id_is_malformed() {
    let (port, bridge) = spawn_bridge(|stream, reader| {
        read_request(reader).expect("get request");
        // The client hangs up after the status line.
        let _ = stream.write_all(b"7 OK\n1.3.6.1.2.1.1.5.0 = edge-1\nEND\n");
    });

    let agent = TcpAgent::new("127.0.0.1", port).with_timeout(Duration::from_secs(2));
    let err = agent.fetch(&oid("1.3.6.1.2.1.1.5.0")).unwrap_err();
    bridge.join().expect("bridge thread");

    assert!(matches!(err, EngineError::Malformed(_)));
}
