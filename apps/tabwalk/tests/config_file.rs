// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Validate tabwalk config file loading and overrides.
// Author: Lukas Bower

use std::fs;
use std::time::Duration;

use tabwalk::{load_config, AgentVersion, ClientConfig, ConfigOverrides};

#[test]
fn loads_config_file_with_overrides() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("tabwalk.toml");
    fs::write(
        &path,
        r#"
[target]
host = "10.0.0.7"
community = "ops"
version = "v1"

[transport]
timeout_ms = 1500

[walk]
max_repetitions = 50
workers = 2
"#,
    )
    .expect("write config");

    let config = load_config(&path).expect("config loads");
    assert_eq!(config.target.host, "10.0.0.7");
    assert_eq!(config.target.port, 161);
    assert_eq!(config.target.version, AgentVersion::V1);
    assert_eq!(config.transport.timeout(), Duration::from_millis(1500));
    assert_eq!(config.walk.walk_config().max_repetitions, 50);

    let overridden = config
        .with_overrides(&ConfigOverrides {
            port: Some(1161),
            workers: Some(8),
            ..ConfigOverrides::default()
        })
        .expect("overrides valid");
    assert_eq!(overridden.target.port, 1161);
    assert_eq!(overridden.walk.workers, 8);
    assert_eq!(overridden.target.community, "ops");
}

#[test]
fn unknown_keys_are_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("tabwalk.toml");
    fs::write(&path, "[target]\nhostname = \"x\"\n").expect("write config");

    let err = load_config(&path).unwrap_err();
    assert!(format!("{err:#}").contains("hostname"));
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("absent.toml");
    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
    assert_eq!(ClientConfig::default().target.port, 161);
}
