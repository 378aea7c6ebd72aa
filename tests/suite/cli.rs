//! End-to-end runs of the `sandpool` binary against a temporary database.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

fn sandpool(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sandpool"))
        .args(args)
        .env("HOME", home)
        .env("SANDPOOL_DB_PATH", home.join("pool.db"))
        .env_remove("ACCOUNT_DB")
        .env_remove("LEASE_DB")
        .env_remove("RUST_LOG")
        .output()
        .expect("run sandpool")
}

fn json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn account_lifecycle_and_exit_codes() {
    let home = tempfile::tempdir().unwrap();
    let home = home.path();

    let put = sandpool(home, &["accounts", "put", "222", "Ready"]);
    assert!(put.status.success());
    assert_eq!(json(&put), Value::Null);

    let leased = sandpool(home, &["accounts", "transition", "222", "Ready", "Leased"]);
    assert!(leased.status.success());
    assert_eq!(json(&leased)["AccountStatus"], "Leased");

    let again = sandpool(home, &["accounts", "transition", "222", "Ready", "Leased"]);
    assert_eq!(again.status.code(), Some(3));

    let refused = sandpool(home, &["accounts", "delete", "222"]);
    assert_eq!(refused.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&refused.stderr).contains("account is leased"));

    let missing = sandpool(home, &["accounts", "get", "nope"]);
    assert_eq!(missing.status.code(), Some(2));

    let usage = sandpool(home, &["accounts", "transition", "222"]);
    assert_eq!(usage.status.code(), Some(1));
}

#[test]
fn lease_commands_share_the_database() {
    let home = tempfile::tempdir().unwrap();
    let home = home.path();

    assert!(sandpool(home, &["leases", "put", "111", "222", "Active"]).status.success());
    let by_principal = sandpool(home, &["leases", "principal", "222"]);
    assert_eq!(json(&by_principal).as_array().map(Vec::len), Some(1));

    let locked = sandpool(home, &["leases", "transition", "111", "222", "Active", "ResetLock"]);
    assert_eq!(json(&locked)["LeaseStatus"], "ResetLock");

    assert!(sandpool(home, &["leases", "delete", "111", "222"]).status.success());
    assert_eq!(
        sandpool(home, &["leases", "delete", "111", "222"]).status.code(),
        Some(2)
    );
}

#[test]
fn memory_backend_is_refused() {
    let home = tempfile::tempdir().unwrap();
    let home = home.path();
    let config = home.join("config.toml");
    std::fs::write(&config, "[store]\nbackend = \"memory\"\n").unwrap();

    let config = config.to_string_lossy();
    let output = sandpool(home, &["--config", &config, "accounts", "list"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("memory backend"));
}
