#![forbid(unsafe_code)]

//! `--config` loading end to end: a TOML file on disk drives the manager
//! settings used by every scenario.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Parser;
use recall_core::NotifyPolicy;
use recall_demo::cli::load_config;
use recall_demo::{Cli, DemoError, run};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write config");
    path
}

#[test]
fn toml_file_overrides_defaults() {
    let temp = tempdir().expect("tempdir");
    let path = write(
        temp.path(),
        "recall.toml",
        "label = \"shelf\"\nnotify = \"under_lock\"\nhistory_capacity = 4\n",
    );

    let config = load_config(&path).expect("load");
    assert_eq!(config.label, "shelf");
    assert_eq!(config.notify, NotifyPolicy::UnderLock);
    assert_eq!(config.history_capacity, 4);
}

#[test]
fn partial_file_keeps_remaining_defaults() {
    let temp = tempdir().expect("tempdir");
    let path = write(temp.path(), "recall.toml", "history_capacity = 64\n");

    let config = load_config(&path).expect("load");
    assert_eq!(config.label, "state");
    assert_eq!(config.notify, NotifyPolicy::AfterUnlock);
    assert_eq!(config.history_capacity, 64);
}

#[test]
fn scenarios_run_under_configured_policy() {
    let temp = tempdir().expect("tempdir");
    let path = write(temp.path(), "recall.toml", "notify = \"under_lock\"\n");

    let cli = Cli::parse_from([
        OsString::from("recall-demo"),
        OsString::from("--config"),
        path.into_os_string(),
    ]);
    let mut out = Vec::new();
    run(cli, &mut out).expect("run");
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("Nothing left to undo at 'Genesis' 1:1, page 1"));
    assert!(text.contains("Went back to Genesis 1:1"));
}

#[test]
fn explicit_default_label_loads_as_written() {
    let temp = tempdir().expect("tempdir");
    let path = write(temp.path(), "recall.toml", "label = \"state\"\n");

    let config = load_config(&path).expect("load");
    assert_eq!(config.label, "state");
    assert_eq!(config, recall_core::ManagerConfig::default());
}

#[test]
fn malformed_file_is_rejected() {
    let temp = tempdir().expect("tempdir");
    let path = write(temp.path(), "recall.toml", "notify = \"sometimes\"\n");

    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, DemoError::Config(_)));
    assert!(err.to_string().contains("TOML parse error"), "{err}");
}

#[test]
fn blank_label_fails_validation() {
    let temp = tempdir().expect("tempdir");
    let path = write(temp.path(), "recall.toml", "label = \"   \"\n");

    let err = load_config(&path).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("label must not be empty"), "{err}");
}
