//! Binary smoke tests: help, version, completions, and the paths that exit
//! before the terminal UI starts.

mod common;

use std::fs;

#[test]
fn help_lists_flags() {
    let result = common::run_cli_case("help_lists_flags", &["--help"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    for flag in ["--cache-path", "--log-file", "--debug", "--clean-cache-only"] {
        assert!(
            result.stdout.contains(flag),
            "missing {flag}; log: {}",
            result.log_path.display()
        );
    }
}

#[test]
fn version_subcommand_prints_version() {
    let result = common::run_cli_case("version_subcommand", &["version", "--verbose"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains(env!("CARGO_PKG_VERSION")));
    assert!(result.stdout.contains("package: clickup_tui"));
}

#[test]
fn completions_emit_script() {
    let result = common::run_cli_case("completions_bash", &["completions", "bash"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("clickup-tui"));
}

#[test]
fn clean_cache_only_exits_without_token() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("cache");
    fs::create_dir_all(cache.join("teams")).unwrap();
    fs::write(cache.join("teams").join("teams.json"), "{}").unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();
    let log = dir.path().join("ctu.log");

    let result = common::run_cli_case(
        "clean_cache_only",
        &[
            "--config",
            config.to_str().unwrap(),
            "--cache-path",
            cache.to_str().unwrap(),
            "--log-file",
            log.to_str().unwrap(),
            "--clean-cache-only",
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("Cache cleared"));
    assert!(!cache.join("teams").join("teams.json").exists());
    assert!(log.exists());
}

#[test]
fn missing_token_is_a_user_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[api]\ntoken = \"\"\n").unwrap();
    let cache = dir.path().join("cache");
    let log = dir.path().join("ctu.log");

    let result = common::run_cli_case(
        "missing_token",
        &[
            "--config",
            config.to_str().unwrap(),
            "--cache-path",
            cache.to_str().unwrap(),
            "--log-file",
            log.to_str().unwrap(),
        ],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("CTU-1004"));
}

#[test]
fn missing_explicit_config_is_a_user_error() {
    let result = common::run_cli_case(
        "missing_config",
        &["--config", "/nonexistent/clickup-tui/config.toml", "--clean-cache-only"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("CTU-1002"));
}

#[test]
fn unusable_cache_root_is_logged_before_exit() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "file").unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();
    let log = dir.path().join("ctu.log");
    let cache = blocker.join("cache");

    let result = common::run_cli_case(
        "unusable_cache_root",
        &[
            "--config",
            config.to_str().unwrap(),
            "--cache-path",
            cache.to_str().unwrap(),
            "--log-file",
            log.to_str().unwrap(),
        ],
    );
    assert_eq!(result.status.code(), Some(2), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("CTU-3001"));
    let logged = fs::read_to_string(&log).unwrap();
    assert!(logged.contains("cache directory unusable"), "log file: {logged}");
}
