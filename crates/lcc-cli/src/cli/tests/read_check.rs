use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn cli_parse_check() {
    match parse(&["lcc", "check"]) {
        CliCommand::Check => {}
        _ => panic!("expected Check"),
    }
}

#[test]
fn cli_parse_read_defaults() {
    match parse(&["lcc", "read", "users"]) {
        CliCommand::Read {
            stream,
            full_refresh,
            state,
        } => {
            assert_eq!(stream, "users");
            assert!(!full_refresh);
            assert!(state.is_none());
        }
        _ => panic!("expected Read"),
    }
}

#[test]
fn cli_parse_read_full_refresh_with_state() {
    match parse(&["lcc", "read", "users", "--full-refresh", "--state", "s.json"]) {
        CliCommand::Read {
            full_refresh,
            state,
            ..
        } => {
            assert!(full_refresh);
            assert_eq!(state, Some(PathBuf::from("s.json")));
        }
        _ => panic!("expected Read"),
    }
}

#[test]
fn cli_parse_global_config_flag() {
    let cli = Cli::try_parse_from(["lcc", "read", "users", "--config", "/tmp/lcc.toml"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/lcc.toml")));
    let cli = Cli::try_parse_from(["lcc", "--config", "c.toml", "check"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
}

#[test]
fn cli_parse_read_requires_stream() {
    assert!(Cli::try_parse_from(["lcc", "read"]).is_err());
}
