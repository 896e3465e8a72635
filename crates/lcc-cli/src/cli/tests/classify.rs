use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_classify_minimal() {
    match parse(&["lcc", "classify", "--status", "429"]) {
        CliCommand::Classify {
            status,
            headers,
            body,
            stream,
            now,
        } => {
            assert_eq!(status, 429);
            assert!(headers.is_empty());
            assert!(body.is_none());
            assert!(stream.is_none());
            assert!(now.is_none());
        }
        _ => panic!("expected Classify"),
    }
}

#[test]
fn cli_parse_classify_all_flags() {
    match parse(&[
        "lcc",
        "classify",
        "--status",
        "503",
        "--header",
        "Retry-After: 5",
        "--header",
        "X-RateLimit-Reset: 1700000000",
        "--body",
        "-",
        "--stream",
        "users",
        "--now",
        "1699999990.5",
    ]) {
        CliCommand::Classify {
            status,
            headers,
            body,
            stream,
            now,
        } => {
            assert_eq!(status, 503);
            assert_eq!(headers, vec!["Retry-After: 5", "X-RateLimit-Reset: 1700000000"]);
            assert_eq!(body.as_deref(), Some("-"));
            assert_eq!(stream.as_deref(), Some("users"));
            assert_eq!(now, Some(1_699_999_990.5));
        }
        _ => panic!("expected Classify"),
    }
}

#[test]
fn cli_parse_classify_requires_status() {
    assert!(Cli::try_parse_from(["lcc", "classify"]).is_err());
    assert!(Cli::try_parse_from(["lcc", "classify", "--status", "abc"]).is_err());
    assert!(Cli::try_parse_from(["lcc", "classify", "--status", "70000"]).is_err());
}
