#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]

use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;

use crate::{
    cli::{
        Cli, Command,
        until_interrupted,
        formatting::{CandidateReport, format_candidates, format_diagnostic},
    },
    core::WindsmithError,
    session::Diagnostic,
};

#[test]
fn build_flags_parse() {
    let cli = Cli::parse_from([
        "windsmith", "build", "--input", "src/app.css", "--output", "dist/app.css",
    ]);

    match cli.command {
        Command::Build(args) => {
            assert_eq!(args.input, PathBuf::from("src/app.css"));
            assert_eq!(args.output, Some(PathBuf::from("dist/app.css")));
            assert!(args.root.is_none());
        }
        other => panic!("expected build, got {other:?}"),
    }
}

#[test]
fn log_dir_is_global() {
    let cli = Cli::parse_from(["windsmith", "watch", "-i", "app.css", "--log-dir", "/tmp/logs"]);

    assert_eq!(cli.log_dir.as_deref(), Some(Path::new("/tmp/logs")));
    assert!(matches!(cli.command, Command::Watch(_)));
}

#[test]
fn build_requires_input() {
    assert!(Cli::try_parse_from(["windsmith", "build"]).is_err());
}

fn report() -> CandidateReport<'static> {
    CandidateReport {
        files: 2,
        candidates: vec!["flex", "p-4"],
    }
}

#[test]
fn candidates_print_as_json() {
    let output = format_candidates(&report(), true).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(parsed["files"], 2);
    assert_eq!(parsed["candidates"], serde_json::json!(["flex", "p-4"]));
}

#[test]
fn candidates_print_one_per_line() {
    let output = format_candidates(&report(), false).unwrap();
    assert_eq!(output, "flex\np-4");
}

#[test]
fn diagnostics_show_their_path() {
    let err = WindsmithError::extraction("/project/logo.svg", "invalid UTF-8");
    let formatted = format_diagnostic(&Diagnostic::warning(&err));

    assert!(formatted.contains("warning"));
    assert!(formatted.contains("/project/logo.svg"));
}

#[tokio::test]
async fn interrupt_ends_the_wait() {
    let signal = async { Ok::<(), io::Error>(()) };
    let waited = tokio::time::timeout(Duration::from_secs(1), until_interrupted(signal)).await;
    assert!(waited.is_ok());
}

#[tokio::test]
async fn unavailable_signal_keeps_waiting() {
    let failing = async { Err::<(), _>(io::Error::other("no signal handler")) };
    let waited = tokio::time::timeout(Duration::from_millis(200), until_interrupted(failing)).await;
    assert!(waited.is_err());
}
