//! Command-line interface.
//!
//! `build` compiles once, `watch` rebuilds until interrupted and
//! `candidates` prints what the tokenizer finds in the project.

pub mod formatting;

#[cfg(test)]
mod tests;

use std::{future::Future, path::PathBuf, sync::Arc};

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use crate::{
    candidates::{CandidateSet, ClassTokenizer, extract_candidates},
    core::WindsmithError,
    session::{BuildSession, SessionOptions},
    sources::SourceRegistry,
};

use formatting::{CandidateReport, format_candidates, format_diagnostic};

/// Utility-class stylesheet compiler
#[derive(Debug, Parser)]
#[command(name = "windsmith", version, about)]
pub struct Cli {
    /// Also write logs to daily-rotated files in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile the stylesheet once
    Build(BuildArgs),
    /// Recompile whenever sources or theme inputs change
    Watch(BuildArgs),
    /// Print the candidates a build would see
    Candidates(CandidatesArgs),
}

/// Arguments shared by `build` and `watch`
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Root stylesheet
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Project root scanned for sources; the working directory when omitted
    #[arg(short, long)]
    pub root: Option<PathBuf>,
}

impl BuildArgs {
    fn options(&self) -> SessionOptions {
        let mut options = SessionOptions::new(&self.input);
        if let Some(output) = &self.output {
            options = options.with_output(output);
        }
        if let Some(root) = &self.root {
            options = options.with_root(root);
        }
        options
    }
}

/// Arguments for `candidates`
#[derive(Debug, Args)]
pub struct CandidatesArgs {
    /// Project root; the working directory when omitted
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Root stylesheet whose declared sources are included
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Print a JSON report
    #[arg(long)]
    pub json: bool,
}

/// Runs a parsed command.
///
/// # Errors
/// Returns the error that ended the command. In `watch` only startup errors
/// end the command.
pub async fn run(command: Command) -> Result<(), WindsmithError> {
    match command {
        Command::Build(args) => {
            let report = BuildSession::new(args.options()).build().await?;
            for diagnostic in &report.diagnostics {
                eprintln!("{}", format_diagnostic(diagnostic));
            }
            Ok(())
        }
        Command::Watch(args) => {
            BuildSession::new(args.options())
                .watch(until_interrupted(tokio::signal::ctrl_c()))
                .await
        }
        Command::Candidates(args) => candidates(args).await,
    }
}

/// Resolves once `signal` fires. If the signal cannot be listened for, it
/// never resolves and the process runs until killed.
pub(crate) async fn until_interrupted(signal: impl Future<Output = std::io::Result<()>>) {
    match signal.await {
        Ok(()) => info!("Interrupted"),
        Err(err) => {
            warn!(error = %err, "Cannot listen for Ctrl-C, watching until killed");
            std::future::pending::<()>().await;
        }
    }
}

async fn candidates(args: CandidatesArgs) -> Result<(), WindsmithError> {
    let (snapshot, files) = match &args.input {
        Some(input) => {
            let mut options = SessionOptions::new(input);
            if let Some(root) = &args.root {
                options = options.with_root(root);
            }
            BuildSession::new(options).candidates().await?
        }
        None => {
            let root = match &args.root {
                Some(root) => root.clone(),
                None => std::env::current_dir()?,
            };
            let files = SourceRegistry::for_project(root).matcher()?.scan();
            let extraction = extract_candidates(&files, Arc::new(ClassTokenizer)).await;
            let set: CandidateSet = extraction.candidates.into_iter().collect();
            (set.snapshot(), files)
        }
    };

    let report = CandidateReport {
        files: files.len(),
        candidates: snapshot.iter().collect(),
    };
    let output = format_candidates(&report, args.json).map_err(|err| {
        WindsmithError::Generation {
            details: err.to_string(),
        }
    })?;
    println!("{output}");
    Ok(())
}
