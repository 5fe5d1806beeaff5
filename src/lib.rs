//! Windsmith - utility-class stylesheet compiler.
//!
//! Windsmith reads a root stylesheet, resolves its theme from `@theme`
//! blocks and layered TOML config files, scans project sources for
//! class-like candidates and hands both to a [`Generator`](generator::Generator).
//! The main features include:
//!
//! - Theme resolution with replace and extend semantics and deferred values
//! - Source discovery honoring `.gitignore`, `@source` and `@source not`
//! - Parallel, append-only candidate extraction
//! - One-shot builds, a file watcher, and lazy dev server sessions
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use windsmith::session::{BuildSession, SessionOptions};
//!
//! # async fn run() -> windsmith::Result<()> {
//! let options = SessionOptions::new("src/app.css").with_output("dist/app.css");
//! let report = BuildSession::new(options).build().await?;
//! println!("{} bytes", report.artifact.css().len());
//! # Ok(())
//! # }
//! ```

/// Candidate tokens and their append-only set.
pub mod candidates;

/// Command-line interface.
pub mod cli;

/// Config layers and their loading.
pub mod config;

/// Rebuild scheduling for live sessions.
pub mod coordinator;

/// Core error types and result aliases.
pub mod core;

/// Stylesheet generation.
pub mod generator;

/// Root stylesheet parsing.
pub mod input;

/// Build, watch and dev sessions.
pub mod session;

/// Source registration and discovery.
pub mod sources;

/// Theme store and resolution.
pub mod theme;

/// Logging setup.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use core::{BuildMode, Result, WindsmithError};
