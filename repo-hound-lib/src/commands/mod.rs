//! Command-line interface and orchestration for repo-hound
//!
//! This module implements the CLI commands and wires configuration, providers, the crawler,
//! and the line writer together into end-to-end scans.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **repos**: Search every configured term on every selected platform and print the URL
//!   of each unique repository
//! - **hashes**: Search the same way, but crawl each unique repository and print one MD5
//!   digest line per unique file or release asset
//! - **scan**: Do both, interleaving repository lines with their digest lines
//! - **init**: Generate a default configuration file
//! - **validate**: Check a configuration file
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. The scanning commands share one pipeline:
//!
//! 1. Parse arguments and load configuration
//! 2. Build one provider per selected platform
//! 3. Drive the scanner, which streams records to the host's output as they are found
//!
//! Configuration lives in a TOML file whose settings are merged over the built-in defaults.

mod common;
mod config;
mod host;
mod init;
mod progress_reporter;
mod run;
mod scan;
mod validate;

#[cfg(debug_assertions)]
pub use config::Config;

pub use host::Host;
#[cfg(test)]
pub use host::TestHost;
pub use init::{InitArgs, init_config};
pub use progress_reporter::ProgressReporter;
pub use run::run;
pub use scan::{ScanArgs, process_scan};
pub use validate::{ValidateArgs, validate_config};
