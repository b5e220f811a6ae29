#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for repo-hound
//!
//! This library consolidates all functionality for the repo-hound tool, which searches public
//! code-hosting platforms for mouse-jiggler style utilities, crawls the repositories it finds, and
//! fingerprints their files and release assets.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and orchestration
//! - [`scan`]: Providers, crawling, fetching, and de-duplication
//! - [`reports`]: Line-oriented output of scan records

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub type HashSet<T> = rustc_hash::FxHashSet<T>;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub mod reports;

pub mod scan;

pub use crate::commands::{Host, run};
