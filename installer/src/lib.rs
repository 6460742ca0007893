//! Liquibase installer library.
//!
//! This crate provides the core functionality for detecting the host
//! platform, resolving a Liquibase release, and installing it with a launcher
//! on the command search path. It is used by the `liquibase-installer` CLI
//! binary and can be consumed programmatically for testing or custom
//! installation workflows.
//!
//! Work flows strictly forward through four stages:
//!
//! 1. [`platform`] maps the running system to a platform tag.
//! 2. [`release`] turns a version selector and edition into a concrete
//!    version and download URL.
//! 3. [`pipeline`] downloads, verifies, extracts, and places the payload.
//! 4. [`environment`] puts the launcher on `PATH` and verifies it runs.
//!
//! # Modules
//!
//! - [`artefact`] - Download, checksum, extraction, and payload discovery
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Immutable run configuration from CLI and environment
//! - [`deps`] - Command execution and Java runtime checks
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`environment`] - PATH persistence and post-install verification
//! - [`error`] - Semantic error types with recovery hints
//! - [`launcher`] - Launcher link and wrapper script creation
//! - [`logging`] - Stderr backend for the `log` facade
//! - [`output`] - Leveled reporter and dry-run/summary formatting
//! - [`pipeline`] - Artifact installation orchestration
//! - [`platform`] - Operating system and architecture detection
//! - [`release`] - Version, edition, and release index resolution
//! - [`stager`] - Replace-in-place copy into the library directory
//! - [`target`] - System, user, or custom install prefix selection

pub mod artefact;
pub mod cli;
pub mod config;
pub mod deps;
pub mod dirs;
pub mod environment;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod release;
pub mod stager;
pub mod target;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
