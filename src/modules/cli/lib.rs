//! Portico CLI
//!
//! This crate provides the command-line interface for Portico including:
//! - check: Load the configuration and report every error
//! - dump: Print the canonical configuration
//! - watch: Keep the configuration loaded with hot reload
//! - init: Write an example configuration

pub mod commands;

pub use commands::{Cli, Commands, LogFormat};
