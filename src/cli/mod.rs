//! CLI module for armctl - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for full task runs,
//! single-skill execution, homing, and plan inspection.

pub mod commands;

pub use commands::Cli;
