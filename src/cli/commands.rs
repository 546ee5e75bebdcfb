//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: execute a full task (plan + all skills)
//! - skill: execute a single skill with retry/escalation
//! - home: return the arm to its home position
//! - plan: print the planned skill order without executing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// armctl - Skill execution orchestrator for a robot arm
#[derive(Parser, Debug)]
#[command(name = "armctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full task: plan it, then execute every skill in order
    Run {
        /// Task name from the configured task registry
        #[arg(short, long, default_value = "make_tea")]
        task: String,

        /// Hold-still policy and auto-approving judge, no network calls
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a single skill with retry and escalation
    Skill {
        /// Skill name from the configured catalog
        name: String,

        /// Hold-still policy and auto-approving judge, no network calls
        #[arg(long)]
        dry_run: bool,
    },

    /// Return the arm to its home position
    Home,

    /// Print the planned skill order for a task without executing it
    Plan {
        /// Task name from the configured task registry
        #[arg(short, long, default_value = "make_tea")]
        task: String,
    },
}
