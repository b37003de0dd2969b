//! Command-line interface for the patient registry.
//!
//! This module provides the CLI structure for the `ptreg` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, DeleteCommand, EditCommand, ListCommand, OutputFormat, ScopeArg,
    SearchCommand, ShowCommand, StatusCommand,
};

use crate::logging::Verbosity;

/// ptreg - Keep a small register of patients
///
/// Register, edit, delete, list, and search patient records. Every change is
/// saved immediately to a local database.
#[derive(Debug, Parser)]
#[command(name = "ptreg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a new patient
    Add(AddCommand),

    /// Edit a patient's details
    Edit(EditCommand),

    /// Delete a patient
    Delete(DeleteCommand),

    /// List all patients
    List(ListCommand),

    /// Search patients
    Search(SearchCommand),

    /// Show one patient in detail
    Show(ShowCommand),

    /// Show registry and storage status
    Status(StatusCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
