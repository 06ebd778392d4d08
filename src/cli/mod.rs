//! CLI module for Periksa.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Periksa - AI-assisted receivables audit
///
/// A terminal workspace for auditing accounts receivable: upload a document
/// (PDF, image, or CSV) for a structured AI analysis, then discuss the
/// findings in chat, by keyboard or by voice.
/// The name "Periksa" comes from the Indonesian word for "examine."
#[derive(Parser, Debug)]
#[command(name = "periksa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Periksa and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Analyze one audit document and print the report
    Analyze {
        /// Path to a PDF, image, or CSV document
        file: String,

        /// Read the analysis aloud when it completes
        #[arg(long)]
        speak: bool,
    },

    /// Open the interactive audit workspace
    Chat {
        /// Document to upload and analyze on start
        #[arg(short, long)]
        document: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the active configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Open the configuration in $EDITOR
    Edit,
}
