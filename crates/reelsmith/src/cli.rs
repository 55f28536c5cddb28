//! Command-line interface definitions.

use clap::{Parser, Subcommand};

/// Reelsmith CLI - scheduled generation and delivery of narrated video.
#[derive(Parser)]
#[command(name = "reelsmith")]
#[command(about = "Generate narrated short-form videos and pace their uploads", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the daily generation-and-delivery loop
    Run {
        /// Run a single cycle and exit instead of looping
        #[arg(long)]
        once: bool,

        /// Show detailed progress
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show pack and unit status
    Status,

    /// Show the upload timetable for retained packs
    Plan,

    /// Delete packs past the retention window
    Prune,
}
