use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Debug, Subcommand, PartialEq)]
pub(crate) enum Command {
    /// Load the settings and report records that would be dropped.
    Check {
        /// The directory containing settings.yaml
        #[clap(short, long)]
        settings: Option<PathBuf>,
    },
    /// Rewrite the settings with bad records removed.
    Normalize {
        /// The directory containing settings.yaml
        #[clap(short, long)]
        settings: Option<PathBuf>,
        /// Print the result instead of saving it
        #[arg(long)]
        dry_run: bool,
    },
    /// Drive a virtual pad through the polling loop and print its reports.
    Demo {
        /// Number of frames to run
        #[arg(short, long, default_value_t = 120)]
        frames: u32,
        /// Milliseconds between frames
        #[arg(long, default_value_t = 16)]
        interval: u64,
    },
}

/// Input device binding engine for an emulated console pad.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Turn debugging information on
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// The command to run
    #[clap(subcommand)]
    pub command: Command,
}
