// 命令行参数

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Data directory (config.json, logs/); defaults to GAITGATE_DATA_DIR or the system data dir
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a pose recording and classify every frame
    Run {
        /// Pose recording file (JSON)
        #[arg(short, long)]
        recording: PathBuf,

        /// Minimum landmark count for a Human frame (overrides config)
        #[arg(short, long, allow_negative_numbers = true)]
        threshold: Option<i64>,

        /// Write the run report as JSON
        #[arg(long)]
        summary_out: Option<PathBuf>,

        /// Cancel the run after N frames have been processed
        #[arg(long)]
        stop_after: Option<u64>,
    },

    /// Show or edit the configuration
    Config {
        /// Set the landmark threshold
        #[arg(long, allow_negative_numbers = true)]
        set_threshold: Option<i64>,

        /// Reset to defaults
        #[arg(long, conflicts_with = "set_threshold")]
        reset: bool,
    },
}
