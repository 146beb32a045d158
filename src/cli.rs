use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "raster-index")]
#[command(about = "Spectral index and unmixing time series for reflectance stacks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Worker threads (default: number of logical CPUs)
    #[arg(short = 'j', long, global = true)]
    pub threads: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a JSON job: stack, sensor bands, indices, SMA options, output
    Batch {
        /// Job configuration file
        config: PathBuf,
    },

    /// List the supported indices with their bands and references
    List,
}
