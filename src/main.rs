// src/main.rs
use anyhow::Result;
use clap::Parser;

use raster_index::batch::process_batch;
use raster_index::cli::{Cli, Commands};
use raster_index::processing::CATALOG;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match &cli.command {
        Commands::Batch { config } => {
            process_batch(config, cli.threads)?;
            println!("Processing complete: {}", config.display());
        }
        Commands::List => {
            for entry in CATALOG {
                let bands: Vec<_> = entry.bands.iter().map(|b| b.as_str()).collect();
                println!("{:<10} {:<34} [{}]", entry.name, entry.family, bands.join(", "));
                if let Some(citation) = entry.citation {
                    println!("{:<10} {}", "", citation.reference());
                }
            }
        }
    }

    Ok(())
}
