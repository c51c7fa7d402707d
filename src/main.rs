use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use markerkit::{init_logging, load_config, open_area, read_state, summarize, write_state};

#[derive(Parser)]
#[command(name = "markerkit", version = markerkit::VERSION)]
#[command(about = "Inspect and transform saved annotation marker areas", long_about = None)]
struct Cli {
    /// Config file (.toml or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary of a saved marker area
    Inspect {
        file: PathBuf,
    },

    /// Rescale every marker to a new surface size
    Scale {
        file: PathBuf,

        /// New surface width
        #[arg(long)]
        width: f64,

        /// New surface height
        #[arg(long)]
        height: f64,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect { file } => {
            let state = read_state(&file)?;
            for line in summarize(&state) {
                println!("{line}");
            }
        }
        Commands::Scale {
            file,
            width,
            height,
            output,
        } => {
            let mut area = open_area(&file, &config)?;
            if !area.resize_surface(width, height) {
                bail!("Surface size must be positive, got {}x{}", width, height);
            }
            let state = area.get_state();
            match output {
                Some(path) => write_state(&state, &path)?,
                None => println!("{}", state.to_json()?),
            }
        }
    }

    Ok(())
}
