use clap::{Parser, Subcommand};
use cli::{run_extraction, RunConfig};
use color_eyre::eyre::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the region vocabulary of every image in a directory
    Extract {
        /// Directory of preprocessed grayscale images
        #[arg(short, long)]
        input: PathBuf,
        /// Output directory for the vocabulary matrix and failure lists
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Also write an overlay of the selected region for every image
        #[arg(long)]
        visualize: bool,
        /// TOML or JSON file with selection thresholds
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Process images one after another instead of on all cores
        #[arg(long)]
        sequential: bool,
    },
    /// Run an extraction described entirely by a configuration file
    Run {
        /// Path to the TOML or JSON run configuration
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the JSON schema of the run configuration
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Extract {
            input,
            output_dir,
            visualize,
            config,
            sequential,
        } => {
            let mut run_config = match config {
                Some(path) => RunConfig::from_file(path)?,
                None => RunConfig::new(String::new(), String::new()),
            };
            // Command-line flags take precedence over the file
            run_config.input_path = input.to_string_lossy().to_string();
            run_config.output_dir = output_dir.to_string_lossy().to_string();
            run_config.visualize |= *visualize;
            if *sequential {
                run_config.parallel = false;
            }
            extract(&run_config)?;
        }
        Commands::Run { config } => {
            let run_config = RunConfig::from_file(config)?;
            extract(&run_config)?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&RunConfig::schema())?);
        }
    }

    Ok(())
}

fn extract(config: &RunConfig) -> Result<()> {
    info!("Input: {}", config.input_path);
    info!("Thresholds: {:?}", config.thresholds);

    let result = run_extraction(config)?;

    let failed = result.failure_indices();
    if failed.is_empty() {
        info!("✅ All {} images produced a vocabulary vector", result.len());
    } else {
        warn!(
            "{} of {} images failed: {:?}",
            failed.len(),
            result.len(),
            failed
        );
    }
    info!("📄 Results saved to: {:?}", Path::new(&config.output_dir));

    Ok(())
}
