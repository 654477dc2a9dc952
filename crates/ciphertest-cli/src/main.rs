//! ciphertest CLI: run and author encryption tests from a terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "ciphertest", version, about = "Timed symbol-to-digit encryption test")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take the test interactively; type digits and press enter
    Run {
        /// Server payload JSON (not needed if the progress file holds one)
        #[arg(long)]
        payload: Option<PathBuf>,

        /// Saved progress JSON; read on start and updated on completion
        #[arg(long)]
        progress: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for completion records
        #[arg(long, default_value = "./ciphertest-results")]
        output: PathBuf,
    },

    /// Print the decrypted answer key of a payload
    Decrypt {
        /// Server payload JSON
        #[arg(long)]
        payload: PathBuf,
    },

    /// Build a payload from a plaintext key grid
    Encode {
        /// Key grid JSON, e.g. [[1,2,3],[4,5,6]]
        #[arg(long)]
        key: PathBuf,

        /// Mask digits (comma-separated)
        #[arg(long)]
        mask: String,

        /// Write the payload here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check that a payload can drive a test
    Validate {
        /// Server payload JSON
        #[arg(long)]
        payload: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and sample payload
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ciphertest=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            payload,
            progress,
            config,
            output,
        } => commands::run::execute(payload, progress, config, output).await,
        Commands::Decrypt { payload } => commands::decrypt::execute(payload),
        Commands::Encode { key, mask, output } => commands::encode::execute(key, mask, output),
        Commands::Validate { payload, config } => commands::validate::execute(payload, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
