//! Duel balance lab - Development Tools

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "duel-tools")]
#[command(about = "Development tools for the duel balance lab")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// Path to data directory
        #[arg(default_value = "assets/data")]
        path: String,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating data files in: {path}");
            match duel_tools::validate::validate_data_directory(std::path::Path::new(&path)) {
                Ok(report) => {
                    tracing::info!(
                        characters = report.characters,
                        arenas = report.arenas,
                        "Validation passed"
                    );
                    println!("{report}");
                }
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    if let duel_tools::validate::ValidationError::Failed(problems) = &e {
                        for problem in problems {
                            eprintln!("  {problem}");
                        }
                    }
                    std::process::exit(1);
                }
            }
        }
    }
}
