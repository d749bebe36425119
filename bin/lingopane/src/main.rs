mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "lingopane")]
#[command(about = "Selection-translation pipeline against a Gemini-style endpoint", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a piece of text through the full pipeline
    Translate {
        /// Text to translate
        text: String,

        /// Target language (overrides the configured one)
        #[arg(long = "to")]
        target_language: Option<String>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show settings location, credential presence and feature flags
    Status,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print all settings
    Show,
    /// Print a single settings key
    Get { key: String },
    /// Set a settings key
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Translate {
            text,
            target_language,
        } => {
            commands::translate::run(&text, target_language.as_deref()).await?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config_cmd::show().await?,
            ConfigCommands::Get { key } => commands::config_cmd::get(&key).await?,
            ConfigCommands::Set { key, value } => commands::config_cmd::set(&key, &value).await?,
        },
        Commands::Status => {
            commands::status::run().await?;
        }
    }

    Ok(())
}
