use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use telar_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "telar")]
#[command(author, version, about = "Play Telar scrollytelling stories in the terminal")]
struct Cli {
    /// Config file (defaults to ~/.config/telar/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a story in the terminal
    Play {
        /// Story JSON file
        story: PathBuf,
        /// URL of the page the story is served from
        #[arg(long)]
        page_url: Option<String>,
    },
    /// Print the parsed step table
    Steps {
        /// Story JSON file
        story: PathBuf,
    },
    /// Validate a story file and report issues
    Check {
        /// Story JSON file
        story: PathBuf,
        /// URL of the page the story is served from
        #[arg(long)]
        page_url: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    match cli.command {
        Commands::Play { story, page_url } => {
            if let Some(url) = page_url {
                config.site.page_url = url;
            }
            // The terminal belongs to the UI, so logs go to a file
            init_file_logging(&config)?;
            commands::play::run(config, &story).await
        }
        Commands::Steps { story } => {
            init_logging(&config);
            commands::steps::run(&story)
        }
        Commands::Check { story, page_url } => {
            if let Some(url) = page_url {
                config.site.page_url = url;
            }
            init_logging(&config);
            commands::check::run(&config, &story)
        }
        Commands::Config => {
            init_logging(&config);
            commands::config::run(&config, cli.config.as_deref())
        }
    }
}

fn env_filter(config: &AppConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.general.log_level))
}

fn init_logging(config: &AppConfig) {
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn init_file_logging(config: &AppConfig) -> Result<()> {
    let data_dir = config.data_dir();
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    let log_path = config.log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}
