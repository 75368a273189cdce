mod check_cmd;
mod ocr_cmd;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use meterline_config::{CONFIG_FILE_NAME, ensure_valid, load_credentials, load_with_overrides, process_env};
use meterline_core::LanguageHint;
use meterline_gateway::{WebhookState, build_router, start_server};
use meterline_logging::init_logger;

#[derive(Parser)]
#[command(name = "meterline")]
#[command(about = "Meterline: LINE webhook that reads meter digits from photos")]
#[command(version)]
struct Cli {
    /// Path to the YAML config file (missing file means defaults)
    #[arg(short, long, global = true, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Validate configuration and credentials, then exit
    CheckConfig,
    /// Recognize one local image and print the reply it would get
    Ocr {
        image: PathBuf,
        /// `eng` or `eng+tha`
        #[arg(short, long)]
        language: Option<LanguageHint>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env = process_env();

    let mut config = load_with_overrides(&cli.config, &env).await?;
    init_logger(&config.logging.level, config.logging.json, config.logging.dir.as_deref());

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            ensure_valid(&config)?;

            let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
                .parse()
                .with_context(|| format!("Invalid bind address: {}", config.server.bind_address))?;
            info!(
                %addr,
                webhook_path = %config.server.webhook_path,
                config = %cli.config.display(),
                "Starting Meterline"
            );

            let state = WebhookState::from_config(&config, load_credentials(&env));
            let app = build_router(state, &config.server.webhook_path);
            start_server(addr, app).await?;
        }
        Commands::CheckConfig => check_cmd::run(&config, &env)?,
        Commands::Ocr { image, language } => {
            ensure_valid(&config)?;
            ocr_cmd::run(&config, &image, language).await?;
        }
    }

    Ok(())
}
