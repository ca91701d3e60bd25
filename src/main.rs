use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use anyhow::anyhow;

use seedtts_gateway::{ServerConfig, SeedTts, routes, state::AppState};

/// SeedTTS Gateway - streaming speech synthesis client and relay server
#[derive(Parser, Debug)]
#[command(name = "seedtts-gateway")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize text into a WAV file
    Speak {
        /// Text to speak, optionally starting with an emotion tag like `<happy>`
        #[arg(short = 't', long = "text")]
        text: String,

        /// Output file path
        #[arg(short = 'o', long = "output", default_value = "output.wav")]
        output: PathBuf,
    },

    /// Run the relay server
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file or environment
    let config = if let Some(config_path) = cli.config {
        info!("Loading configuration from {}", config_path.display());
        ServerConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    config.validate().map_err(|e| anyhow!(e.to_string()))?;

    match cli.command {
        Commands::Speak { text, output } => speak(config, &text, output).await,
        Commands::Serve => serve(config).await,
    }
}

/// Capture mode: one synthesis written to disk
async fn speak(config: ServerConfig, text: &str, output: PathBuf) -> anyhow::Result<()> {
    let tts = SeedTts::new(config.seedtts.clone())?;

    match tts.synthesize_to_file(text, &output).await? {
        Some(path) => info!("Audio written to {}", path.display()),
        None => warn!("No audio received, {} not written", output.display()),
    }

    Ok(())
}

/// Relay mode: serve `/tts` until the process is stopped
async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let address = config.address();
    info!("Starting server on {}", address);

    let app_state = AppState::new(config)?;
    let app = routes::create_app(app_state);

    let listener = TcpListener::bind(&address).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
