//! Configuration module for the SeedTTS gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//!
//! # Environment variables
//! `HOST`, `PORT`, `SEEDTTS_URL`, `SEEDTTS_APP_ID`, `SEEDTTS_TOKEN`, `SEEDTTS_CLUSTER`,
//! `SEEDTTS_UID`, `SEEDTTS_VOICE_TYPE`, `SEEDTTS_ENCODING`, `SEEDTTS_SAMPLE_RATE`,
//! `SEEDTTS_LANGUAGE`, `SEEDTTS_MAX_ATTEMPTS`, `RELAY_CHUNK_SIZE`, `RELAY_SKIP_LEADING_CHUNK`.
//!
//! # Example
//! ```rust,no_run
//! use seedtts_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

mod env;
mod yaml;

pub use yaml::{RelayYaml, SeedTtsYaml, ServerYaml, YamlConfig};

use crate::core::relay::RelayConfig;
use crate::core::tts::SeedTtsConfig;

/// Default bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 3001;

/// Server configuration
///
/// Contains everything needed to run the gateway:
/// - Server settings (host, port)
/// - SeedTTS credentials and voice settings
/// - Relay chunking settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub seedtts: SeedTtsConfig,
    pub relay: RelayConfig,
}

/// Zeroize the SeedTTS token when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        self.seedtts.token.zeroize();
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// The .env file is loaded in main.rs before this is called, so its values
    /// show up here as regular environment variables.
    ///
    /// # Errors
    /// Returns an error if a numeric or boolean variable cannot be parsed.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        env::load_from_env()
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = YamlConfig::from_file(path)?;

        let mut config = env::load_from_env()?;
        yaml_config.apply(&mut config);

        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check that the configuration can serve synthesis requests
    ///
    /// # Errors
    /// Returns an error if the SeedTTS section is incomplete or the relay
    /// chunk size is zero.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.seedtts.validate()?;

        if self.relay.chunk_size == 0 {
            return Err("relay.chunk_size must be greater than 0".into());
        }

        Ok(())
    }
}
