use serde::Deserialize;
use std::path::PathBuf;

use super::ServerConfig;

/// Complete YAML configuration structure
///
/// All fields are optional; whatever is present overrides the value loaded
/// from the environment.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///
/// seedtts:
///   endpoint: "wss://openspeech.bytedance.com/api/v1/tts/ws_binary"
///   app_id: "your-app-id"
///   token: "your-token"
///   cluster: "volcano_icl"
///   voice_type: "S_xyiql9xn1"
///   encoding: "pcm"
///   sample_rate: 16000
///   max_attempts: 2
///
/// relay:
///   chunk_size: 512
///   skip_leading_chunk: false
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub seedtts: Option<SeedTtsYaml>,
    pub relay: Option<RelayYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// SeedTTS settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SeedTtsYaml {
    pub endpoint: Option<String>,
    pub app_id: Option<String>,
    pub token: Option<String>,
    pub cluster: Option<String>,
    pub uid: Option<String>,
    pub voice_type: Option<String>,
    pub encoding: Option<String>,
    pub sample_rate: Option<u32>,
    pub speed_ratio: Option<f32>,
    pub volume_ratio: Option<f32>,
    pub pitch_ratio: Option<f32>,
    pub language: Option<String>,
    pub max_attempts: Option<u32>,
}

/// Relay settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RelayYaml {
    pub chunk_size: Option<usize>,
    pub skip_leading_chunk: Option<bool>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }

    /// Overwrite every field of `config` that this file sets.
    pub fn apply(self, config: &mut ServerConfig) {
        if let Some(server) = self.server {
            set(&mut config.host, server.host);
            set(&mut config.port, server.port);
        }

        if let Some(seedtts) = self.seedtts {
            let target = &mut config.seedtts;
            set(&mut target.endpoint, seedtts.endpoint);
            set(&mut target.app_id, seedtts.app_id);
            set(&mut target.token, seedtts.token);
            set(&mut target.cluster, seedtts.cluster);
            set(&mut target.uid, seedtts.uid);
            set(&mut target.voice_type, seedtts.voice_type);
            set(&mut target.encoding, seedtts.encoding);
            set(&mut target.sample_rate, seedtts.sample_rate);
            set(&mut target.speed_ratio, seedtts.speed_ratio);
            set(&mut target.volume_ratio, seedtts.volume_ratio);
            set(&mut target.pitch_ratio, seedtts.pitch_ratio);
            set(&mut target.language, seedtts.language);
            set(&mut target.max_attempts, seedtts.max_attempts);
        }

        if let Some(relay) = self.relay {
            set(&mut config.relay.chunk_size, relay.chunk_size);
            set(&mut config.relay.skip_leading_chunk, relay.skip_leading_chunk);
        }
    }
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}
