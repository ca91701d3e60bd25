use std::env;
use std::fmt::Display;
use std::str::FromStr;

use super::{DEFAULT_HOST, DEFAULT_PORT, ServerConfig};
use crate::core::relay::RelayConfig;
use crate::core::tts::SeedTtsConfig;

/// Build a configuration from environment variables over defaults.
pub(super) fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut seedtts = SeedTtsConfig::default();
    set(&mut seedtts.endpoint, env_string("SEEDTTS_URL"));
    set(&mut seedtts.app_id, env_string("SEEDTTS_APP_ID"));
    set(&mut seedtts.token, env_string("SEEDTTS_TOKEN"));
    set(&mut seedtts.cluster, env_string("SEEDTTS_CLUSTER"));
    set(&mut seedtts.uid, env_string("SEEDTTS_UID"));
    set(&mut seedtts.voice_type, env_string("SEEDTTS_VOICE_TYPE"));
    set(&mut seedtts.encoding, env_string("SEEDTTS_ENCODING"));
    set(&mut seedtts.sample_rate, env_parse("SEEDTTS_SAMPLE_RATE")?);
    set(&mut seedtts.language, env_string("SEEDTTS_LANGUAGE"));
    set(&mut seedtts.max_attempts, env_parse("SEEDTTS_MAX_ATTEMPTS")?);

    let mut relay = RelayConfig::default();
    set(&mut relay.chunk_size, env_parse("RELAY_CHUNK_SIZE")?);
    set(&mut relay.skip_leading_chunk, env_bool("RELAY_SKIP_LEADING_CHUNK")?);

    Ok(ServerConfig {
        host: env_string("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: env_parse("PORT")?.unwrap_or(DEFAULT_PORT),
        seedtts,
        relay,
    })
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Non-empty value of `name`.
fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: Display,
{
    env_string(name)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| format!("Invalid {name} value '{value}': {e}"))
        })
        .transpose()
}

fn env_bool(name: &str) -> Result<Option<bool>, String> {
    env_string(name)
        .map(|value| match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(format!("Invalid {name} value '{other}': expected true or false")),
        })
        .transpose()
}
