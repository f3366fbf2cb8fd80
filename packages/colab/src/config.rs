use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::session::SessionConfig;

// =============================================================================
// Layered config (figment-deserialized from defaults / env vars)
// =============================================================================
//
// There is no config file. Every tunable can be set from the environment:
//
//   COLAB_SERVER__PORT=9000            →  server.port = 9000
//   COLAB_SERVER__MAX_FRAME_BYTES=4096 →  server.max_frame_bytes = 4096
//   COLAB_CLIENT__ADDRESS=host:9000    →  client.address = "host:9000"
//
// Positional CLI arguments override both layers.

pub const DEFAULT_PORT: u16 = 8080;

/// Top-level tunable configuration, deserialized by figment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerFileConfig,
    #[serde(default)]
    pub client: ClientFileConfig,
}

/// Server tunables (`COLAB_SERVER__*`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerFileConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Longest accepted frame, delimiter excluded.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Pending edits per session before the network reader waits.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for ServerFileConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_frame_bytes: default_max_frame_bytes(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Client tunables (`COLAB_CLIENT__*`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientFileConfig {
    #[serde(default = "default_address")]
    pub address: String,
    /// How often the editor wakes to notice a server disconnect.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for ClientFileConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_frame_bytes() -> usize {
    1024 * 1024
}

fn default_queue_capacity() -> usize {
    256
}

fn default_address() -> String {
    format!("localhost:{}", DEFAULT_PORT)
}

fn default_poll_interval_ms() -> u64 {
    100
}

/// Build the layered figment: struct defaults, then `COLAB_`-prefixed env vars.
///
/// Env vars use double-underscore for nesting into sections.
pub fn load_config() -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Serialized},
    };

    Figment::from(Serialized::defaults(FileConfig::default()))
        .merge(Env::prefixed("COLAB_").split("__"))
}

// =============================================================================
// Runtime config (derived from FileConfig + CLI overrides)
// =============================================================================

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// `host:port` to bind.
    pub bind_addr: String,
    pub session: SessionConfig,
}

impl ServerConfig {
    pub fn from_file(fc: &ServerFileConfig, host: Option<&str>, port: Option<u16>) -> Self {
        let host = host.unwrap_or(&fc.host);
        let port = port.unwrap_or(fc.port);
        Self {
            bind_addr: format!("{}:{}", host, port),
            session: SessionConfig {
                max_frame_bytes: fc.max_frame_bytes.max(1),
                queue_capacity: fc.queue_capacity.max(1),
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub address: String,
    pub poll_interval: Duration,
}

impl ClientConfig {
    pub fn from_file(fc: &ClientFileConfig, address: Option<&str>) -> Self {
        Self {
            address: address.unwrap_or(&fc.address).to_string(),
            poll_interval: Duration::from_millis(fc.poll_interval_ms.max(1)),
        }
    }
}

/// Parse a positional port argument. Anything that isn't a port falls back to
/// the configured one.
pub fn parse_port(arg: &str) -> Option<u16> {
    arg.trim().parse().ok()
}
