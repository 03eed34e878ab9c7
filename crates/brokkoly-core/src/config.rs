//! Server configuration.
//!
//! The binary fills this from CLI flags and `BROKKOLY_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

use crate::impls::MEMORY_SCHEME;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Opaque broker location handed to the broker connector.
    pub broker_url: String,
    /// Serve static assets from here before the embedded ones.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            broker_url: MEMORY_SCHEME.to_string(),
            static_dir: None,
        }
    }
}
