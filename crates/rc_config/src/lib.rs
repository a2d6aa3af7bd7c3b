//! Configuration for the relay and its clients.
//!
//! Values are layered: environment variables override the configuration
//! file, which overrides the built-in defaults.
//!
//! ```toml
//! [relay]
//! listen = "0.0.0.0:3000"
//! api_base = "https://chat.example.com/api"
//!
//! [client]
//! relay_url = "http://127.0.0.1:3000/api/chat/stream"
//! placeholder = "Thinking..."
//! ```

mod error;

use std::{net::SocketAddr, path::Path};

use confique::Config as Confique;
use tracing::debug;

pub use crate::error::Error;
use crate::error::Result;

/// Default location of the configuration file, relative to the working
/// directory.
pub const DEFAULT_FILE: &str = "rc.toml";

#[derive(Debug, Clone, PartialEq, Confique)]
pub struct Config {
    #[config(nested)]
    pub relay: RelayConfig,

    #[config(nested)]
    pub client: ClientConfig,
}

/// Settings for `rc serve`.
#[derive(Debug, Clone, PartialEq, Confique)]
pub struct RelayConfig {
    /// Address the relay listens on.
    #[config(env = "RC_LISTEN", default = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// Full URL of the backend streaming endpoint.
    ///
    /// Takes precedence over `api_base`.
    #[config(env = "RC_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Base URL of the backend API. The streaming path is appended to it.
    #[config(env = "RC_API_BASE")]
    pub api_base: Option<String>,
}

/// Settings for `rc ask`.
#[derive(Debug, Clone, PartialEq, Confique)]
pub struct ClientConfig {
    /// Streaming endpoint of the relay.
    #[config(env = "RC_RELAY_URL", default = "http://127.0.0.1:3000/api/chat/stream")]
    pub relay_url: String,

    /// Shown in place of the reply until its first fragment arrives.
    #[config(default = "Thinking...")]
    pub placeholder: String,
}

impl Config {
    /// Load the configuration, reading `file` if it exists.
    pub fn load(file: &Path) -> Result<Self> {
        debug!(file = %file.display(), exists = file.is_file(), "Loading configuration.");

        Ok(Self::builder().env().file(file).load()?)
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
