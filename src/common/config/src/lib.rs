//! Configuration management for SAQ.
//!
//! Providers are listed in a plain text file, one entry per line:
//!
//! ```text
//! # comments and blank lines are ignored
//! http://localhost:8080
//! http://localhost:8081 120
//! ```
//!
//! An optional second token overrides the poll interval (seconds) for that
//! provider. The file is created with a commented template on first run.

mod providers_file;

pub use providers_file::{load_providers_file, ProviderEntry};

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Global SAQ configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaqConfig {
    /// Polling configuration.
    pub poll: PollConfig,
    /// Query evaluation configuration.
    pub query: QueryConfig,
}

impl Default for SaqConfig {
    fn default() -> Self {
        Self {
            poll: PollConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

/// Provider polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Poll interval applied when a provider line does not name one.
    pub default_interval_secs: u64,
    /// Timeout for the `/hello` handshake.
    pub hello_timeout_secs: u64,
    /// Timeout for `/all_data` fetches.
    pub data_timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            default_interval_secs: 30,
            hello_timeout_secs: 10,
            data_timeout_secs: 30,
        }
    }
}

impl PollConfig {
    /// Default poll interval as a `Duration`.
    pub fn default_interval(&self) -> Duration {
        Duration::from_secs(self.default_interval_secs)
    }

    /// Handshake timeout as a `Duration`.
    pub fn hello_timeout(&self) -> Duration {
        Duration::from_secs(self.hello_timeout_secs)
    }

    /// Data fetch timeout as a `Duration`.
    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.data_timeout_secs)
    }
}

/// Query evaluation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Maximum link-resolution depth inside a single field access.
    pub link_depth_limit: usize,
    /// Collect and report per-operator timings.
    pub profile: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            link_depth_limit: 8,
            profile: false,
        }
    }
}

/// Default location of the providers file (`~/.saq/providers.txt`).
pub fn default_providers_path() -> PathBuf {
    let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
    home.join(".saq").join("providers.txt")
}
