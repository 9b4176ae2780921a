//! HTTP client for the provider surface.
//!
//! Providers expose two endpoints: `GET /hello` describing the provider,
//! and `GET /all_data` returning a JSON array of SAO maps. Status is the
//! only error signal; non-2xx bodies are ignored.

use std::time::Duration;

use serde::Deserialize;

use common_config::PollConfig;
use common_error::{SaqError, SaqResult};
use saq_core::SaObject;

/// How a provider publishes its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    /// The provider serves its full data set from `/all_data`.
    AllAtOnce,
    /// The provider expects per-scope requests. Recognized but not polled.
    OnDemand,
}

impl ProviderMode {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "ALL_AT_ONCE" => Some(Self::AllAtOnce),
            "ON_DEMAND" => Some(Self::OnDemand),
            _ => None,
        }
    }
}

/// The `/hello` handshake payload.
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    /// Provider-declared source name.
    pub name: String,
    /// Publishing mode.
    pub mode: ProviderMode,
    /// Free-form description.
    pub description: String,
    /// Provider version string.
    pub version: String,
}

#[derive(Debug, Deserialize)]
struct HelloResponse {
    name: String,
    mode: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    version: String,
}

/// Why a fetch failed, which decides what happens to the previous
/// contribution: transport failures retain it, malformed payloads clear it.
#[derive(Debug)]
pub enum FetchError {
    /// Network error, timeout, or non-2xx status.
    Transport(String),
    /// Body parsed but is not a valid SAO array.
    Malformed(String),
}

impl FetchError {
    /// Human-readable cause.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport(msg) | Self::Malformed(msg) => msg,
        }
    }
}

/// Blocking HTTP client for one provider.
#[derive(Clone)]
pub struct ProviderClient {
    base_url: String,
    agent: ureq::Agent,
    hello_timeout: Duration,
    data_timeout: Duration,
}

impl ProviderClient {
    /// Create a client for `url` with the configured timeouts.
    pub fn new(url: &str, poll: &PollConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(poll.hello_timeout())
            .build();
        Self {
            base_url: url.trim_end_matches('/').to_string(),
            agent,
            hello_timeout: poll.hello_timeout(),
            data_timeout: poll.data_timeout(),
        }
    }

    /// The provider base URL.
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// `GET /hello`: identify the provider.
    pub fn hello(&self) -> SaqResult<ProviderInfo> {
        let url = format!("{}/hello", self.base_url);
        let response = self
            .agent
            .get(&url)
            .timeout(self.hello_timeout)
            .call()
            .map_err(|e| SaqError::provider(&self.base_url, e.to_string()))?;

        let hello: HelloResponse = response
            .into_json()
            .map_err(|e| SaqError::provider(&self.base_url, format!("invalid hello: {e}")))?;
        let mode = ProviderMode::parse(&hello.mode).ok_or_else(|| {
            SaqError::provider(
                &self.base_url,
                format!("unknown provider mode '{}'", hello.mode),
            )
        })?;
        if hello.name.is_empty() {
            return Err(SaqError::provider(&self.base_url, "provider name is empty"));
        }

        Ok(ProviderInfo {
            name: hello.name,
            mode,
            description: hello.description,
            version: hello.version,
        })
    }

    /// `GET /all_data`: fetch and validate the provider's full data set.
    pub fn all_data(&self) -> Result<Vec<SaObject>, FetchError> {
        let url = format!("{}/all_data", self.base_url);
        let response = self
            .agent
            .get(&url)
            .timeout(self.data_timeout)
            .call()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let payload: serde_json::Value = response
            .into_json()
            .map_err(|e| FetchError::Malformed(format!("invalid JSON: {e}")))?;
        let serde_json::Value::Array(items) = payload else {
            return Err(FetchError::Malformed("payload is not a JSON array".to_string()));
        };

        let mut objects = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let obj = SaObject::from_json(item)
                .map_err(|e| FetchError::Malformed(format!("object {i}: {e}")))?;
            objects.push(obj);
        }
        Ok(objects)
    }
}
