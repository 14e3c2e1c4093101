//! Transport configuration and per-handle request defaults.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};

/// Default user agent sent with every request.
pub const USER_AGENT: &str = concat!("reclient/", env!("CARGO_PKG_VERSION"));

/// Connect timeout for new connections.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for a whole request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// How long an idle pooled connection is kept alive.
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Maximum idle connections kept per host.
pub const POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Maximum redirects followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

// ---------------------------------------------------------------------------
// ClientConfig -- transport build settings
// ---------------------------------------------------------------------------

/// Settings applied when the underlying `reqwest::Client` is built.
///
/// These are fixed for the lifetime of the transport. Per-request defaults
/// that can change after construction live in [`RequestDefaults`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Duration,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
    #[serde(default = "default_pool_idle_timeout")]
    pub pool_idle_timeout: Duration,
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Skip TLS certificate verification. Intended for test servers only.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout: CONNECT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
            pool_idle_timeout: POOL_IDLE_TIMEOUT,
            pool_max_idle_per_host: POOL_MAX_IDLE_PER_HOST,
            max_redirects: MAX_REDIRECTS,
            accept_invalid_certs: false,
        }
    }
}

impl ClientConfig {
    /// Apply these settings to a `reqwest::ClientBuilder`.
    pub fn apply(&self, builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        let redirect = if self.max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(self.max_redirects)
        };
        builder
            .user_agent(self.user_agent.clone())
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .redirect(redirect)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
    }
}

fn default_user_agent() -> String {
    USER_AGENT.to_string()
}

fn default_connect_timeout() -> Duration {
    CONNECT_TIMEOUT
}

fn default_request_timeout() -> Duration {
    REQUEST_TIMEOUT
}

fn default_pool_idle_timeout() -> Duration {
    POOL_IDLE_TIMEOUT
}

fn default_pool_max_idle() -> usize {
    POOL_MAX_IDLE_PER_HOST
}

fn default_max_redirects() -> usize {
    MAX_REDIRECTS
}

// ---------------------------------------------------------------------------
// RequestDefaults -- mutable per-handle defaults
// ---------------------------------------------------------------------------

/// Defaults a [`ClientHandle`](crate::ClientHandle) applies to every request
/// it builds.
///
/// Mutated through `ClientHandle::configure` and the `set_*` methods.
/// Intended to be settled before the handle is shared across concurrent
/// callers; mutation is not synchronized against in-flight issuance.
#[derive(Debug, Clone, Default)]
pub struct RequestDefaults {
    /// Headers attached to every request.
    pub headers: HeaderMap,
    /// Per-request timeout override. `None` uses the transport-level timeout.
    pub timeout: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout, CONNECT_TIMEOUT);
        assert_eq!(config.request_timeout, REQUEST_TIMEOUT);
        assert_eq!(config.max_redirects, MAX_REDIRECTS);
        assert!(!config.accept_invalid_certs);
        assert!(config.user_agent.starts_with("reclient/"));
    }

    #[test]
    fn test_apply_builds_client() {
        let config = ClientConfig::default();
        let client = config.apply(reqwest::Client::builder()).build();
        assert!(client.is_ok());
    }

    #[test]
    fn test_config_roundtrips_through_serde() {
        let mut config = ClientConfig::default();
        config.pool_max_idle_per_host = 4;
        let json = serde_json::to_string(&config).unwrap();
        let back: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pool_max_idle_per_host, 4);
        assert_eq!(back.connect_timeout, config.connect_timeout);
    }
}
