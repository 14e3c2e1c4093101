//! Factory composing a key strategy with a client cache.

use std::sync::{Arc, OnceLock};

use tracing::debug;
use url::Url;

use crate::cache::ClientCache;
use crate::client::ClientHandle;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::key::{FullBaseUrl, HostScope, KeyStrategy};

// ---------------------------------------------------------------------------
// ClientFactory
// ---------------------------------------------------------------------------

/// Hands out cached [`ClientHandle`]s keyed by a [`KeyStrategy`].
///
/// The factory owns one strategy and one cache; [`get`](Self::get) derives a
/// key from the URL and returns the cached handle for it, lazily building one
/// from the factory's [`ClientConfig`] on first use. Construction failures
/// propagate and cache nothing.
///
/// # Examples
///
/// ```rust
/// use reclient::ClientFactory;
///
/// # fn example() -> reclient::Result<()> {
/// let factory = ClientFactory::per_host();
/// let a = factory.get("https://api.example.com/v1/users")?;
/// let b = factory.get("https://api.example.com/v2/orders")?;
/// assert!(std::sync::Arc::ptr_eq(&a, &b)); // same host, same transport
/// # Ok(())
/// # }
/// ```
pub struct ClientFactory {
    strategy: Arc<dyn KeyStrategy>,
    cache: ClientCache,
    config: ClientConfig,
}

impl ClientFactory {
    /// Factory keyed per scheme+host+port (the default scoping).
    pub fn per_host() -> Self {
        Self::with_strategy(HostScope)
    }

    /// Per-host factory with custom transport settings.
    pub fn per_host_with_config(config: ClientConfig) -> Self {
        Self::with_strategy_and_config(HostScope, config)
    }

    /// Factory keyed per full base URL.
    ///
    /// Handles from this factory come with their base target pre-set to the
    /// (normalized) URL used to obtain them, so API versions under one host
    /// get independent handles and configuration.
    pub fn per_base_url() -> Self {
        Self::with_strategy(FullBaseUrl)
    }

    /// Per-base-URL factory with custom transport settings.
    pub fn per_base_url_with_config(config: ClientConfig) -> Self {
        Self::with_strategy_and_config(FullBaseUrl, config)
    }

    /// Factory with a caller-supplied strategy, for custom scoping such as
    /// per-tenant or per-credential keying.
    pub fn with_strategy(strategy: impl KeyStrategy + 'static) -> Self {
        Self::with_strategy_and_config(strategy, ClientConfig::default())
    }

    /// Factory with a caller-supplied strategy and transport settings.
    pub fn with_strategy_and_config(
        strategy: impl KeyStrategy + 'static,
        config: ClientConfig,
    ) -> Self {
        Self {
            strategy: Arc::new(strategy),
            cache: ClientCache::new(),
            config,
        }
    }

    /// Return the cached handle for `url`, creating one if needed.
    ///
    /// Fails with [`Error::InvalidUrl`] on unparseable input and
    /// [`Error::ConstructionFailed`] if the transport cannot be built (in
    /// which case nothing is cached and a later call retries).
    pub fn get(&self, url: &str) -> Result<Arc<ClientHandle>> {
        let parsed = Url::parse(url).map_err(|e| Error::invalid_url(url, e))?;
        let key = self.strategy.derive_key(&parsed);

        self.cache.get_or_create(&key, || {
            debug!(key = %key, "Creating client handle");
            let handle = ClientHandle::new(&self.config)?;
            if let Some(base) = self.strategy.base_url(&parsed) {
                handle.set_base(base);
            }
            Ok(handle)
        })
    }

    /// The cache backing this factory.
    pub fn cache(&self) -> &ClientCache {
        &self.cache
    }

    /// Close every cached handle and clear the cache.
    pub fn dispose_all(&self) {
        self.cache.dispose_all();
    }
}

impl Default for ClientFactory {
    fn default() -> Self {
        Self::per_host()
    }
}

impl std::fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFactory")
            .field("cache", &self.cache)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Process-wide default factory
// ---------------------------------------------------------------------------

static DEFAULT_FACTORY: OnceLock<ClientFactory> = OnceLock::new();

/// The process-wide per-host factory, initialized on first use.
pub fn default_factory() -> &'static ClientFactory {
    DEFAULT_FACTORY.get_or_init(ClientFactory::per_host)
}

/// Fetch a handle for `url` from the process-wide default factory.
pub fn get(url: &str) -> Result<Arc<ClientHandle>> {
    default_factory().get(url)
}

/// Close every handle in the process-wide default factory.
///
/// Meant for application shutdown hooks. The factory itself stays usable;
/// later lookups rebuild their transports.
pub fn shutdown() {
    if let Some(factory) = DEFAULT_FACTORY.get() {
        factory.dispose_all();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
