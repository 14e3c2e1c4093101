//! Client handle owning one pooled HTTP transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use tracing::debug;
use url::Url;

use crate::config::{ClientConfig, RequestDefaults};
use crate::error::{Error, Result};

/// A reusable HTTP client bound to one `reqwest::Client`.
///
/// Each handle owns exactly one transport, built once at construction.
/// Reusing a handle reuses that transport's connection pool instead of
/// opening fresh sockets per request. Handles are usually obtained from a
/// [`ClientFactory`](crate::ClientFactory), which guarantees one live handle
/// per cache key, but can also be constructed directly.
///
/// Configuration (base URL, default headers, timeout override) is meant to
/// happen before the handle is shared; those mutations are not synchronized
/// against concurrent request issuance.
pub struct ClientHandle {
    /// Owned transport. `None` after [`close`](Self::close) has dropped it.
    transport: Mutex<Option<reqwest::Client>>,
    base_url: RwLock<Option<Url>>,
    defaults: RwLock<RequestDefaults>,
    closed: AtomicBool,
}

impl ClientHandle {
    /// Build a handle with a fresh transport from the given configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = config
            .apply(reqwest::Client::builder())
            .build()
            .map_err(Error::ConstructionFailed)?;
        Ok(Self::from_client(client))
    }

    /// Wrap an already-built `reqwest::Client`.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            transport: Mutex::new(Some(client)),
            base_url: RwLock::new(None),
            defaults: RwLock::new(RequestDefaults::default()),
            closed: AtomicBool::new(false),
        }
    }

    /// The base URL requests with relative paths are joined against.
    pub fn base_url(&self) -> Option<Url> {
        self.base_url.read().expect("base_url lock poisoned").clone()
    }

    /// Set the base URL from a string.
    pub fn set_base_url(&self, url: &str) -> Result<()> {
        self.ensure_open()?;
        let parsed = Url::parse(url).map_err(|e| Error::invalid_url(url, e))?;
        *self.base_url.write().expect("base_url lock poisoned") = Some(parsed);
        Ok(())
    }

    pub(crate) fn set_base(&self, url: Url) {
        *self.base_url.write().expect("base_url lock poisoned") = Some(url);
    }

    /// Mutate the request defaults (headers, timeout override).
    pub fn configure<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut RequestDefaults),
    {
        self.ensure_open()?;
        let mut defaults = self.defaults.write().expect("defaults lock poisoned");
        f(&mut defaults);
        Ok(())
    }

    /// Attach a header to every request built through this handle.
    ///
    /// Name and value are both validated up front; nothing is mutated on a
    /// rejected header.
    pub fn set_default_header(&self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::InvalidHeaderName(name.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidHeaderValue(value.to_string()))?;
        self.configure(|d| {
            d.headers.insert(name, value);
        })
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Start building a request.
    ///
    /// `path_or_url` may be absolute, or relative to the handle's base URL.
    /// Default headers and the timeout override are applied; further
    /// customization happens on the returned `reqwest::RequestBuilder`.
    ///
    /// The builder carries its own clone of the transport, so a request built
    /// before [`close`](Self::close) stays valid through its own I/O.
    pub fn request(&self, method: Method, path_or_url: &str) -> Result<reqwest::RequestBuilder> {
        let client = self.transport()?;
        let url = self.resolve(path_or_url)?;
        let defaults = self.defaults.read().expect("defaults lock poisoned");

        let mut builder = client.request(method, url).headers(defaults.headers.clone());
        if let Some(timeout) = defaults.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder)
    }

    /// Build a GET request.
    pub fn get(&self, path_or_url: &str) -> Result<reqwest::RequestBuilder> {
        self.request(Method::GET, path_or_url)
    }

    /// Build a POST request.
    pub fn post(&self, path_or_url: &str) -> Result<reqwest::RequestBuilder> {
        self.request(Method::POST, path_or_url)
    }

    /// Build a PUT request.
    pub fn put(&self, path_or_url: &str) -> Result<reqwest::RequestBuilder> {
        self.request(Method::PUT, path_or_url)
    }

    /// Build a DELETE request.
    pub fn delete(&self, path_or_url: &str) -> Result<reqwest::RequestBuilder> {
        self.request(Method::DELETE, path_or_url)
    }

    /// Get a clone of the owned transport.
    ///
    /// Fails with [`Error::Disposed`] once the handle is closed.
    pub fn transport(&self) -> Result<reqwest::Client> {
        self.ensure_open()?;
        self.transport
            .lock()
            .expect("transport lock poisoned")
            .clone()
            .ok_or(Error::Disposed)
    }

    /// Close the handle and release the owned transport.
    ///
    /// Idempotent: the transport is dropped exactly once no matter how many
    /// times (or from how many threads) this is called. Requests already
    /// built keep their own transport clone and complete normally; new calls
    /// to [`request`](Self::request) and the configuration methods fail with
    /// [`Error::Disposed`].
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let dropped = self
            .transport
            .lock()
            .expect("transport lock poisoned")
            .take();
        if dropped.is_some() {
            debug!("Client handle closed, transport released");
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::Disposed)
        } else {
            Ok(())
        }
    }

    fn resolve(&self, path_or_url: &str) -> Result<Url> {
        match Url::parse(path_or_url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url();
                match base {
                    Some(base) => base
                        .join(path_or_url)
                        .map_err(|e| Error::invalid_url(path_or_url, e)),
                    None => Err(Error::NoBaseUrl(path_or_url.to_string())),
                }
            }
            Err(e) => Err(Error::invalid_url(path_or_url, e)),
        }
    }
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle")
            .field("base_url", &self.base_url())
            .field("closed", &self.is_closed())
            .finish()
    }
}
