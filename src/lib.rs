//! # reclient
//!
//! Reusable HTTP client cache and factory built on `reqwest`.
//!
//! Creating a transport per request exhausts sockets and thrashes connection
//! pools under load. This crate keeps one pooled transport per logical
//! target: a [`ClientFactory`] derives a cache key from each request URL and
//! hands back the one cached [`ClientHandle`] for that key, creating it
//! lazily and exactly once even under concurrent lookups.
//!
//! ## Quick Start
//!
//! ```rust
//! use reclient::{ClientFactory, Result};
//!
//! # fn main() -> Result<()> {
//! // One transport per scheme+host+port.
//! let factory = ClientFactory::per_host();
//!
//! let client = factory.get("https://api.example.com/v1/users")?;
//! client.set_default_header("x-api-key", "secret")?;
//!
//! // Same host -> same handle, same connection pool.
//! let again = factory.get("https://api.example.com/v2/orders")?;
//! assert!(std::sync::Arc::ptr_eq(&client, &again));
//!
//! // `request`/`get`/`post` return a reqwest::RequestBuilder to send.
//! let request = client.get("https://api.example.com/v1/users")?;
//! # let _ = request;
//!
//! // At shutdown, close every cached transport.
//! factory.dispose_all();
//! # Ok(())
//! # }
//! ```
//!
//! ## Keying
//!
//! Two strategies ship with the crate, chosen at factory construction:
//!
//! - [`HostScope`] (default): one handle per scheme+host+port. Matches the
//!   per-host connection budget the cache exists to protect.
//! - [`FullBaseUrl`]: one handle per base URL, with the handle's base target
//!   pre-set, so `/v1` and `/v2` under one host get independent handles.
//!
//! Custom scoping, such as per-tenant or per-credential keying, is a
//! [`KeyStrategy`] implementation away.
//!
//! For the "just works" path there is a process-wide per-host factory:
//! [`get`] fetches from it and [`shutdown`] closes its handles.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod factory;
pub mod key;

// Re-exports for ergonomic usage
pub use cache::{ClientCache, CacheStatsSnapshot};
pub use client::ClientHandle;
pub use config::{ClientConfig, RequestDefaults};
pub use error::{Error, Result};
pub use factory::{default_factory, get, shutdown, ClientFactory};
pub use key::{CacheKey, FullBaseUrl, HostScope, KeyStrategy};
