//! Cache key derivation strategies.
//!
//! A strategy decides which URLs share one transport. The default
//! [`HostScope`] collapses everything under one scheme+host+port, matching
//! the per-host connection budget the cache protects. [`FullBaseUrl`] keys
//! on the whole base URL so that, say, `/v1` and `/v2` under one host get
//! independent handles and configuration.

use std::fmt;

use url::Url;

// ---------------------------------------------------------------------------
// CacheKey
// ---------------------------------------------------------------------------

/// Opaque, comparable key derived deterministically from a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap an already-derived key string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// KeyStrategy
// ---------------------------------------------------------------------------

/// Maps a request URL to a cache key.
///
/// Implementations must be pure: equal URLs always yield equal keys. URL
/// parsing (and thus the only failure mode) happens before a strategy is
/// consulted, in [`ClientFactory::get`](crate::ClientFactory::get).
pub trait KeyStrategy: Send + Sync {
    /// Derive the cache key for a URL.
    fn derive_key(&self, url: &Url) -> CacheKey;

    /// The base URL a factory pre-sets on a handle freshly created for `url`.
    ///
    /// `None` (the default) leaves the handle without a base target, so
    /// callers pass absolute URLs per request.
    fn base_url(&self, url: &Url) -> Option<Url> {
        let _ = url;
        None
    }
}

// ---------------------------------------------------------------------------
// Built-in strategies
// ---------------------------------------------------------------------------

/// Keys on `scheme://host:port`.
///
/// Any two URLs sharing scheme, host, and effective port collapse to one
/// handle. Explicit default ports are normalized: `https://api.com:443` and
/// `https://api.com` yield the same key.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostScope;

impl KeyStrategy for HostScope {
    fn derive_key(&self, url: &Url) -> CacheKey {
        let host = url.host_str().unwrap_or_default();
        match url.port_or_known_default() {
            Some(port) => CacheKey::new(format!("{}://{}:{}", url.scheme(), host, port)),
            None => CacheKey::new(format!("{}://{}", url.scheme(), host)),
        }
    }
}

/// Keys on the entire base URL.
///
/// Query and fragment are stripped and trailing slashes trimmed for keying,
/// so `https://api.com/v1` and `https://api.com/v1/` share a handle while
/// `/v1` and `/v2` do not. A factory backed by this strategy also sets the
/// new handle's base target; the base target keeps a trailing slash so that
/// relative requests resolve *under* the base (`Url::join` drops the final
/// segment of a slashless base).
#[derive(Debug, Clone, Copy, Default)]
pub struct FullBaseUrl;

impl FullBaseUrl {
    fn normalize(url: &Url) -> Url {
        let mut normalized = url.clone();
        normalized.set_query(None);
        normalized.set_fragment(None);
        let path = normalized.path();
        if path.len() > 1 && path.ends_with('/') {
            let trimmed = path.trim_end_matches('/').to_string();
            normalized.set_path(&trimmed);
        }
        normalized
    }

    // Normalized like the key, but slash-terminated for join semantics.
    fn join_base(url: &Url) -> Url {
        let mut base = Self::normalize(url);
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base
    }
}

impl KeyStrategy for FullBaseUrl {
    fn derive_key(&self, url: &Url) -> CacheKey {
        CacheKey::new(Self::normalize(url).to_string())
    }

    fn base_url(&self, url: &Url) -> Option<Url> {
        Some(Self::join_base(url))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_host_scope_collapses_paths() {
        let a = HostScope.derive_key(&url("https://api.com/v1/x"));
        let b = HostScope.derive_key(&url("https://api.com/v2/y?q=1"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_host_scope_distinguishes_scheme() {
        let https = HostScope.derive_key(&url("https://api.com/v1/x"));
        let http = HostScope.derive_key(&url("http://api.com/v1/x"));
        assert_ne!(https, http);
    }

    #[test]
    fn test_host_scope_normalizes_default_port() {
        let explicit = HostScope.derive_key(&url("https://api.com:443/x"));
        let implied = HostScope.derive_key(&url("https://api.com/x"));
        assert_eq!(explicit, implied);

        let custom = HostScope.derive_key(&url("https://api.com:8443/x"));
        assert_ne!(custom, implied);
    }

    #[test]
    fn test_host_scope_has_no_base_url() {
        assert!(HostScope.base_url(&url("https://api.com/v1")).is_none());
    }

    #[test]
    fn test_full_base_url_distinguishes_paths() {
        let v1 = FullBaseUrl.derive_key(&url("https://api.com/v1"));
        let v2 = FullBaseUrl.derive_key(&url("https://api.com/v2"));
        assert_ne!(v1, v2);
    }

    #[test]
    fn test_full_base_url_trailing_slash_insensitive() {
        let bare = FullBaseUrl.derive_key(&url("https://api.com/v1"));
        let slash = FullBaseUrl.derive_key(&url("https://api.com/v1/"));
        assert_eq!(bare, slash);
    }

    #[test]
    fn test_full_base_url_strips_query_and_fragment() {
        let plain = FullBaseUrl.derive_key(&url("https://api.com/v1"));
        let noisy = FullBaseUrl.derive_key(&url("https://api.com/v1?token=x#frag"));
        assert_eq!(plain, noisy);
    }

    #[test]
    fn test_full_base_url_sets_slash_terminated_base_target() {
        // Both spellings produce the same join-safe base.
        let with_slash = FullBaseUrl.base_url(&url("https://api.com/v1/")).unwrap();
        let without = FullBaseUrl.base_url(&url("https://api.com/v1")).unwrap();
        assert_eq!(with_slash.as_str(), "https://api.com/v1/");
        assert_eq!(without.as_str(), "https://api.com/v1/");

        // A slash-terminated base keeps relative joins under the base.
        assert_eq!(
            with_slash.join("users").unwrap().as_str(),
            "https://api.com/v1/users"
        );
    }

    proptest! {
        #[test]
        fn prop_host_scope_ignores_path_and_query(
            path in "[a-z0-9/]{0,20}",
            query in "[a-z0-9=&]{0,20}",
        ) {
            let plain = url("https://api.example.com");
            let mut varied = plain.clone();
            varied.set_path(&path);
            if !query.is_empty() {
                varied.set_query(Some(&query));
            }
            prop_assert_eq!(
                HostScope.derive_key(&plain),
                HostScope.derive_key(&varied)
            );
        }

        #[test]
        fn prop_derive_key_is_deterministic(host in "[a-z]{1,12}\\.[a-z]{2,4}") {
            let u = url(&format!("https://{host}/v1"));
            prop_assert_eq!(HostScope.derive_key(&u), HostScope.derive_key(&u));
            prop_assert_eq!(FullBaseUrl.derive_key(&u), FullBaseUrl.derive_key(&u));
        }
    }
}
