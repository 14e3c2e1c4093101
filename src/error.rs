//! Error types for the client cache and factory.

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for client creation, configuration, and lookup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The URL handed to the factory or to `set_base_url` could not be parsed.
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A relative path was given but the handle has no base URL to join it against.
    #[error("Relative path '{0}' requires a base URL")]
    NoBaseUrl(String),

    /// The underlying transport could not be built from its configuration.
    ///
    /// Nothing is cached on this failure; a later lookup with the same key
    /// retries construction.
    #[error("Failed to build HTTP transport: {0}")]
    ConstructionFailed(#[source] reqwest::Error),

    /// A default header name was not a valid HTTP header name.
    #[error("Invalid header name '{0}'")]
    InvalidHeaderName(String),

    /// A default header value contained bytes that are not valid in a header.
    #[error("Invalid header value '{0}'")]
    InvalidHeaderValue(String),

    /// Operation attempted on a handle after it was closed.
    #[error("Client handle is closed")]
    Disposed,
}

impl Error {
    /// Build an [`Error::InvalidUrl`] from the offending input and parse error.
    pub(crate) fn invalid_url(url: &str, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_display_includes_input() {
        let err = url::Url::parse("not a url").unwrap_err();
        let err = Error::invalid_url("not a url", err);
        assert!(err.to_string().contains("not a url"));
    }
}
