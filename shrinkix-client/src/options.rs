//! Call options for per-request configuration.
//!
//! This module provides [`CallOptions`] for configuring individual API calls
//! with a timeout, a different credential, or extra headers.

use http::{HeaderMap, HeaderName, HeaderValue, header};
use std::time::Duration;

use crate::response::headers::API_KEY;

/// Options for configuring individual API calls.
///
/// Anything left unset falls back to the client's defaults.
///
/// # Example
///
/// ```ignore
/// use shrinkix_client::CallOptions;
/// use std::time::Duration;
///
/// let options = CallOptions::new()
///     .timeout(Duration::from_secs(5))
///     .api_key("sk_test_other")
///     .try_header("x-request-id", "abc-123")
///     .unwrap();
///
/// let result = client.check_limit_with_options(options).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Timeout for this specific call.
    pub(crate) timeout: Option<Duration>,
    /// Credential for this specific call.
    pub(crate) api_key: Option<String>,
    /// Custom headers for this specific call.
    pub(crate) headers: HeaderMap,
}

impl CallOptions {
    /// Create new default call options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout for this call, overriding the client default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the configured timeout, if any.
    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Send this call with a different API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn get_api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Try to add a custom header for this call.
    ///
    /// Returns `None` if the header name or value is invalid.
    ///
    /// Headers the client sets itself (`content-type`, `content-length` and
    /// `x-api-key`) are reserved and skipped when the request is built.
    pub fn try_header<K, V>(mut self, name: K, value: V) -> Option<Self>
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        let name = name.try_into().ok()?;
        let value = value.try_into().ok()?;
        self.headers.insert(name, value);
        Some(self)
    }

    /// Set all custom headers for this call, replacing any existing headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Get a reference to the custom headers.
    pub fn get_headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a mutable reference to the custom headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}

/// Check if a header name is owned by the client.
pub(crate) fn is_reserved_header(name: &HeaderName) -> bool {
    name == header::CONTENT_TYPE || name == header::CONTENT_LENGTH || name.as_str() == API_KEY
}
