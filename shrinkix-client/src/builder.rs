//! Client builder for the Shrinkix API client.
//!
//! Provides a fluent API for configuring and building a [`ShrinkixClient`].

use std::time::Duration;

use http::Uri;

use crate::client::ShrinkixClient;
use crate::transport::HyperTransport;

/// Default deadline for a whole API call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("shrinkix-client/", env!("CARGO_PKG_VERSION"));

/// Builder for creating a [`ShrinkixClient`].
///
/// # Example
///
/// ```ignore
/// use shrinkix_client::ClientBuilder;
/// use std::time::Duration;
///
/// let client = ClientBuilder::new("http://localhost:5000")
///     .api_key("sk_test_placeholder")
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// ```
pub struct ClientBuilder {
    /// Base URL of the service (e.g., "http://localhost:5000").
    base_url: String,
    /// Credential sent in the `x-api-key` header.
    api_key: Option<String>,
    /// Default deadline for each call.
    default_timeout: Duration,
    user_agent: String,
    /// Optional pre-configured transport.
    transport: Option<HyperTransport>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("default_timeout", &self.default_timeout)
            .field("user_agent", &self.user_agent)
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

impl ClientBuilder {
    /// Create a new ClientBuilder with the given base URL.
    ///
    /// The base URL must include the scheme and host. A trailing slash is
    /// removed.
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            default_timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            transport: None,
        }
    }

    /// Set the API key. Required.
    pub fn api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the default deadline for API calls.
    ///
    /// The deadline covers connecting, sending the upload and reading the
    /// whole response body. Individual calls can override it with
    /// [`CallOptions::timeout`](crate::CallOptions::timeout).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Use a pre-configured transport (custom TLS roots, pool settings).
    ///
    /// # Example
    ///
    /// ```ignore
    /// let transport = HyperTransport::builder()
    ///     .pool_max_idle_per_host(2)
    ///     .build();
    ///
    /// let client = ClientBuilder::new("https://api.shrinkix.com")
    ///     .api_key(key)
    ///     .transport(transport)
    ///     .build()?;
    /// ```
    pub fn transport(mut self, transport: HyperTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute `http`/`https`
    /// URL, or if no non-empty API key was given.
    pub fn build(self) -> Result<ShrinkixClient, ClientBuildError> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        validate_base_url(&base_url)?;

        let api_key = match self.api_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => return Err(ClientBuildError::MissingApiKey),
        };

        if http::HeaderValue::from_str(&api_key).is_err() {
            return Err(ClientBuildError::InvalidApiKey);
        }
        if http::HeaderValue::from_str(&self.user_agent).is_err() {
            return Err(ClientBuildError::InvalidUserAgent(self.user_agent));
        }

        let transport = self.transport.unwrap_or_default();

        Ok(ShrinkixClient::new(
            transport,
            base_url,
            api_key,
            self.default_timeout,
            self.user_agent,
        ))
    }
}

fn validate_base_url(base_url: &str) -> Result<(), ClientBuildError> {
    let invalid = |reason: &str| ClientBuildError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: reason.to_string(),
    };

    let uri: Uri = base_url.parse().map_err(|e: http::uri::InvalidUri| invalid(&e.to_string()))?;
    match uri.scheme_str() {
        Some("http") | Some("https") => {}
        Some(other) => return Err(invalid(&format!("unsupported scheme `{other}`"))),
        None => return Err(invalid("missing scheme")),
    }
    if uri.authority().is_none() {
        return Err(invalid("missing host"));
    }
    if uri.query().is_some() {
        return Err(invalid("query strings are not allowed"));
    }
    Ok(())
}

/// Error type for client building failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientBuildError {
    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("an API key is required")]
    MissingApiKey,

    /// The key contains characters that cannot appear in a header.
    #[error("API key is not a valid header value")]
    InvalidApiKey,

    #[error("invalid user agent `{0}`")]
    InvalidUserAgent(String),
}
