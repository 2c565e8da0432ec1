//! Shrinkix API client implementation.
//!
//! This module provides the main [`ShrinkixClient`] type for calling the
//! compression service.

use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use tokio::time::timeout;

use crate::ClientError;
use crate::builder::ClientBuilder;
use crate::directives::Directives;
use crate::multipart::{FilePart, FormField, MultipartBuilder, MultipartEnvelope};
use crate::options::{CallOptions, is_reserved_header};
use crate::response::{CompressionResult, ResponseKind, classify, headers};
use crate::transport::{HyperTransport, TransportBody};

/// Field name shared by every file of a batch upload.
pub const BATCH_FIELD: &str = "images[]";

/// The three operations exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    CheckLimit,
    Compress,
    CompressBatch,
}

impl Endpoint {
    /// Path appended to the client's base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::CheckLimit => "/api/check-limit",
            Endpoint::Compress => "/api/compress",
            Endpoint::CompressBatch => "/api/compress/batch",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Endpoint::CheckLimit => Method::GET,
            Endpoint::Compress | Endpoint::CompressBatch => Method::POST,
        }
    }

    fn expected(&self) -> ResponseKind {
        match self {
            Endpoint::CheckLimit => ResponseKind::Json,
            Endpoint::Compress => ResponseKind::Image,
            Endpoint::CompressBatch => ResponseKind::Archive,
        }
    }
}

/// Client for the Shrinkix image compression API.
///
/// Every call performs exactly one request/response exchange and never
/// retries. The outcome is reported on two levels:
///
/// - `Err(ClientError)` when no status code was received (connection
///   refused, reset, deadline exceeded) or the request could not be built.
/// - `Ok(CompressionResult)` otherwise. A non-200 status becomes
///   [`CompressionResult::Error`].
///
/// Use [`ClientBuilder`] or [`ShrinkixClient::builder`] to create an instance.
/// Cloning is cheap and shares the connection pool.
///
/// # Example
///
/// ```ignore
/// use shrinkix_client::{Directives, FilePart, ImageFormat, ShrinkixClient};
///
/// let client = ShrinkixClient::builder("http://localhost:5000")
///     .api_key("sk_test_placeholder")
///     .build()?;
///
/// let image = FilePart::from_path("photo.jpg").await?;
/// let result = client
///     .compress_with(&image, Directives::new().format(ImageFormat::Webp))
///     .await?;
///
/// if let Some(image) = result.as_image() {
///     image.write_to("photo.webp").await?;
/// }
/// ```
#[derive(Clone)]
pub struct ShrinkixClient {
    transport: HyperTransport,
    base_url: String,
    api_key: String,
    default_timeout: Duration,
    user_agent: String,
}

impl std::fmt::Debug for ShrinkixClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShrinkixClient")
            .field("base_url", &self.base_url)
            .field("default_timeout", &self.default_timeout)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl ShrinkixClient {
    pub(crate) fn new(
        transport: HyperTransport,
        base_url: String,
        api_key: String,
        default_timeout: Duration,
        user_agent: String,
    ) -> Self {
        Self {
            transport,
            base_url,
            api_key,
            default_timeout,
            user_agent,
        }
    }

    /// Create a new [`ClientBuilder`] for the given base URL.
    pub fn builder<S: Into<String>>(base_url: S) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Ask the service how much of the key's quota is left.
    ///
    /// Yields [`CompressionResult::Json`] on 200.
    pub async fn check_limit(&self) -> Result<CompressionResult, ClientError> {
        self.check_limit_with_options(CallOptions::default()).await
    }

    pub async fn check_limit_with_options(
        &self,
        options: CallOptions,
    ) -> Result<CompressionResult, ClientError> {
        self.execute(Endpoint::CheckLimit, None, options).await
    }

    /// Compress one image.
    ///
    /// `directives` are sent as text fields, in the given order, ahead of the
    /// file part. The image is sent under its own field name, which
    /// [`FilePart::image`] and [`FilePart::from_path`] set to `image`.
    pub async fn compress(
        &self,
        image: &FilePart,
        directives: &[FormField],
    ) -> Result<CompressionResult, ClientError> {
        self.compress_with_options(image, directives, CallOptions::default())
            .await
    }

    /// Compress one image using a typed [`Directives`] set.
    pub async fn compress_with(
        &self,
        image: &FilePart,
        directives: Directives,
    ) -> Result<CompressionResult, ClientError> {
        self.compress_with_options(image, &directives.into_fields(), CallOptions::default())
            .await
    }

    pub async fn compress_with_options(
        &self,
        image: &FilePart,
        directives: &[FormField],
        options: CallOptions,
    ) -> Result<CompressionResult, ClientError> {
        let envelope = MultipartBuilder::new()
            .fields(directives.iter().cloned())
            .file(image.clone())
            .build()?;
        self.execute(Endpoint::Compress, Some(envelope), options)
            .await
    }

    /// Compress several images at once; the service answers with a zip archive.
    ///
    /// Every file is sent under the shared `images[]` field, in order.
    pub async fn compress_batch(&self, images: &[FilePart]) -> Result<CompressionResult, ClientError> {
        self.compress_batch_with_options(images, CallOptions::default())
            .await
    }

    pub async fn compress_batch_with_options(
        &self,
        images: &[FilePart],
        options: CallOptions,
    ) -> Result<CompressionResult, ClientError> {
        let envelope = MultipartBuilder::new()
            .files(images.iter().map(|image| image.clone().with_field_name(BATCH_FIELD)))
            .build()?;
        self.execute(Endpoint::CompressBatch, Some(envelope), options)
            .await
    }

    async fn execute(
        &self,
        endpoint: Endpoint,
        envelope: Option<MultipartEnvelope>,
        options: CallOptions,
    ) -> Result<CompressionResult, ClientError> {
        let call = self.exchange(endpoint, envelope, options);

        #[cfg(feature = "tracing")]
        let call = {
            use tracing::Instrument;
            call.instrument(tracing::info_span!(
                "shrinkix.call",
                api.endpoint = endpoint.path(),
                api.method = %endpoint.method(),
                otel.kind = "client",
            ))
        };

        call.await
    }

    async fn exchange(
        &self,
        endpoint: Endpoint,
        envelope: Option<MultipartEnvelope>,
        options: CallOptions,
    ) -> Result<CompressionResult, ClientError> {
        let deadline = options.timeout.unwrap_or(self.default_timeout);
        let request = self.build_request(endpoint, envelope, &options)?;

        let round_trip = async {
            let response = self.transport.request(request).await?;
            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| ClientError::Transport(format!("failed to read response body: {}", e)))?
                .to_bytes();
            Ok::<(StatusCode, HeaderMap, Bytes), ClientError>((parts.status, parts.headers, body))
        };

        let (status, response_headers, body) = timeout(deadline, round_trip)
            .await
            .map_err(|_| ClientError::Timeout(deadline))??;

        let result = classify(endpoint.expected(), status, response_headers, body);

        #[cfg(feature = "tracing")]
        tracing::debug!(status = status.as_u16(), kind = result.kind(), "classified response");

        Ok(result)
    }

    fn build_request(
        &self,
        endpoint: Endpoint,
        envelope: Option<MultipartEnvelope>,
        options: &CallOptions,
    ) -> Result<Request<TransportBody>, ClientError> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        let api_key = options.api_key.as_deref().unwrap_or(&self.api_key);

        let builder = Request::builder()
            .method(endpoint.method())
            .uri(&url)
            .header(header::USER_AGENT, self.user_agent.as_str())
            .header(headers::API_KEY, api_key);

        let mut request = match envelope {
            Some(envelope) => {
                let content_type = envelope.content_type();
                builder
                    .header(header::CONTENT_TYPE, content_type)
                    .header(header::CONTENT_LENGTH, HeaderValue::from(envelope.len()))
                    .body(TransportBody::full(envelope.into_body()))?
            }
            None => builder.body(TransportBody::empty())?,
        };

        // Options may replace defaults like user-agent, but never the framing or credential.
        let request_headers = request.headers_mut();
        for (name, value) in options.headers.iter() {
            if !is_reserved_header(name) {
                request_headers.insert(name.clone(), value.clone());
            }
        }
        if !request_headers.contains_key(header::ACCEPT) {
            request_headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        }

        Ok(request)
    }
}
