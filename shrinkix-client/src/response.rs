//! Response types for the compression API.
//!
//! Every call yields a [`CompressionResult`], a tagged variant that tells the
//! caller what came back:
//!
//! - [`ImageResult`]: a transformed image plus the diagnostic headers
//! - [`ArchiveResult`]: a zip archive from a batch submission (not decoded)
//! - [`JsonResult`]: a JSON document (limit check, or JSON-mode compression)
//! - [`ErrorResult`]: any response whose status was not 200
//! - [`UnexpectedResult`]: a 200 whose content type fits none of the above
//!
//! Diagnostic headers are parsed opportunistically. An absent or malformed
//! header is `None`, never a zero or a sentinel string.

use std::path::Path;
use std::str::FromStr;

use bytes::Bytes;
use http::{HeaderMap, StatusCode, header};
use serde::de::DeserializeOwned;

use crate::format::ImageFormat;

/// Header names used by the service.
pub mod headers {
    /// Credential header sent on every call.
    pub const API_KEY: &str = "x-api-key";
    pub const ORIGINAL_SIZE: &str = "x-original-size";
    pub const COMPRESSED_SIZE: &str = "x-compressed-size";
    pub const SAVED_PERCENT: &str = "x-saved-percent";
    pub const METADATA_PRESERVED: &str = "x-metadata-preserved";
    pub const OUTPUT_FORMAT: &str = "x-output-format";
    pub const IMAGE_WIDTH: &str = "image-width";
    pub const IMAGE_HEIGHT: &str = "image-height";
    pub const COMPRESSION_COUNT: &str = "compression-count";
    pub const TOTAL_FILES: &str = "x-total-files";
    pub const TOTAL_ORIGINAL_SIZE: &str = "x-total-original-size";
    pub const TOTAL_COMPRESSED_SIZE: &str = "x-total-compressed-size";
    pub const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
    pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
    pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
    pub const REQUEST_ID: &str = "x-request-id";
}

/// What a successful response from an endpoint is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResponseKind {
    Json,
    Image,
    Archive,
}

/// Rate-limit information reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub reset: Option<u64>,
}

/// Response metadata wrapper around HTTP headers.
///
/// Provides access to the headers returned with any result variant.
#[derive(Debug, Clone, Default)]
pub struct ResponseMeta {
    headers: HeaderMap,
}

impl ResponseMeta {
    /// Create new metadata from HTTP headers.
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    /// Get a reference to the underlying headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header value as a string, if present and valid UTF-8.
    pub fn get(&self, name: &str) -> Option<&str> {
        header_str(&self.headers, name)
    }

    pub fn rate_limit(&self) -> RateLimit {
        RateLimit {
            limit: parse_header(&self.headers, headers::RATE_LIMIT_LIMIT),
            remaining: parse_header(&self.headers, headers::RATE_LIMIT_REMAINING),
            reset: parse_header(&self.headers, headers::RATE_LIMIT_RESET),
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        self.get(headers::REQUEST_ID)
    }
}

/// A transformed image returned by `/api/compress`.
#[derive(Debug, Clone)]
pub struct ImageResult {
    /// Image bytes exactly as received.
    pub bytes: Bytes,
    /// `Content-Type` of the response.
    pub content_type: String,
    /// `X-Original-Size`, in bytes.
    pub original_size: Option<u64>,
    /// `X-Compressed-Size`, in bytes.
    pub compressed_size: Option<u64>,
    /// `X-Saved-Percent`.
    pub saved_percent: Option<f64>,
    /// `X-Metadata-Preserved`; `None` when the header is absent or not a boolean.
    pub metadata_preserved: Option<bool>,
    /// `X-Output-Format`.
    pub output_format: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub compression_count: Option<u64>,
    pub meta: ResponseMeta,
}

impl ImageResult {
    fn from_parts(content_type: String, headers: HeaderMap, bytes: Bytes) -> Self {
        Self {
            bytes,
            content_type,
            original_size: parse_header(&headers, headers::ORIGINAL_SIZE),
            compressed_size: parse_header(&headers, headers::COMPRESSED_SIZE),
            saved_percent: parse_header(&headers, headers::SAVED_PERCENT),
            metadata_preserved: parse_flag(&headers, headers::METADATA_PRESERVED),
            output_format: header_str(&headers, headers::OUTPUT_FORMAT).map(str::to_string),
            width: parse_header(&headers, headers::IMAGE_WIDTH),
            height: parse_header(&headers, headers::IMAGE_HEIGHT),
            compression_count: parse_header(&headers, headers::COMPRESSION_COUNT),
            meta: ResponseMeta::new(headers),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The image format named by the response content type.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.content_type)
    }

    /// Whether the content type matches `format`.
    pub fn is_format(&self, format: ImageFormat) -> bool {
        self.format() == Some(format)
    }

    /// Write the image bytes to `path`.
    pub async fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        tokio::fs::write(path, &self.bytes).await
    }
}

/// A zip archive returned by `/api/compress/batch`.
#[derive(Debug, Clone)]
pub struct ArchiveResult {
    /// Archive bytes exactly as received.
    pub bytes: Bytes,
    pub total_files: Option<u64>,
    pub total_original_size: Option<u64>,
    pub total_compressed_size: Option<u64>,
    pub meta: ResponseMeta,
}

impl ArchiveResult {
    fn from_parts(headers: HeaderMap, bytes: Bytes) -> Self {
        Self {
            bytes,
            total_files: parse_header(&headers, headers::TOTAL_FILES),
            total_original_size: parse_header(&headers, headers::TOTAL_ORIGINAL_SIZE),
            total_compressed_size: parse_header(&headers, headers::TOTAL_COMPRESSED_SIZE),
            meta: ResponseMeta::new(headers),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the archive bytes to `path`.
    pub async fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        tokio::fs::write(path, &self.bytes).await
    }
}

/// A JSON document.
#[derive(Debug, Clone)]
pub struct JsonResult {
    pub bytes: Bytes,
    pub meta: ResponseMeta,
}

impl JsonResult {
    /// Deserialize the body.
    ///
    /// # Example
    ///
    /// ```ignore
    /// #[derive(serde::Deserialize)]
    /// struct Limits { remaining: u64 }
    ///
    /// if let CompressionResult::Json(json) = client.check_limit().await? {
    ///     let limits: Limits = json.json()?;
    /// }
    /// ```
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.bytes)
    }

    pub fn value(&self) -> Result<serde_json::Value, serde_json::Error> {
        self.json()
    }
}

/// A response whose status was not 200.
#[derive(Debug, Clone)]
pub struct ErrorResult {
    pub status: StatusCode,
    /// Response body, `None` when empty. Not guaranteed to be structured.
    pub raw_body: Option<Bytes>,
    /// `Retry-After` in seconds, when the service sent one.
    pub retry_after: Option<u64>,
    pub meta: ResponseMeta,
}

impl ErrorResult {
    fn from_parts(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            raw_body: (!body.is_empty()).then_some(body),
            retry_after: parse_header(&headers, header::RETRY_AFTER.as_str()),
            meta: ResponseMeta::new(headers),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Human-readable message from a JSON body's `message` or `error` field.
    pub fn message(&self) -> Option<String> {
        let body = self.raw_body.as_ref()?;
        let value: serde_json::Value = serde_json::from_slice(body).ok()?;
        ["message", "error"]
            .iter()
            .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS
    }
}

/// A 200 response from an image endpoint that carried neither an image nor
/// JSON, such as an HTML page from a proxy.
#[derive(Debug, Clone)]
pub struct UnexpectedResult {
    /// `Content-Type` of the response, if any.
    pub content_type: Option<String>,
    pub bytes: Bytes,
    pub meta: ResponseMeta,
}

/// The classified outcome of one API call.
#[derive(Debug, Clone)]
pub enum CompressionResult {
    Image(ImageResult),
    Archive(ArchiveResult),
    Json(JsonResult),
    Error(ErrorResult),
    Unexpected(UnexpectedResult),
}

impl CompressionResult {
    /// Short name of the variant, for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            CompressionResult::Image(_) => "image",
            CompressionResult::Archive(_) => "archive",
            CompressionResult::Json(_) => "json",
            CompressionResult::Error(_) => "error",
            CompressionResult::Unexpected(_) => "unexpected",
        }
    }

    /// `true` for images, archives and JSON documents.
    pub fn is_success(&self) -> bool {
        !matches!(
            self,
            CompressionResult::Error(_) | CompressionResult::Unexpected(_)
        )
    }

    pub fn meta(&self) -> &ResponseMeta {
        match self {
            CompressionResult::Image(r) => &r.meta,
            CompressionResult::Archive(r) => &r.meta,
            CompressionResult::Json(r) => &r.meta,
            CompressionResult::Error(r) => &r.meta,
            CompressionResult::Unexpected(r) => &r.meta,
        }
    }

    pub fn as_image(&self) -> Option<&ImageResult> {
        match self {
            CompressionResult::Image(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_archive(&self) -> Option<&ArchiveResult> {
        match self {
            CompressionResult::Archive(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&JsonResult> {
        match self {
            CompressionResult::Json(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorResult> {
        match self {
            CompressionResult::Error(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_unexpected(&self) -> Option<&UnexpectedResult> {
        match self {
            CompressionResult::Unexpected(r) => Some(r),
            _ => None,
        }
    }
}

/// Classify a fully received response.
///
/// Only status 200 counts as success. For image endpoints an `image/*`
/// content type yields [`CompressionResult::Image`] and a JSON content type
/// yields [`CompressionResult::Json`]; anything else, including a missing
/// content type, is [`CompressionResult::Unexpected`].
pub(crate) fn classify(
    expected: ResponseKind,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
) -> CompressionResult {
    if status != StatusCode::OK {
        return CompressionResult::Error(ErrorResult::from_parts(status, headers, body));
    }

    match expected {
        ResponseKind::Json => CompressionResult::Json(JsonResult {
            bytes: body,
            meta: ResponseMeta::new(headers),
        }),
        ResponseKind::Archive => CompressionResult::Archive(ArchiveResult::from_parts(headers, body)),
        ResponseKind::Image => {
            let content_type =
                header_str(&headers, header::CONTENT_TYPE.as_str()).map(str::to_string);
            match content_type {
                Some(ct) if is_image_content_type(&ct) => {
                    CompressionResult::Image(ImageResult::from_parts(ct, headers, body))
                }
                Some(ct) if is_json_content_type(&ct) => CompressionResult::Json(JsonResult {
                    bytes: body,
                    meta: ResponseMeta::new(headers),
                }),
                content_type => CompressionResult::Unexpected(UnexpectedResult {
                    content_type,
                    bytes: body,
                    meta: ResponseMeta::new(headers),
                }),
            }
        }
    }
}

fn is_image_content_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    essence.len() > "image/".len()
        && essence
            .get(.."image/".len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    essence.eq_ignore_ascii_case("application/json") || essence.ends_with("+json")
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
}

fn parse_header<T: FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    let raw = header_str(headers, name)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(header = name, value = raw, "ignoring malformed header");
            None
        }
    }
}

fn parse_flag(headers: &HeaderMap, name: &str) -> Option<bool> {
    let raw = header_str(headers, name)?;
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
