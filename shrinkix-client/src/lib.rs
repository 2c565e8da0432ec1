//! HTTP client for the Shrinkix image compression API.
//!
//! This crate talks to a Shrinkix-compatible service over HTTP/1.1:
//!
//! ## Features
//!
//! - Quota lookup (`GET /api/check-limit`)
//! - Single image compression with directives (`POST /api/compress`)
//! - Batch compression into a zip archive (`POST /api/compress/batch`)
//! - A standalone `multipart/form-data` encoder ([`MultipartBuilder`])
//! - Typed results with the service's diagnostic headers parsed into options
//!
//! ## Example
//!
//! ```ignore
//! use shrinkix_client::{CompressionResult, Directives, FilePart, ShrinkixClient};
//!
//! let client = ShrinkixClient::builder("http://localhost:5000")
//!     .api_key("sk_test_placeholder")
//!     .build()?;
//!
//! let image = FilePart::from_path("photo.jpg").await?;
//! match client.compress_with(&image, Directives::new().width(800)).await? {
//!     CompressionResult::Image(image) => {
//!         println!("{} -> {:?} bytes", image.content_type, image.compressed_size);
//!     }
//!     CompressionResult::Error(error) => {
//!         eprintln!("rejected with {}: {:?}", error.status, error.message());
//!     }
//!     other => eprintln!("unexpected {} response", other.kind()),
//! }
//! ```
//!
//! ## Failure levels
//!
//! A call returns `Err(`[`ClientError`]`)` only when no status code was
//! received (or the request could not be built). Any answer from the
//! server, including 4xx and 5xx, comes back as `Ok` with
//! [`CompressionResult::Error`] for non-200 statuses.
//!
//! ## Tracing
//!
//! Enable the `tracing` feature to get one `info` span per call.

mod builder;
mod client;
pub mod directives;
mod error;
mod format;
pub mod multipart;
mod options;
pub mod response;
pub mod transport;

pub use builder::{ClientBuildError, ClientBuilder, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use client::{BATCH_FIELD, Endpoint, ShrinkixClient};
pub use directives::Directives;
pub use error::ClientError;
pub use format::{ImageFormat, UnknownFormat};
pub use multipart::{FilePart, FormField, MultipartBuilder, MultipartEnvelope};
pub use options::CallOptions;
pub use response::{
    ArchiveResult, CompressionResult, ErrorResult, ImageResult, JsonResult, RateLimit,
    ResponseMeta, UnexpectedResult,
};

// Re-export transport types at the top level for convenience
pub use transport::{HyperTransport, HyperTransportBuilder, TlsClientConfig, TransportBody};

pub use bytes::Bytes;
pub use http::{HeaderMap, StatusCode};
