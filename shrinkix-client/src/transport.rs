//! HTTP transport layer.
//!
//! This module provides the hyper-based transport used by
//! [`ShrinkixClient`](crate::ShrinkixClient):
//! - [`HyperTransport`]: Pooled HTTP/1.1 client with an HTTPS-or-HTTP connector
//! - [`TransportBody`]: Request body type (empty or a single buffer)

mod body;
mod hyper;

pub use body::TransportBody;
pub use self::hyper::{HyperTransport, HyperTransportBuilder};

pub use rustls::ClientConfig as TlsClientConfig;
