//! `multipart/form-data` request encoding.
//!
//! This module provides [`MultipartBuilder`], which assembles text fields and
//! file parts into a single contiguous body framed as:
//!
//! ```text
//! --<boundary>\r\n
//! Content-Disposition: form-data; name="<name>"\r\n
//! \r\n
//! <value>\r\n
//! --<boundary>\r\n
//! Content-Disposition: form-data; name="<field>"; filename="<filename>"\r\n
//! Content-Type: <media type>\r\n
//! \r\n
//! <raw content>\r\n
//! --<boundary>--\r\n
//! ```
//!
//! Fields are written first, in the order they were added, followed by the
//! files in the order they were added. File content is copied verbatim.

use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use rand::Rng;
use rand::distr::Alphanumeric;

use crate::ClientError;
use crate::format::ImageFormat;

/// Fixed prefix of every generated boundary token.
pub const BOUNDARY_PREFIX: &str = "----ShrinkixBoundary";

/// Number of random alphanumeric characters appended to [`BOUNDARY_PREFIX`].
pub const BOUNDARY_RANDOM_LEN: usize = 24;

/// Field name the service expects for a single image upload.
pub const IMAGE_FIELD: &str = "image";

/// Media type used when a file's type cannot be guessed.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Regeneration attempts before giving up on finding an absent boundary.
const MAX_BOUNDARY_ATTEMPTS: usize = 8;

/// Longest boundary allowed by RFC 2046.
const MAX_BOUNDARY_LEN: usize = 70;

const CRLF: &[u8] = b"\r\n";
const DASHES: &[u8] = b"--";

/// A plain text form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

impl FormField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A binary file part. The content is never inspected or altered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field_name: String,
    pub filename: String,
    pub media_type: String,
    pub content: Bytes,
}

impl FilePart {
    /// Create a file part with every attribute given explicitly.
    pub fn new(
        field_name: impl Into<String>,
        filename: impl Into<String>,
        media_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            filename: filename.into(),
            media_type: media_type.into(),
            content: content.into(),
        }
    }

    /// Create an `image` part, guessing the media type from the filename.
    pub fn image(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let filename = filename.into();
        let media_type = guess_media_type(&filename);
        Self::new(IMAGE_FIELD, filename, media_type, content)
    }

    /// Read a file from disk into an `image` part.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await.map_err(|e| {
            ClientError::InvalidRequest(format!("failed to read {}: {}", path.display(), e))
        })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::image(filename, content))
    }

    /// Return the same part under a different form field name.
    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    /// Size of the raw content in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

fn guess_media_type(filename: &str) -> &'static str {
    ImageFormat::from_path(filename)
        .map(|format| format.mime_type())
        .unwrap_or(OCTET_STREAM)
}

/// An encoded multipart body together with the boundary that frames it.
#[derive(Debug, Clone)]
pub struct MultipartEnvelope {
    boundary: String,
    body: Bytes,
}

impl MultipartEnvelope {
    /// The boundary token used in every delimiter.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Builder for `multipart/form-data` bodies.
///
/// # Example
///
/// ```
/// use shrinkix_client::{FilePart, MultipartBuilder};
///
/// let envelope = MultipartBuilder::new()
///     .field("width", "100")
///     .file(FilePart::image("photo.jpg", vec![0xFF, 0xD8, 0xFF, 0xD9]))
///     .build()
///     .unwrap();
///
/// assert!(envelope.content_type().starts_with("multipart/form-data; boundary="));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MultipartBuilder {
    fields: Vec<FormField>,
    files: Vec<FilePart>,
    boundary: Option<String>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(FormField::new(name, value));
        self
    }

    /// Append several text fields, keeping their order.
    pub fn fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = FormField>,
    {
        self.fields.extend(fields);
        self
    }

    /// Append a file part.
    pub fn file(mut self, file: FilePart) -> Self {
        self.files.push(file);
        self
    }

    /// Append several file parts, keeping their order.
    pub fn files<I>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = FilePart>,
    {
        self.files.extend(files);
        self
    }

    /// Use a fixed boundary instead of a random one.
    ///
    /// [`build`](Self::build) fails if the token occurs inside any part.
    pub fn boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Encode the fields and files into a single body.
    pub fn build(self) -> Result<MultipartEnvelope, ClientError> {
        let boundary = match self.boundary {
            Some(boundary) => {
                validate_boundary(&boundary)?;
                if occurs_in_parts(&boundary, &self.fields, &self.files) {
                    return Err(ClientError::InvalidRequest(format!(
                        "boundary {boundary:?} occurs inside the request content"
                    )));
                }
                boundary
            }
            None => select_boundary(&self.fields, &self.files)?,
        };

        let body = encode(&self.fields, &self.files, &boundary);
        Ok(MultipartEnvelope { boundary, body })
    }
}

/// Encode `fields` followed by `files` with a freshly generated boundary.
pub fn build(fields: &[FormField], files: &[FilePart]) -> Result<MultipartEnvelope, ClientError> {
    MultipartBuilder::new()
        .fields(fields.iter().cloned())
        .files(files.iter().cloned())
        .build()
}

/// Generate a random boundary token.
pub fn random_boundary() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(BOUNDARY_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{BOUNDARY_PREFIX}{suffix}")
}

fn select_boundary(fields: &[FormField], files: &[FilePart]) -> Result<String, ClientError> {
    for _ in 0..MAX_BOUNDARY_ATTEMPTS {
        let boundary = random_boundary();
        if !occurs_in_parts(&boundary, fields, files) {
            return Ok(boundary);
        }
    }
    Err(ClientError::InvalidRequest(
        "could not select a boundary absent from the request content".to_string(),
    ))
}

fn validate_boundary(boundary: &str) -> Result<(), ClientError> {
    let valid = !boundary.is_empty()
        && boundary.len() <= MAX_BOUNDARY_LEN
        && boundary.bytes().all(|b| b.is_ascii_graphic());
    if valid {
        Ok(())
    } else {
        Err(ClientError::InvalidRequest(format!(
            "invalid multipart boundary {boundary:?}"
        )))
    }
}

fn occurs_in_parts(boundary: &str, fields: &[FormField], files: &[FilePart]) -> bool {
    let needle = boundary.as_bytes();
    fields
        .iter()
        .any(|f| contains(f.name.as_bytes(), needle) || contains(f.value.as_bytes(), needle))
        || files.iter().any(|f| {
            contains(&f.content, needle)
                || contains(f.field_name.as_bytes(), needle)
                || contains(f.filename.as_bytes(), needle)
                || contains(f.media_type.as_bytes(), needle)
        })
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn field_header(field: &FormField) -> String {
    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field.name)
}

fn file_header(file: &FilePart) -> String {
    format!(
        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
        file.field_name, file.filename, file.media_type
    )
}

/// One encoded part: its header block and its content.
struct Part<'a> {
    header: String,
    content: &'a [u8],
}

fn parts<'a>(fields: &'a [FormField], files: &'a [FilePart]) -> Vec<Part<'a>> {
    let fields = fields.iter().map(|f| Part {
        header: field_header(f),
        content: f.value.as_bytes(),
    });
    let files = files.iter().map(|f| Part {
        header: file_header(f),
        content: &f.content,
    });
    fields.chain(files).collect()
}

/// Exact size of the encoded body.
fn encoded_len(parts: &[Part<'_>], boundary: &str) -> usize {
    let delimiter = DASHES.len() + boundary.len() + CRLF.len();
    let parts_len: usize = parts
        .iter()
        .map(|p| delimiter + p.header.len() + p.content.len() + CRLF.len())
        .sum();
    let closing = DASHES.len() + boundary.len() + DASHES.len() + CRLF.len();
    parts_len + closing
}

fn encode_parts(parts: &[Part<'_>], boundary: &str) -> BytesMut {
    let mut buf = BytesMut::with_capacity(encoded_len(parts, boundary));

    for part in parts {
        buf.put_slice(DASHES);
        buf.put_slice(boundary.as_bytes());
        buf.put_slice(CRLF);
        buf.put_slice(part.header.as_bytes());
        buf.put_slice(part.content);
        buf.put_slice(CRLF);
    }

    buf.put_slice(DASHES);
    buf.put_slice(boundary.as_bytes());
    buf.put_slice(DASHES);
    buf.put_slice(CRLF);

    buf
}

fn encode(fields: &[FormField], files: &[FilePart], boundary: &str) -> Bytes {
    encode_parts(&parts(fields, files), boundary).freeze()
}
