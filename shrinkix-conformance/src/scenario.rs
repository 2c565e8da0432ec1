//! The six conformance scenarios and their pass criteria.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use shrinkix_client::{ClientError, CompressionResult, Directives, ImageFormat};

use crate::fixtures::FixtureError;

/// Width requested by the resize scenario.
pub const RESIZE_WIDTH: u32 = 100;

/// A resized image must come back smaller than this many bytes.
pub const RESIZE_MAX_BYTES: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    CheckLimit,
    Compress,
    BatchCompress,
    FormatConversion,
    Resize,
    PreserveMetadata,
}

impl Scenario {
    /// Every scenario, in execution order.
    pub const ALL: [Scenario; 6] = [
        Scenario::CheckLimit,
        Scenario::Compress,
        Scenario::BatchCompress,
        Scenario::FormatConversion,
        Scenario::Resize,
        Scenario::PreserveMetadata,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::CheckLimit => "check-limit",
            Scenario::Compress => "compress",
            Scenario::BatchCompress => "batch-compress",
            Scenario::FormatConversion => "format-conversion",
            Scenario::Resize => "resize",
            Scenario::PreserveMetadata => "preserve-metadata",
        }
    }

    /// Directives sent by the single-image scenarios.
    pub fn directives(&self) -> Directives {
        match self {
            Scenario::FormatConversion => Directives::new().format(ImageFormat::Webp),
            Scenario::Resize => Directives::new().width(RESIZE_WIDTH),
            Scenario::PreserveMetadata => Directives::new().preserve_metadata(true),
            _ => Directives::new(),
        }
    }

    /// Stem of the file a successful payload is saved under. The limit
    /// check has no payload worth keeping.
    pub fn output_stem(&self) -> Option<&'static str> {
        match self {
            Scenario::CheckLimit => None,
            Scenario::Compress => Some("compressed"),
            Scenario::BatchCompress => Some("compressed_batch"),
            Scenario::FormatConversion => Some("converted"),
            Scenario::Resize => Some("resized"),
            Scenario::PreserveMetadata => Some("metadata"),
        }
    }

    /// Decide whether `result` satisfies this scenario.
    ///
    /// Returns a short detail line on success.
    pub fn verify(&self, result: &CompressionResult) -> Result<String, ScenarioFailure> {
        if let CompressionResult::Error(error) = result {
            return Err(ScenarioFailure::Protocol {
                status: error.status_code(),
                message: error.message(),
            });
        }
        if let CompressionResult::Unexpected(other) = result {
            return Err(ScenarioFailure::UnexpectedContent(format!(
                "status 200 with content type {}",
                other.content_type.as_deref().unwrap_or("none")
            )));
        }

        match self {
            Scenario::CheckLimit => {
                let json = expect_kind(result, "json", CompressionResult::as_json)?;
                Ok(format!("limit response ({} bytes)", json.bytes.len()))
            }
            Scenario::BatchCompress => {
                let archive = expect_kind(result, "archive", CompressionResult::as_archive)?;
                let files = archive
                    .total_files
                    .map(|n| format!(", {n} files"))
                    .unwrap_or_default();
                Ok(format!("{} byte archive{files}", archive.len()))
            }
            Scenario::Compress => {
                let image = expect_kind(result, "image", CompressionResult::as_image)?;
                let sizes = match (image.original_size, image.compressed_size) {
                    (Some(original), Some(compressed)) if compressed >= original => {
                        return Err(ScenarioFailure::UnexpectedContent(format!(
                            "compressed size {compressed} is not below original size {original}"
                        )));
                    }
                    (Some(original), Some(compressed)) => {
                        format!(", {original} -> {compressed} bytes")
                    }
                    _ => String::new(),
                };
                Ok(format!("{} ({} bytes{sizes})", image.content_type, image.len()))
            }
            Scenario::FormatConversion => {
                let image = expect_kind(result, "image", CompressionResult::as_image)?;
                if !image.is_format(ImageFormat::Webp) {
                    return Err(ScenarioFailure::UnexpectedContent(format!(
                        "expected {}, got {}",
                        ImageFormat::Webp.mime_type(),
                        image.content_type
                    )));
                }
                Ok(format!("converted to {}", image.content_type))
            }
            Scenario::Resize => {
                let image = expect_kind(result, "image", CompressionResult::as_image)?;
                if image.len() >= RESIZE_MAX_BYTES {
                    return Err(ScenarioFailure::UnexpectedContent(format!(
                        "resized image is {} bytes, expected fewer than {RESIZE_MAX_BYTES}",
                        image.len()
                    )));
                }
                Ok(format!("{} bytes at width {RESIZE_WIDTH}", image.len()))
            }
            Scenario::PreserveMetadata => {
                let image = expect_kind(result, "image", CompressionResult::as_image)?;
                match image.metadata_preserved {
                    Some(true) => Ok("metadata preserved".to_string()),
                    Some(false) => Err(ScenarioFailure::UnexpectedContent(
                        "X-Metadata-Preserved is false".to_string(),
                    )),
                    None => Err(ScenarioFailure::UnexpectedContent(
                        "X-Metadata-Preserved missing".to_string(),
                    )),
                }
            }
        }
    }
}

fn expect_kind<'a, T>(
    result: &'a CompressionResult,
    expected: &str,
    pick: fn(&'a CompressionResult) -> Option<&'a T>,
) -> Result<&'a T, ScenarioFailure> {
    pick(result).ok_or_else(|| {
        ScenarioFailure::UnexpectedContent(format!(
            "expected {expected} response, got {}",
            result.kind()
        ))
    })
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scenario `{0}`")]
pub struct UnknownScenario(pub String);

impl FromStr for Scenario {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s.trim())
            .ok_or_else(|| UnknownScenario(s.to_string()))
    }
}

/// Lifecycle of one scenario within a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScenarioState {
    #[default]
    NotRun,
    Running,
    Passed,
    Failed,
}

impl ScenarioState {
    pub fn is_finished(&self) -> bool {
        matches!(self, ScenarioState::Passed | ScenarioState::Failed)
    }
}

/// Why a scenario failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScenarioFailure {
    /// No status code was received.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with something other than 200.
    #[error("server answered {status}{}", message_suffix(.message))]
    Protocol { status: u16, message: Option<String> },

    /// Status 200, but not the payload the scenario asked for.
    #[error("unexpected content: {0}")]
    UnexpectedContent(String),

    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error("cannot build request: {0}")]
    InvalidRequest(String),

    #[error("cannot save output: {0}")]
    Output(String),
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(" ({m})"))
        .unwrap_or_default()
}

impl From<ClientError> for ScenarioFailure {
    fn from(err: ClientError) -> Self {
        if err.is_transport() {
            ScenarioFailure::Transport(err.to_string())
        } else {
            ScenarioFailure::InvalidRequest(err.message())
        }
    }
}

/// The result of running one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    /// Always [`ScenarioState::Passed`] or [`ScenarioState::Failed`].
    pub state: ScenarioState,
    /// Human-readable summary of what happened.
    pub detail: String,
    pub failure: Option<ScenarioFailure>,
    pub elapsed: Duration,
}

impl ScenarioOutcome {
    pub fn passed(scenario: Scenario, detail: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            scenario,
            state: ScenarioState::Passed,
            detail: detail.into(),
            failure: None,
            elapsed,
        }
    }

    pub fn failed(scenario: Scenario, failure: ScenarioFailure, elapsed: Duration) -> Self {
        Self {
            scenario,
            state: ScenarioState::Failed,
            detail: failure.to_string(),
            failure: Some(failure),
            elapsed,
        }
    }

    pub fn name(&self) -> &'static str {
        self.scenario.name()
    }

    pub fn is_passed(&self) -> bool {
        self.state == ScenarioState::Passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shrinkix_client::{
        ArchiveResult, Bytes, ErrorResult, ImageResult, JsonResult, ResponseMeta, StatusCode,
        UnexpectedResult,
    };

    fn image(content_type: &str, len: usize, preserved: Option<bool>) -> CompressionResult {
        CompressionResult::Image(ImageResult {
            bytes: Bytes::from(vec![0u8; len]),
            content_type: content_type.to_string(),
            original_size: Some(2000),
            compressed_size: Some(1000),
            saved_percent: Some(50.0),
            metadata_preserved: preserved,
            output_format: None,
            width: None,
            height: None,
            compression_count: None,
            meta: ResponseMeta::default(),
        })
    }

    fn json() -> CompressionResult {
        CompressionResult::Json(JsonResult {
            bytes: Bytes::from_static(br#"{"remaining":10}"#),
            meta: ResponseMeta::default(),
        })
    }

    fn error(status: u16, body: &'static str) -> CompressionResult {
        CompressionResult::Error(ErrorResult {
            status: StatusCode::from_u16(status).unwrap(),
            raw_body: Some(Bytes::from_static(body.as_bytes())),
            retry_after: None,
            meta: ResponseMeta::default(),
        })
    }

    #[test]
    fn test_names_round_trip() {
        let names: Vec<&str> = Scenario::ALL.iter().map(Scenario::name).collect();
        assert_eq!(
            names,
            [
                "check-limit",
                "compress",
                "batch-compress",
                "format-conversion",
                "resize",
                "preserve-metadata"
            ]
        );
        for scenario in Scenario::ALL {
            assert_eq!(scenario.name().parse::<Scenario>(), Ok(scenario));
        }
        assert!("nope".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_directives_per_scenario() {
        assert!(Scenario::Compress.directives().is_empty());
        let fields = Scenario::Resize.directives().into_fields();
        assert_eq!((fields[0].name.as_str(), fields[0].value.as_str()), ("width", "100"));
        let fields = Scenario::FormatConversion.directives().into_fields();
        assert_eq!(fields[0].value, "webp");
        let fields = Scenario::PreserveMetadata.directives().into_fields();
        assert_eq!(fields[0].value, "true");
    }

    #[test]
    fn test_check_limit_needs_json() {
        assert!(Scenario::CheckLimit.verify(&json()).is_ok());
        let err = Scenario::CheckLimit
            .verify(&error(429, r#"{"error":"Monthly limit exceeded"}"#))
            .unwrap_err();
        assert_eq!(
            err,
            ScenarioFailure::Protocol {
                status: 429,
                message: Some("Monthly limit exceeded".to_string())
            }
        );
        assert_eq!(err.to_string(), "server answered 429 (Monthly limit exceeded)");
    }

    #[test]
    fn test_compress_needs_image() {
        assert!(Scenario::Compress.verify(&image("image/jpeg", 10, None)).is_ok());
        let err = Scenario::Compress.verify(&json()).unwrap_err();
        assert_eq!(
            err,
            ScenarioFailure::UnexpectedContent("expected image response, got json".to_string())
        );
    }

    #[test]
    fn test_compress_rejects_html_page() {
        let page = CompressionResult::Unexpected(UnexpectedResult {
            content_type: Some("text/html".to_string()),
            bytes: Bytes::from_static(b"<html>maintenance</html>"),
            meta: ResponseMeta::default(),
        });
        let err = Scenario::Compress.verify(&page).unwrap_err();
        assert_eq!(
            err,
            ScenarioFailure::UnexpectedContent("status 200 with content type text/html".to_string())
        );
        assert!(Scenario::Resize.verify(&page).is_err());
    }

    #[test]
    fn test_compress_requires_smaller_output() {
        let mut result = image("image/jpeg", 10, None);
        if let CompressionResult::Image(image) = &mut result {
            image.original_size = Some(1000);
            image.compressed_size = Some(1000);
        }
        let err = Scenario::Compress.verify(&result).unwrap_err();
        assert_eq!(
            err,
            ScenarioFailure::UnexpectedContent(
                "compressed size 1000 is not below original size 1000".to_string()
            )
        );

        if let CompressionResult::Image(image) = &mut result {
            image.compressed_size = Some(999);
        }
        assert_eq!(
            Scenario::Compress.verify(&result).unwrap(),
            "image/jpeg (10 bytes, 1000 -> 999 bytes)"
        );

        if let CompressionResult::Image(image) = &mut result {
            image.original_size = None;
        }
        assert!(Scenario::Compress.verify(&result).is_ok());
    }

    #[test]
    fn test_batch_needs_archive() {
        let archive = CompressionResult::Archive(ArchiveResult {
            bytes: Bytes::from_static(b"PK\x03\x04"),
            total_files: Some(2),
            total_original_size: None,
            total_compressed_size: None,
            meta: ResponseMeta::default(),
        });
        assert_eq!(
            Scenario::BatchCompress.verify(&archive).unwrap(),
            "4 byte archive, 2 files"
        );
        assert!(Scenario::BatchCompress.verify(&image("image/jpeg", 1, None)).is_err());
    }

    #[test]
    fn test_format_conversion_checks_content_type() {
        assert!(Scenario::FormatConversion.verify(&image("image/webp", 10, None)).is_ok());
        let err = Scenario::FormatConversion
            .verify(&image("image/jpeg", 10, None))
            .unwrap_err();
        assert!(matches!(err, ScenarioFailure::UnexpectedContent(_)));
        assert!(err.to_string().contains("image/webp"));
    }

    #[test]
    fn test_resize_threshold() {
        assert!(Scenario::Resize.verify(&image("image/jpeg", 4999, None)).is_ok());
        assert!(Scenario::Resize.verify(&image("image/jpeg", 5000, None)).is_err());
    }

    #[test]
    fn test_preserve_metadata_requires_true() {
        assert!(Scenario::PreserveMetadata.verify(&image("image/jpeg", 1, Some(true))).is_ok());
        assert!(Scenario::PreserveMetadata.verify(&image("image/jpeg", 1, Some(false))).is_err());
        assert!(Scenario::PreserveMetadata.verify(&image("image/jpeg", 1, None)).is_err());
    }

    #[test]
    fn test_client_errors_map_to_failures() {
        let failure: ScenarioFailure = ClientError::Transport("connection refused".into()).into();
        assert!(matches!(failure, ScenarioFailure::Transport(ref m) if m.contains("connection refused")));

        let failure: ScenarioFailure = ClientError::Timeout(Duration::from_secs(1)).into();
        assert!(matches!(failure, ScenarioFailure::Transport(_)));

        let failure: ScenarioFailure = ClientError::InvalidRequest("bad".into()).into();
        assert_eq!(failure, ScenarioFailure::InvalidRequest("bad".to_string()));
    }

    #[test]
    fn test_outcome_constructors() {
        let ok = ScenarioOutcome::passed(Scenario::Resize, "fine", Duration::ZERO);
        assert!(ok.is_passed());
        assert_eq!(ok.name(), "resize");

        let failed = ScenarioOutcome::failed(
            Scenario::Resize,
            ScenarioFailure::Transport("reset".into()),
            Duration::ZERO,
        );
        assert!(!failed.is_passed());
        assert_eq!(failed.state, ScenarioState::Failed);
        assert_eq!(failed.detail, "transport failure: reset");
        assert!(failed.state.is_finished());
        assert!(!ScenarioState::Running.is_finished());
    }
}
