//! Drives the harness against in-process axum services.

use axum::Router;
use axum::extract::Multipart;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use shrinkix_client::{FilePart, ShrinkixClient};
use shrinkix_conformance::{
    Fixtures, Harness, HarnessConfig, Scenario, ScenarioFailure, ScenarioState,
};
use tokio::net::TcpListener;

struct Upload {
    fields: Vec<(String, String)>,
    files: Vec<(String, Vec<u8>)>,
}

impl Upload {
    async fn read(mut multipart: Multipart) -> Self {
        let mut upload = Upload {
            fields: Vec::new(),
            files: Vec::new(),
        };
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            if field.file_name().is_some() {
                upload.files.push((name, field.bytes().await.unwrap().to_vec()));
            } else {
                upload.fields.push((name, field.text().await.unwrap()));
            }
        }
        upload
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

async fn limit_ok() -> Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"remaining":499}"#,
    )
        .into_response()
}

async fn compress_ok(multipart: Multipart) -> Response {
    let upload = Upload::read(multipart).await;
    let Some((_, image)) = upload.files.iter().find(|(name, _)| name == "image") else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let content_type = match upload.field("format") {
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };
    let body = match upload.field("width") {
        Some(_) => vec![0xAB; 120],
        None => image[..image.len() / 2].to_vec(),
    };
    let preserved = upload.field("preserveMetadata").unwrap_or("false").to_string();

    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::HeaderName::from_static("x-metadata-preserved"), preserved),
            (header::HeaderName::from_static("x-original-size"), image.len().to_string()),
            (header::HeaderName::from_static("x-compressed-size"), body.len().to_string()),
        ],
        body,
    )
        .into_response()
}

async fn batch_ok(multipart: Multipart) -> Response {
    let upload = Upload::read(multipart).await;
    let mut archive = b"PK\x03\x04".to_vec();
    for (name, data) in &upload.files {
        assert_eq!(name, "images[]");
        archive.extend_from_slice(data);
    }
    (
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::HeaderName::from_static("x-total-files"), upload.files.len().to_string()),
        ],
        archive,
    )
        .into_response()
}

/// Answers 200 but ignores every directive.
async fn compress_ignoring_directives(multipart: Multipart) -> Response {
    let _ = Upload::read(multipart).await;
    ([(header::CONTENT_TYPE, "image/jpeg")], vec![0u8; 6000]).into_response()
}

/// A proxy maintenance page served with status 200.
async fn maintenance_page() -> Response {
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        "<html>maintenance</html>",
    )
        .into_response()
}

async fn limit_exhausted() -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        r#"{"error":"Monthly limit exceeded"}"#,
    )
        .into_response()
}

async fn batch_broken() -> Response {
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn compliant() -> Router {
    Router::new()
        .route("/api/check-limit", get(limit_ok))
        .route("/api/compress", post(compress_ok))
        .route("/api/compress/batch", post(batch_ok))
}

fn fixtures() -> Fixtures {
    Fixtures::from_parts(
        FilePart::image("test_quality_90.jpg", vec![0xFF; 8000]),
        FilePart::image("test_quality_10.jpg", vec![0xEE; 3000]),
    )
}

fn harness(base_url: &str) -> Harness {
    let client = ShrinkixClient::builder(base_url)
        .api_key("sk_test_placeholder")
        .build()
        .unwrap();
    Harness::new(client, fixtures())
}

#[tokio::test]
async fn test_compliant_service_passes_everything() {
    let base = serve(compliant()).await;
    let mut harness = harness(&base);

    let report = harness.run_all().await;

    assert!(report.all_passed(), "{report}");
    assert_eq!(report.total(), 6);
    let order: Vec<Scenario> = report.outcomes().iter().map(|o| o.scenario).collect();
    assert_eq!(order, Scenario::ALL);
    for scenario in Scenario::ALL {
        assert_eq!(harness.state(scenario), ScenarioState::Passed);
    }
    assert!(report.to_string().ends_with("6/6 passed"));
}

#[tokio::test]
async fn test_failures_do_not_stop_the_run() {
    let base = serve(
        Router::new()
            .route("/api/check-limit", get(limit_exhausted))
            .route("/api/compress", post(compress_ignoring_directives))
            .route("/api/compress/batch", post(batch_broken)),
    )
    .await;
    let mut harness = harness(&base);

    let report = harness.run_all().await;

    assert_eq!(report.total(), 6);
    assert_eq!(report.passed(), 1);
    assert!(!report.all_passed());

    let failure = |scenario| {
        report
            .outcome(scenario)
            .and_then(|o| o.failure.clone())
            .unwrap_or_else(|| panic!("{scenario} passed"))
    };
    assert_eq!(
        failure(Scenario::CheckLimit),
        ScenarioFailure::Protocol {
            status: 429,
            message: Some("Monthly limit exceeded".to_string())
        }
    );
    assert!(report.outcome(Scenario::Compress).unwrap().is_passed());
    assert!(matches!(
        failure(Scenario::BatchCompress),
        ScenarioFailure::Protocol { status: 500, .. }
    ));
    for scenario in [
        Scenario::FormatConversion,
        Scenario::Resize,
        Scenario::PreserveMetadata,
    ] {
        assert!(matches!(
            failure(scenario),
            ScenarioFailure::UnexpectedContent(_)
        ));
    }
}

#[tokio::test]
async fn test_html_page_on_compress_fails() {
    let base = serve(
        Router::new()
            .route("/api/check-limit", get(limit_ok))
            .route("/api/compress", post(maintenance_page))
            .route("/api/compress/batch", post(batch_ok)),
    )
    .await;
    let mut harness = harness(&base);

    let report = harness.run_all().await;

    let compress = report.outcome(Scenario::Compress).unwrap();
    assert_eq!(compress.state, ScenarioState::Failed);
    assert_eq!(
        compress.failure,
        Some(ScenarioFailure::UnexpectedContent(
            "status 200 with content type text/html; charset=utf-8".to_string()
        ))
    );
    for scenario in [
        Scenario::FormatConversion,
        Scenario::Resize,
        Scenario::PreserveMetadata,
    ] {
        assert!(!report.outcome(scenario).unwrap().is_passed(), "{scenario} passed");
    }
    assert_eq!(report.passed(), 2, "{report}");
}

#[tokio::test]
async fn test_unreachable_service_fails_every_scenario() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let mut harness = harness(&format!("http://{addr}"));

    let report = harness.run_all().await;

    assert_eq!(report.passed(), 0);
    for outcome in report.outcomes() {
        assert_eq!(outcome.state, ScenarioState::Failed);
        assert!(
            matches!(outcome.failure, Some(ScenarioFailure::Transport(_))),
            "{}: {}",
            outcome.name(),
            outcome.detail
        );
        assert!(outcome.detail.starts_with("transport failure"));
    }
}

#[tokio::test]
async fn test_missing_fixture_fails_only_dependent_scenarios() {
    let base = serve(compliant()).await;
    let dir = tempfile::tempdir().unwrap();
    let primary = dir.path().join("test_quality_90.jpg");
    tokio::fs::write(&primary, vec![0xFF; 4000]).await.unwrap();

    let config = HarnessConfig {
        server_url: base,
        test_image: primary,
        secondary_image: dir.path().join("test_quality_10.jpg"),
        ..HarnessConfig::default()
    };
    let mut harness = Harness::from_config(&config).await.unwrap();

    let report = harness.run_all().await;

    assert_eq!(report.passed(), 5, "{report}");
    let batch = report.outcome(Scenario::BatchCompress).unwrap();
    assert!(matches!(batch.failure, Some(ScenarioFailure::Fixture(_))));
    assert!(batch.detail.contains("test_quality_10.jpg"));
}

#[tokio::test]
async fn test_output_dir_receives_payloads() {
    let base = serve(compliant()).await;
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let mut harness = harness(&base).output_dir(&out);

    let report = harness.run_all().await;
    assert!(report.all_passed(), "{report}");

    for name in [
        "compressed.jpg",
        "compressed_batch.zip",
        "converted.webp",
        "resized.jpg",
        "metadata.jpg",
    ] {
        assert!(out.join(name).is_file(), "missing {name}");
    }
    assert_eq!(std::fs::read(out.join("resized.jpg")).unwrap().len(), 120);
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 5);
}
