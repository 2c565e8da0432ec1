use shrinkix_conformance::{Harness, HarnessConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = HarnessConfig::from_env()?;
    tracing::info!(server = %config.server_url, "starting conformance run");

    let mut harness = Harness::from_config(&config).await?;

    println!("=== Shrinkix Conformance Tests ===");
    let report = harness.run_all().await;
    println!("{report}");

    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}
