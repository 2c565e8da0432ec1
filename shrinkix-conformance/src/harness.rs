//! Sequential runner for the conformance scenarios.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use shrinkix_client::{CompressionResult, ShrinkixClient};

use crate::config::{ConfigError, HarnessConfig};
use crate::fixtures::Fixtures;
use crate::report::Report;
use crate::scenario::{Scenario, ScenarioFailure, ScenarioOutcome, ScenarioState};

/// Runs scenarios one after another against a single service.
///
/// Scenarios share only the client and the read-only fixtures, so a failing
/// scenario never affects the next one.
///
/// # Example
///
/// ```ignore
/// let config = HarnessConfig::from_env()?;
/// let mut harness = Harness::from_config(&config).await?;
/// let report = harness.run_all().await;
/// println!("{report}");
/// ```
#[derive(Debug)]
pub struct Harness {
    client: ShrinkixClient,
    fixtures: Fixtures,
    output_dir: Option<PathBuf>,
    states: HashMap<Scenario, ScenarioState>,
}

impl Harness {
    pub fn new(client: ShrinkixClient, fixtures: Fixtures) -> Self {
        Self {
            client,
            fixtures,
            output_dir: None,
            states: HashMap::new(),
        }
    }

    /// Build the client and load the fixtures described by `config`.
    pub async fn from_config(config: &HarnessConfig) -> Result<Self, ConfigError> {
        let client = config.client()?;
        let fixtures = Fixtures::load(config).await;
        let mut harness = Self::new(client, fixtures);
        harness.output_dir = config.output_dir.clone();
        Ok(harness)
    }

    /// Save successful payloads under `dir`.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn state(&self, scenario: Scenario) -> ScenarioState {
        self.states.get(&scenario).copied().unwrap_or_default()
    }

    pub async fn run_all(&mut self) -> Report {
        self.run(&Scenario::ALL).await
    }

    /// Run `scenarios` in order. Every scenario runs regardless of earlier
    /// failures.
    pub async fn run(&mut self, scenarios: &[Scenario]) -> Report {
        let mut outcomes = Vec::with_capacity(scenarios.len());
        for &scenario in scenarios {
            outcomes.push(self.run_one(scenario).await);
        }
        Report::new(outcomes)
    }

    pub async fn run_one(&mut self, scenario: Scenario) -> ScenarioOutcome {
        self.states.insert(scenario, ScenarioState::Running);
        tracing::info!(scenario = %scenario, "running");

        let started = Instant::now();
        let outcome = match self.execute(scenario).await {
            Ok(detail) => {
                tracing::info!(scenario = %scenario, %detail, "passed");
                ScenarioOutcome::passed(scenario, detail, started.elapsed())
            }
            Err(failure) => {
                tracing::warn!(scenario = %scenario, error = %failure, "failed");
                ScenarioOutcome::failed(scenario, failure, started.elapsed())
            }
        };

        self.states.insert(scenario, outcome.state);
        outcome
    }

    async fn execute(&self, scenario: Scenario) -> Result<String, ScenarioFailure> {
        let result = match scenario {
            Scenario::CheckLimit => self.client.check_limit().await?,
            Scenario::BatchCompress => {
                let images = [
                    self.fixtures.primary()?.clone(),
                    self.fixtures.secondary()?.clone(),
                ];
                self.client.compress_batch(&images).await?
            }
            Scenario::Compress
            | Scenario::FormatConversion
            | Scenario::Resize
            | Scenario::PreserveMetadata => {
                let image = self.fixtures.primary()?;
                self.client
                    .compress_with(image, scenario.directives())
                    .await?
            }
        };

        let detail = scenario.verify(&result)?;

        match self.save(scenario, &result).await? {
            Some(path) => Ok(format!("{detail}, saved {}", path.display())),
            None => Ok(detail),
        }
    }

    async fn save(
        &self,
        scenario: Scenario,
        result: &CompressionResult,
    ) -> Result<Option<PathBuf>, ScenarioFailure> {
        let (Some(dir), Some(stem)) = (&self.output_dir, scenario.output_stem()) else {
            return Ok(None);
        };

        let written = match result {
            CompressionResult::Image(image) => {
                let ext = image.format().map(|f| f.as_str()).unwrap_or("bin");
                let path = output_path(dir, stem, ext);
                write_output(dir, &path, image.write_to(&path)).await?;
                Some(path)
            }
            CompressionResult::Archive(archive) => {
                let path = output_path(dir, stem, "zip");
                write_output(dir, &path, archive.write_to(&path)).await?;
                Some(path)
            }
            _ => None,
        };

        if let Some(path) = &written {
            tracing::debug!(scenario = %scenario, path = %path.display(), "saved output");
        }
        Ok(written)
    }
}

fn output_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    dir.join(format!("{stem}.{ext}"))
}

async fn write_output(
    dir: &Path,
    path: &Path,
    write: impl Future<Output = std::io::Result<()>>,
) -> Result<(), ScenarioFailure> {
    let failed = |e: std::io::Error| ScenarioFailure::Output(format!("{}: {e}", path.display()));
    tokio::fs::create_dir_all(dir).await.map_err(failed)?;
    write.await.map_err(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shrinkix_client::FilePart;

    fn unreachable_harness() -> Harness {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let client = ShrinkixClient::builder(format!("http://{addr}"))
            .api_key("sk_test_placeholder")
            .build()
            .unwrap();
        let fixtures = Fixtures::from_parts(
            FilePart::image("a.jpg", vec![1, 2, 3]),
            FilePart::image("b.jpg", vec![4, 5, 6]),
        );
        Harness::new(client, fixtures)
    }

    #[test]
    fn test_states_start_not_run() {
        let harness = unreachable_harness();
        for scenario in Scenario::ALL {
            assert_eq!(harness.state(scenario), ScenarioState::NotRun);
        }
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("out"), "converted", "webp"),
            PathBuf::from("out/converted.webp")
        );
    }

    #[tokio::test]
    async fn test_failed_scenario_records_state() {
        let mut harness = unreachable_harness();
        let outcome = harness.run_one(Scenario::CheckLimit).await;

        assert_eq!(outcome.state, ScenarioState::Failed);
        assert!(matches!(outcome.failure, Some(ScenarioFailure::Transport(_))));
        assert_eq!(harness.state(Scenario::CheckLimit), ScenarioState::Failed);
        assert_eq!(harness.state(Scenario::Compress), ScenarioState::NotRun);
    }
}
