//! Conformance harness for Shrinkix-compatible compression services.
//!
//! Runs six scenarios against a live service and reports one outcome per
//! scenario:
//!
//! | Scenario | Passes when |
//! |---|---|
//! | `check-limit` | the limit check answers JSON |
//! | `compress` | a plain upload answers an image |
//! | `batch-compress` | two images answer a zip archive |
//! | `format-conversion` | `format=webp` answers `image/webp` |
//! | `resize` | `width=100` answers an image under 5000 bytes |
//! | `preserve-metadata` | `preserveMetadata=true` answers `X-Metadata-Preserved: true` |
//!
//! Failures never stop the run; see [`Harness::run_all`].

pub mod config;
pub mod fixtures;
pub mod harness;
pub mod report;
pub mod scenario;

pub use config::{ConfigError, HarnessConfig};
pub use fixtures::{FixtureError, Fixtures};
pub use harness::Harness;
pub use report::Report;
pub use scenario::{Scenario, ScenarioFailure, ScenarioOutcome, ScenarioState};
