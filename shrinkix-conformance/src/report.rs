//! Aggregated results of a conformance run.

use std::fmt;
use std::time::Duration;

use crate::scenario::{Scenario, ScenarioOutcome};

/// One outcome per scenario that ran, in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    outcomes: Vec<ScenarioOutcome>,
}

impl Report {
    pub fn new(outcomes: Vec<ScenarioOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[ScenarioOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, scenario: Scenario) -> Option<&ScenarioOutcome> {
        self.outcomes.iter().find(|o| o.scenario == scenario)
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_passed()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioOutcome> {
        self.outcomes.iter().filter(|o| !o.is_passed())
    }

    /// `true` iff every outcome passed.
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(ScenarioOutcome::is_passed)
    }

    pub fn elapsed(&self) -> Duration {
        self.outcomes.iter().map(|o| o.elapsed).sum()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            if outcome.is_passed() {
                writeln!(f, "  PASS  {} ({})", outcome.name(), outcome.detail)?;
            } else {
                writeln!(f, "  FAIL  {}: {}", outcome.name(), outcome.detail)?;
            }
        }
        writeln!(f)?;
        write!(f, "{}/{} passed", self.passed(), self.total())
    }
}
