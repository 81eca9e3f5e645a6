//! Scenario runner
//!
//! A scenario drives create/read/update/delete calls against the service,
//! waits for convergence through the [`crate::poller::StatePoller`] and
//! asserts on what it observes.
//!
//! ## Lifecycle
//!
//! For every scenario the runner:
//!
//! 1. Skips it if the context lacks one of its required identities
//! 2. Hands it a fresh [`CleanupStack`] and runs the body
//! 3. Drains the cleanup stack, newest first, even when the body failed or
//!    panicked
//! 4. Records the outcome and moves on; one failing scenario never stops
//!    the run

pub mod assertions;
pub mod zones;

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::FutureExt as _;
use tracing::{error, info, warn};

use crate::cleanup::{CleanupFailure, CleanupStack};
use crate::context::{Identity, TestContext};
use crate::error::{Error, Result};

/// Tag carried by the quick, always-run scenarios
pub const SMOKE: &str = "smoke";

/// One end-to-end check against the service
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Short snake_case name, unique within a runner
    fn name(&self) -> &'static str;

    /// Stable UUID identifying this check across renames
    fn idempotent_id(&self) -> &'static str;

    fn tags(&self) -> &'static [&'static str] {
        &[]
    }

    /// Identities that must be present in the context
    fn required_identities(&self) -> &'static [Identity] {
        &[Identity::Primary]
    }

    /// Run the body; register every created resource on `cleanup`
    async fn run(&self, ctx: &TestContext, cleanup: &mut CleanupStack) -> Result<()>;
}

/// How a scenario ended
#[derive(Debug)]
pub enum ScenarioOutcome {
    Passed,
    Failed(Error),
    Skipped(String),
}

impl ScenarioOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, ScenarioOutcome::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ScenarioOutcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ScenarioOutcome::Skipped(_))
    }
}

/// Result of a single scenario
#[derive(Debug)]
pub struct ScenarioReport {
    pub name: &'static str,
    pub idempotent_id: &'static str,
    pub outcome: ScenarioOutcome,
    /// Teardowns that failed for reasons other than "already gone"
    pub cleanup_failures: Vec<CleanupFailure>,
    pub elapsed: Duration,
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            ScenarioOutcome::Passed => write!(f, "{} ... ok", self.name)?,
            ScenarioOutcome::Failed(e) => write!(f, "{} ... FAILED: {}", self.name, e)?,
            ScenarioOutcome::Skipped(reason) => write!(f, "{} ... skipped ({})", self.name, reason)?,
        }
        if !self.cleanup_failures.is_empty() {
            write!(f, " [{} cleanup failure(s)]", self.cleanup_failures.len())?;
        }
        Ok(())
    }
}

/// Results of a whole run, in execution order
#[derive(Debug, Default)]
pub struct RunReport {
    pub scenarios: Vec<ScenarioReport>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|r| r.outcome.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.scenarios.iter().filter(|r| r.outcome.is_failed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.scenarios.iter().filter(|r| r.outcome.is_skipped()).count()
    }

    /// No scenario failed
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn get(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|r| r.name == name)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.scenarios {
            writeln!(f, "{}", report)?;
        }
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped()
        )
    }
}

/// Runs scenarios one after another against a shared context
#[derive(Default)]
pub struct ScenarioRunner {
    scenarios: Vec<Box<dyn Scenario>>,
    tag: Option<String>,
}

impl ScenarioRunner {
    /// Create an empty runner
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner preloaded with every zone scenario
    pub fn zones() -> Self {
        let mut runner = Self::new();
        for scenario in zones::all() {
            runner.add(scenario);
        }
        runner
    }

    /// Append a scenario
    pub fn add(&mut self, scenario: Box<dyn Scenario>) -> &mut Self {
        self.scenarios.push(scenario);
        self
    }

    /// Only run scenarios carrying `tag`
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Names of the scenarios that would run, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.selected().map(|s| s.name()).collect()
    }

    fn selected(&self) -> impl Iterator<Item = &Box<dyn Scenario>> + '_ {
        self.scenarios.iter().filter(move |scenario| {
            self.tag
                .as_deref()
                .is_none_or(|tag| scenario.tags().contains(&tag))
        })
    }

    /// Run every selected scenario
    pub async fn run_all(&self, ctx: &TestContext) -> RunReport {
        let mut report = RunReport::default();
        for scenario in self.selected() {
            report.scenarios.push(Self::run_scenario(ctx, scenario.as_ref()).await);
        }

        info!(
            "Run finished: {} passed, {} failed, {} skipped",
            report.passed(),
            report.failed(),
            report.skipped()
        );
        report
    }

    /// Run the selected scenario named `name`
    pub async fn run_named(&self, ctx: &TestContext, name: &str) -> Option<ScenarioReport> {
        let scenario = self.selected().find(|s| s.name() == name)?;
        Some(Self::run_scenario(ctx, scenario.as_ref()).await)
    }

    /// Run one scenario with its own cleanup scope
    pub async fn run_scenario(ctx: &TestContext, scenario: &dyn Scenario) -> ScenarioReport {
        let started = Instant::now();

        if let Some(missing) = scenario
            .required_identities()
            .iter()
            .find(|identity| !ctx.has(**identity))
        {
            let reason = format!("no {} credentials", missing);
            info!("Skipping {}: {}", scenario.name(), reason);
            return ScenarioReport {
                name: scenario.name(),
                idempotent_id: scenario.idempotent_id(),
                outcome: ScenarioOutcome::Skipped(reason),
                cleanup_failures: Vec::new(),
                elapsed: started.elapsed(),
            };
        }

        info!("Running {} [{}]", scenario.name(), scenario.idempotent_id());
        let mut cleanup = CleanupStack::new();
        let result = AssertUnwindSafe(scenario.run(ctx, &mut cleanup))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(Error::Other(format!(
                    "scenario panicked: {}",
                    panic_message(panic)
                )))
            });

        // Teardown is unconditional
        let cleanup_failures = cleanup.run().await;
        if !cleanup_failures.is_empty() {
            warn!(
                "{}: {} cleanup failure(s)",
                scenario.name(),
                cleanup_failures.len()
            );
        }

        let outcome = match result {
            Ok(()) => {
                info!("{} passed", scenario.name());
                ScenarioOutcome::Passed
            }
            Err(e) => {
                error!("{} failed: {}", scenario.name(), e);
                ScenarioOutcome::Failed(e)
            }
        };

        ScenarioReport {
            name: scenario.name(),
            idempotent_id: scenario.idempotent_id(),
            outcome,
            cleanup_failures,
            elapsed: started.elapsed(),
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    panic.downcast::<String>().map_or_else(
        |panic| {
            panic
                .downcast::<&'static str>()
                .map_or_else(|_| "unknown panic".to_owned(), |message| (*message).to_owned())
        },
        |message| *message,
    )
}

impl fmt::Debug for ScenarioRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("scenarios", &self.scenarios.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("tag", &self.tag)
            .finish()
    }
}
