//! Deferred teardown for scenario resources
//!
//! Every zone a scenario creates is registered here right after creation.
//! The runner drains the stack when the scenario ends, whether the body
//! passed or failed, newest registration first.
//!
//! Delete teardowns treat NotFound as success: the scenario may already
//! have deleted the zone itself. Any other teardown failure is logged and
//! returned to the caller, and the remaining teardowns still run.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::traits::ZoneClient;

type DeferredFn = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send>;

enum CleanupAction {
    /// Delete a zone as the identity that created it
    DeleteZone {
        client: Arc<dyn ZoneClient>,
        zone_id: String,
    },
    /// Arbitrary async teardown
    Deferred { description: String, run: DeferredFn },
}

impl CleanupAction {
    fn describe(&self) -> String {
        match self {
            CleanupAction::DeleteZone { client, zone_id } => {
                format!("delete zone {} as {}", zone_id, client.identity())
            }
            CleanupAction::Deferred { description, .. } => description.clone(),
        }
    }
}

/// A teardown that failed for a reason other than the resource being gone
#[derive(Debug)]
pub struct CleanupFailure {
    pub description: String,
    pub error: Error,
}

impl fmt::Display for CleanupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.description, self.error)
    }
}

/// Stack of deferred teardown actions, executed in reverse order
#[derive(Default)]
pub struct CleanupStack {
    actions: Vec<CleanupAction>,
}

impl CleanupStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register deletion of a zone; NotFound during teardown is tolerated
    pub fn delete_zone(&mut self, client: Arc<dyn ZoneClient>, zone_id: impl Into<String>) {
        let zone_id = zone_id.into();
        debug!("Registered cleanup: delete zone {} as {}", zone_id, client.identity());
        self.actions.push(CleanupAction::DeleteZone { client, zone_id });
    }

    /// Register an arbitrary async teardown
    pub fn defer<F, Fut>(&mut self, description: impl Into<String>, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.actions.push(CleanupAction::Deferred {
            description: description.into(),
            run: Box::new(move || Box::pin(f())),
        });
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Descriptions of the teardowns still registered, newest first
    pub fn pending(&self) -> Vec<String> {
        self.actions.iter().rev().map(|a| a.describe()).collect()
    }

    /// Run every registered teardown, newest first
    ///
    /// Leaves the stack empty. Returns the failures that were not tolerated.
    pub async fn run(&mut self) -> Vec<CleanupFailure> {
        let mut failures = Vec::new();

        while let Some(action) = self.actions.pop() {
            let description = action.describe();
            debug!("Cleanup: {}", description);

            let result = match action {
                CleanupAction::DeleteZone { client, zone_id } => {
                    match client.delete_zone(&zone_id).await {
                        Ok(_) => Ok(()),
                        Err(e) if e.is_not_found() => {
                            debug!("Zone {} already gone", zone_id);
                            Ok(())
                        }
                        Err(e) => Err(e),
                    }
                }
                CleanupAction::Deferred { run, .. } => run().await,
            };

            if let Err(error) = result {
                warn!("Cleanup failed ({}): {}", description, error);
                failures.push(CleanupFailure { description, error });
            }
        }

        failures
    }
}

impl fmt::Debug for CleanupStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupStack")
            .field("actions", &self.pending())
            .finish()
    }
}

impl Drop for CleanupStack {
    fn drop(&mut self) {
        if !self.actions.is_empty() {
            warn!(
                "CleanupStack dropped with {} pending teardown(s); resources may leak: {}",
                self.actions.len(),
                self.pending().join(", ")
            );
        }
    }
}
