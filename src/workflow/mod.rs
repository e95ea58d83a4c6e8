//! Multi-step provisioning workflows with compensation.
//!
//! A composite resource ("create hosted service", then "create deployment")
//! is provisioned as an ordered sequence of forward actions. When one fails,
//! the compensating actions of every step that already completed run in
//! reverse completion order, and the *original* forward failure is surfaced
//! to the caller; a cleanup error must never mask the root cause, so
//! compensation failures are logged and recorded as warnings instead of
//! propagating.
//!
//! Step outcomes are explicit `Result` values rather than unwinding, which
//! keeps the reverse-order rollback independently testable without real
//! I/O. A forward action with an ambiguous outcome (request sent, response
//! lost) must report failure, and compensations must therefore be safe to
//! run against a possibly-already-created resource ("delete if exists").

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::error::EngineError;

/// Future returned by step actions.
pub type StepFuture<'a> = Pin<Box<dyn Future<Output = Result<(), EngineError>> + Send + 'a>>;

type Action<'a> = Box<dyn FnOnce() -> StepFuture<'a> + Send + 'a>;

/// One step of a provisioning sequence: a named forward action and an
/// optional compensating action that reverses it.
pub struct Step<'a> {
    name: String,
    forward: Action<'a>,
    compensate: Option<Action<'a>>,
}

impl<'a> Step<'a> {
    /// Creates a step from a name and a forward action.
    #[must_use]
    pub fn new<F, Fut>(name: impl Into<String>, forward: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<(), EngineError>> + Send + 'a,
    {
        Self {
            name: name.into(),
            forward: Box::new(move || Box::pin(forward())),
            compensate: None,
        }
    }

    /// Attaches a compensating action. Steps without one (read-only
    /// lookups, irreversible work) are simply skipped during rollback.
    #[must_use]
    pub fn with_compensation<F, Fut>(mut self, compensate: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<(), EngineError>> + Send + 'a,
    {
        self.compensate = Some(Box::new(move || Box::pin(compensate())));
        self
    }

    /// Name used in failure reports and rollback warnings.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Step<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Step")
            .field("name", &self.name)
            .field("has_compensation", &self.compensate.is_some())
            .finish()
    }
}

/// A compensation that failed during rollback. Recorded, never propagated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompensationWarning {
    /// Name of the step whose compensation failed.
    pub step: String,
    /// The compensation's own error.
    pub error: EngineError,
}

/// Failure of a provisioning sequence: the original forward error plus any
/// compensation failures collected while rolling back.
#[derive(Debug, Error)]
#[error("provisioning step '{step}' failed: {error}")]
pub struct WorkflowFailure {
    /// Name of the step whose forward action failed.
    pub step: String,
    /// The original forward error, surfaced unmodified.
    #[source]
    pub error: EngineError,
    /// Compensations that failed while rolling back, in execution order.
    pub compensation_warnings: Vec<CompensationWarning>,
}

/// Executes an ordered provisioning sequence with rollback on failure.
///
/// The sequence is owned by this call and discarded when it returns,
/// whether it succeeds or was compensated. Steps run strictly in declared
/// order; the first forward failure stops the sequence, later steps never
/// run, and the compensations of completed steps run in reverse completion
/// order.
///
/// # Errors
///
/// Returns [`WorkflowFailure`] carrying the original forward error; see
/// [`WorkflowFailure::compensation_warnings`] for rollback problems.
pub async fn run(steps: Vec<Step<'_>>) -> Result<(), WorkflowFailure> {
    let mut completed: Vec<(String, Option<Action<'_>>)> = Vec::with_capacity(steps.len());
    for step in steps {
        match (step.forward)().await {
            Ok(()) => completed.push((step.name, step.compensate)),
            Err(error) => {
                let compensation_warnings = rollback(completed).await;
                return Err(WorkflowFailure {
                    step: step.name,
                    error,
                    compensation_warnings,
                });
            }
        }
    }
    Ok(())
}

async fn rollback(completed: Vec<(String, Option<Action<'_>>)>) -> Vec<CompensationWarning> {
    let mut warnings = Vec::new();
    for (step, compensate) in completed.into_iter().rev() {
        let Some(action) = compensate else {
            continue;
        };
        if let Err(error) = action().await {
            tracing::warn!(%step, %error, "compensation failed during rollback");
            warnings.push(CompensationWarning { step, error });
        }
    }
    warnings
}
