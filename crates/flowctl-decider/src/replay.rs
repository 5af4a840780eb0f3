use crate::error::ReplayError;
use crate::projector::ProjectedState;
use crate::scheduler::{ScheduleRequest, WorkflowContext};
use flowctl_types::ReplayControl;
use serde_json::Value;
use tracing::debug;

/// Control-flow unwind a workflow function propagates via `?`.
///
/// Workflow functions read `Outcome<T>` values with `.result()`, which
/// returns `Err(ReplayControl::SyncNeeded)` on an unresolved placeholder.
/// `From<ReplayControl>` lets that convert straight into `Unwind` at the `?`
/// site; [`ReplayRuntime::run`] is the only place that ever observes
/// `Unwind::SyncNeeded` — it always means "stop here, this turn is done,"
/// never a real failure.
#[derive(Debug)]
pub enum Unwind {
    SyncNeeded,
    Failed(ReplayError),
}

impl From<ReplayControl> for Unwind {
    fn from(control: ReplayControl) -> Self {
        match control {
            ReplayControl::SyncNeeded => Self::SyncNeeded,
            ReplayControl::Activity(reason) => Self::Failed(ReplayError::UnhandledActivityError(reason)),
        }
    }
}

impl From<ReplayError> for Unwind {
    fn from(err: ReplayError) -> Self {
        Self::Failed(err)
    }
}

/// A workflow function: given the replay context, produce the workflow's
/// final result or unwind early via [`Unwind`].
pub type WorkflowFn = dyn Fn(&WorkflowContext) -> Result<Value, Unwind>;

/// How a replay pass concluded, once the trampoline finishes (as opposed to
/// being cut short by `Unwind::SyncNeeded`, which just ends the turn).
#[derive(Clone, Debug, PartialEq)]
pub enum TerminalOutcome {
    Completed(Value),
    Failed(String),
}

/// Everything a single decision turn's replay produced: calls newly enqueued
/// by the workflow function, and whether the workflow reached a terminal
/// state this turn.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ReplayResult {
    pub pending: Vec<ScheduleRequest>,
    pub terminal: Option<TerminalOutcome>,
}

/// Runs a workflow function once against projected history, catching the
/// `SyncNeeded` unwind at this single boundary.
///
/// This is the trampoline: the source runtime unwound a Python exception up
/// through arbitrarily many stack frames back to `resume()`; here the same
/// shape is an ordinary `Result` threaded out via `?`, caught exactly once,
/// right here.
pub struct ReplayRuntime;

impl ReplayRuntime {
    pub fn run(workflow_fn: &WorkflowFn, projected: ProjectedState) -> ReplayResult {
        let ctx = WorkflowContext::new(projected);

        let terminal = match workflow_fn(&ctx) {
            Ok(value) => Some(TerminalOutcome::Completed(value)),
            Err(Unwind::SyncNeeded) => None,
            Err(Unwind::Failed(err)) => Some(TerminalOutcome::Failed(err.into_reason())),
        };

        let pending = ctx.take_pending();
        debug!(pending = pending.len(), terminal = ?terminal, "replay turn finished");
        ReplayResult { pending, terminal }
    }
}
