use flowctl_types::{CallId, ContextCodecError};
use thiserror::Error;

/// Errors produced by the history projector while folding events into
/// per-call state.
///
/// Mirrors the structural half of the error taxonomy: these are all
/// conditions the projector can detect on its own, without needing the
/// workflow function to run.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The persisted execution context could not be decoded. Fatal: the
    /// alternative is silently losing retry counters and scheduling state,
    /// which is worse than a loud failure.
    #[error("failed to decode execution context: {0}")]
    ContextDecodeFailure(#[from] ContextCodecError),

    /// More than one `DecisionTaskCompleted` event appeared in the window of
    /// events newer than `previousStartedEventId`. The projector assumes
    /// exactly zero or one; seeing two means the history or the caller's
    /// windowing is broken.
    #[error("expected at most one DecisionTaskCompleted event in the new window, found {count}")]
    MultipleDecisionTasksCompleted { count: usize },

    /// A completion/failure/timeout event referenced a `scheduledEventId`
    /// that was never recorded as an `ActivityTaskScheduled` (or the
    /// sub-workflow analogue) event id.
    #[error("event references unknown scheduled event id {scheduled_event_id}")]
    UnknownScheduledEventId { scheduled_event_id: u64 },

    /// The first event of a brand-new execution was not
    /// `WorkflowExecutionStarted`, so no input is available.
    #[error("workflow execution started event is missing; no input was captured")]
    MissingWorkflowInput,
}

/// Errors produced while replaying a workflow function.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// The workflow observed an `Error` outcome (directly or composed from
    /// its arguments) without `error_handling` turned on for that scope.
    #[error("unhandled activity error: {0}")]
    UnhandledActivityError(String),

    /// The workflow function called `fail()` directly rather than letting an
    /// unhandled activity error propagate.
    #[error("workflow failed: {0}")]
    WorkflowFailed(String),
}

impl ReplayError {
    /// The bare reason string carried by either variant, without the
    /// `Display` impl's diagnostic prefix.
    ///
    /// This is what a `TerminateWorkflowExecution` decision's `reason` must
    /// carry verbatim (spec S6, testable property 6): the original
    /// implementation terminates with the raw `e.message`/composed error
    /// string, never a decorated one. The prefixed `Display` form stays
    /// reserved for logging.
    pub fn into_reason(self) -> String {
        match self {
            Self::UnhandledActivityError(reason) => reason,
            Self::WorkflowFailed(reason) => reason,
        }
    }
}

/// Invariant violations detected in projected per-call state.
///
/// Corresponds to the disjointness invariant over `scheduled`, `results`,
/// `with_errors`, and `timed_out`: a call id that is reachable from history
/// must not appear in more than one of those sets at once (a call may move
/// from `timed_out` back into `scheduled` on retry, which is why the check
/// is about simultaneous membership, not historical membership).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateViolation {
    #[error("call {call_id} is present in more than one of scheduled/results/with_errors/timed_out: {sets:?}")]
    NotDisjoint { call_id: CallId, sets: Vec<&'static str> },
}
