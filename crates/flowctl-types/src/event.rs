use crate::call_id::CallId;
use serde::{Deserialize, Serialize};

/// Distinguishes an activity call from a sub-workflow call.
///
/// Both are scheduled, started, completed, failed, or timed out through the
/// same family of events on the remote service; this tag lets the projector
/// fold both into one call-indexed state table instead of two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    Activity,
    Subworkflow,
}

/// One event in the execution's history, as delivered by the remote service.
///
/// `event_id` is the server-assigned, strictly increasing identifier used to
/// find `previousStartedEventId` and to resolve `scheduledEventId` references
/// on completion/failure/timeout events back to the `CallId` they belong to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub event_id: u64,
    pub kind: EventKind,
}

/// The event types the projector understands.
///
/// Unknown event types (anything not matched here) are ignored by the
/// projector rather than treated as an error — the history format is
/// expected to grow new event kinds over time that this engine has no
/// reason to react to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Always the first event of an execution. Carries the raw workflow
    /// input envelope.
    WorkflowExecutionStarted { input: String },

    /// Recorded once per decision turn when the decider responds. Carries the
    /// execution context blob from the *previous* turn, if any.
    DecisionTaskCompleted { execution_context: Option<String> },

    /// A call (activity or sub-workflow) was scheduled on the server.
    /// `activity_id` is the decimal string encoding of the `CallId`.
    Scheduled {
        kind: CallKind,
        activity_id: String,
        name: String,
        version: String,
        input: String,
    },
    /// The scheduled call completed successfully.
    Completed {
        kind: CallKind,
        scheduled_event_id: u64,
        result: String,
    },
    /// The scheduled call failed.
    Failed {
        kind: CallKind,
        scheduled_event_id: u64,
        reason: String,
    },
    /// The scheduled call timed out before completing.
    TimedOut {
        kind: CallKind,
        scheduled_event_id: u64,
    },
}

impl EventKind {
    /// Variant name, for logging and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WorkflowExecutionStarted { .. } => "WorkflowExecutionStarted",
            Self::DecisionTaskCompleted { .. } => "DecisionTaskCompleted",
            Self::Scheduled { .. } => "Scheduled",
            Self::Completed { .. } => "Completed",
            Self::Failed { .. } => "Failed",
            Self::TimedOut { .. } => "TimedOut",
        }
    }
}

/// Parse a decimal `activity_id` string into a [`CallId`].
///
/// The remote service always transmits `activityId` as a string even though
/// this engine treats it as an integer internally; this is the one place
/// that boundary is crossed.
pub fn parse_call_id(activity_id: &str) -> Result<CallId, std::num::ParseIntError> {
    activity_id.parse()
}
