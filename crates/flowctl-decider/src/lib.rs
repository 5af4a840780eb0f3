pub mod emitter;
pub mod error;
pub mod invariants;
pub mod options_stack;
pub mod projector;
pub mod replay;
pub mod scheduler;

pub use emitter::{Decision, DecisionEmitter, DecisionReply};
pub use error::{ProjectionError, ReplayError, StateViolation};
pub use invariants::check_disjoint;
pub use options_stack::{ActivityScopeGuard, OptionsStack, SubworkflowScopeGuard};
pub use projector::{HistoryProjector, ProjectedState};
pub use replay::{ReplayResult, ReplayRuntime, TerminalOutcome, Unwind, WorkflowFn};
pub use scheduler::{ScheduleRequest, WorkflowContext};

/// Runs one full decision turn: project history, check invariants, replay
/// the workflow function, and build the decision reply.
///
/// This is the single entry point `flowctl-worker`'s decider loop calls per
/// polled decision task; everything above is exposed separately for testing
/// and for callers that need to inspect an intermediate stage.
pub fn decide(
    workflow_fn: &WorkflowFn,
    events: &[flowctl_types::HistoryEvent],
    previous_started_event_id: Option<u64>,
    execution_context: Option<&str>,
) -> Result<DecisionReply, ProjectionError> {
    let state = HistoryProjector::project(events, previous_started_event_id, execution_context)?;
    if let Err(violation) = check_disjoint(&state) {
        tracing::error!(%violation, "projected state failed disjointness check");
    }
    let replay = ReplayRuntime::run(workflow_fn, state.clone());
    Ok(DecisionEmitter::build(replay, &state))
}
