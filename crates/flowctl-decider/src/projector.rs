use crate::error::ProjectionError;
use flowctl_types::{CallId, EventKind, ExecutionContext, HistoryEvent};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// In-memory, call-indexed state reconstructed from an execution's history.
///
/// This is the typed counterpart of [`ExecutionContext`]; the projector
/// builds one of these from either a persisted context blob plus new events,
/// or from scratch on a brand-new execution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectedState {
    pub event_to_call_id: BTreeMap<u64, CallId>,
    pub retries: BTreeMap<CallId, i64>,
    pub scheduled: BTreeSet<CallId>,
    pub results: BTreeMap<CallId, String>,
    pub timed_out: BTreeSet<CallId>,
    pub with_errors: BTreeMap<CallId, String>,
    pub input: Option<String>,
}

impl From<ExecutionContext> for ProjectedState {
    fn from(ctx: ExecutionContext) -> Self {
        Self {
            event_to_call_id: ctx.event_to_call_id,
            retries: ctx.retries,
            scheduled: ctx.scheduled,
            results: ctx.results,
            timed_out: ctx.timed_out,
            with_errors: ctx.with_errors,
            input: ctx.input,
        }
    }
}

impl From<ProjectedState> for ExecutionContext {
    fn from(state: ProjectedState) -> Self {
        Self {
            event_to_call_id: state.event_to_call_id,
            retries: state.retries,
            scheduled: state.scheduled,
            results: state.results,
            timed_out: state.timed_out,
            with_errors: state.with_errors,
            input: state.input,
        }
    }
}

impl ProjectedState {
    pub fn activity_result(&self, call_id: CallId) -> Option<&str> {
        self.results.get(&call_id).map(String::as_str)
    }

    pub fn activity_error(&self, call_id: CallId) -> Option<&str> {
        self.with_errors.get(&call_id).map(String::as_str)
    }

    pub fn is_scheduled(&self, call_id: CallId) -> bool {
        self.scheduled.contains(&call_id)
    }

    pub fn retries_left(&self, call_id: CallId) -> i64 {
        self.retries.get(&call_id).copied().unwrap_or(0)
    }

    pub fn any_activity_running(&self) -> bool {
        !self.scheduled.is_empty()
    }

    /// Apply one new history event, mutating the projected state in place.
    fn apply_event(&mut self, event: &HistoryEvent) -> Result<(), ProjectionError> {
        match &event.kind {
            EventKind::WorkflowExecutionStarted { input } => {
                self.input = Some(input.clone());
            }
            EventKind::DecisionTaskCompleted { .. } => {
                // Handled by the caller before the forward walk; nothing to
                // fold here.
            }
            EventKind::Scheduled { activity_id, .. } => {
                let call_id = flowctl_types::parse_call_id(activity_id).map_err(|_| {
                    ProjectionError::UnknownScheduledEventId {
                        scheduled_event_id: event.event_id,
                    }
                })?;
                self.event_to_call_id.insert(event.event_id, call_id);
                self.scheduled.insert(call_id);
                self.timed_out.remove(&call_id);
                trace!(call_id = call_id.value(), "activity scheduled");
            }
            EventKind::Completed {
                scheduled_event_id,
                result,
                ..
            } => {
                let call_id = self.resolve(*scheduled_event_id)?;
                self.scheduled.remove(&call_id);
                self.results.insert(call_id, result.clone());
                trace!(call_id = call_id.value(), "activity completed");
            }
            EventKind::Failed {
                scheduled_event_id,
                reason,
                ..
            } => {
                let call_id = self.resolve(*scheduled_event_id)?;
                self.scheduled.remove(&call_id);
                self.with_errors.insert(call_id, reason.clone());
                trace!(call_id = call_id.value(), "activity failed");
            }
            EventKind::TimedOut {
                scheduled_event_id, ..
            } => {
                let call_id = self.resolve(*scheduled_event_id)?;
                self.scheduled.remove(&call_id);
                self.timed_out.insert(call_id);
                let left = self.retries.entry(call_id).or_insert(0);
                *left -= 1;
                trace!(call_id = call_id.value(), retries_left = *left, "activity timed out");
            }
        }
        Ok(())
    }

    fn resolve(&self, scheduled_event_id: u64) -> Result<CallId, ProjectionError> {
        self.event_to_call_id
            .get(&scheduled_event_id)
            .copied()
            .ok_or(ProjectionError::UnknownScheduledEventId { scheduled_event_id })
    }
}

/// Folds a decision task's event history into [`ProjectedState`].
pub struct HistoryProjector;

impl HistoryProjector {
    /// Build projected state from a persisted context (if any) and the full,
    /// ascending-by-`event_id` event list for the execution.
    ///
    /// `previous_started_event_id` is the server's high-water mark from the
    /// prior decision turn (`None` on the very first turn). Only events with
    /// `event_id` greater than that mark are folded; everything at or below
    /// it is assumed already reflected in `execution_context`.
    pub fn project(
        events: &[HistoryEvent],
        previous_started_event_id: Option<u64>,
        execution_context: Option<&str>,
    ) -> Result<ProjectedState, ProjectionError> {
        let mut state = match execution_context {
            Some(raw) => ProjectedState::from(ExecutionContext::decode(raw)?),
            None => ProjectedState::default(),
        };

        let new_events: Vec<&HistoryEvent> = events
            .iter()
            .filter(|e| previous_started_event_id.map(|prev| e.event_id > prev).unwrap_or(true))
            .collect();

        let decision_task_completed_count = new_events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::DecisionTaskCompleted { .. }))
            .count();
        if decision_task_completed_count > 1 {
            return Err(ProjectionError::MultipleDecisionTasksCompleted {
                count: decision_task_completed_count,
            });
        }

        for event in new_events {
            state.apply_event(event)?;
        }

        debug!(
            scheduled = state.scheduled.len(),
            results = state.results.len(),
            errors = state.with_errors.len(),
            timed_out = state.timed_out.len(),
            "projected history into call state"
        );

        Ok(state)
    }
}
