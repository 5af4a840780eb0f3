use crate::error::ReplayError;
use crate::options_stack::{ActivityScopeGuard, OptionsStack, SubworkflowScopeGuard};
use crate::projector::ProjectedState;
use flowctl_types::{
    ActivityOptions, CallEnvelope, CallId, CallIdAllocator, CallKind, Outcome, ResolvedActivityOptions,
    ResolvedSubworkflowOptions, SubworkflowOptions, TypeId, any_placeholder, compose_errors,
};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

/// A remote call the workflow function wants scheduled this turn, derived
/// from arguments that were all resolved (no placeholder, no error) and not
/// already present in the projected history.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleRequest {
    pub call_id: CallId,
    pub kind: CallKind,
    pub type_id: TypeId,
    pub input: String,
    pub activity_options: Option<ResolvedActivityOptions>,
    pub subworkflow_options: Option<ResolvedSubworkflowOptions>,
    /// `retries+1`, set only the first time this `call_id` is ever
    /// scheduled. `None` on a retry reschedule, where the context's current
    /// (already-decremented) count must survive untouched.
    pub retries_seed: Option<i64>,
}

/// The argument-dependency scheduler: the API a workflow function drives to
/// invoke activities and sub-workflows.
///
/// One `WorkflowContext` exists per replay pass. `CallId`s are assigned in
/// call order via the internal allocator, so the workflow function must
/// request calls in the same source order every replay for ids to line up
/// with the projected history.
pub struct WorkflowContext {
    allocator: RefCell<CallIdAllocator>,
    projected: ProjectedState,
    options_stack: OptionsStack,
    pending: Rc<RefCell<Vec<ScheduleRequest>>>,
}

impl WorkflowContext {
    pub fn new(projected: ProjectedState) -> Self {
        Self {
            allocator: RefCell::new(CallIdAllocator::new()),
            projected,
            options_stack: OptionsStack::new(),
            pending: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// The raw workflow input envelope captured from `WorkflowExecutionStarted`.
    pub fn input(&self) -> Option<&str> {
        self.projected.input.as_deref()
    }

    pub fn push_activity_options(&self, frame: ActivityOptions) -> ActivityScopeGuard {
        self.options_stack.push_activity(frame)
    }

    pub fn push_subworkflow_options(&self, frame: SubworkflowOptions) -> SubworkflowScopeGuard {
        self.options_stack.push_subworkflow(frame)
    }

    /// Schedule or observe an activity call.
    ///
    /// Allocates the next `CallId`, then:
    /// - if the projected history already carries a result or error for that
    ///   id, returns it directly without touching the pending schedule list;
    /// - if any argument is still a `Placeholder`, returns `Placeholder`
    ///   without scheduling (blocked on an upstream dependency);
    /// - if any argument is an `Error`, composes the reasons and either
    ///   returns them as this call's own `Error` outcome (when
    ///   `error_handling` is enabled for the active scope) or fails the turn
    ///   outright (when it is not, the default);
    /// - otherwise, if the call wasn't already scheduled in a prior turn,
    ///   enqueues a [`ScheduleRequest`] and returns `Placeholder`.
    pub fn call_activity(
        &self,
        type_id: TypeId,
        args: Vec<Outcome<Value>>,
        call_site_options: &ActivityOptions,
    ) -> Result<Outcome<Value>, ReplayError> {
        let call_id = self.allocator.borrow_mut().allocate();
        let resolved = self.options_stack.resolve_activity(call_site_options);

        if let Some(result) = self.dependency_gate(call_id, &args, resolved.error_handling)? {
            return Ok(result);
        }

        if !self.projected.is_scheduled(call_id) {
            let retries_seed = self.retries_seed(call_id, resolved.retry);
            let input = CallEnvelope::new(unwrap_resolved(args)).encode();
            self.pending.borrow_mut().push(ScheduleRequest {
                call_id,
                kind: CallKind::Activity,
                type_id,
                input,
                activity_options: Some(resolved),
                subworkflow_options: None,
                retries_seed,
            });
            trace!(call_id = call_id.value(), "activity call enqueued");
        }
        Ok(Outcome::Placeholder)
    }

    /// Schedule or observe a sub-workflow call. Mirrors [`Self::call_activity`].
    pub fn call_subworkflow(
        &self,
        type_id: TypeId,
        args: Vec<Outcome<Value>>,
        call_site_options: &SubworkflowOptions,
    ) -> Result<Outcome<Value>, ReplayError> {
        let call_id = self.allocator.borrow_mut().allocate();
        let resolved = self.options_stack.resolve_subworkflow(call_site_options);

        if let Some(result) = self.dependency_gate(call_id, &args, resolved.error_handling)? {
            return Ok(result);
        }

        if !self.projected.is_scheduled(call_id) {
            let retries_seed = self.retries_seed(call_id, resolved.retry);
            let input = CallEnvelope::new(unwrap_resolved(args)).encode();
            self.pending.borrow_mut().push(ScheduleRequest {
                call_id,
                kind: CallKind::Subworkflow,
                type_id,
                input,
                activity_options: None,
                subworkflow_options: Some(resolved),
                retries_seed,
            });
            trace!(call_id = call_id.value(), "sub-workflow call enqueued");
        }
        Ok(Outcome::Placeholder)
    }

    /// `Some(retry+1)` the first time a call id is ever scheduled (no entry
    /// in the projected `retries` map yet); `None` when rescheduling a call
    /// that already has a (decremented) entry, so the existing count in the
    /// context survives untouched rather than being reset.
    fn retries_seed(&self, call_id: CallId, retry: u32) -> Option<i64> {
        if self.projected.retries.contains_key(&call_id) {
            None
        } else {
            Some(retry as i64 + 1)
        }
    }

    /// Resolve whether a call can proceed at all, given its already-allocated
    /// `call_id`, its arguments, and the `error_handling` policy in effect.
    ///
    /// Returns `Ok(Some(outcome))` when the caller should stop and return
    /// that outcome directly (already resolved from history, blocked, or
    /// errored-with-handling); `Ok(None)` when the call is clear to be
    /// scheduled; `Err` when an unhandled upstream error must end the turn.
    fn dependency_gate(
        &self,
        call_id: CallId,
        args: &[Outcome<Value>],
        error_handling: bool,
    ) -> Result<Option<Outcome<Value>>, ReplayError> {
        if let Some(raw) = self.projected.activity_result(call_id) {
            let value: Value = serde_json::from_str(raw).unwrap_or(Value::Null);
            return Ok(Some(Outcome::Result(value)));
        }
        if let Some(reason) = self.projected.activity_error(call_id) {
            let reason = reason.to_string();
            return if error_handling {
                Ok(Some(Outcome::Error(reason)))
            } else {
                Err(ReplayError::UnhandledActivityError(reason))
            };
        }
        if self.projected.timed_out.contains(&call_id) && self.projected.retries_left(call_id) <= 0 {
            let reason = format!("call {call_id} timed out and exhausted its retries");
            return if error_handling {
                Ok(Some(Outcome::Error(reason)))
            } else {
                Err(ReplayError::UnhandledActivityError(reason))
            };
        }
        if any_placeholder(args.iter()) {
            return Ok(Some(Outcome::Placeholder));
        }
        if let Some(composed) = compose_errors(args.iter()) {
            return if error_handling {
                Ok(Some(Outcome::Error(composed)))
            } else {
                Err(ReplayError::UnhandledActivityError(composed))
            };
        }
        Ok(None)
    }

    /// Explicit workflow-initiated failure, bypassing activity error
    /// propagation entirely.
    pub fn fail(&self, reason: impl Into<String>) -> ReplayError {
        ReplayError::WorkflowFailed(reason.into())
    }

    /// Drain every call enqueued this turn, in allocation order.
    pub fn take_pending(&self) -> Vec<ScheduleRequest> {
        std::mem::take(&mut self.pending.borrow_mut())
    }
}

/// Unwrap a list of arguments already known to be fully resolved (no
/// placeholder, no error) into their plain JSON values.
fn unwrap_resolved(args: Vec<Outcome<Value>>) -> Vec<Value> {
    args.into_iter()
        .map(|o| match o {
            Outcome::Result(v) => v,
            _ => unreachable!("dependency_gate guarantees every argument is Result here"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with(projected: ProjectedState) -> WorkflowContext {
        WorkflowContext::new(projected)
    }

    #[test]
    fn schedules_call_when_args_fully_resolved() {
        let ctx = ctx_with(ProjectedState::default());
        let outcome = ctx
            .call_activity(
                TypeId::new("add", 1),
                vec![Outcome::Result(Value::from(1)), Outcome::Result(Value::from(2))],
                &ActivityOptions::default(),
            )
            .unwrap();
        assert!(outcome.is_placeholder());
        let pending = ctx.take_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].call_id, CallId::new(0));
        assert_eq!(pending[0].input, r#"{"args":[1,2],"kwargs":{}}"#);
    }

    #[test]
    fn blocks_on_placeholder_argument_without_scheduling() {
        let ctx = ctx_with(ProjectedState::default());
        let outcome = ctx
            .call_activity(
                TypeId::new("add", 1),
                vec![Outcome::Placeholder, Outcome::Result(Value::from(2))],
                &ActivityOptions::default(),
            )
            .unwrap();
        assert!(outcome.is_placeholder());
        assert!(ctx.take_pending().is_empty());
    }

    #[test]
    fn default_error_handling_terminates_turn_on_argument_error() {
        let ctx = ctx_with(ProjectedState::default());
        let err = ctx
            .call_activity(
                TypeId::new("add", 1),
                vec![Outcome::Error("boom".into()), Outcome::Result(Value::from(2))],
                &ActivityOptions::default(),
            )
            .unwrap_err();
        assert_eq!(err, ReplayError::UnhandledActivityError("boom".into()));
        assert!(ctx.take_pending().is_empty());
    }

    #[test]
    fn error_handling_enabled_surfaces_error_outcome_instead_of_failing() {
        let ctx = ctx_with(ProjectedState::default());
        let opts = ActivityOptions {
            error_handling: Some(true),
            ..Default::default()
        };
        let outcome = ctx
            .call_activity(
                TypeId::new("add", 1),
                vec![Outcome::Error("boom".into())],
                &opts,
            )
            .unwrap();
        assert_eq!(outcome.error_reason(), Some("boom"));
        assert!(ctx.take_pending().is_empty());
    }

    #[test]
    fn unhandled_activity_error_from_history_fails_the_call_immediately() {
        let mut projected = ProjectedState::default();
        projected.with_errors.insert(CallId::new(0), "boom".to_string());
        let ctx = ctx_with(projected);
        let err = ctx
            .call_activity(TypeId::new("add", 1), vec![], &ActivityOptions::default())
            .unwrap_err();
        assert_eq!(err, ReplayError::UnhandledActivityError("boom".into()));
    }

    #[test]
    fn activity_error_from_history_surfaces_as_outcome_when_error_handling_enabled() {
        let mut projected = ProjectedState::default();
        projected.with_errors.insert(CallId::new(0), "boom".to_string());
        let ctx = ctx_with(projected);
        let opts = ActivityOptions {
            error_handling: Some(true),
            ..Default::default()
        };
        let outcome = ctx.call_activity(TypeId::new("add", 1), vec![], &opts).unwrap();
        assert_eq!(outcome.error_reason(), Some("boom"));
    }

    #[test]
    fn returns_result_directly_from_projected_history_without_rescheduling() {
        let mut projected = ProjectedState::default();
        projected.results.insert(CallId::new(0), "3".to_string());
        let ctx = ctx_with(projected);
        let outcome = ctx
            .call_activity(TypeId::new("add", 1), vec![], &ActivityOptions::default())
            .unwrap();
        assert_eq!(outcome, Outcome::Result(Value::from(3)));
        assert!(ctx.take_pending().is_empty());
    }

    #[test]
    fn call_ids_allocate_sequentially_across_multiple_calls() {
        let ctx = ctx_with(ProjectedState::default());
        ctx.call_activity(TypeId::new("a", 1), vec![], &ActivityOptions::default())
            .unwrap();
        ctx.call_activity(TypeId::new("b", 1), vec![], &ActivityOptions::default())
            .unwrap();
        let pending = ctx.take_pending();
        assert_eq!(pending[0].call_id, CallId::new(0));
        assert_eq!(pending[1].call_id, CallId::new(1));
    }
}
