use crate::projector::ProjectedState;
use crate::replay::{ReplayResult, TerminalOutcome};
use crate::scheduler::ScheduleRequest;
use flowctl_types::{CallKind, ExecutionContext, ResolvedActivityOptions, ResolvedSubworkflowOptions, TypeId};
use tracing::trace;

/// One decision handed back to the remote service in a decision task
/// response.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    ScheduleActivity {
        call_id: flowctl_types::CallId,
        type_id: TypeId,
        input: String,
        options: ResolvedActivityOptions,
    },
    StartChildWorkflow {
        call_id: flowctl_types::CallId,
        type_id: TypeId,
        input: String,
        options: ResolvedSubworkflowOptions,
    },
    CompleteWorkflowExecution {
        result: String,
    },
    FailWorkflowExecution {
        reason: String,
    },
}

/// A full decision task response: the ordered decisions plus the execution
/// context blob to hand back so the next turn can restore call-indexed
/// state without replaying the entire history.
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionReply {
    pub decisions: Vec<Decision>,
    pub execution_context: String,
}

/// Turns a [`ReplayResult`] plus the state it replayed against into a
/// [`DecisionReply`].
///
/// The context handed back already folds in this turn's own new schedule
/// requests (their call ids join `scheduled`, their seeded retry counts join
/// `retries`): the server's `ActivityTaskScheduled` event for them won't
/// exist until the *next* decision task, but the context travels with this
/// reply immediately, so it must already reflect what this turn decided.
pub struct DecisionEmitter;

impl DecisionEmitter {
    pub fn build(replay: ReplayResult, state: &ProjectedState) -> DecisionReply {
        let mut context_state = state.clone();
        for req in &replay.pending {
            context_state.scheduled.insert(req.call_id);
            if let Some(seed) = req.retries_seed {
                context_state.retries.insert(req.call_id, seed);
            }
        }

        let mut decisions: Vec<Decision> = replay
            .pending
            .into_iter()
            .map(Self::schedule_decision)
            .collect();

        match replay.terminal {
            // A workflow function can only return `Ok` once every value it
            // dereferenced via `.result()` was already resolved, but a call
            // it fired and forgot (never dereferenced) can still be
            // outstanding on the server. Completing here would abandon it;
            // instead this turn just carries forward whatever schedule
            // decisions it produced, and the next turn re-replays to the
            // same terminal value once the server confirms quiescence.
            Some(TerminalOutcome::Completed(_)) if context_state.any_activity_running() => {
                trace!(
                    outstanding = context_state.scheduled.len(),
                    "workflow function completed but calls are still outstanding; deferring CompleteWorkflowExecution"
                );
            }
            Some(TerminalOutcome::Completed(value)) => {
                decisions.push(Decision::CompleteWorkflowExecution {
                    result: value.to_string(),
                });
            }
            Some(TerminalOutcome::Failed(reason)) => {
                decisions.push(Decision::FailWorkflowExecution { reason });
            }
            None => {}
        }

        DecisionReply {
            decisions,
            execution_context: ExecutionContext::from(context_state).encode(),
        }
    }

    fn schedule_decision(req: ScheduleRequest) -> Decision {
        match req.kind {
            CallKind::Activity => Decision::ScheduleActivity {
                call_id: req.call_id,
                type_id: req.type_id,
                input: req.input,
                options: req.activity_options.expect("activity schedule carries activity options"),
            },
            CallKind::Subworkflow => Decision::StartChildWorkflow {
                call_id: req.call_id,
                type_id: req.type_id,
                input: req.input,
                options: req
                    .subworkflow_options
                    .expect("sub-workflow schedule carries sub-workflow options"),
            },
        }
    }
}
