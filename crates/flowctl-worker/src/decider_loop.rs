use crate::error::WorkerError;
use crate::registry::WorkflowRegistry;
use crate::transport::Transport;
use flowctl_decider::decide;
use flowctl_types::{EventKind, HistoryEvent};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// `poll → project → replay → respond`, forever, against one task list.
///
/// A turn, once started, always runs to completion: the trampoline inside
/// `flowctl_decider::decide` has no internal suspension point, so the only
/// place this loop can be cancelled cleanly is while blocked on the next
/// poll.
pub struct DeciderLoop<T: Transport> {
    transport: Arc<T>,
    domain: String,
    task_list: String,
    registry: WorkflowRegistry,
}

impl<T: Transport> DeciderLoop<T> {
    pub fn new(transport: Arc<T>, domain: impl Into<String>, task_list: impl Into<String>, registry: WorkflowRegistry) -> Self {
        Self {
            transport,
            domain: domain.into(),
            task_list: task_list.into(),
            registry,
        }
    }

    /// Run the loop until `shutdown` is cancelled. Transport errors on poll
    /// or respond are logged and the loop keeps going (the server will
    /// redeliver); a [`WorkerError`] is only returned for conditions this
    /// spec treats as fatal (context decode failure, a malformed event
    /// window).
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), WorkerError> {
        loop {
            let task = tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                polled = self.transport.poll_decision_task(&self.domain, &self.task_list) => polled,
            };

            let task = match task {
                Ok(Some(task)) => task,
                Ok(None) => continue,
                Err(err) => {
                    error!(%err, "decision task poll failed; retrying");
                    continue;
                }
            };

            let Some(handler) = self.registry.handler(&task.workflow_type) else {
                warn!(workflow_type = %task.workflow_type, workflow_id = %task.workflow_id, "no registered handler for workflow type; abandoning task");
                continue;
            };

            let execution_context = task.execution_context.or_else(|| latest_execution_context(&task.events));

            let reply = decide(handler.as_ref(), &task.events, task.previous_started_event_id, execution_context.as_deref()).map_err(|source| {
                WorkerError::ContextDecodeFailure {
                    workflow_id: task.workflow_id.clone(),
                    source,
                }
            })?;

            if let Err(err) = self
                .transport
                .respond_decision_task_completed(&task.task_token, &reply.decisions, &reply.execution_context)
                .await
            {
                error!(%err, workflow_id = %task.workflow_id, "failed to respond to decision task; server will redeliver");
            }
        }
    }
}

/// Find the `executionContext` carried by the most recent
/// `DecisionTaskCompleted` event in a task's event list, if any.
///
/// Most transports will already surface this pre-extracted on
/// [`crate::transport::DecisionTaskMessage::execution_context`]; this is a
/// fallback for ones that hand back the raw event list instead.
fn latest_execution_context(events: &[HistoryEvent]) -> Option<String> {
    events
        .iter()
        .filter_map(|event| match &event.kind {
            EventKind::DecisionTaskCompleted { execution_context } => Some((event.event_id, execution_context.clone())),
            _ => None,
        })
        .max_by_key(|(event_id, _)| *event_id)
        .and_then(|(_, ctx)| ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ActivityTaskMessage, DecisionTaskMessage, RegistrationOutcome};
    use async_trait::async_trait;
    use flowctl_decider::Decision;
    use flowctl_types::{ActivityTypeDefaults, CallId, TypeId, WorkflowTypeDefaults};
    use std::sync::Mutex;

    struct OneShotTransport {
        task: Mutex<Option<DecisionTaskMessage>>,
        responded: Mutex<Vec<(String, Vec<Decision>, String)>>,
    }

    #[async_trait]
    impl Transport for OneShotTransport {
        async fn poll_decision_task(&self, _domain: &str, _task_list: &str) -> Result<Option<DecisionTaskMessage>, crate::error::TransportError> {
            let task = self.task.lock().unwrap().take();
            if task.is_none() {
                // Yield so a concurrently spawned shutdown signal gets a
                // chance to run instead of this stub busy-polling forever.
                tokio::task::yield_now().await;
            }
            Ok(task)
        }

        async fn respond_decision_task_completed(
            &self,
            task_token: &str,
            decisions: &[Decision],
            execution_context: &str,
        ) -> Result<(), crate::error::TransportError> {
            self.responded
                .lock()
                .unwrap()
                .push((task_token.to_string(), decisions.to_vec(), execution_context.to_string()));
            Ok(())
        }

        async fn poll_activity_task(&self, _domain: &str, _task_list: &str) -> Result<Option<ActivityTaskMessage>, crate::error::TransportError> {
            Ok(None)
        }

        async fn respond_activity_task_completed(&self, _task_token: &str, _result: &str) -> Result<(), crate::error::TransportError> {
            Ok(())
        }

        async fn respond_activity_task_failed(&self, _task_token: &str, _reason: &str) -> Result<(), crate::error::TransportError> {
            Ok(())
        }

        async fn record_activity_task_heartbeat(&self, _task_token: &str) -> Result<bool, crate::error::TransportError> {
            Ok(false)
        }

        async fn register_workflow_type(
            &self,
            _registration: &crate::transport::WorkflowTypeRegistration,
        ) -> Result<RegistrationOutcome, crate::error::TransportError> {
            Ok(RegistrationOutcome::Registered)
        }

        async fn register_activity_type(
            &self,
            _registration: &crate::transport::ActivityTypeRegistration,
        ) -> Result<RegistrationOutcome, crate::error::TransportError> {
            Ok(RegistrationOutcome::Registered)
        }

        async fn describe_workflow_type(&self, _domain: &str, _type_id: &TypeId) -> Result<WorkflowTypeDefaults, crate::error::TransportError> {
            Ok(WorkflowTypeDefaults::new("tl"))
        }

        async fn describe_activity_type(&self, _domain: &str, _type_id: &TypeId) -> Result<ActivityTypeDefaults, crate::error::TransportError> {
            Ok(ActivityTypeDefaults::new("tl"))
        }

        async fn start_workflow_execution(
            &self,
            _domain: &str,
            _workflow_id: &str,
            _type_id: &TypeId,
            _task_list: &str,
            _input: &str,
        ) -> Result<(), crate::error::TransportError> {
            Ok(())
        }

        async fn terminate_workflow_execution(&self, _domain: &str, _workflow_id: &str, _reason: &str) -> Result<(), crate::error::TransportError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn schedules_activity_on_first_turn_then_idles_until_shutdown() {
        let task = DecisionTaskMessage {
            task_token: "token-1".into(),
            workflow_type: TypeId::new("greet", 1),
            workflow_id: "wf-1".into(),
            events: vec![HistoryEvent {
                event_id: 1,
                kind: EventKind::WorkflowExecutionStarted { input: r#"{"args":[1,2],"kwargs":{}}"#.into() },
            }],
            previous_started_event_id: None,
            execution_context: None,
        };
        let transport = Arc::new(OneShotTransport {
            task: Mutex::new(Some(task)),
            responded: Mutex::new(Vec::new()),
        });

        let mut registry = WorkflowRegistry::new();
        let handler: crate::registry::RegisteredWorkflowFn = Arc::new(|ctx: &flowctl_decider::WorkflowContext| {
            let sum = ctx
                .call_activity(TypeId::new("add", 1), vec![], &Default::default())
                .map_err(flowctl_decider::Unwind::from)?;
            let value = sum.result().map_err(flowctl_decider::Unwind::from)?;
            Ok(value.clone())
        });
        registry.register(TypeId::new("greet", 1), WorkflowTypeDefaults::new("tl"), handler);

        let loop_ = DeciderLoop::new(transport.clone(), "domain", "tl", registry);
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move { shutdown_clone.cancel() });
        loop_.run(shutdown).await.unwrap();

        let responses = transport.responded.lock().unwrap();
        assert_eq!(responses.len(), 1);
        let (token, decisions, _ctx) = &responses[0];
        assert_eq!(token, "token-1");
        assert!(matches!(&decisions[0], Decision::ScheduleActivity { call_id, .. } if *call_id == CallId::new(0)));
    }
}
