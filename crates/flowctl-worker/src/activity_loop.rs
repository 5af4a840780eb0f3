use crate::activity::ActivityHandle;
use crate::error::WorkerError;
use crate::registry::ActivityRegistry;
use crate::transport::Transport;
use flowctl_types::CallEnvelope;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// `poll → invoke → complete/fail`, forever, against one task list.
///
/// Symmetric to [`crate::decider_loop::DeciderLoop`] but stateless: there is
/// no history, no replay, no call-dependency graph. Each polled task is
/// handled independently.
pub struct ActivityWorkerLoop<T: Transport> {
    transport: Arc<T>,
    domain: String,
    task_list: String,
    registry: ActivityRegistry,
}

impl<T: Transport + 'static> ActivityWorkerLoop<T> {
    pub fn new(transport: Arc<T>, domain: impl Into<String>, task_list: impl Into<String>, registry: ActivityRegistry) -> Self {
        Self {
            transport,
            domain: domain.into(),
            task_list: task_list.into(),
            registry,
        }
    }

    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), WorkerError> {
        loop {
            let task = tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                polled = self.transport.poll_activity_task(&self.domain, &self.task_list) => polled,
            };

            let task = match task {
                Ok(Some(task)) => task,
                Ok(None) => continue,
                Err(err) => {
                    error!(%err, "activity task poll failed; retrying");
                    continue;
                }
            };

            let Some(handler) = self.registry.handler(&task.activity_type) else {
                warn!(activity_type = %task.activity_type, "no registered handler for activity type; abandoning task");
                continue;
            };

            let input = match CallEnvelope::decode(&task.input) {
                Ok(input) => input,
                Err(err) => {
                    error!(%err, task_token = %task.task_token, "activity input did not decode as a call envelope");
                    if let Err(err) = self.transport.respond_activity_task_failed(&task.task_token, &err.to_string()).await {
                        error!(%err, "failed to report activity input decode failure");
                    }
                    continue;
                }
            };

            let handle = ActivityHandle::new(self.transport.clone(), task.task_token.clone());
            match handler.invoke(input, handle).await {
                Ok(result) => {
                    if let Err(err) = self.transport.respond_activity_task_completed(&task.task_token, &result.to_string()).await {
                        error!(%err, task_token = %task.task_token, "failed to report activity completion");
                    }
                }
                Err(reason) => {
                    if let Err(err) = self.transport.respond_activity_task_failed(&task.task_token, &reason).await {
                        error!(%err, task_token = %task.task_token, "failed to report activity failure");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ActivityTaskMessage, DecisionTaskMessage, RegistrationOutcome};
    use async_trait::async_trait;
    use flowctl_decider::Decision;
    use flowctl_types::{ActivityTypeDefaults, TypeId, WorkflowTypeDefaults};
    use serde_json::{Value, json};
    use std::sync::Mutex;

    struct OneShotActivityTransport {
        task: Mutex<Option<ActivityTaskMessage>>,
        completed: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Transport for OneShotActivityTransport {
        async fn poll_decision_task(&self, _domain: &str, _task_list: &str) -> Result<Option<DecisionTaskMessage>, crate::error::TransportError> {
            Ok(None)
        }

        async fn respond_decision_task_completed(
            &self,
            _task_token: &str,
            _decisions: &[Decision],
            _execution_context: &str,
        ) -> Result<(), crate::error::TransportError> {
            Ok(())
        }

        async fn poll_activity_task(&self, _domain: &str, _task_list: &str) -> Result<Option<ActivityTaskMessage>, crate::error::TransportError> {
            let task = self.task.lock().unwrap().take();
            if task.is_none() {
                tokio::task::yield_now().await;
            }
            Ok(task)
        }

        async fn respond_activity_task_completed(&self, task_token: &str, result: &str) -> Result<(), crate::error::TransportError> {
            self.completed.lock().unwrap().push((task_token.to_string(), result.to_string()));
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

    struct Add;

    #[async_trait]
    impl crate::activity::ActivityHandler for Add {
        async fn invoke(&self, input: CallEnvelope, _handle: ActivityHandle) -> Result<Value, String> {
            let a = input.args[0].as_i64().unwrap();
            let b = input.args[1].as_i64().unwrap();
            Ok(json!(a + b))
        }
    }

    #[tokio::test]
    async fn invokes_registered_handler_and_reports_completion() {
        let task = ActivityTaskMessage {
            task_token: "token-1".into(),
            activity_type: TypeId::new("add", 1),
            input: r#"{"args":[1,2],"kwargs":{}}"#.into(),
        };
        let transport = Arc::new(OneShotActivityTransport {
            task: Mutex::new(Some(task)),
            completed: Mutex::new(Vec::new()),
        });

        let mut registry = ActivityRegistry::new();
        registry.register(TypeId::new("add", 1), ActivityTypeDefaults::new("tl"), Arc::new(Add));

        let loop_ = ActivityWorkerLoop::new(transport.clone(), "domain", "tl", registry);
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move { shutdown_clone.cancel() });
        loop_.run(shutdown).await.unwrap();

        let completed = transport.completed.lock().unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0], ("token-1".to_string(), "3".to_string()));
    }
}
