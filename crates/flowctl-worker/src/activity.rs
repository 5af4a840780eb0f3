use crate::error::TransportError;
use crate::transport::Transport;
use async_trait::async_trait;
use flowctl_types::CallEnvelope;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A locally registered activity implementation.
///
/// Unlike a workflow function, an activity has no replay contract: it runs
/// exactly once per attempt, may perform real side effects, and may await
/// real I/O — so it is a genuine `async fn`, not the synchronous trampoline
/// the decider uses for workflow code.
#[async_trait]
pub trait ActivityHandler: Send + Sync {
    async fn invoke(&self, input: CallEnvelope, handle: ActivityHandle) -> Result<Value, String>;
}

/// Handed to a running activity so it can report liveness and observe a
/// cooperative cancellation request.
///
/// `record_activity_task_heartbeat` returns `false` when the server has
/// asked for the activity to stop; this engine surfaces that as a
/// [`CancellationToken`] the activity body may poll between units of work,
/// rather than forcibly aborting it — the remote service's cancellation is
/// advisory, and so is this handle's.
#[derive(Clone)]
pub struct ActivityHandle {
    transport: Arc<dyn Transport>,
    task_token: String,
    cancellation: CancellationToken,
}

impl ActivityHandle {
    pub fn new(transport: Arc<dyn Transport>, task_token: String) -> Self {
        Self {
            transport,
            task_token,
            cancellation: CancellationToken::new(),
        }
    }

    /// Record a heartbeat with the remote service. Cancels the token this
    /// handle carries if the server requests cancellation.
    pub async fn heartbeat(&self) -> Result<(), TransportError> {
        if !self.transport.record_activity_task_heartbeat(&self.task_token).await? {
            self.cancellation.cancel();
        }
        Ok(())
    }

    /// A token the activity body may poll (or select on) to observe a
    /// cancellation request surfaced by a prior [`Self::heartbeat`] call.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ActivityTaskMessage, DecisionTaskMessage, RegistrationOutcome};
    use flowctl_decider::Decision;
    use flowctl_types::{ActivityTypeDefaults, TypeId, WorkflowTypeDefaults};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct StubTransport {
        /// Value returned by `record_activity_task_heartbeat`; `false` means
        /// the server has requested cancellation.
        should_continue: AtomicBool,
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn poll_decision_task(&self, _domain: &str, _task_list: &str) -> Result<Option<DecisionTaskMessage>, TransportError> {
            Ok(None)
        }

        async fn respond_decision_task_completed(
            &self,
            _task_token: &str,
            _decisions: &[Decision],
            _execution_context: &str,
        ) -> Result<(), TransportError> {
            Ok(())
        }

        async fn poll_activity_task(&self, _domain: &str, _task_list: &str) -> Result<Option<ActivityTaskMessage>, TransportError> {
            Ok(None)
        }

        async fn respond_activity_task_completed(&self, _task_token: &str, _result: &str) -> Result<(), TransportError> {
            Ok(())
        }

        async fn respond_activity_task_failed(&self, _task_token: &str, _reason: &str) -> Result<(), TransportError> {
            Ok(())
        }

        async fn record_activity_task_heartbeat(&self, _task_token: &str) -> Result<bool, TransportError> {
            Ok(self.should_continue.load(Ordering::SeqCst))
        }

        async fn register_workflow_type(
            &self,
            _registration: &crate::transport::WorkflowTypeRegistration,
        ) -> Result<RegistrationOutcome, TransportError> {
            Ok(RegistrationOutcome::Registered)
        }

        async fn register_activity_type(
            &self,
            _registration: &crate::transport::ActivityTypeRegistration,
        ) -> Result<RegistrationOutcome, TransportError> {
            Ok(RegistrationOutcome::Registered)
        }

        async fn describe_workflow_type(&self, _domain: &str, _type_id: &TypeId) -> Result<WorkflowTypeDefaults, TransportError> {
            Ok(WorkflowTypeDefaults::new("tl"))
        }

        async fn describe_activity_type(&self, _domain: &str, _type_id: &TypeId) -> Result<ActivityTypeDefaults, TransportError> {
            Ok(ActivityTypeDefaults::new("tl"))
        }

        async fn start_workflow_execution(
            &self,
            _domain: &str,
            _workflow_id: &str,
            _type_id: &TypeId,
            _task_list: &str,
            _input: &str,
        ) -> Result<(), TransportError> {
            Ok(())
        }

        async fn terminate_workflow_execution(&self, _domain: &str, _workflow_id: &str, _reason: &str) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn heartbeat_cancels_token_when_server_requests_it() {
        let transport = Arc::new(StubTransport {
            should_continue: AtomicBool::new(false),
        });
        let handle = ActivityHandle::new(transport, "token".into());
        assert!(!handle.cancellation().is_cancelled());
        handle.heartbeat().await.unwrap();
        assert!(handle.cancellation().is_cancelled());
    }

    #[tokio::test]
    async fn heartbeat_leaves_token_uncancelled_when_server_does_not_request_it() {
        let transport = Arc::new(StubTransport {
            should_continue: AtomicBool::new(true),
        });
        let handle = ActivityHandle::new(transport, "token".into());
        handle.heartbeat().await.unwrap();
        assert!(!handle.cancellation().is_cancelled());
    }
}
