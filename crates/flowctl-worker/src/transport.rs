use crate::error::TransportError;
use async_trait::async_trait;
use flowctl_decider::Decision;
use flowctl_types::{ActivityTypeDefaults, HistoryEvent, TypeId, WorkflowTypeDefaults};

/// One decision task handed back by a long-poll, fully materialised: the
/// transport is responsible for paginating `nextPageToken` internally and
/// for locating the `executionContext` carried by the most recent
/// `DecisionTaskCompleted` event before handing this struct up — neither is
/// the decider's concern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecisionTaskMessage {
    pub task_token: String,
    pub workflow_type: TypeId,
    pub workflow_id: String,
    pub events: Vec<HistoryEvent>,
    pub previous_started_event_id: Option<u64>,
    pub execution_context: Option<String>,
}

/// One activity task handed back by a long-poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityTaskMessage {
    pub task_token: String,
    pub activity_type: TypeId,
    pub input: String,
}

/// Outcome of registering a workflow or activity type at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered,
    AlreadyExists,
}

/// A request to register a workflow type, matching `register_workflow_type`
/// in the remote service's RPC surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowTypeRegistration {
    pub domain: String,
    pub type_id: TypeId,
    pub defaults: WorkflowTypeDefaults,
    pub doc: Option<String>,
}

/// A request to register an activity type, matching `register_activity_type`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityTypeRegistration {
    pub domain: String,
    pub type_id: TypeId,
    pub defaults: ActivityTypeDefaults,
    pub doc: Option<String>,
}

/// The remote workflow service's RPC surface, as consumed by this engine.
///
/// This crate never implements a concrete transport (HTTP/JSON, or
/// otherwise) — that is explicitly out of scope for the decider/worker
/// core. Embedding binaries supply an implementation of this trait; the
/// decider and activity worker loops are generic over it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Long-poll for a decision task. `Ok(None)` means "no task, caller
    /// should poll again" — the remote service's empty-`taskToken`
    /// sentinel, already translated by the implementation.
    async fn poll_decision_task(
        &self,
        domain: &str,
        task_list: &str,
    ) -> Result<Option<DecisionTaskMessage>, TransportError>;

    async fn respond_decision_task_completed(
        &self,
        task_token: &str,
        decisions: &[Decision],
        execution_context: &str,
    ) -> Result<(), TransportError>;

    /// Long-poll for an activity task. `Ok(None)` means "no task".
    async fn poll_activity_task(
        &self,
        domain: &str,
        task_list: &str,
    ) -> Result<Option<ActivityTaskMessage>, TransportError>;

    async fn respond_activity_task_completed(&self, task_token: &str, result: &str) -> Result<(), TransportError>;

    async fn respond_activity_task_failed(&self, task_token: &str, reason: &str) -> Result<(), TransportError>;

    /// Record a heartbeat for a running activity. `Ok(false)` means the
    /// server has requested cancellation.
    async fn record_activity_task_heartbeat(&self, task_token: &str) -> Result<bool, TransportError>;

    async fn register_workflow_type(
        &self,
        registration: &WorkflowTypeRegistration,
    ) -> Result<RegistrationOutcome, TransportError>;

    async fn register_activity_type(
        &self,
        registration: &ActivityTypeRegistration,
    ) -> Result<RegistrationOutcome, TransportError>;

    async fn describe_workflow_type(&self, domain: &str, type_id: &TypeId) -> Result<WorkflowTypeDefaults, TransportError>;

    async fn describe_activity_type(&self, domain: &str, type_id: &TypeId) -> Result<ActivityTypeDefaults, TransportError>;

    /// Start a new workflow execution, returning the server-assigned
    /// `workflowId` (a UUIDv4 minted by the caller, per the remote
    /// service's contract).
    async fn start_workflow_execution(
        &self,
        domain: &str,
        workflow_id: &str,
        type_id: &TypeId,
        task_list: &str,
        input: &str,
    ) -> Result<(), TransportError>;

    async fn terminate_workflow_execution(&self, domain: &str, workflow_id: &str, reason: &str) -> Result<(), TransportError>;
}
