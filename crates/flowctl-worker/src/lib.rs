pub mod activity;
pub mod activity_loop;
pub mod builder;
pub mod decider_loop;
pub mod error;
pub mod registration;
pub mod registry;
pub mod transport;

pub use activity::{ActivityHandle, ActivityHandler};
pub use activity_loop::ActivityWorkerLoop;
pub use builder::WorkerBuilder;
pub use decider_loop::DeciderLoop;
pub use error::{TransportError, WorkerError};
pub use registration::{register_activity_types, register_workflow_types};
pub use registry::{ActivityRegistry, RegisteredActivityFn, RegisteredWorkflowFn, WorkflowRegistry};
pub use transport::{ActivityTaskMessage, ActivityTypeRegistration, DecisionTaskMessage, RegistrationOutcome, Transport, WorkflowTypeRegistration};

use flowctl_types::TypeId;

/// Start a new workflow execution, minting a UUIDv4 `workflow_id` per the
/// remote service's contract.
///
/// Returns the minted id so the caller can track the execution; the service
/// itself never hands one back synchronously (the next decision task is
/// where anyone observes progress).
pub async fn start_workflow_execution(
    transport: &dyn Transport,
    domain: &str,
    type_id: &TypeId,
    task_list: &str,
    input: &str,
) -> Result<String, TransportError> {
    let workflow_id = uuid::Uuid::new_v4().to_string();
    transport.start_workflow_execution(domain, &workflow_id, type_id, task_list, input).await?;
    Ok(workflow_id)
}
