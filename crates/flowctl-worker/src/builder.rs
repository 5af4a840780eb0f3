use crate::activity_loop::ActivityWorkerLoop;
use crate::decider_loop::DeciderLoop;
use crate::error::WorkerError;
use crate::registration::{register_activity_types, register_workflow_types};
use crate::registry::{ActivityRegistry, RegisteredActivityFn, RegisteredWorkflowFn, WorkflowRegistry};
use crate::transport::Transport;
use flowctl_types::{ActivityTypeDefaults, TypeId, WorkflowTypeDefaults};
use std::sync::Arc;

/// Assembles a worker's `domain`, `task_list`, and type registrations
/// programmatically; there is no config-file format prescribed here, an
/// embedding binary is free to source these values however it likes and
/// hand them to this builder.
pub struct WorkerBuilder<T: Transport> {
    transport: Arc<T>,
    domain: String,
    task_list: String,
    workflows: WorkflowRegistry,
    activities: ActivityRegistry,
}

impl<T: Transport + 'static> WorkerBuilder<T> {
    pub fn new(transport: Arc<T>, domain: impl Into<String>, task_list: impl Into<String>) -> Self {
        Self {
            transport,
            domain: domain.into(),
            task_list: task_list.into(),
            workflows: WorkflowRegistry::new(),
            activities: ActivityRegistry::new(),
        }
    }

    pub fn workflow(mut self, type_id: TypeId, defaults: WorkflowTypeDefaults, handler: RegisteredWorkflowFn) -> Self {
        self.workflows.register(type_id, defaults, handler);
        self
    }

    pub fn activity(mut self, type_id: TypeId, defaults: ActivityTypeDefaults, handler: RegisteredActivityFn) -> Self {
        self.activities.register(type_id, defaults, handler);
        self
    }

    /// Register every configured workflow and activity type with the remote
    /// service, then build the two independent loops. Registration divergence
    /// is fatal (see [`WorkerError::ConfigurationDivergence`]); the caller
    /// decides whether to exit the process on it.
    pub async fn build(self) -> Result<(DeciderLoop<T>, ActivityWorkerLoop<T>), WorkerError> {
        register_workflow_types(self.transport.as_ref(), &self.domain, &self.workflows).await?;
        register_activity_types(self.transport.as_ref(), &self.domain, &self.activities).await?;

        let decider = DeciderLoop::new(self.transport.clone(), self.domain.clone(), self.task_list.clone(), self.workflows);
        let activity = ActivityWorkerLoop::new(self.transport, self.domain, self.task_list, self.activities);
        Ok((decider, activity))
    }
}
