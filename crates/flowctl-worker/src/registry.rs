use flowctl_types::{ActivityTypeDefaults, TypeId, WorkflowTypeDefaults};
use std::collections::HashMap;
use std::sync::Arc;

/// A registered workflow function plus the registration defaults it was
/// declared with.
///
/// `Arc<dyn Fn(...) + Send + Sync>` rather than the bare `WorkflowFn` alias
/// from `flowctl-decider`: the registry is held across the `.await` points
/// in the decider loop, so every entry must be `Send + Sync` even though a
/// single replay pass itself is synchronous, single-threaded code.
pub type RegisteredWorkflowFn = Arc<dyn Fn(&flowctl_decider::WorkflowContext) -> Result<serde_json::Value, flowctl_decider::Unwind> + Send + Sync>;

struct WorkflowEntry {
    handler: RegisteredWorkflowFn,
    defaults: WorkflowTypeDefaults,
}

/// Maps `(name, version)` to a locally registered workflow handler.
///
/// Mirrors the source's process-global workflow registry, but as an
/// explicit object passed to the decider loop rather than a module-level
/// singleton — there is no semantic requirement for process-wide state, and
/// an explicit registry lets a single process run more than one decider
/// loop against distinct registries if it needs to.
#[derive(Default)]
pub struct WorkflowRegistry {
    entries: HashMap<TypeId, WorkflowEntry>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_id: TypeId, defaults: WorkflowTypeDefaults, handler: RegisteredWorkflowFn) -> &mut Self {
        self.entries.insert(type_id, WorkflowEntry { handler, defaults });
        self
    }

    pub fn handler(&self, type_id: &TypeId) -> Option<&RegisteredWorkflowFn> {
        self.entries.get(type_id).map(|e| &e.handler)
    }

    pub fn defaults(&self, type_id: &TypeId) -> Option<&WorkflowTypeDefaults> {
        self.entries.get(type_id).map(|e| &e.defaults)
    }

    pub fn type_ids(&self) -> impl Iterator<Item = &TypeId> {
        self.entries.keys()
    }
}

/// A registered activity handler plus the registration defaults it was
/// declared with.
pub type RegisteredActivityFn = Arc<dyn crate::activity::ActivityHandler>;

struct ActivityEntry {
    handler: RegisteredActivityFn,
    defaults: ActivityTypeDefaults,
}

/// Maps `(name, version)` to a locally registered activity handler.
#[derive(Default)]
pub struct ActivityRegistry {
    entries: HashMap<TypeId, ActivityEntry>,
}

impl ActivityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_id: TypeId, defaults: ActivityTypeDefaults, handler: RegisteredActivityFn) -> &mut Self {
        self.entries.insert(type_id, ActivityEntry { handler, defaults });
        self
    }

    pub fn handler(&self, type_id: &TypeId) -> Option<&RegisteredActivityFn> {
        self.entries.get(type_id).map(|e| &e.handler)
    }

    pub fn defaults(&self, type_id: &TypeId) -> Option<&ActivityTypeDefaults> {
        self.entries.get(type_id).map(|e| &e.defaults)
    }

    pub fn type_ids(&self) -> impl Iterator<Item = &TypeId> {
        self.entries.keys()
    }
}
