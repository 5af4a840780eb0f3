pub mod call_id;
pub mod context;
pub mod envelope;
pub mod event;
pub mod identity;
pub mod options;
pub mod outcome;

pub use call_id::{CallId, CallIdAllocator};
pub use context::{ContextCodecError, ExecutionContext};
pub use envelope::CallEnvelope;
pub use event::{CallKind, EventKind, HistoryEvent, parse_call_id};
pub use identity::{ActivityTypeDefaults, TypeId, WorkflowTypeDefaults};
pub use options::{
    ActivityOptions, ResolvedActivityOptions, ResolvedSubworkflowOptions, SubworkflowOptions,
    clamp_nonneg,
};
pub use outcome::{Outcome, ReplayControl, any_placeholder, compose_errors};
