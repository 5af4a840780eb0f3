use flowctl_decider::ProjectionError;
use flowctl_types::TypeId;
use thiserror::Error;

/// Opaque transport failure. The concrete cause (HTTP status, connection
/// reset, malformed JSON from the remote service) is collapsed into
/// `anyhow::Error` here because the transport itself is a named collaborator
/// this crate only depends on through the [`crate::transport::Transport`]
/// trait — it never inspects the cause, only logs it and retries.
#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(#[from] anyhow::Error);

/// Errors a worker process surfaces at its outermost loop boundary.
///
/// Fatal variants (`ConfigurationDivergence`, `ContextDecodeFailure`) are
/// returned rather than exiting the process directly: library code never
/// calls `std::process::exit`, it is the embedding binary's job to treat a
/// fatal variant as a reason to exit non-zero.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A type registered at startup already exists on the remote service
    /// with defaults that differ from the locally configured ones.
    #[error("{type_id} is already registered with divergent defaults: {detail}")]
    ConfigurationDivergence { type_id: TypeId, detail: String },

    /// The persisted execution context for a decision task could not be
    /// decoded, or the new event window was otherwise malformed.
    #[error("failed to project history for workflow execution {workflow_id}: {source}")]
    ContextDecodeFailure {
        workflow_id: String,
        #[source]
        source: ProjectionError,
    },
}
