use crate::error::WorkerError;
use crate::registry::{ActivityRegistry, WorkflowRegistry};
use crate::transport::{ActivityTypeRegistration, RegistrationOutcome, Transport, WorkflowTypeRegistration};
use tracing::info;

/// Declare every workflow type in `registry` to the remote service.
///
/// A type the server already has is diffed against the locally configured
/// defaults; any divergence is a [`WorkerError::ConfigurationDivergence`],
/// which the caller should treat as fatal (two workers registering the same
/// `(name, version)` with different defaults would otherwise silently
/// disagree about timeouts neither side can see the other's value for).
pub async fn register_workflow_types(
    transport: &dyn Transport,
    domain: &str,
    registry: &WorkflowRegistry,
) -> Result<(), WorkerError> {
    for type_id in registry.type_ids() {
        let defaults = registry
            .defaults(type_id)
            .expect("type_ids() only yields ids present in the registry")
            .clone();
        let registration = WorkflowTypeRegistration {
            domain: domain.to_string(),
            type_id: type_id.clone(),
            defaults: defaults.clone(),
            doc: None,
        };
        match transport.register_workflow_type(&registration).await? {
            RegistrationOutcome::Registered => {
                info!(%type_id, "registered workflow type");
            }
            RegistrationOutcome::AlreadyExists => {
                let remote = transport.describe_workflow_type(domain, type_id).await?;
                if remote != defaults {
                    return Err(WorkerError::ConfigurationDivergence {
                        type_id: type_id.clone(),
                        detail: format!("local={defaults:?} remote={remote:?}"),
                    });
                }
                info!(%type_id, "workflow type already registered with matching defaults");
            }
        }
    }
    Ok(())
}

/// Declare every activity type in `registry` to the remote service. Mirrors
/// [`register_workflow_types`].
pub async fn register_activity_types(
    transport: &dyn Transport,
    domain: &str,
    registry: &ActivityRegistry,
) -> Result<(), WorkerError> {
    for type_id in registry.type_ids() {
        let defaults = registry
            .defaults(type_id)
            .expect("type_ids() only yields ids present in the registry")
            .clone();
        let registration = ActivityTypeRegistration {
            domain: domain.to_string(),
            type_id: type_id.clone(),
            defaults: defaults.clone(),
            doc: None,
        };
        match transport.register_activity_type(&registration).await? {
            RegistrationOutcome::Registered => {
                info!(%type_id, "registered activity type");
            }
            RegistrationOutcome::AlreadyExists => {
                let remote = transport.describe_activity_type(domain, type_id).await?;
                if remote != defaults {
                    return Err(WorkerError::ConfigurationDivergence {
                        type_id: type_id.clone(),
                        detail: format!("local={defaults:?} remote={remote:?}"),
                    });
                }
                info!(%type_id, "activity type already registered with matching defaults");
            }
        }
    }
    Ok(())
}
