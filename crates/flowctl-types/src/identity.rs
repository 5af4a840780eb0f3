use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a workflow or activity type on the remote service.
///
/// `version` is always compared and transmitted as a string: the remote
/// service stores versions as strings internally even when a caller supplies
/// an integer, so a registration performed with `version = 2` and a lookup
/// performed with `version = "2"` must be recognised as the same type.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeId {
    pub name: String,
    pub version: String,
}

impl TypeId {
    pub fn new(name: impl Into<String>, version: impl ToString) -> Self {
        Self {
            name: name.into(),
            version: version.to_string(),
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Registration defaults for a workflow type (§4.H / §6).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTypeDefaults {
    pub task_list: String,
    pub child_policy: String,
    pub execution_start_to_close: u32,
    pub task_start_to_close: u32,
}

impl WorkflowTypeDefaults {
    pub fn new(task_list: impl Into<String>) -> Self {
        Self {
            task_list: task_list.into(),
            child_policy: "TERMINATE".to_string(),
            execution_start_to_close: 3600,
            task_start_to_close: 60,
        }
    }
}

/// Registration defaults for an activity type (§4.H / §6).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTypeDefaults {
    pub task_list: String,
    pub heartbeat: u32,
    pub schedule_to_close: u32,
    pub schedule_to_start: u32,
    pub start_to_close: u32,
}

impl ActivityTypeDefaults {
    pub fn new(task_list: impl Into<String>) -> Self {
        Self {
            task_list: task_list.into(),
            heartbeat: 60,
            schedule_to_close: 420,
            schedule_to_start: 120,
            start_to_close: 300,
        }
    }
}
