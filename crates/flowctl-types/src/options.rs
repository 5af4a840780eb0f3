use serde::{Deserialize, Serialize};

/// Clamp to a non-negative integer, matching the source's `max(int(x), 0)`.
pub fn clamp_nonneg(value: i64) -> u32 {
    value.max(0) as u32
}

/// Partial activity-scheduling options as supplied at a single call site or
/// pushed onto an [`OptionsStack`] scope.
///
/// Every field is optional: `None` means "not specified here," deferring to
/// whatever frame is resolved next. [`ActivityOptions::resolved`] produces the
/// fully-defaulted frame actually used to schedule a call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityOptions {
    pub heartbeat: Option<u32>,
    pub schedule_to_close: Option<u32>,
    pub schedule_to_start: Option<u32>,
    pub start_to_close: Option<u32>,
    pub task_list: Option<String>,
    pub retry: Option<u32>,
    pub delay: Option<u32>,
    pub error_handling: Option<bool>,
}

/// Partial sub-workflow-scheduling options. Shares `task_list`, `retry`,
/// `delay`, and `error_handling` with [`ActivityOptions`]; the duration
/// fields are sub-workflow specific.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubworkflowOptions {
    pub workflow_duration: Option<u32>,
    pub decision_duration: Option<u32>,
    pub task_list: Option<String>,
    pub retry: Option<u32>,
    pub delay: Option<u32>,
    pub error_handling: Option<bool>,
}

/// Fully-resolved activity options: every field either carries an explicit
/// value or its documented default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedActivityOptions {
    pub heartbeat: Option<u32>,
    pub schedule_to_close: Option<u32>,
    pub schedule_to_start: Option<u32>,
    pub start_to_close: Option<u32>,
    pub task_list: Option<String>,
    pub retry: u32,
    pub delay: u32,
    pub error_handling: bool,
}

impl Default for ResolvedActivityOptions {
    fn default() -> Self {
        Self {
            heartbeat: None,
            schedule_to_close: None,
            schedule_to_start: None,
            start_to_close: None,
            task_list: None,
            retry: 3,
            delay: 0,
            error_handling: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSubworkflowOptions {
    pub workflow_duration: Option<u32>,
    pub decision_duration: Option<u32>,
    pub task_list: Option<String>,
    pub retry: u32,
    pub delay: u32,
    pub error_handling: bool,
}

impl Default for ResolvedSubworkflowOptions {
    fn default() -> Self {
        Self {
            workflow_duration: None,
            decision_duration: None,
            task_list: None,
            retry: 3,
            delay: 0,
            error_handling: false,
        }
    }
}

impl ActivityOptions {
    /// Left-fold `frames` (outermost first) onto the call-site options,
    /// innermost frame winning for any field it defines, then apply defaults
    /// for anything still unset.
    pub fn resolve(call_site: &ActivityOptions, frames: &[ActivityOptions]) -> ResolvedActivityOptions {
        let mut merged = call_site.clone();
        for frame in frames {
            merged = merged.overlaid_by(frame);
        }
        let defaults = ResolvedActivityOptions::default();
        ResolvedActivityOptions {
            heartbeat: merged.heartbeat.or(defaults.heartbeat),
            schedule_to_close: merged.schedule_to_close.or(defaults.schedule_to_close),
            schedule_to_start: merged.schedule_to_start.or(defaults.schedule_to_start),
            start_to_close: merged.start_to_close.or(defaults.start_to_close),
            task_list: merged.task_list.or(defaults.task_list),
            retry: merged.retry.unwrap_or(defaults.retry),
            delay: merged.delay.unwrap_or(defaults.delay),
            error_handling: merged.error_handling.unwrap_or(defaults.error_handling),
        }
    }

    /// Combine with a frame that sits on top (wins on overlap).
    fn overlaid_by(&self, top: &ActivityOptions) -> ActivityOptions {
        ActivityOptions {
            heartbeat: top.heartbeat.or(self.heartbeat),
            schedule_to_close: top.schedule_to_close.or(self.schedule_to_close),
            schedule_to_start: top.schedule_to_start.or(self.schedule_to_start),
            start_to_close: top.start_to_close.or(self.start_to_close),
            task_list: top.task_list.clone().or_else(|| self.task_list.clone()),
            retry: top.retry.or(self.retry),
            delay: top.delay.or(self.delay),
            error_handling: top.error_handling.or(self.error_handling),
        }
    }
}

impl SubworkflowOptions {
    pub fn resolve(
        call_site: &SubworkflowOptions,
        frames: &[SubworkflowOptions],
    ) -> ResolvedSubworkflowOptions {
        let mut merged = call_site.clone();
        for frame in frames {
            merged = merged.overlaid_by(frame);
        }
        let defaults = ResolvedSubworkflowOptions::default();
        ResolvedSubworkflowOptions {
            workflow_duration: merged.workflow_duration.or(defaults.workflow_duration),
            decision_duration: merged.decision_duration.or(defaults.decision_duration),
            task_list: merged.task_list.or(defaults.task_list),
            retry: merged.retry.unwrap_or(defaults.retry),
            delay: merged.delay.unwrap_or(defaults.delay),
            error_handling: merged.error_handling.unwrap_or(defaults.error_handling),
        }
    }

    fn overlaid_by(&self, top: &SubworkflowOptions) -> SubworkflowOptions {
        SubworkflowOptions {
            workflow_duration: top.workflow_duration.or(self.workflow_duration),
            decision_duration: top.decision_duration.or(self.decision_duration),
            task_list: top.task_list.clone().or_else(|| self.task_list.clone()),
            retry: top.retry.or(self.retry),
            delay: top.delay.or(self.delay),
            error_handling: top.error_handling.or(self.error_handling),
        }
    }
}
