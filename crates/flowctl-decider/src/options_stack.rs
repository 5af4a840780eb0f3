use flowctl_types::{ActivityOptions, ResolvedActivityOptions, ResolvedSubworkflowOptions, SubworkflowOptions};
use std::cell::RefCell;
use std::rc::Rc;

/// LIFO stack of partial option frames opened by nested `options()` scopes.
///
/// The source runtime exposed this as a `@contextmanager`: entering the
/// `with` block pushed a frame, leaving it popped one. Rust has no block
///-scoped `with`, so the same shape is expressed as a guard: [`push_activity`]
/// / [`push_subworkflow`] return a guard whose `Drop` impl pops, so the frame
/// is removed on every exit path (including `?` early-return) without the
/// caller doing anything.
#[derive(Clone, Default)]
pub struct OptionsStack {
    inner: Rc<RefCell<Inner>>,
}

#[derive(Default)]
struct Inner {
    activity_frames: Vec<ActivityOptions>,
    subworkflow_frames: Vec<SubworkflowOptions>,
}

impl OptionsStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new activity-options scope; the returned guard pops it on drop.
    pub fn push_activity(&self, frame: ActivityOptions) -> ActivityScopeGuard {
        self.inner.borrow_mut().activity_frames.push(frame);
        ActivityScopeGuard { stack: self.inner.clone() }
    }

    /// Push a new sub-workflow-options scope; the returned guard pops it on drop.
    pub fn push_subworkflow(&self, frame: SubworkflowOptions) -> SubworkflowScopeGuard {
        self.inner.borrow_mut().subworkflow_frames.push(frame);
        SubworkflowScopeGuard { stack: self.inner.clone() }
    }

    /// Resolve a call-site's activity options against the currently open
    /// scopes, outermost to innermost, then hardcoded defaults.
    pub fn resolve_activity(&self, call_site: &ActivityOptions) -> ResolvedActivityOptions {
        let frames = &self.inner.borrow().activity_frames;
        ActivityOptions::resolve(call_site, frames)
    }

    pub fn resolve_subworkflow(&self, call_site: &SubworkflowOptions) -> ResolvedSubworkflowOptions {
        let frames = &self.inner.borrow().subworkflow_frames;
        SubworkflowOptions::resolve(call_site, frames)
    }
}

/// Pops the activity-options frame it was constructed with when dropped.
pub struct ActivityScopeGuard {
    stack: Rc<RefCell<Inner>>,
}

impl Drop for ActivityScopeGuard {
    fn drop(&mut self) {
        self.stack.borrow_mut().activity_frames.pop();
    }
}

/// Pops the sub-workflow-options frame it was constructed with when dropped.
pub struct SubworkflowScopeGuard {
    stack: Rc<RefCell<Inner>>,
}

impl Drop for SubworkflowScopeGuard {
    fn drop(&mut self) {
        self.stack.borrow_mut().subworkflow_frames.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_scopes_resolve_innermost_wins() {
        let stack = OptionsStack::new();
        let call_site = ActivityOptions::default();
        {
            let _outer = stack.push_activity(ActivityOptions {
                task_list: Some("outer".into()),
                retry: Some(1),
                ..Default::default()
            });
            {
                let _inner = stack.push_activity(ActivityOptions {
                    task_list: Some("inner".into()),
                    ..Default::default()
                });
                let resolved = stack.resolve_activity(&call_site);
                assert_eq!(resolved.task_list.as_deref(), Some("inner"));
                assert_eq!(resolved.retry, 1);
            }
            // inner guard dropped: only the outer frame applies now.
            let resolved = stack.resolve_activity(&call_site);
            assert_eq!(resolved.task_list.as_deref(), Some("outer"));
        }
        // outer guard dropped too: nothing but call-site/defaults remain.
        let resolved = stack.resolve_activity(&call_site);
        assert_eq!(resolved.task_list, None);
        assert_eq!(resolved.retry, 3);
    }

    #[test]
    fn guard_pops_even_when_dropped_via_early_return() {
        fn scoped(stack: &OptionsStack) -> Result<(), ()> {
            let _guard = stack.push_activity(ActivityOptions {
                retry: Some(9),
                ..Default::default()
            });
            Err(())
        }

        let stack = OptionsStack::new();
        let _ = scoped(&stack);
        let resolved = stack.resolve_activity(&ActivityOptions::default());
        assert_eq!(resolved.retry, 3);
    }

    #[test]
    fn subworkflow_scopes_are_independent_of_activity_scopes() {
        let stack = OptionsStack::new();
        let _activity_guard = stack.push_activity(ActivityOptions {
            retry: Some(9),
            ..Default::default()
        });
        let resolved = stack.resolve_subworkflow(&SubworkflowOptions::default());
        assert_eq!(resolved.retry, 3);
    }
}
