use std::fmt;

/// Control-flow signal raised by [`Outcome::result`] when the value cannot be
/// produced synchronously.
///
/// `SyncNeeded` is never surfaced past the replay trampoline (see
/// `flowctl-decider::replay`): it means "this turn ends here, keep whatever
/// scheduling side effects already happened." `Activity` carries the reason
/// string attached to an upstream `Error` outcome and is the payload for the
/// `ActivityError` the workflow author actually observes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplayControl {
    /// Dereferencing an unresolved placeholder. Caught by the runtime, never
    /// returned to a workflow author.
    SyncNeeded,
    /// Dereferencing a resolved error. Surfaces to workflow code as
    /// `ActivityError` when caught with manual `error_handling`.
    Activity(String),
}

impl fmt::Display for ReplayControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SyncNeeded => write!(f, "sync needed"),
            Self::Activity(reason) => write!(f, "activity error: {reason}"),
        }
    }
}

impl std::error::Error for ReplayControl {}

/// The tri-state outcome a workflow observes for any remote call.
///
/// A call to a proxied activity or sub-workflow always returns an `Outcome`
/// synchronously; the variant tells the workflow author whether a value is
/// available yet, never available (error), or still in flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// Not yet resolved. Calling `.result()` unwinds the current turn.
    Placeholder,
    /// Successfully produced.
    Result(T),
    /// The remote call failed; `reason` is a short human string.
    Error(String),
}

impl<T> Outcome<T> {
    /// Observe the value, or fail with a control-flow signal.
    ///
    /// - `Result(v)` -> `Ok(&v)`
    /// - `Error(r)` -> `Err(ReplayControl::Activity(r))`
    /// - `Placeholder` -> `Err(ReplayControl::SyncNeeded)`
    pub fn result(&self) -> Result<&T, ReplayControl> {
        match self {
            Self::Result(v) => Ok(v),
            Self::Error(reason) => Err(ReplayControl::Activity(reason.clone())),
            Self::Placeholder => Err(ReplayControl::SyncNeeded),
        }
    }

    /// Consume the outcome, or fail with a control-flow signal.
    pub fn into_result(self) -> Result<T, ReplayControl> {
        match self {
            Self::Result(v) => Ok(v),
            Self::Error(reason) => Err(ReplayControl::Activity(reason)),
            Self::Placeholder => Err(ReplayControl::SyncNeeded),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn error_reason(&self) -> Option<&str> {
        match self {
            Self::Error(reason) => Some(reason.as_str()),
            _ => None,
        }
    }
}

/// Concatenate the reasons of every `Error` outcome in `args`, newline
/// separated, preserving argument order.
///
/// Returns `None` if none of `args` is an `Error`.
pub fn compose_errors<'a, T: 'a>(args: impl IntoIterator<Item = &'a Outcome<T>>) -> Option<String> {
    let reasons: Vec<&str> = args.into_iter().filter_map(Outcome::error_reason).collect();
    if reasons.is_empty() {
        None
    } else {
        Some(reasons.join("\n"))
    }
}

/// True if any argument is still a `Placeholder` (the call is blocked on an
/// upstream dependency that hasn't resolved yet).
pub fn any_placeholder<'a, T: 'a>(args: impl IntoIterator<Item = &'a Outcome<T>>) -> bool {
    args.into_iter().any(Outcome::is_placeholder)
}
