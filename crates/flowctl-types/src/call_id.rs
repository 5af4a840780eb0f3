use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies a single remote call (activity or sub-workflow invocation) within
/// one workflow execution.
///
/// Assigned in the order the workflow code requests remote calls, starting at
/// zero. Stability of this sequence across replays is the load-bearing
/// invariant of the whole engine: identical workflow code given identical
/// input must allocate identical `CallId`s call-site by call-site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CallId(pub u64);

impl CallId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CallId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<u64> for CallId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Monotonic allocator for `CallId`s within a single replay pass.
///
/// A fresh allocator is created at the start of every decision turn; as long
/// as the workflow function calls proxies in the same source order every
/// time, the sequence of values handed out is identical turn after turn.
#[derive(Clone, Copy, Debug, Default)]
pub struct CallIdAllocator {
    next: u64,
}

impl CallIdAllocator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn allocate(&mut self) -> CallId {
        let id = CallId(self.next);
        self.next += 1;
        id
    }
}
