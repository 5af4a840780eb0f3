use crate::call_id::CallId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// The opaque execution context round-tripped through the remote service on
/// every decision reply and the following decision task.
///
/// This is the in-memory, properly-typed shape. The wire shape
/// ([`WireExecutionContext`]) is string-keyed JSON, because the transport
/// flattens every object key to a string; [`ExecutionContext::decode`] is the
/// single place that re-coerces those keys back to [`CallId`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    pub event_to_call_id: BTreeMap<u64, CallId>,
    pub retries: BTreeMap<CallId, i64>,
    pub scheduled: BTreeSet<CallId>,
    pub results: BTreeMap<CallId, String>,
    pub timed_out: BTreeSet<CallId>,
    pub with_errors: BTreeMap<CallId, String>,
    pub input: Option<String>,
}

/// JSON-wire shape of [`ExecutionContext`].
///
/// Every map key is a `String` here, matching what the transport actually
/// carries: JSON object keys are always strings, so a map keyed by `CallId`
/// (an integer) gets silently flattened to decimal-string keys by any JSON
/// encoder. Decoding must parse them back explicitly; skipping that step is
/// exactly the bug this split-representation guards against.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct WireExecutionContext {
    event_to_call_id: BTreeMap<String, u64>,
    retries: BTreeMap<String, i64>,
    scheduled: BTreeSet<u64>,
    results: BTreeMap<String, String>,
    timed_out: BTreeSet<u64>,
    with_errors: BTreeMap<String, String>,
    input: Option<String>,
}

#[derive(Debug, Error)]
pub enum ContextCodecError {
    #[error("execution context is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("execution context key {key:?} is not a valid call id: {source}")]
    InvalidCallIdKey {
        key: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

impl ExecutionContext {
    /// Serialize to the UTF-8 JSON string the decision reply carries as
    /// `executionContext`.
    ///
    /// Integer keys (`event_to_call_id`, `retries`, `results`,
    /// `with_errors`) are rendered as decimal strings, matching how any JSON
    /// encoder would flatten them; `scheduled` and `timed_out` are rendered
    /// as arrays since JSON has no native set type.
    pub fn encode(&self) -> String {
        let wire = WireExecutionContext {
            event_to_call_id: self
                .event_to_call_id
                .iter()
                .map(|(event_id, call_id)| (event_id.to_string(), call_id.value()))
                .collect(),
            retries: self
                .retries
                .iter()
                .map(|(call_id, n)| (call_id.to_string(), *n))
                .collect(),
            scheduled: self.scheduled.iter().map(|c| c.value()).collect(),
            results: self
                .results
                .iter()
                .map(|(call_id, raw)| (call_id.to_string(), raw.clone()))
                .collect(),
            timed_out: self.timed_out.iter().map(|c| c.value()).collect(),
            with_errors: self
                .with_errors
                .iter()
                .map(|(call_id, reason)| (call_id.to_string(), reason.clone()))
                .collect(),
            input: self.input.clone(),
        };
        serde_json::to_string(&wire).expect("ExecutionContext always serializes")
    }

    /// Decode a context blob previously produced by [`Self::encode`].
    ///
    /// Re-coerces every string-keyed map back into a `CallId`-keyed one. A
    /// key that does not parse as a non-negative integer is reported as
    /// [`ContextCodecError::InvalidCallIdKey`] rather than silently dropped.
    pub fn decode(raw: &str) -> Result<Self, ContextCodecError> {
        let wire: WireExecutionContext = serde_json::from_str(raw)?;

        let event_to_call_id = wire
            .event_to_call_id
            .into_iter()
            .map(|(event_id, call_id)| {
                event_id
                    .parse::<u64>()
                    .map(|event_id| (event_id, CallId::new(call_id)))
                    .map_err(|source| ContextCodecError::InvalidCallIdKey { key: event_id, source })
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        let retries = fix_keys(wire.retries)?;
        let results = fix_keys(wire.results)?;
        let with_errors = fix_keys(wire.with_errors)?;

        Ok(Self {
            event_to_call_id,
            retries,
            scheduled: wire.scheduled.into_iter().map(CallId::new).collect(),
            results,
            timed_out: wire.timed_out.into_iter().map(CallId::new).collect(),
            with_errors,
            input: wire.input,
        })
    }
}

/// Re-coerce a string-keyed map's keys back into `CallId`s.
///
/// This is the "fix json's silent key conversion from int to string" step
/// the original implementation performed ad hoc in each call site; here it
/// is one shared, fallible helper instead.
fn fix_keys<V>(map: BTreeMap<String, V>) -> Result<BTreeMap<CallId, V>, ContextCodecError> {
    map.into_iter()
        .map(|(key, value)| {
            key.parse::<CallId>()
                .map(|call_id| (call_id, value))
                .map_err(|source| ContextCodecError::InvalidCallIdKey { key, source })
        })
        .collect()
}
