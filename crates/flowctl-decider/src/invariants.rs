use crate::error::StateViolation;
use crate::projector::ProjectedState;

/// Check that no call id is simultaneously present in more than one of
/// `scheduled`, `results`, `with_errors`, `timed_out`.
///
/// A call moves between these sets over its lifetime (`scheduled` ->
/// `results`/`with_errors`, or `scheduled` -> `timed_out` -> `scheduled` again
/// on retry) but must never occupy two of them at once; that would mean the
/// projector folded a contradictory pair of events for the same call.
pub fn check_disjoint(state: &ProjectedState) -> Result<(), StateViolation> {
    let mut call_ids: Vec<_> = state
        .scheduled
        .iter()
        .chain(state.results.keys())
        .chain(state.with_errors.keys())
        .chain(state.timed_out.iter())
        .copied()
        .collect();
    call_ids.sort_unstable();
    call_ids.dedup();

    for call_id in call_ids {
        let mut sets = Vec::new();
        if state.scheduled.contains(&call_id) {
            sets.push("scheduled");
        }
        if state.results.contains_key(&call_id) {
            sets.push("results");
        }
        if state.with_errors.contains_key(&call_id) {
            sets.push("with_errors");
        }
        if state.timed_out.contains(&call_id) {
            sets.push("timed_out");
        }
        if sets.len() > 1 {
            return Err(StateViolation::NotDisjoint { call_id, sets });
        }
    }
    Ok(())
}
