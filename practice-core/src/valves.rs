//! # Valve Combination Module
//!
//! The three piston valves are the whole input vocabulary of the trumpet:
//! every playable note is encoded as the set of valves held down while it
//! sounds. This module defines the valve-id domain and the combination
//! matching predicate the practice session evaluates on every input change.

use std::collections::BTreeSet;

/// The three logical valve ids, in order.
pub const VALVE_IDS: [u8; 3] = [1, 2, 3];

/// A combination of valves. A set keeps membership unique and ordered.
pub type ValveSet = BTreeSet<u8>;

/// Builds a `ValveSet` from a slice of valve ids.
pub fn valve_set(ids: &[u8]) -> ValveSet {
    ids.iter().copied().collect()
}

/// Checks whether a held combination answers a required one.
///
/// True iff the two sets have identical membership: partial overlap is not
/// a match and neither is a superset. The predicate is evaluated repeatedly
/// as input accumulates, not just once at submission.
///
/// # Arguments
/// * `required` - The combination the current note requires
/// * `pressed` - The valves currently held down
pub fn is_match(required: &ValveSet, pressed: &ValveSet) -> bool {
    required == pressed
}

/// Renders a combination for feedback text, e.g. "1+3" or "open".
pub fn combination_label(combination: &ValveSet) -> String {
    if combination.is_empty() {
        "open".to_string()
    } else {
        combination
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("+")
    }
}
