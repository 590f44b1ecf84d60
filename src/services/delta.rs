use std::collections::HashSet;

use crate::models::PlanningEntity;

/// Returns the entries of `current` whose id does not appear in `previous`.
///
/// Output keeps the order of `current`. Duplicate ids inside `current` are
/// passed through untouched. An empty `previous` makes everything new.
#[must_use]
pub fn compute_delta(previous: &[PlanningEntity], current: &[PlanningEntity]) -> Vec<PlanningEntity> {
    let seen: HashSet<&str> = previous.iter().map(|e| e.id.as_str()).collect();

    current
        .iter()
        .filter(|e| !seen.contains(e.id.as_str()))
        .cloned()
        .collect()
}
