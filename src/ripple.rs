use tracing::debug;

use crate::schedule::{Item, Schedule};
use crate::time::IdealTime;

/// Shift `next` forward so it starts where `current` ends, preserving its
/// duration. No-op when the pair is already disjoint.
fn ripple_pair(current: &Item, next: &mut Item) {
    if next.start < current.end {
        let delta = current.end.subtract(next.start);
        next.start = next.start.add(delta);
        next.end = next.end.add(delta);
    }
}

/// One left-to-right sweep over consecutive item pairs.
///
/// For each pair where both items satisfy `in_scope`, the later item is
/// rippled forward out of overlap, then measured against `deadline`: an item
/// starting strictly past the deadline is removed outright, one merely
/// running past it is clamped. An item starting exactly on the deadline
/// survives (possibly zero-length).
///
/// The sweep never revisits earlier pairs, so overlap only ever moves
/// forward. Removal does not advance the cursor: the removed item's
/// predecessor is re-paired with the following item. Pairs outside the scope
/// predicate are passed over untouched.
pub fn ripple_and_truncate(
    schedule: &mut Schedule,
    deadline: IdealTime,
    in_scope: impl Fn(&Item) -> bool,
) {
    let items = &mut schedule.items;
    let mut i = 0;
    while i + 1 < items.len() {
        if !(in_scope(&items[i]) && in_scope(&items[i + 1])) {
            i += 1;
            continue;
        }

        let (head, tail) = items.split_at_mut(i + 1);
        let next = &mut tail[0];
        ripple_pair(&head[i], next);

        if next.start > deadline {
            debug!(payload = %next.payload, "dropping item pushed past the deadline");
            items.remove(i + 1);
            continue;
        }
        if next.end > deadline {
            next.end = deadline;
        }
        i += 1;
    }
}

/// Remove the injection marker from every item, so a later independent pass
/// cannot mistake this run's items for newly injected ones. Running it twice
/// is a no-op.
pub fn clear_triggers(schedule: &mut Schedule) {
    for item in &mut schedule.items {
        item.clear_trigger();
    }
}
