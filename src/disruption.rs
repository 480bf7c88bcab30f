//! Turns a user-provided list of trip short-names into the `excluded_trip_set`
//! the Round Engine needs.

use std::collections::HashSet;

use crate::store::ScheduleStore;

/// Expands each `n` in `short_names`: if `n` is divisible by 100 and non-zero,
/// it's a series root and expands to `n+1 ..= n+99`; otherwise `n` itself is
/// excluded. This fixes the historical script's bug, which appended the
/// series root itself instead of its expanded members.
pub fn expand_series(short_names: &[u32]) -> HashSet<u32> {
    let mut expanded = HashSet::new();
    for &n in short_names {
        if n != 0 && n % 100 == 0 {
            expanded.extend(n + 1..=n + 99);
        } else {
            expanded.insert(n);
        }
    }
    expanded
}

/// Maps an expanded short-name set to concrete trip ids via the store's
/// short_name index.
pub fn resolve(store: &ScheduleStore, expanded: &HashSet<u32>) -> HashSet<u32> {
    store.trip_ids_for_short_names(expanded)
}
