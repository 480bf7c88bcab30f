//! Walks predecessor pointers from a destination label back to the origin,
//! producing an ordered leg list. Grounded on the teacher's `backtrack`
//! (`raptor::path`), collapsed to this crate's flatter leg shape (no
//! coordinates, no walk legs — only transit and same-station transfer legs
//! exist here).

use crate::store::{Label, SELF};

/// One boarding or transfer: `via_trip_or_0 == 0` marks a same-station transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg {
    pub from_stop: u32,
    pub via_trip_or_0: u32,
    pub to_stop: u32,
}

/// Walks `labels` backward from `dest_stop_id` to the origin. Returns an
/// empty list if `dest_stop_id` is `None` (nothing to walk back from) or if
/// the destination was never reached.
pub fn reconstruct(labels: &[Label], dest_stop_id: Option<u32>) -> Vec<Leg> {
    let Some(dest_stop_id) = dest_stop_id else {
        return Vec::new();
    };

    let mut legs = Vec::new();
    let mut cur = dest_stop_id;
    while labels[cur as usize].via_stop != SELF {
        let label = labels[cur as usize];
        legs.push(Leg {
            from_stop: label.via_stop,
            via_trip_or_0: label.via_trip,
            to_stop: cur,
        });
        cur = label.via_stop;
    }
    legs.reverse();
    legs
}
