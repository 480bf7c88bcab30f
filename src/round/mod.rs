//! The RAPTOR-style K-round search: a round is "board at most one more trip."
//!
//! `QueryState` mirrors the teacher's `Allocator` reuse pattern (pre-allocated
//! buffers, a `reset()` that clears without reallocating) so repeated queries
//! against one store don't pay for fresh heap allocations each time. Unlike
//! the teacher's route-grouped scan, Phase A here walks the store's
//! `stop_departures` index directly per frontier stop, per the stop-centric
//! contract in `ScheduleStore`.

use std::collections::HashSet;

use bitvec::prelude::*;
use tracing::{trace, warn};

use crate::{
    config::EngineConfig,
    planner::Query,
    store::{Label, ScheduleStore, SELF},
};

/// Reusable per-query scratch state, sized once against a `ScheduleStore` and
/// reset (not reallocated) between queries against that same store.
pub struct QueryState {
    labels: Vec<Label>,
    frontier: Vec<u32>,
    used_trips: BitVec,
    round_snapshots: Vec<Box<[Label]>>,
    travel_added: Vec<u32>,
    transfer_added: Vec<u32>,
}

impl QueryState {
    pub fn new(store: &ScheduleStore) -> Self {
        Self {
            labels: vec![Label::UNREACHED; store.stop_count()],
            frontier: Vec::with_capacity(64),
            used_trips: bitvec![0; store.trip_count() + 1],
            round_snapshots: Vec::new(),
            travel_added: Vec::with_capacity(64),
            transfer_added: Vec::with_capacity(64),
        }
    }

    fn reset(&mut self, store: &ScheduleStore) {
        self.labels.clear();
        self.labels.resize(store.stop_count(), Label::UNREACHED);
        self.frontier.clear();
        self.used_trips.clear();
        self.used_trips.resize(store.trip_count() + 1, false);
        self.round_snapshots.clear();
        self.travel_added.clear();
        self.transfer_added.clear();
    }
}

/// Result of a completed query: per-round snapshots, the final labels, and
/// the reached destination (if any within the round budget).
pub struct RoundResult {
    /// Always length `max_rounds + 1` (the requested `rounds`, or
    /// `config.max_rounds` if `None`), even if the search's frontier emptied
    /// out early — trailing rounds are padded with the final label state.
    /// Index 0 is the origin-only state.
    pub round_snapshots: Vec<Box<[Label]>>,
    pub final_labels: Box<[Label]>,
    pub dest_stop_id: Option<u32>,
}

/// Runs the search to completion. `rounds` overrides `config.max_rounds` when
/// `Some`; the Round Engine never returns an error — an unreachable
/// destination is reported as `dest_stop_id: None`, not a failure.
pub fn run(
    store: &ScheduleStore,
    config: &EngineConfig,
    query: &Query,
    state: &mut QueryState,
    rounds: Option<usize>,
) -> RoundResult {
    state.reset(store);
    let max_rounds = rounds.unwrap_or(config.max_rounds);

    for &s in query.origin_stop_ids.iter() {
        state.labels[s as usize] = Label::origin();
    }
    state.frontier.clear();
    state.frontier.extend(query.origin_stop_ids.iter().copied());
    state.frontier.sort_unstable();
    state.frontier.dedup();
    state.round_snapshots.push(state.labels.clone().into_boxed_slice());

    for round in 1..=max_rounds {
        if state.frontier.is_empty() {
            break;
        }
        state.travel_added.clear();
        state.transfer_added.clear();

        // Round 1 is bounded by the broad service window (matching the source's
        // 6h query-time prefilter); every later round narrows to the 1h boarding
        // window, since by then `labels` already holds a concrete arrival offset.
        let window_s = if round == 1 {
            config.service_window_s
        } else {
            config.boarding_window_s
        };

        // Phase A: trip traversal.
        for &s in state.frontier.clone().iter() {
            let window_start = query.departure_s + state.labels[s as usize].travel_time_s;
            let used_trips = &state.used_trips;
            let excluded = &query.excluded_trip_set;
            let boardable: Vec<(u32, u32)> = store
                .stop_departures(
                    s,
                    window_start,
                    window_s,
                    &query.active_trip_mask,
                    |trip_id| {
                        used_trips.get(trip_id as usize).is_some_and(|b| *b)
                            || excluded.contains(&trip_id)
                    },
                )
                .collect();

            for &(trip_id, _) in &boardable {
                state.used_trips.set(trip_id as usize, true);
            }

            for (trip_id, hop_on_idx) in boardable {
                let trip_rows = store.trip_stops(trip_id);
                let hop_on = trip_rows[hop_on_idx as usize];
                for row in &trip_rows[hop_on_idx as usize + 1..] {
                    debug_assert!(row.stop_sequence > hop_on.stop_sequence);
                    let arr_off = row.arrival_time_s - query.departure_s;
                    if arr_off < state.labels[row.stop_id as usize].travel_time_s {
                        state.labels[row.stop_id as usize] = Label {
                            travel_time_s: arr_off,
                            via_trip: trip_id,
                            via_stop: s,
                        };
                        state.travel_added.push(row.stop_id);
                        trace!(round, stop = row.stop_id, trip_id, arr_off, "boarded");
                    }
                }
            }
        }
        state.travel_added.sort_unstable();
        state.travel_added.dedup();

        // Phase B: same-station transfer.
        for &s in &state.travel_added {
            if !store.stop_info(s).is_transfer {
                continue;
            }
            let station_id = store.stop_info(s).station_id;
            let from_time = state.labels[s as usize].travel_time_s;
            for &s2 in store.station_platforms(station_id) {
                if s2 == s {
                    continue;
                }
                let cand = from_time + transfer_time(config);
                if cand < state.labels[s2 as usize].travel_time_s {
                    state.labels[s2 as usize] = Label {
                        travel_time_s: cand,
                        via_trip: 0,
                        via_stop: s,
                    };
                    state.transfer_added.push(s2);
                }
            }
        }
        state.transfer_added.sort_unstable();
        state.transfer_added.dedup();

        state
            .round_snapshots
            .push(state.labels.clone().into_boxed_slice());

        state.frontier.clear();
        state.frontier.extend(state.travel_added.iter().copied());
        state.frontier.extend(state.transfer_added.iter().copied());
        state.frontier.sort_unstable();
        state.frontier.dedup();

        if round == max_rounds && !state.frontier.is_empty() {
            warn!(max_rounds, "round cap reached with stops still improving");
        }
    }

    // The frontier can empty out before `max_rounds` rounds run, breaking the
    // loop early. Pad with copies of the final (unchanging) label state so
    // `round_snapshots` always has the documented `max_rounds + 1` length and
    // callers can index `round_snapshots[k]` for any `k <= max_rounds`.
    while state.round_snapshots.len() < max_rounds + 1 {
        state
            .round_snapshots
            .push(state.labels.clone().into_boxed_slice());
    }

    let dest_stop_id = query
        .destination_stop_ids
        .iter()
        .copied()
        .filter(|&s| state.labels[s as usize].is_reached())
        .min_by_key(|&s| {
            let pos = query
                .destination_stop_ids
                .iter()
                .position(|&d| d == s)
                .unwrap_or(usize::MAX);
            (state.labels[s as usize].travel_time_s, pos)
        });

    RoundResult {
        round_snapshots: state.round_snapshots.clone(),
        final_labels: state.labels.clone().into_boxed_slice(),
        dest_stop_id,
    }
}

/// Extension point for a time/day-of-week-dependent transfer cost; today
/// always returns the configured constant.
fn transfer_time(config: &EngineConfig) -> u32 {
    config.transfer_cost_s
}
