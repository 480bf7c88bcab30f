//! Resolves human-readable origin/destination names and a date/time to the
//! integer-space [`Query`] the Round Engine needs.

use std::collections::HashSet;

use bitvec::prelude::*;
use tracing::warn;

use crate::{
    disruption,
    error::{PlannerError, StopRole},
    shared::time::Time,
    store::ScheduleStore,
};

/// Fully resolved, integer-space search parameters.
#[derive(Debug, Clone)]
pub struct Query {
    pub origin_stop_ids: Box<[u32]>,
    pub destination_stop_ids: Box<[u32]>,
    pub departure_s: u32,
    /// Sized to the store's trip count; `active_trip_mask[trip_id]` is set
    /// iff that trip operates on the requested date.
    pub active_trip_mask: BitVec,
    pub excluded_trip_set: HashSet<u32>,
}

/// Resolves `(origin_name, destination_name, date, time_str, disruption_short_names,
/// use_disruptions)` into a [`Query`]. An empty service date is not an error:
/// it's logged and the query proceeds with an empty active-trip mask, which
/// the Round Engine reports as every stop unreached.
#[allow(clippy::too_many_arguments)]
pub fn plan(
    store: &ScheduleStore,
    origin_name: &str,
    destination_name: &str,
    date: &str,
    departure_time_str: &str,
    use_disruptions: bool,
    disruption_short_names: &[u32],
) -> Result<Query, PlannerError> {
    let departure_s = parse_departure_time(departure_time_str)?;

    let origin_stop_ids = store.stops_by_name(origin_name);
    if origin_stop_ids.is_empty() {
        return Err(PlannerError::UnknownStopArea {
            which: StopRole::Origin,
            name: origin_name.to_string(),
        });
    }
    let destination_stop_ids = store.stops_by_name(destination_name);
    if destination_stop_ids.is_empty() {
        return Err(PlannerError::UnknownStopArea {
            which: StopRole::Destination,
            name: destination_name.to_string(),
        });
    }

    let active_trips = store.trips_on_date(date);
    if active_trips.is_empty() {
        warn!("no trips operate on {date}; query will return all-unreached labels");
    }
    let mut active_trip_mask: BitVec = bitvec![0; store.trip_count() + 1];
    for &trip_id in active_trips {
        active_trip_mask.set(trip_id as usize, true);
    }

    let excluded_trip_set = if use_disruptions {
        let expanded = disruption::expand_series(disruption_short_names);
        disruption::resolve(store, &expanded)
    } else {
        HashSet::new()
    };

    Ok(Query {
        origin_stop_ids: origin_stop_ids.into(),
        destination_stop_ids: destination_stop_ids.into(),
        departure_s,
        active_trip_mask,
        excluded_trip_set,
    })
}

/// Accepts both `HH:MM` and `HH:MM:SS`; the former defaults seconds to `00`.
fn parse_departure_time(time_str: &str) -> Result<u32, PlannerError> {
    let normalized = if time_str.matches(':').count() == 1 {
        format!("{time_str}:00")
    } else {
        time_str.to_string()
    };
    Time::from_hms(&normalized)
        .map(|t| t.as_seconds())
        .ok_or_else(|| PlannerError::MalformedTime(time_str.to_string()))
}
