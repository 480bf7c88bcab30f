//! The dense, read-only schedule produced by the [`Optimizer`](crate::optimizer).
//!
//! Every field here is plain boxed-slice/HashMap data: no lifetimes, no
//! interior mutability, `Clone`-able so a host can cache it by whatever
//! means it likes, matching the teacher's `Repository` convention of boxed
//! slices over nested vectors for cache-friendly, immutable-after-build data.

use std::collections::HashMap;

/// Out-of-band "no predecessor, this is the origin" marker for [`Label::via_stop`].
pub const SELF: u32 = u32::MAX;
/// Sentinel travel time for a stop that hasn't been reached yet.
pub const UNREACHED: u32 = 24 * 3600 + 1;

/// Per-stop, per-round search result: best known arrival offset from the
/// query's departure second, plus the predecessor trip/stop that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub travel_time_s: u32,
    /// `0` marks a transfer leg (trip ids are renumbered starting at 1, see [`ScheduleStore`]).
    pub via_trip: u32,
    /// [`SELF`] marks the origin.
    pub via_stop: u32,
}

impl Label {
    pub const UNREACHED: Self = Self {
        travel_time_s: UNREACHED,
        via_trip: 0,
        via_stop: SELF,
    };

    pub const fn origin() -> Self {
        Self {
            travel_time_s: 0,
            via_trip: 0,
            via_stop: SELF,
        }
    }

    pub const fn is_reached(&self) -> bool {
        self.travel_time_s < UNREACHED
    }
}

impl Default for Label {
    fn default() -> Self {
        Self::UNREACHED
    }
}

/// A platform. `station_id` is the logical stop-area it belongs to.
#[derive(Debug, Clone)]
pub struct StopRecord {
    pub name: Box<str>,
    pub station_id: u32,
    pub platform_code: Box<str>,
    pub is_transfer: bool,
}

/// One `(trip, stop)` event, in the ordering the Optimizer sorted it into.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopTimeRow {
    pub stop_id: u32,
    pub stop_sequence: u16,
    pub arrival_time_s: u32,
    pub departure_time_s: u32,
}

/// One boardable departure from a stop: the trip, its departure second, and
/// the position within that trip's stop sequence this row corresponds to
/// (the "hop-on index"), cached so Phase A never re-scans a trip's stop
/// sequence looking for where it boarded.
#[derive(Debug, Clone, Copy)]
pub struct Departure {
    pub trip_id: u32,
    pub departure_time_s: u32,
    pub hop_on_idx: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slice {
    start: u32,
    len: u32,
}

impl Slice {
    fn range(&self) -> std::ops::Range<usize> {
        self.start as usize..(self.start as usize + self.len as usize)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleStore {
    stops: Box<[StopRecord]>,

    station_platforms_offsets: Box<[Slice]>,
    station_platforms_data: Box<[u32]>,

    // Indexed directly by trip_id (trips are 1-based; index 0 is unused padding).
    trip_stop_offsets: Box<[Slice]>,
    trip_stops: Box<[StopTimeRow]>,

    stop_departure_offsets: Box<[Slice]>,
    stop_departures: Box<[Departure]>,

    trips_on_date: HashMap<Box<str>, Box<[u32]>>,
    short_name_to_trips: HashMap<u32, Box<[u32]>>,
    name_to_platforms: HashMap<Box<str>, Box<[u32]>>,
}

impl ScheduleStore {
    pub(crate) fn new(
        stops: Box<[StopRecord]>,
        station_platforms_offsets: Box<[(u32, u32)]>,
        station_platforms_data: Box<[u32]>,
        trip_stop_offsets: Box<[(u32, u32)]>,
        trip_stops: Box<[StopTimeRow]>,
        stop_departure_offsets: Box<[(u32, u32)]>,
        stop_departures: Box<[Departure]>,
        trips_on_date: HashMap<Box<str>, Box<[u32]>>,
        short_name_to_trips: HashMap<u32, Box<[u32]>>,
        name_to_platforms: HashMap<Box<str>, Box<[u32]>>,
    ) -> Self {
        let to_slices = |pairs: Box<[(u32, u32)]>| -> Box<[Slice]> {
            pairs
                .iter()
                .map(|&(start, len)| Slice { start, len })
                .collect()
        };
        Self {
            stops,
            station_platforms_offsets: to_slices(station_platforms_offsets),
            station_platforms_data,
            trip_stop_offsets: to_slices(trip_stop_offsets),
            trip_stops,
            stop_departure_offsets: to_slices(stop_departure_offsets),
            stop_departures,
            trips_on_date,
            short_name_to_trips,
            name_to_platforms,
        }
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn trip_count(&self) -> usize {
        // trip ids are 1-based; offsets[0] is unused padding.
        self.trip_stop_offsets.len().saturating_sub(1)
    }

    /// Every platform whose station name matches `name` exactly.
    pub fn stops_by_name(&self, name: &str) -> &[u32] {
        self.name_to_platforms
            .get(name)
            .map(|b| &**b)
            .unwrap_or(&[])
    }

    pub fn station_platforms(&self, station_id: u32) -> &[u32] {
        &self.station_platforms_data[self.station_platforms_offsets[station_id as usize].range()]
    }

    pub fn stop_info(&self, stop_id: u32) -> &StopRecord {
        &self.stops[stop_id as usize]
    }

    /// Ordered slice of `(stop_id, stop_sequence, arrival_time_s, departure_time_s)`
    /// rows for `trip_id`, sorted by `stop_sequence`.
    pub fn trip_stops(&self, trip_id: u32) -> &[StopTimeRow] {
        &self.trip_stops[self.trip_stop_offsets[trip_id as usize].range()]
    }

    pub fn trips_on_date(&self, date: &str) -> &[u32] {
        self.trips_on_date.get(date).map(|b| &**b).unwrap_or(&[])
    }

    /// Trips departing `stop_id` within `[window_start_s, window_start_s + window_s]`,
    /// in the active mask and for which `is_excluded` returns `false`, as
    /// `(trip_id, hop_on_idx)` pairs. `is_excluded` lets a caller combine the
    /// disruption set and the already-boarded-trips set without allocating a union.
    ///
    /// Implemented as a binary search into the stop's pre-sorted-by-departure-time
    /// slice followed by a bounded linear scan, not a scan of the whole stop-time table.
    pub fn stop_departures<'a>(
        &'a self,
        stop_id: u32,
        window_start_s: u32,
        window_s: u32,
        active_trip_mask: &'a bitvec::slice::BitSlice,
        mut is_excluded: impl FnMut(u32) -> bool + 'a,
    ) -> impl Iterator<Item = (u32, u32)> + 'a {
        let window_end_s = window_start_s + window_s;
        let slice = &self.stop_departures[self.stop_departure_offsets[stop_id as usize].range()];
        let start = slice.partition_point(|d| d.departure_time_s < window_start_s);
        slice[start..]
            .iter()
            .take_while(move |d| d.departure_time_s <= window_end_s)
            .filter(move |d| {
                active_trip_mask.get(d.trip_id as usize).is_some_and(|b| *b)
                    && !is_excluded(d.trip_id)
            })
            .map(|d| (d.trip_id, d.hop_on_idx))
    }

    /// Resolves a post-expansion short-name set to the concrete trip ids sharing it.
    pub fn trip_ids_for_short_names(
        &self,
        short_names: &std::collections::HashSet<u32>,
    ) -> std::collections::HashSet<u32> {
        short_names
            .iter()
            .filter_map(|sn| self.short_name_to_trips.get(sn))
            .flat_map(|ids| ids.iter().copied())
            .collect()
    }
}
