//! One-shot transform from raw relational tables to a dense [`ScheduleStore`].
//!
//! Mirrors the teacher's `Repository::load_gtfs` phase structure (one method
//! per table, `debug!` + `Instant::now()`/`elapsed()` around each phase) but
//! follows the renumbering and transfer-station rules this schedule format
//! actually needs rather than the teacher's GTFS-table-specific load order.

use std::{
    collections::{HashMap, HashSet},
    time::Instant,
};

use rayon::prelude::*;
use tracing::debug;

use crate::{
    error::OptimizerError,
    raw::RawSchedule,
    shared::time::Time,
    store::{Departure, ScheduleStore, StopRecord, StopTimeRow},
};

/// Builds a [`ScheduleStore`] from already-parsed raw tables.
pub struct Optimizer;

struct ParsedStopTime {
    trip_id: String,
    stop_id: String,
    stop_sequence: u16,
    arrival_time_s: u32,
    departure_time_s: u32,
}

impl Optimizer {
    /// Runs all seven build steps in order. Any malformed row or dangling
    /// foreign key aborts the build: the store is either complete or absent.
    pub fn build(raw: &RawSchedule) -> Result<ScheduleStore, OptimizerError> {
        let parsed_stop_times = Self::normalize_times(raw)?;
        Self::check_duplicate_stop_ids(raw)?;

        let stop_ids: HashSet<&str> = raw.stops.iter().map(|s| s.stop_id.as_str()).collect();
        let trip_ids: HashSet<&str> = raw.trips.iter().map(|t| t.trip_id.as_str()).collect();
        for row in &parsed_stop_times {
            if !trip_ids.contains(row.trip_id.as_str()) {
                return Err(OptimizerError::DanglingTripId(row.trip_id.clone()));
            }
            if !stop_ids.contains(row.stop_id.as_str()) {
                return Err(OptimizerError::DanglingStopId(row.stop_id.clone()));
            }
        }

        let station_key_of = Self::station_keys(raw);
        let is_transfer_station = Self::detect_transfer_stations(&parsed_stop_times, &station_key_of);

        let (stop_id_map, new_stops, station_id_map, num_stations) =
            Self::renumber_stops(raw, &station_key_of, &is_transfer_station);
        let trip_id_map = Self::renumber_trips(raw);

        let service_dates = Self::join_service_dates(raw);
        let trips_on_date = Self::build_trips_on_date(raw, &trip_id_map, &service_dates);

        let station_platforms = Self::build_station_platforms(&new_stops, num_stations);
        let short_name_to_trips = Self::build_short_name_index(raw, &trip_id_map);
        let name_to_platforms = Self::build_name_index(&new_stops);

        let (trip_stop_offsets, trip_stops) =
            Self::build_trip_stop_index(&parsed_stop_times, &stop_id_map, &trip_id_map);
        let (stop_departure_offsets, stop_departures) =
            Self::build_departure_index(&trip_stop_offsets, &trip_stops, new_stops.len());

        Ok(ScheduleStore::new(
            new_stops,
            station_platforms.0,
            station_platforms.1,
            trip_stop_offsets,
            trip_stops,
            stop_departure_offsets,
            stop_departures,
            trips_on_date,
            short_name_to_trips,
            name_to_platforms,
        ))
    }

    /// Step 1: parse `HH:MM:SS` to seconds-since-midnight; drop synthetic
    /// `stoparea`-prefixed stop rows (applied implicitly: such stops never
    /// appear in `raw.stops` once the loader filters them, so here we only
    /// guard against their stop_times referencing a dropped id).
    fn normalize_times(raw: &RawSchedule) -> Result<Vec<ParsedStopTime>, OptimizerError> {
        debug!("normalizing stop_times...");
        let now = Instant::now();
        let parsed = raw
            .stop_times
            .iter()
            .filter(|row| !row.stop_id.starts_with("stoparea"))
            .map(|row| {
                let arrival_time_s = Time::from_hms(&row.arrival_time)
                    .ok_or_else(|| OptimizerError::MalformedTime {
                        trip_id: row.trip_id.clone(),
                        raw: row.arrival_time.clone(),
                    })?
                    .as_seconds();
                let departure_time_s = Time::from_hms(&row.departure_time)
                    .ok_or_else(|| OptimizerError::MalformedTime {
                        trip_id: row.trip_id.clone(),
                        raw: row.departure_time.clone(),
                    })?
                    .as_seconds();
                Ok(ParsedStopTime {
                    trip_id: row.trip_id.clone(),
                    stop_id: row.stop_id.clone(),
                    stop_sequence: row.stop_sequence,
                    arrival_time_s,
                    departure_time_s,
                })
            })
            .collect::<Result<Vec<_>, OptimizerError>>()?;
        debug!("normalized {} stop_times in {:?}", parsed.len(), now.elapsed());
        Ok(parsed)
    }

    /// Two raw stop rows sharing a `stop_id` would silently collide in
    /// `renumber_stops`'s id map (the later row winning); caught here instead.
    fn check_duplicate_stop_ids(raw: &RawSchedule) -> Result<(), OptimizerError> {
        let mut seen = HashSet::with_capacity(raw.stops.len());
        for stop in &raw.stops {
            if stop.stop_id.starts_with("stoparea") {
                continue;
            }
            if !seen.insert(stop.stop_id.as_str()) {
                return Err(OptimizerError::DuplicateId(stop.stop_id.clone()));
            }
        }
        Ok(())
    }

    /// A stop's station key is its `parent_station` if present, otherwise itself
    /// (an unaffiliated stop is its own singleton station).
    fn station_keys(raw: &RawSchedule) -> HashMap<&str, &str> {
        raw.stops
            .iter()
            .filter(|s| !s.stop_id.starts_with("stoparea"))
            .map(|s| {
                let key = s.parent_station.as_deref().unwrap_or(s.stop_id.as_str());
                (s.stop_id.as_str(), key)
            })
            .collect()
    }

    /// Step 4: a station is a transfer station iff, across all trips, its
    /// platforms collectively lead to more than two distinct next-stops.
    fn detect_transfer_stations(
        parsed: &[ParsedStopTime],
        station_key_of: &HashMap<&str, &str>,
    ) -> HashSet<String> {
        debug!("detecting transfer stations...");
        let now = Instant::now();
        let mut by_trip: HashMap<&str, Vec<&ParsedStopTime>> = HashMap::new();
        for row in parsed {
            by_trip.entry(row.trip_id.as_str()).or_default().push(row);
        }

        let mut next_stops: HashMap<&str, HashSet<&str>> = HashMap::new();
        for rows in by_trip.values_mut() {
            rows.sort_unstable_by_key(|r| r.stop_sequence);
            for pair in rows.windows(2) {
                let (cur, next) = (pair[0], pair[1]);
                if let Some(&key) = station_key_of.get(cur.stop_id.as_str()) {
                    next_stops
                        .entry(key)
                        .or_default()
                        .insert(next.stop_id.as_str());
                }
            }
        }

        let transfer_stations: HashSet<String> = next_stops
            .into_iter()
            .filter(|(_, nexts)| nexts.len() > 2)
            .map(|(key, _)| key.to_string())
            .collect();
        debug!(
            "found {} transfer stations in {:?}",
            transfer_stations.len(),
            now.elapsed()
        );
        transfer_stations
    }

    /// Step 5 (stops + stations): sort old ids ascending, assign 0-based ids.
    /// Step 6 (stops_array): materialize `StopRecord`s in new-id order.
    fn renumber_stops(
        raw: &RawSchedule,
        station_key_of: &HashMap<&str, &str>,
        is_transfer_station: &HashSet<String>,
    ) -> (HashMap<String, u32>, Box<[StopRecord]>, HashMap<String, u32>, u32) {
        debug!("renumbering stops and stations...");
        let now = Instant::now();

        let mut station_keys: Vec<&str> = station_key_of.values().copied().collect();
        station_keys.sort_unstable();
        station_keys.dedup();
        let station_id_map: HashMap<String, u32> = station_keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.to_string(), i as u32))
            .collect();

        let mut stops: Vec<_> = raw
            .stops
            .iter()
            .filter(|s| !s.stop_id.starts_with("stoparea"))
            .collect();
        stops.sort_unstable_by(|a, b| a.stop_id.cmp(&b.stop_id));

        let stop_id_map: HashMap<String, u32> = stops
            .iter()
            .enumerate()
            .map(|(i, s)| (s.stop_id.clone(), i as u32))
            .collect();

        let records: Box<[StopRecord]> = stops
            .iter()
            .map(|s| {
                let key = station_key_of.get(s.stop_id.as_str()).copied().unwrap_or(&s.stop_id);
                let station_id = station_id_map[key];
                StopRecord {
                    name: s.stop_name.clone().into_boxed_str(),
                    station_id,
                    platform_code: s.platform_code.clone().unwrap_or_default().into_boxed_str(),
                    is_transfer: is_transfer_station.contains(key),
                }
            })
            .collect();

        debug!(
            "renumbered {} stops into {} stations in {:?}",
            records.len(),
            station_id_map.len(),
            now.elapsed()
        );
        (stop_id_map, records, station_id_map, station_keys.len() as u32)
    }

    /// Step 5 (trips): sort old trip ids ascending, assign ids starting at 1
    /// (id `0` is reserved for the transfer sentinel, see [`crate::store`]).
    fn renumber_trips(raw: &RawSchedule) -> HashMap<String, u32> {
        let mut trip_ids: Vec<&str> = raw.trips.iter().map(|t| t.trip_id.as_str()).collect();
        trip_ids.sort_unstable();
        trip_ids
            .into_iter()
            .enumerate()
            .map(|(i, id)| (id.to_string(), i as u32 + 1))
            .collect()
    }

    /// Step 3: join trips with calendar-dates on `service_id`; a trip running
    /// on N days yields N `(trip_id, date)` rows, which is expected.
    fn join_service_dates<'a>(raw: &'a RawSchedule) -> HashMap<&'a str, Vec<&'a str>> {
        let mut dates_by_service: HashMap<&str, Vec<&str>> = HashMap::new();
        for row in &raw.calendar_dates {
            dates_by_service
                .entry(row.service_id.as_str())
                .or_default()
                .push(row.date.as_str());
        }
        dates_by_service
    }

    fn build_trips_on_date(
        raw: &RawSchedule,
        trip_id_map: &HashMap<String, u32>,
        service_dates: &HashMap<&str, Vec<&str>>,
    ) -> HashMap<Box<str>, Box<[u32]>> {
        let mut by_date: HashMap<Box<str>, Vec<u32>> = HashMap::new();
        for trip in &raw.trips {
            let Some(&new_id) = trip_id_map.get(trip.trip_id.as_str()) else {
                continue;
            };
            if let Some(dates) = service_dates.get(trip.service_id.as_str()) {
                for date in dates {
                    by_date.entry((*date).into()).or_default().push(new_id);
                }
            }
        }
        by_date
            .into_iter()
            .map(|(date, mut ids)| {
                ids.sort_unstable();
                (date, ids.into_boxed_slice())
            })
            .collect()
    }

    /// Step 6: station→platforms adjacency as an `(offsets, data)` CSR pair,
    /// with platforms within a station ordered by ascending new stop_id.
    fn build_station_platforms(
        stops: &[StopRecord],
        num_stations: u32,
    ) -> (Box<[(u32, u32)]>, Box<[u32]>) {
        let mut by_station: Vec<Vec<u32>> = vec![Vec::new(); num_stations as usize];
        for (stop_id, stop) in stops.iter().enumerate() {
            by_station[stop.station_id as usize].push(stop_id as u32);
        }
        let mut offsets = Vec::with_capacity(by_station.len());
        let mut data = Vec::with_capacity(stops.len());
        for platforms in &by_station {
            offsets.push((data.len() as u32, platforms.len() as u32));
            data.extend_from_slice(platforms);
        }
        (offsets.into_boxed_slice(), data.into_boxed_slice())
    }

    fn build_short_name_index(
        raw: &RawSchedule,
        trip_id_map: &HashMap<String, u32>,
    ) -> HashMap<u32, Box<[u32]>> {
        let mut by_short_name: HashMap<u32, Vec<u32>> = HashMap::new();
        for trip in &raw.trips {
            if let Some(&new_id) = trip_id_map.get(trip.trip_id.as_str()) {
                by_short_name
                    .entry(trip.trip_short_name)
                    .or_default()
                    .push(new_id);
            }
        }
        by_short_name
            .into_iter()
            .map(|(sn, mut ids)| {
                ids.sort_unstable();
                (sn, ids.into_boxed_slice())
            })
            .collect()
    }

    fn build_name_index(stops: &[StopRecord]) -> HashMap<Box<str>, Box<[u32]>> {
        let mut by_name: HashMap<Box<str>, Vec<u32>> = HashMap::new();
        for (stop_id, stop) in stops.iter().enumerate() {
            by_name.entry(stop.name.clone()).or_default().push(stop_id as u32);
        }
        by_name
            .into_iter()
            .map(|(name, ids)| (name, ids.into_boxed_slice()))
            .collect()
    }

    /// Step 7 (CSR): trip_id → contiguous, `stop_sequence`-ordered slice of rows.
    fn build_trip_stop_index(
        parsed: &[ParsedStopTime],
        stop_id_map: &HashMap<String, u32>,
        trip_id_map: &HashMap<String, u32>,
    ) -> (Box<[(u32, u32)]>, Box<[StopTimeRow]>) {
        debug!("building per-trip stop index...");
        let now = Instant::now();

        let mut by_trip: HashMap<u32, Vec<StopTimeRow>> = HashMap::new();
        for row in parsed {
            let (Some(&trip_id), Some(&stop_id)) = (
                trip_id_map.get(row.trip_id.as_str()),
                stop_id_map.get(row.stop_id.as_str()),
            ) else {
                continue;
            };
            by_trip.entry(trip_id).or_default().push(StopTimeRow {
                stop_id,
                stop_sequence: row.stop_sequence,
                arrival_time_s: row.arrival_time_s,
                departure_time_s: row.departure_time_s,
            });
        }
        by_trip
            .par_iter_mut()
            .for_each(|(_, rows)| rows.sort_unstable_by_key(|r| r.stop_sequence));

        let num_trips = trip_id_map.values().copied().max().unwrap_or(0);
        let mut offsets = vec![(0u32, 0u32); num_trips as usize + 1];
        let mut data = Vec::new();
        let mut trip_ids: Vec<u32> = by_trip.keys().copied().collect();
        trip_ids.sort_unstable();
        for trip_id in trip_ids {
            let rows = &by_trip[&trip_id];
            offsets[trip_id as usize] = (data.len() as u32, rows.len() as u32);
            data.extend_from_slice(rows);
        }

        debug!(
            "indexed {} trips / {} stop_times in {:?}",
            num_trips,
            data.len(),
            now.elapsed()
        );
        (offsets.into_boxed_slice(), data.into_boxed_slice())
    }

    /// Step 7 (departure index): group stop-time rows by stop_id, sorted
    /// ascending by `departure_time_s`, caching the hop-on row's position
    /// within its trip so Phase A never re-scans for it.
    fn build_departure_index(
        trip_stop_offsets: &[(u32, u32)],
        trip_stops: &[StopTimeRow],
        num_stops: usize,
    ) -> (Box<[(u32, u32)]>, Box<[Departure]>) {
        debug!("building per-stop departure index...");
        let now = Instant::now();

        let mut by_stop: HashMap<u32, Vec<Departure>> = HashMap::new();
        for (trip_id, &(start, len)) in trip_stop_offsets.iter().enumerate() {
            if trip_id == 0 {
                continue; // padding slot, trip ids start at 1
            }
            let slice = &trip_stops[start as usize..(start + len) as usize];
            for (hop_on_idx, row) in slice.iter().enumerate() {
                by_stop
                    .entry(row.stop_id)
                    .or_default()
                    .push(Departure {
                        trip_id: trip_id as u32,
                        departure_time_s: row.departure_time_s,
                        hop_on_idx: hop_on_idx as u32,
                    });
            }
        }
        by_stop
            .par_iter_mut()
            .for_each(|(_, deps)| deps.sort_unstable_by_key(|d| d.departure_time_s));

        let mut offsets = vec![(0u32, 0u32); num_stops];
        let mut data = Vec::new();
        for stop_id in 0..num_stops as u32 {
            if let Some(deps) = by_stop.get(&stop_id) {
                offsets[stop_id as usize] = (data.len() as u32, deps.len() as u32);
                data.extend_from_slice(deps);
            }
        }

        debug!("indexed {} departures in {:?}", data.len(), now.elapsed());
        (offsets.into_boxed_slice(), data.into_boxed_slice())
    }
}
