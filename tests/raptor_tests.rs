//! End-to-end scenarios over small, literal, hand-built schedules — no
//! loader involved, the raw rows are constructed directly as the contract
//! in `raw` describes them.

use std::collections::HashSet;

use tramline::{
    config::EngineConfig,
    error::OptimizerError,
    optimizer::Optimizer,
    planner,
    raw::{RawCalendarDate, RawSchedule, RawStop, RawStopTime, RawTrip},
    reconstruct, round,
    round::QueryState,
    store::{Label, SELF, UNREACHED},
};

const DATE: &str = "20260101";

fn stop(id: &str, name: &str, parent: Option<&str>, code: Option<&str>) -> RawStop {
    RawStop {
        stop_id: id.into(),
        stop_name: name.into(),
        parent_station: parent.map(String::from),
        platform_code: code.map(String::from),
    }
}

fn trip(id: &str, short_name: u32) -> RawTrip {
    RawTrip {
        trip_id: id.into(),
        service_id: "SVC".into(),
        trip_short_name: short_name,
        shape_id: None,
    }
}

fn stop_time(trip_id: &str, stop_id: &str, seq: u16, arrival: &str, departure: &str) -> RawStopTime {
    RawStopTime {
        trip_id: trip_id.into(),
        stop_id: stop_id.into(),
        stop_sequence: seq,
        arrival_time: arrival.into(),
        departure_time: departure.into(),
    }
}

/// Scenario A / D fixture: a single direct trip A -> B -> C.
fn scenario_a() -> RawSchedule {
    RawSchedule {
        stops: vec![
            stop("A1", "A", None, None),
            stop("B1", "B", None, None),
            stop("C1", "C", None, None),
        ],
        trips: vec![trip("T1", 1)],
        calendar_dates: vec![RawCalendarDate {
            service_id: "SVC".into(),
            date: DATE.into(),
        }],
        stop_times: vec![
            stop_time("T1", "A1", 1, "08:00:00", "08:00:00"),
            stop_time("T1", "B1", 2, "08:10:00", "08:10:00"),
            stop_time("T1", "C1", 3, "08:25:00", "08:25:00"),
        ],
    }
}

/// Scenario B / C fixture: adds transfer station S (platforms B1, B2) and a
/// second trip T2 reachable only after transferring. T3 is a third trip
/// through B1 solely to give station S a third distinct next-stop, which is
/// what this crate's transfer-station heuristic requires to flag S as a
/// transfer station (see Optimizer step 4).
fn scenario_b() -> RawSchedule {
    RawSchedule {
        stops: vec![
            stop("A1", "A", None, None),
            stop("B1", "B", Some("S"), Some("1")),
            stop("B2", "B", Some("S"), Some("2")),
            stop("C1", "C", None, None),
            stop("D1", "D", None, None),
            stop("E1", "E", None, None),
        ],
        trips: vec![trip("T1", 1), trip("T2", 2), trip("T3", 3)],
        calendar_dates: vec![RawCalendarDate {
            service_id: "SVC".into(),
            date: DATE.into(),
        }],
        stop_times: vec![
            stop_time("T1", "A1", 1, "08:00:00", "08:00:00"),
            stop_time("T1", "B1", 2, "08:10:00", "08:10:00"),
            stop_time("T1", "C1", 3, "08:25:00", "08:25:00"),
            stop_time("T2", "B2", 1, "08:20:00", "08:20:00"),
            stop_time("T2", "D1", 2, "08:35:00", "08:35:00"),
            stop_time("T3", "B1", 1, "07:00:00", "07:00:00"),
            stop_time("T3", "E1", 2, "07:10:00", "07:10:00"),
        ],
    }
}

/// Scenario F fixture: same station S as scenario B, but without T3 — only
/// two distinct next-stops, so S does not cross the transfer-station threshold.
fn scenario_f() -> RawSchedule {
    let mut raw = scenario_b();
    raw.trips.retain(|t| t.trip_id != "T3");
    raw.stop_times.retain(|st| st.trip_id != "T3");
    raw.stops.retain(|s| s.stop_id != "E1");
    raw
}

#[test]
fn scenario_a_single_direct_trip() {
    let store = Optimizer::build(&scenario_a()).unwrap();
    let config = EngineConfig::default();
    let query = planner::plan(&store, "A", "C", DATE, "08:00", false, &[]).unwrap();
    let mut state = QueryState::new(&store);
    let result = round::run(&store, &config, &query, &mut state, Some(1));

    let c1 = store.stops_by_name("C")[0];
    assert_eq!(result.dest_stop_id, Some(c1));
    assert_eq!(
        result.final_labels[c1 as usize],
        Label {
            travel_time_s: 1500,
            via_trip: 1,
            via_stop: store.stops_by_name("A")[0],
        }
    );
}

#[test]
fn scenario_b_one_transfer() {
    let store = Optimizer::build(&scenario_b()).unwrap();
    let config = EngineConfig::default();
    let query = planner::plan(&store, "A", "D", DATE, "08:00", false, &[]).unwrap();
    let mut state = QueryState::new(&store);
    let result = round::run(&store, &config, &query, &mut state, Some(2));

    let b1 = store.stops_by_name("B").iter().copied().find(|&s| store.stop_info(s).platform_code.as_ref() == "1").unwrap();
    let b2 = store.stops_by_name("B").iter().copied().find(|&s| store.stop_info(s).platform_code.as_ref() == "2").unwrap();
    let d1 = store.stops_by_name("D")[0];

    assert!(store.stop_info(b1).is_transfer);
    assert_eq!(
        result.final_labels[b2 as usize],
        Label {
            travel_time_s: 780,
            via_trip: 0,
            via_stop: b1,
        }
    );
    assert_eq!(result.dest_stop_id, Some(d1));
    assert_eq!(result.final_labels[d1 as usize].travel_time_s, 2100);
    assert_eq!(result.final_labels[d1 as usize].via_stop, b2);
    assert_ne!(result.final_labels[d1 as usize].via_trip, 0);
}

#[test]
fn scenario_c_unreached_under_k1() {
    let store = Optimizer::build(&scenario_b()).unwrap();
    let config = EngineConfig::default();
    let query = planner::plan(&store, "A", "D", DATE, "08:00", false, &[]).unwrap();
    let mut state = QueryState::new(&store);
    let result = round::run(&store, &config, &query, &mut state, Some(1));

    let d1 = store.stops_by_name("D")[0];
    assert_eq!(result.dest_stop_id, None);
    assert_eq!(result.final_labels[d1 as usize].travel_time_s, UNREACHED);
}

#[test]
fn round_one_sees_departures_beyond_the_boarding_window_within_the_service_window() {
    // T1 departs three hours after the query departure: past boarding_window_s
    // (1h) but inside service_window_s (6h). Round 1 must still find it.
    let raw = RawSchedule {
        stops: vec![stop("A1", "A", None, None), stop("B1", "B", None, None)],
        trips: vec![trip("T1", 1)],
        calendar_dates: vec![RawCalendarDate {
            service_id: "SVC".into(),
            date: DATE.into(),
        }],
        stop_times: vec![
            stop_time("T1", "A1", 1, "11:00:00", "11:00:00"),
            stop_time("T1", "B1", 2, "11:15:00", "11:15:00"),
        ],
    };
    let store = Optimizer::build(&raw).unwrap();
    let config = EngineConfig::default();
    let query = planner::plan(&store, "A", "B", DATE, "08:00", false, &[]).unwrap();
    let mut state = QueryState::new(&store);
    let result = round::run(&store, &config, &query, &mut state, Some(1));

    let b1 = store.stops_by_name("B")[0];
    assert_eq!(result.dest_stop_id, Some(b1));
    assert_eq!(result.final_labels[b1 as usize].travel_time_s, 3 * 3600 + 900);
}

#[test]
fn scenario_d_disruption_blocks_the_only_trip() {
    let store = Optimizer::build(&scenario_a()).unwrap();
    let config = EngineConfig::default();
    let query = planner::plan(&store, "A", "C", DATE, "08:00", true, &[1]).unwrap();
    let mut state = QueryState::new(&store);
    let result = round::run(&store, &config, &query, &mut state, Some(1));

    let c1 = store.stops_by_name("C")[0];
    assert_eq!(result.dest_stop_id, None);
    assert_eq!(result.final_labels[c1 as usize].travel_time_s, UNREACHED);
}

#[test]
fn scenario_e_series_disruption_excludes_members_not_root() {
    let raw = RawSchedule {
        stops: vec![stop("A1", "A", None, None), stop("B1", "B", None, None)],
        trips: vec![trip("T6600", 6600), trip("T6650", 6650)],
        calendar_dates: vec![RawCalendarDate {
            service_id: "SVC".into(),
            date: DATE.into(),
        }],
        stop_times: vec![
            stop_time("T6600", "A1", 1, "08:00:00", "08:00:00"),
            stop_time("T6600", "B1", 2, "08:10:00", "08:10:00"),
            stop_time("T6650", "A1", 1, "09:00:00", "09:00:00"),
            stop_time("T6650", "B1", 2, "09:10:00", "09:10:00"),
        ],
    };
    let store = Optimizer::build(&raw).unwrap();
    let expanded = tramline::disruption::expand_series(&[6600]);
    let excluded = tramline::disruption::resolve(&store, &expanded);

    let trip_6600 = store.trip_ids_for_short_names(&HashSet::from([6600]));
    let trip_6650 = store.trip_ids_for_short_names(&HashSet::from([6650]));
    assert!(trip_6650.is_subset(&excluded));
    assert!(excluded.is_disjoint(&trip_6600));
}

#[test]
fn scenario_f_non_transfer_station_blocks_footpath() {
    let store = Optimizer::build(&scenario_f()).unwrap();
    let config = EngineConfig::default();
    let query = planner::plan(&store, "A", "D", DATE, "08:00", false, &[]).unwrap();
    let mut state = QueryState::new(&store);
    let result = round::run(&store, &config, &query, &mut state, Some(2));

    let b1 = store.stops_by_name("B").iter().copied().find(|&s| store.stop_info(s).platform_code.as_ref() == "1").unwrap();
    let b2 = store.stops_by_name("B").iter().copied().find(|&s| store.stop_info(s).platform_code.as_ref() == "2").unwrap();

    assert!(!store.stop_info(b1).is_transfer);
    assert_eq!(result.final_labels[b2 as usize].travel_time_s, UNREACHED);
    assert!(result.final_labels[b1 as usize].is_reached());
}

#[test]
fn duplicate_stop_id_aborts_the_build() {
    let raw = RawSchedule {
        stops: vec![
            stop("A1", "A", None, None),
            stop("A1", "A duplicate", None, None),
        ],
        trips: vec![],
        calendar_dates: vec![],
        stop_times: vec![],
    };
    let err = Optimizer::build(&raw).unwrap_err();
    assert!(matches!(err, OptimizerError::DuplicateId(id) if id == "A1"));
}

#[test]
fn invariant_origin_label_and_monotonicity() {
    let store = Optimizer::build(&scenario_b()).unwrap();
    let config = EngineConfig::default();
    let query = planner::plan(&store, "A", "D", DATE, "08:00", false, &[]).unwrap();
    let mut state = QueryState::new(&store);
    let result = round::run(&store, &config, &query, &mut state, Some(2));

    let a1 = store.stops_by_name("A")[0];
    let round0 = &result.round_snapshots[0];
    assert_eq!(round0[a1 as usize], Label::origin());
    for (s, label) in round0.iter().enumerate() {
        if s as u32 != a1 {
            assert_eq!(*label, Label::UNREACHED);
        }
    }

    for stop_id in 0..store.stop_count() {
        for window in result.round_snapshots.windows(2) {
            assert!(window[1][stop_id].travel_time_s <= window[0][stop_id].travel_time_s);
        }
    }
}

#[test]
fn invariant_station_adjacency_covers_every_stop() {
    // scenario_b has 6 platforms (A1, B1, B2, C1, D1, E1) grouped into 5
    // stations: B1 and B2 share station S, everything else is a singleton.
    let store = Optimizer::build(&scenario_b()).unwrap();
    let mut covered: Vec<u32> = (0..5u32)
        .flat_map(|station_id| store.station_platforms(station_id).to_vec())
        .collect();
    covered.sort_unstable();
    covered.dedup();
    assert_eq!(covered, (0..store.stop_count() as u32).collect::<Vec<_>>());
}

#[test]
fn invariant_k_bounded_journey_has_at_most_k_boarding_legs() {
    let store = Optimizer::build(&scenario_b()).unwrap();
    let config = EngineConfig::default();
    let query = planner::plan(&store, "A", "D", DATE, "08:00", false, &[]).unwrap();
    let mut state = QueryState::new(&store);
    let result = round::run(&store, &config, &query, &mut state, Some(2));

    let legs = reconstruct::reconstruct(&result.final_labels, result.dest_stop_id);
    let boardings = legs.iter().filter(|l| l.via_trip_or_0 != 0).count();
    assert!(boardings <= 2);
    assert_eq!(boardings, 2);
    assert_ne!(legs[0].from_stop, SELF);
}
