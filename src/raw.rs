//! Plain row types for the tables the Optimizer consumes. A loader (out of
//! scope here) is expected to hand these in already parsed from whatever
//! feed format it reads; this module only fixes the shape of the contract.
//!
//! Columns the search never reads (headsigns, shapes, coordinates, zones,
//! fares, agency/route ids) are not represented at all: dropping them here
//! means the Optimizer never has to ignore them downstream.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RawStop {
    pub stop_id: String,
    pub stop_name: String,
    pub parent_station: Option<String>,
    pub platform_code: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RawTrip {
    pub trip_id: String,
    pub service_id: String,
    pub trip_short_name: u32,
    pub shape_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RawCalendarDate {
    pub service_id: String,
    pub date: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RawStopTime {
    pub trip_id: String,
    pub stop_id: String,
    pub stop_sequence: u16,
    pub arrival_time: String,
    pub departure_time: String,
}

/// The complete set of raw tables the Optimizer needs to build a `ScheduleStore`.
#[derive(Debug, Clone, Default)]
pub struct RawSchedule {
    pub stops: Vec<RawStop>,
    pub trips: Vec<RawTrip>,
    pub calendar_dates: Vec<RawCalendarDate>,
    pub stop_times: Vec<RawStopTime>,
}
