use thiserror::Error;

/// Role a name played in a query that failed to resolve it, for
/// [`PlannerError::UnknownStopArea`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRole {
    Origin,
    Destination,
}

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("malformed time in stop_times row for trip {trip_id}: {raw}")]
    MalformedTime { trip_id: String, raw: String },
    #[error("stop_time row references unknown trip_id {0}")]
    DanglingTripId(String),
    #[error("stop_time row references unknown stop_id {0}")]
    DanglingStopId(String),
    #[error("trip references unknown service_id {0}")]
    DanglingServiceId(String),
    #[error("duplicate stop_id {0} in stops table")]
    DuplicateId(String),
}

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("no stop area named {name:?} ({which:?})")]
    UnknownStopArea { which: StopRole, name: String },
    #[error("departure time {0:?} is not a valid HH:MM[:SS] string")]
    MalformedTime(String),
}
