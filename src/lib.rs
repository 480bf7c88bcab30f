//! Earliest-arrival public-transit journey planning over a static schedule:
//! a dense [`store::ScheduleStore`] built once by [`optimizer::Optimizer`],
//! searched by a RAPTOR-style [`round`] engine bounded to K rounds, with
//! journeys reconstructed by [`reconstruct`].

pub mod config;
pub mod disruption;
pub mod error;
pub mod optimizer;
pub mod planner;
pub mod raw;
pub mod reconstruct;
pub mod round;
pub mod shared;
pub mod store;

use config::EngineConfig;
use error::PlannerError;
use reconstruct::Leg;
use round::QueryState;
use store::{Label, ScheduleStore};

/// The result of a single query: per-round labels, the final labels, and the
/// reached destination platform (if any within the round budget).
pub struct QueryResult {
    /// Always length `max_rounds + 1` (the requested `rounds`, or
    /// `config.max_rounds` if `None`); padded with the final label state if
    /// the search terminated early. Index 0 is the origin-only state.
    pub round_snapshots: Vec<Box<[Label]>>,
    /// `None` when no destination platform was reached within `rounds`.
    pub dest_stop_id: Option<u32>,
    pub final_labels: Box<[Label]>,
}

impl QueryResult {
    /// Reconstructs the journey to `dest_stop_id`, or an empty leg list if
    /// the destination was never reached.
    pub fn journey(&self) -> Vec<Leg> {
        reconstruct::reconstruct(&self.final_labels, self.dest_stop_id)
    }
}

/// Resolves names/date/time, applies any requested disruptions, and runs the
/// Round Engine. Allocates a fresh [`QueryState`]; a caller issuing many
/// queries against the same store should build one [`QueryState`] with
/// [`QueryState::new`] and drive the engine directly via [`round::run`] to
/// reuse it instead.
#[allow(clippy::too_many_arguments)]
pub fn query(
    store: &ScheduleStore,
    config: &EngineConfig,
    origin_name: &str,
    destination_name: &str,
    date: &str,
    departure_time_str: &str,
    rounds: Option<usize>,
    use_disruptions: bool,
    disruption_short_names: &[u32],
) -> Result<QueryResult, PlannerError> {
    let planned = planner::plan(
        store,
        origin_name,
        destination_name,
        date,
        departure_time_str,
        use_disruptions,
        disruption_short_names,
    )?;

    let mut state = QueryState::new(store);
    let result = round::run(store, config, &planned, &mut state, rounds);

    Ok(QueryResult {
        round_snapshots: result.round_snapshots,
        dest_stop_id: result.dest_stop_id,
        final_labels: result.final_labels,
    })
}

/// Convenience re-exports for the common query path.
pub mod prelude {
    pub use crate::{
        QueryResult, config::EngineConfig, error::PlannerError, query, reconstruct::Leg,
        store::{Label, ScheduleStore},
    };
}
