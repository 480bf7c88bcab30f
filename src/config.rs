/// Tunable constants shared by the Query Planner and Round Engine.
///
/// Bundled behind one value instead of scattered literals so a host can tune
/// boarding/transfer behavior without touching search code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Flat cost, in seconds, of a same-station platform transfer.
    pub transfer_cost_s: u32,
    /// Forward window, in seconds, searched for a boardable trip at a single stop.
    pub boarding_window_s: u32,
    /// Forward window, in seconds, bounding the first round's departure search.
    pub service_window_s: u32,
    /// Round cap; a round is "board at most one more trip."
    pub max_rounds: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transfer_cost_s: 180,
            boarding_window_s: 3600,
            service_window_s: 21_600,
            max_rounds: 8,
        }
    }
}
