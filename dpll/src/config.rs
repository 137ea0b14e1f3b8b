//! Solver configuration.
use crate::rules::Rules;

/// Configurable parameters used during solving.
#[derive(Clone, Copy, Debug)]
pub struct SolverConfig {
    /// Which simplification rules run during the search.
    pub rules: Rules,

    /// Ceiling on the complexity counter. The driver checks this before each node and aborts
    /// with [`Status::Unknown`](crate::status::Status::Unknown) once reached. `None` means
    /// unbounded, the default.
    pub complexity_limit: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            rules: Rules::REMOVE_SINGULAR,
            complexity_limit: None,
        }
    }
}
