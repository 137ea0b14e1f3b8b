//! The solver's verdict.

/// The outcome of a solve.
///
/// `Unknown` is reserved for uncomputed or interrupted states; a completed solve never returns it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    Unknown,
    Sat,
    Unsat,
}
