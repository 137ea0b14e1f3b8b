//! A DPLL based SAT solver.
//!
//! [`Cnf`] is the in-place mutable formula representation the search operates on; [`Solver`]
//! drives the search itself, configured by a [`SolverConfig`] and a [`Rules`] set. Formulas are
//! read with the `dpll-dimacs` crate into a [`dpll_formula::cnf::CnfFormula`], which [`Solver`]
//! converts into a [`Cnf`] internally.

pub mod cnf;
pub mod config;
pub mod pure_index;
pub mod rules;
pub mod search;
pub mod status;

pub use cnf::{ActionResult, Cnf};
pub use config::SolverConfig;
pub use rules::Rules;
pub use search::Solver;
pub use status::Status;
