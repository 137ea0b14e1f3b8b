//! The simplification rule set.
use bitflags::bitflags;

bitflags! {
    /// Which simplification rules the search driver applies.
    ///
    /// The set is fixed for the lifetime of a single solve. Composing rules (union, intersection)
    /// is just bitwise composition of the flags.
    #[derive(Default)]
    pub struct Rules: u8 {
        /// Drop tautological clauses before the search starts.
        const REMOVE_TRIVIAL = 1 << 0;
        /// Propagate forced literals from unit clauses at every node.
        const REMOVE_SINGULAR = 1 << 1;
        /// Propagate pure literals at every node.
        const REMOVE_PURE = 1 << 2;
        /// Use the recursive driver instead of the explicit-stack iterative one.
        const RECURSIVE_SOLVING = 1 << 3;
        /// Probe a candidate branch literal before committing to it, skipping branches that would
        /// immediately derive the empty clause. Never changes the SAT/UNSAT verdict, only the
        /// complexity counter.
        const LOOKAHEAD = 1 << 4;
    }
}
