//! The in-place mutable CNF store the search driver operates on.
use dpll_formula::{cnf::CnfFormula, lit::Lit};

use crate::pure_index::PureIndex;

/// Outcome of a CNF mutation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActionResult {
    /// The mutation succeeded and at least one clause remains.
    Ok,
    /// A clause was reduced to zero literals; the current branch is UNSAT.
    EmptyClauseCreated,
    /// No clauses remain; the current branch is SAT.
    CnfDevastated,
}

/// Result of [`Cnf::is_pure`]: whether a variable occurs with only one polarity, and which.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PureStatus {
    pub pure: bool,
    pub negative: bool,
}

/// A CNF formula laid out as a single flat buffer of literals, clauses separated by the empty
/// literal.
///
/// Clauses are deleted and shrunk in place. [`propagate_unit`](Cnf::propagate_unit) is the only
/// mutator that doesn't rescan the buffer to find further unit clauses: it incrementally records
/// newly-exposed units as it compacts. Any other mutator invalidates that cache and marks the CNF
/// dirty so the next [`find_singular_clause`](Cnf::find_singular_clause) call rescans.
#[derive(Clone)]
pub struct Cnf {
    data: Vec<Lit>,
    variables_count: u32,
    clauses_count: u32,

    /// Queue (used as a stack) of literals known to head a unit clause.
    pending_units: Vec<Lit>,
    /// Whether `pending_units` might be missing unit clauses that exist in the buffer.
    dirty: bool,

    pure_index: PureIndex,
}

impl Cnf {
    /// Builds the in-place engine representation from a parsed formula.
    pub fn from_formula(formula: &CnfFormula) -> Cnf {
        let mut data = Vec::new();
        for clause in formula.iter() {
            data.extend_from_slice(clause);
            data.push(Lit::EMPTY);
        }

        let variables_count = formula.var_count() as u32;

        Cnf {
            data,
            variables_count,
            clauses_count: formula.len() as u32,
            pending_units: Vec::new(),
            dirty: true,
            pure_index: PureIndex::new(variables_count),
        }
    }

    /// Current number of clauses.
    pub fn clauses_count(&self) -> u32 {
        self.clauses_count
    }

    /// The declared variable count. Never decreases.
    pub fn variables_count(&self) -> u32 {
        self.variables_count
    }

    /// The first literal of the first clause, or the empty literal if there are no clauses.
    pub fn first_literal(&self) -> Lit {
        self.data.first().copied().unwrap_or(Lit::EMPTY)
    }

    /// Whether the buffer contains a clause with zero literals.
    ///
    /// Only meaningful on a freshly constructed CNF; simplification never reintroduces an empty
    /// clause without reporting [`ActionResult::EmptyClauseCreated`] first.
    pub fn has_empty_clause(&self) -> bool {
        let mut start_of_clause = true;
        for &lit in &self.data {
            if start_of_clause && lit.is_empty() {
                return true;
            }
            start_of_clause = lit.is_empty();
        }
        false
    }

    /// Counts positive and negative occurrences of `|literal|` across the whole buffer.
    pub fn is_pure(&self, literal: Lit) -> PureStatus {
        let mut found = false;
        let mut found_negation = false;

        for &lit in &self.data {
            if lit == literal {
                found = true;
            } else if lit == -literal {
                found_negation = true;
            }
        }

        PureStatus {
            pure: found != found_negation,
            negative: found_negation,
        }
    }

    /// Returns the literal of a unit clause, preferring the pending-unit hint queue, or the empty
    /// literal if none remain. Rescans the buffer only when dirty and the queue is empty.
    pub fn find_singular_clause(&mut self) -> Lit {
        if let Some(hint) = self.pending_units.pop() {
            return hint;
        }

        if !self.dirty {
            return Lit::EMPTY;
        }

        let mut start_of_clause = true;
        for i in 0..self.data.len() {
            let lit = self.data[i];
            if start_of_clause
                && !lit.is_empty()
                && self.data.get(i + 1).copied() == Some(Lit::EMPTY)
            {
                self.pending_units.push(lit);
            }
            start_of_clause = lit.is_empty();
        }
        self.dirty = false;

        self.pending_units.pop().unwrap_or(Lit::EMPTY)
    }

    /// Scans variables `1..=variables_count` for one whose occurrences are one-sided.
    pub fn find_pure_literal(&mut self) -> Lit {
        self.rebuild_pure_index();

        if self.pure_index.pure_count() == 0 {
            return Lit::EMPTY;
        }

        for var in 1..=self.variables_count {
            if self.pure_index.pure(var) {
                let lit = Lit::from_dimacs(var as isize);
                return if self.pure_index.is_negative_only(var) {
                    -lit
                } else {
                    lit
                };
            }
        }

        Lit::EMPTY
    }

    fn rebuild_pure_index(&mut self) {
        self.pure_index.reset();
        for &lit in &self.data {
            if !lit.is_empty() {
                self.pure_index.set_usage(lit);
            }
        }
    }

    /// Deletes every clause containing `literal`, and every occurrence of `-literal` from the
    /// rest, using a single two-cursor pass over the buffer.
    pub fn propagate_unit(&mut self, literal: Lit) -> ActionResult {
        debug_assert!(!literal.is_empty(), "cannot propagate the empty literal");

        let negation = -literal;
        let len = self.data.len();

        let mut new_idx = 0usize;
        let mut old_idx = 0usize;
        let mut old_clause_size = 0usize;
        let mut new_clause_size = 0usize;
        let mut clause_removed = false;

        while old_idx < len {
            old_clause_size += 1;
            let current = self.data[old_idx];
            let mut clause_end = current.is_empty();

            if current == negation {
                // Drop the contra-literal, nothing copied.
            } else if current == literal {
                // Rewind the write cursor past whatever this clause already wrote.
                while new_idx > 0 && !self.data[new_idx - 1].is_empty() {
                    new_idx -= 1;
                }
                // Fast-forward the read cursor to this clause's terminator.
                while !self.data[old_idx].is_empty() {
                    old_idx += 1;
                }
                clause_removed = true;
                self.clauses_count -= 1;
                clause_end = true;
            } else {
                self.data[new_idx] = current;
                new_idx += 1;
                new_clause_size += 1;
            }

            if clause_end {
                if clause_removed {
                    clause_removed = false;
                } else {
                    // The terminator itself was just counted as a literal above; discount it.
                    new_clause_size -= 1;
                    old_clause_size -= 1;

                    if new_clause_size == 0 {
                        return ActionResult::EmptyClauseCreated;
                    } else if new_clause_size == 1 && old_clause_size == 2 {
                        self.pending_units.push(self.data[new_idx - 2]);
                    }
                }
                new_clause_size = 0;
                old_clause_size = 0;
            }

            old_idx += 1;
        }

        self.data.truncate(new_idx);

        if new_idx == 0 {
            ActionResult::CnfDevastated
        } else {
            ActionResult::Ok
        }
    }

    /// Repeatedly propagates unit clauses until none remain.
    pub fn remove_singular_clauses(&mut self) -> ActionResult {
        loop {
            let literal = self.find_singular_clause();
            if literal.is_empty() {
                return ActionResult::Ok;
            }
            match self.propagate_unit(literal) {
                ActionResult::Ok => continue,
                other => return other,
            }
        }
    }

    /// Repeatedly propagates pure literals until none remain.
    ///
    /// A pure literal can't make a clause shrink to zero length (nothing contains its negation),
    /// so only [`ActionResult::CnfDevastated`] or [`ActionResult::Ok`] can normally result, but
    /// callers should still check.
    pub fn remove_pure_literals(&mut self) -> ActionResult {
        loop {
            let literal = self.find_pure_literal();
            if literal.is_empty() {
                return ActionResult::Ok;
            }
            match self.propagate_unit(literal) {
                ActionResult::Ok => continue,
                other => return other,
            }
        }
    }

    /// Deletes every clause containing both some literal and its negation. A pre-search pass
    /// only; not incremental and not part of the unit-propagation cascade.
    pub fn remove_trivial_clauses(&mut self) -> ActionResult {
        let mut new_data = Vec::with_capacity(self.data.len());
        let mut new_clauses_count = 0u32;
        let mut clause_start = 0usize;

        for i in 0..self.data.len() {
            if self.data[i].is_empty() {
                let clause = &self.data[clause_start..i];
                let trivial = clause
                    .iter()
                    .any(|&a| clause.iter().any(|&b| a.complementary(b)));

                if !trivial {
                    new_data.extend_from_slice(clause);
                    new_data.push(Lit::EMPTY);
                    new_clauses_count += 1;
                }
                clause_start = i + 1;
            }
        }

        self.data = new_data;
        self.clauses_count = new_clauses_count;
        self.pending_units.clear();
        self.dirty = true;

        if self.data.is_empty() {
            ActionResult::CnfDevastated
        } else {
            ActionResult::Ok
        }
    }

    /// Clauses as slices, for inspection and tests.
    pub fn iter(&self) -> impl Iterator<Item = &[Lit]> {
        let data = &self.data;
        let mut start = 0;
        std::iter::from_fn(move || {
            if start >= data.len() {
                return None;
            }
            let end = start + data[start..].iter().position(|l| l.is_empty())?;
            let clause = &data[start..end];
            start = end + 1;
            Some(clause)
        })
    }
}

impl PartialEq for Cnf {
    fn eq(&self, other: &Cnf) -> bool {
        self.variables_count == other.variables_count
            && self.clauses_count == other.clauses_count
            && self.data == other.data
    }
}

impl Eq for Cnf {}

impl std::fmt::Debug for Cnf {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Cnf")
            .field("variables_count", &self.variables_count)
            .field("clauses_count", &self.clauses_count)
            .field("clauses", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpll_formula::cnf_formula;

    fn cnf_from(formula: CnfFormula) -> Cnf {
        Cnf::from_formula(&formula)
    }

    #[test]
    fn propagate_unit_deletes_containing_clauses_and_trims_negation() {
        let formula = cnf_formula![
            1, 2;
            -1, 3;
            2, 3;
        ];
        let mut cnf = cnf_from(formula);

        let result = cnf.propagate_unit(Lit::from_dimacs(1));
        assert_eq!(result, ActionResult::Ok);

        let clauses: Vec<&[Lit]> = cnf.iter().collect();
        assert_eq!(clauses, vec![&[Lit::from_dimacs(3)][..], &[Lit::from_dimacs(2), Lit::from_dimacs(3)][..]]);
        assert_eq!(cnf.clauses_count(), 2);
    }

    #[test]
    fn propagate_unit_detects_empty_clause() {
        let formula = cnf_formula![
            1;
            -1;
        ];
        let mut cnf = cnf_from(formula);
        assert_eq!(cnf.propagate_unit(Lit::from_dimacs(1)), ActionResult::EmptyClauseCreated);
    }

    #[test]
    fn propagate_unit_detects_devastation() {
        let formula = cnf_formula![
            1;
            1, 2;
        ];
        let mut cnf = cnf_from(formula);
        assert_eq!(cnf.propagate_unit(Lit::from_dimacs(1)), ActionResult::CnfDevastated);
        assert_eq!(cnf.clauses_count(), 0);
    }

    #[test]
    fn propagate_unit_exposes_new_unit_hint() {
        let formula = cnf_formula![
            1, 2;
            -1, 3;
        ];
        let mut cnf = cnf_from(formula);
        cnf.propagate_unit(Lit::from_dimacs(1));
        // `-1, 3` loses its `-1` literal and becomes the unit clause `3`.
        assert_eq!(cnf.find_singular_clause(), Lit::from_dimacs(3));
    }

    #[test]
    fn remove_singular_clauses_leaves_no_unit() {
        let formula = cnf_formula![
            1;
            -1, 2;
            -2, 3;
        ];
        let mut cnf = cnf_from(formula);
        let result = cnf.remove_singular_clauses();
        assert_ne!(result, ActionResult::EmptyClauseCreated);
        for clause in cnf.iter() {
            assert_ne!(clause.len(), 1);
        }
    }

    #[test]
    fn remove_pure_literals_leaves_both_polarities_or_nothing() {
        let formula = cnf_formula![
            1, 2;
            1, -2;
            3, 2;
        ];
        let mut cnf = cnf_from(formula);
        let result = cnf.remove_pure_literals();
        assert_ne!(result, ActionResult::EmptyClauseCreated);

        for clause in cnf.iter() {
            for &lit in clause {
                let status = cnf.is_pure(lit);
                assert!(!status.pure, "variable {:?} should not be pure", lit.var());
            }
        }
    }

    #[test]
    fn remove_trivial_clauses_drops_tautologies() {
        let formula = cnf_formula![
            1, -1, 2;
            -2;
        ];
        let mut cnf = cnf_from(formula);
        let result = cnf.remove_trivial_clauses();
        assert_eq!(result, ActionResult::Ok);
        assert_eq!(cnf.clauses_count(), 1);
    }

    #[test]
    fn remove_trivial_clauses_can_devastate() {
        let formula = cnf_formula![
            1, -1;
        ];
        let mut cnf = cnf_from(formula);
        assert_eq!(cnf.remove_trivial_clauses(), ActionResult::CnfDevastated);
    }

    #[test]
    fn clone_is_a_deep_independent_copy() {
        let formula = cnf_formula![
            1, 2;
            -1, 3;
        ];
        let cnf = cnf_from(formula);
        let mut copy = cnf.clone();
        assert_eq!(cnf, copy);

        copy.propagate_unit(Lit::from_dimacs(1));
        assert_ne!(cnf, copy);
        assert_eq!(cnf.clauses_count(), 2);
    }

    #[test]
    fn has_empty_clause_detects_zero_length_clause() {
        let formula = cnf_formula![
            ;
            1, 2;
        ];
        let cnf = cnf_from(formula);
        assert!(cnf.has_empty_clause());
    }
}
