//! The DPLL search driver: recursive and explicit-stack iterative forms.
use dpll_formula::{cnf::CnfFormula, lit::Lit};
use log::debug;

use crate::cnf::{ActionResult, Cnf};
use crate::config::SolverConfig;
use crate::rules::Rules;
use crate::status::Status;

/// Drives a DPLL search over a CNF under a fixed [`SolverConfig`].
///
/// A `Solver` is single-use per call to [`solve`](Solver::solve) in the sense that its complexity
/// counter accumulates across calls; construct a fresh one per formula if that isn't wanted.
pub struct Solver {
    config: SolverConfig,
    complexity: u64,
}

impl Solver {
    /// Creates a solver with the given configuration.
    pub fn new(config: SolverConfig) -> Solver {
        Solver {
            config,
            complexity: 0,
        }
    }

    /// Number of node visits so far, monotonically increasing.
    pub fn complexity(&self) -> u64 {
        self.complexity
    }

    /// Decides SAT/UNSAT for `formula`.
    pub fn solve(&mut self, formula: &CnfFormula) -> Status {
        let mut cnf = Cnf::from_formula(formula);

        if self.config.rules.contains(Rules::REMOVE_TRIVIAL) {
            match cnf.remove_trivial_clauses() {
                ActionResult::CnfDevastated => return Status::Sat,
                ActionResult::EmptyClauseCreated => return Status::Unsat,
                ActionResult::Ok => {}
            }
        }

        // A zero-clause CNF is vacuously true; an explicit empty clause is immediately false.
        // Neither depends on which rules are enabled.
        if cnf.clauses_count() == 0 {
            return Status::Sat;
        }
        if cnf.has_empty_clause() {
            return Status::Unsat;
        }

        if self.config.rules.contains(Rules::RECURSIVE_SOLVING) {
            self.dpll_recursive(cnf, Lit::EMPTY)
        } else {
            self.dpll_iterative(cnf)
        }
    }

    /// Applies unit propagation (if `propagate` is set) followed by the enabled simplification
    /// rules, in that order. Returns the terminal status if the branch is already decided.
    fn simplify_node(&mut self, cnf: &mut Cnf, propagate: Lit) -> Option<Status> {
        self.complexity += 1;
        debug!(
            "solving cnf of {} clauses, propagating {:?}",
            cnf.clauses_count(),
            propagate
        );

        if let Some(limit) = self.config.complexity_limit {
            if self.complexity >= limit {
                return Some(Status::Unknown);
            }
        }

        let mut result = ActionResult::Ok;

        if !propagate.is_empty() {
            result = cnf.propagate_unit(propagate);
        }

        if result == ActionResult::Ok && self.config.rules.contains(Rules::REMOVE_SINGULAR) {
            result = cnf.remove_singular_clauses();
        }

        if result == ActionResult::Ok && self.config.rules.contains(Rules::REMOVE_PURE) {
            result = cnf.remove_pure_literals();
        }

        match result {
            ActionResult::CnfDevastated => Some(Status::Sat),
            ActionResult::EmptyClauseCreated => Some(Status::Unsat),
            ActionResult::Ok => None,
        }
    }

    /// Whether propagating `literal` would immediately derive the empty clause, without
    /// committing to it. Gated behind [`Rules::LOOKAHEAD`]; when the flag is off this always
    /// returns `false`, matching a driver with no look-ahead at all. Never changes the final
    /// verdict, only how much of the tree gets visited.
    fn is_unsat_propagation(&self, cnf: &Cnf, literal: Lit) -> bool {
        if !self.config.rules.contains(Rules::LOOKAHEAD) {
            return false;
        }
        cnf.clone().propagate_unit(literal) == ActionResult::EmptyClauseCreated
    }

    fn dpll_recursive(&mut self, mut cnf: Cnf, propagate: Lit) -> Status {
        if !propagate.is_empty() && self.is_unsat_propagation(&cnf, propagate) {
            return Status::Unsat;
        }

        if let Some(status) = self.simplify_node(&mut cnf, propagate) {
            return status;
        }

        let first = cnf.first_literal();
        let var = if first.is_negative() { -first } else { first };

        match self.dpll_recursive(cnf.clone(), var) {
            Status::Sat => return Status::Sat,
            Status::Unknown => return Status::Unknown,
            Status::Unsat => {}
        }
        self.dpll_recursive(cnf, -var)
    }

    /// Explicit-stack form of [`dpll_recursive`](Solver::dpll_recursive): keeps parallel arrays of
    /// the literal being assigned and the CNF checkpoint at each decision depth, to bound the
    /// call-stack cost on deep formulas. Must agree with the recursive form on every input.
    fn dpll_iterative(&mut self, initial_cnf: Cnf) -> Status {
        let capacity = initial_cnf.variables_count() as usize + 1;
        let mut propagating: Vec<Lit> = vec![Lit::EMPTY; capacity];
        let mut cnfs: Vec<Cnf> = Vec::with_capacity(capacity);
        let mut depth = 0usize;
        let mut cnf = initial_cnf;

        loop {
            let propagate = propagating[depth];

            let outcome = if !propagate.is_empty() && self.is_unsat_propagation(&cnf, propagate) {
                Some(Status::Unsat)
            } else {
                self.simplify_node(&mut cnf, propagate)
            };

            match outcome {
                Some(Status::Sat) => return Status::Sat,
                Some(Status::Unknown) => return Status::Unknown,
                Some(Status::Unsat) => {
                    while depth > 0 && propagating[depth].is_negative() {
                        propagating[depth] = Lit::EMPTY;
                        depth -= 1;
                    }
                    if depth == 0 {
                        return Status::Unsat;
                    }
                    propagating[depth] = -propagating[depth];
                    cnf = cnfs[depth - 1].clone();
                }
                None => {
                    if cnfs.len() > depth {
                        cnfs[depth] = cnf.clone();
                    } else {
                        cnfs.push(cnf.clone());
                    }
                    depth += 1;

                    let first = cnf.first_literal();
                    propagating[depth] = if first.is_negative() { -first } else { first };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpll_formula::cnf_formula;
    use proptest::prelude::*;

    fn solve_with(rules: Rules, formula: &CnfFormula) -> Status {
        Solver::new(SolverConfig {
            rules,
            complexity_limit: None,
        })
        .solve(formula)
    }

    /// Exhaustive truth-table oracle used as a ground truth for small formulas.
    fn brute_force(formula: &CnfFormula) -> Status {
        let var_count = formula.var_count();
        if var_count > 20 {
            panic!("brute_force oracle is exponential, keep var_count small");
        }
        let clauses: Vec<Vec<Lit>> = formula.iter().map(|c| c.to_vec()).collect();

        for assignment in 0..(1u32 << var_count) {
            let satisfied = clauses.iter().all(|clause| {
                if clause.is_empty() {
                    return false;
                }
                clause.iter().any(|&lit| {
                    let bit = (assignment >> (lit.var() - 1)) & 1 == 1;
                    bit == lit.is_positive()
                })
            });
            if satisfied {
                return Status::Sat;
            }
        }
        Status::Unsat
    }

    // S1: minimal SAT.
    #[test]
    fn scenario_minimal_sat() {
        let formula = cnf_formula![ 1; ];
        assert_eq!(solve_with(Rules::REMOVE_SINGULAR, &formula), Status::Sat);
    }

    // S2: minimal UNSAT by clash.
    #[test]
    fn scenario_minimal_unsat_clash() {
        let formula = cnf_formula![ 1; -1; ];
        assert_eq!(solve_with(Rules::REMOVE_SINGULAR, &formula), Status::Unsat);
    }

    // S3: pure branching.
    #[test]
    fn scenario_pure_branching_sat() {
        let formula = cnf_formula![ 1, 2; -2, 3; -3, 1; ];
        assert_eq!(solve_with(Rules::REMOVE_SINGULAR, &formula), Status::Sat);
    }

    // S4: forced chain, unit cascade derives contradiction without branching.
    #[test]
    fn scenario_forced_chain_unsat() {
        let formula = cnf_formula![ 1; -1, 2; -2, 3; -3; ];
        assert_eq!(solve_with(Rules::REMOVE_SINGULAR, &formula), Status::Unsat);
    }

    // S5: trivial clause ignored once REMOVE_TRIVIAL is enabled.
    #[test]
    fn scenario_trivial_clause_then_sat() {
        let formula = cnf_formula![ 1, -1, 2; -2; ];
        let rules = Rules::REMOVE_TRIVIAL | Rules::REMOVE_SINGULAR;
        assert_eq!(solve_with(rules, &formula), Status::Sat);
    }

    // S6: small pigeonhole-like formula, all eight 3-clauses over {1,2,3}.
    #[test]
    fn scenario_all_clauses_over_three_vars_is_unsat() {
        let mut formula = CnfFormula::new();
        for a in [1, -1] {
            for b in [2, -2] {
                for c in [3, -3] {
                    formula.add_clause(vec![
                        Lit::from_dimacs(a),
                        Lit::from_dimacs(b),
                        Lit::from_dimacs(c),
                    ]);
                }
            }
        }
        let mut solver = Solver::new(SolverConfig {
            rules: Rules::REMOVE_SINGULAR,
            complexity_limit: None,
        });
        assert_eq!(solver.solve(&formula), Status::Unsat);
        assert!(solver.complexity() <= 8);
    }

    // P8: degenerate entry states.
    #[test]
    fn empty_cnf_is_sat() {
        let formula = CnfFormula::new();
        assert_eq!(solve_with(Rules::REMOVE_SINGULAR, &formula), Status::Sat);
    }

    #[test]
    fn cnf_with_empty_clause_is_unsat() {
        let formula = cnf_formula![ ; 1, 2; ];
        assert_eq!(solve_with(Rules::REMOVE_SINGULAR, &formula), Status::Unsat);
    }

    #[test]
    fn complexity_limit_yields_unknown() {
        let formula = cnf_formula![ 1, 2; -1, 2; 1, -2; -1, -2; ];
        let mut solver = Solver::new(SolverConfig {
            rules: Rules::REMOVE_SINGULAR,
            complexity_limit: Some(1),
        });
        assert_eq!(solver.solve(&formula), Status::Unknown);
    }

    // P7: decision is invariant under clause reordering.
    #[test]
    fn decision_invariant_under_clause_reordering() {
        let forward = cnf_formula![ 1, 2; -1, 3; -3; ];
        let backward = cnf_formula![ -3; -1, 3; 1, 2; ];
        assert_eq!(
            solve_with(Rules::REMOVE_SINGULAR, &forward),
            solve_with(Rules::REMOVE_SINGULAR, &backward),
        );
    }

    proptest! {
        // P5: recursive and iterative drivers agree on every input.
        #[test]
        fn recursive_and_iterative_agree(
            formula in dpll_formula::cnf::strategy::cnf_formula(0..6usize, 0..12, 0..4)
        ) {
            let recursive = solve_with(Rules::REMOVE_SINGULAR | Rules::RECURSIVE_SOLVING, &formula);
            let iterative = solve_with(Rules::REMOVE_SINGULAR, &formula);
            prop_assert_eq!(recursive, iterative);
        }

        // P6: extra simplification rules never change the verdict.
        #[test]
        fn extra_rules_never_change_the_verdict(
            formula in dpll_formula::cnf::strategy::cnf_formula(0..6usize, 0..12, 0..4)
        ) {
            let minimal = solve_with(Rules::empty(), &formula);
            let maximal = solve_with(
                Rules::REMOVE_TRIVIAL | Rules::REMOVE_SINGULAR | Rules::REMOVE_PURE | Rules::LOOKAHEAD,
                &formula,
            );
            prop_assert_eq!(minimal, maximal);
        }

        // Fuzz property: agree with a brute-force truth-table oracle for small formulas.
        #[test]
        fn agrees_with_brute_force_oracle(
            formula in dpll_formula::cnf::strategy::cnf_formula(0..6usize, 0..12, 0..4)
        ) {
            let expected = brute_force(&formula);
            let actual = solve_with(Rules::REMOVE_SINGULAR | Rules::REMOVE_PURE, &formula);
            prop_assert_eq!(actual, expected);
        }
    }
}
