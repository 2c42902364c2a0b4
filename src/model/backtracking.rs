//! `BacktrackingEngine`: the crate's sole [`ConstraintEngine`]
//! implementation, generalised from the teacher's hand-rolled
//! backtracking search (`src/algorithm/solver.rs`'s `ConstraintSolver`,
//! whose `backtrack_search`/`try_place_curriculum` pair recurses over a
//! fixed 5x8 bitmask grid) to the spec's arbitrary variable/domain model.
//!
//! Variables are assigned in declaration order, domain values tried in
//! the order they were supplied (§4.4's "Ordering and tie-breaks" —
//! sessions by (template index, occurrence, week), slot indices
//! ascending), so the same input always reproduces the same schedule: the
//! determinism CP-SAT/SMT engines give only with a pinned seed is built
//! in here by construction.
//!
//! Pruning is incremental: every constraint referencing a variable is
//! re-examined the moment that variable is assigned, instead of waiting
//! for the whole scope to be complete. A disjunction or custom predicate
//! only fails once every variable it touches is assigned (a partial
//! assignment can't yet be known to violate it); an at-most-k constraint
//! fails the instant the count of already-true indicators exceeds `k`,
//! which is what keeps resource-exclusivity pruning cheap.

use std::collections::HashSet;
use std::time::Instant;

use tracing::trace;

use super::engine::{ConstraintEngine, ConstraintLabel, CustomPredicate, Lit, SolveOutcome};

enum ConstraintBody {
    Disjunction(Vec<Lit>),
    Conjunction(Vec<Lit>),
    Implication(Vec<Lit>, Lit),
    AtMostK(Vec<Lit>, u32),
    Custom(Vec<usize>, CustomPredicate),
}

struct PostedConstraint {
    body: ConstraintBody,
    label: ConstraintLabel,
}

impl PostedConstraint {
    fn scope(&self) -> Vec<usize> {
        match &self.body {
            ConstraintBody::Disjunction(lits) | ConstraintBody::Conjunction(lits) => {
                lits.iter().flat_map(Lit::vars).collect()
            }
            ConstraintBody::Implication(ante, cons) => ante
                .iter()
                .flat_map(Lit::vars)
                .chain(cons.vars())
                .collect(),
            ConstraintBody::AtMostK(lits, _) => lits.iter().flat_map(Lit::vars).collect(),
            ConstraintBody::Custom(scope, _) => scope.clone(),
        }
    }

    /// `Some(true/false)` once decidable from `values`, `None` while
    /// still pending (at-most-k never returns `Some(true)` early — it can
    /// only be violated, never conclusively satisfied before the search
    /// completes, so it always reports `None` unless it is violated).
    fn evaluate(&self, values: &[Option<i64>]) -> Option<bool> {
        match &self.body {
            ConstraintBody::Disjunction(lits) => {
                let mut pending = false;
                for lit in lits {
                    match eval_lit(lit, values) {
                        Some(true) => return Some(true),
                        Some(false) => {}
                        None => pending = true,
                    }
                }
                if pending {
                    None
                } else {
                    Some(false)
                }
            }
            ConstraintBody::Conjunction(lits) => {
                let mut pending = false;
                for lit in lits {
                    match eval_lit(lit, values) {
                        Some(false) => return Some(false),
                        Some(true) => {}
                        None => pending = true,
                    }
                }
                if pending {
                    None
                } else {
                    Some(true)
                }
            }
            ConstraintBody::Implication(ante, cons) => {
                let mut ante_pending = false;
                for lit in ante {
                    match eval_lit(lit, values) {
                        Some(false) => return Some(true), // antecedent false: vacuously true
                        Some(true) => {}
                        None => ante_pending = true,
                    }
                }
                if ante_pending {
                    return None;
                }
                eval_lit(cons, values)
            }
            ConstraintBody::AtMostK(lits, k) => {
                let satisfied = lits
                    .iter()
                    .filter(|lit| eval_lit(lit, values) == Some(true))
                    .count() as u32;
                if satisfied > *k {
                    Some(false)
                } else {
                    None
                }
            }
            ConstraintBody::Custom(scope, predicate) => {
                let mut args = Vec::with_capacity(scope.len());
                for &v in scope {
                    match values[v] {
                        Some(value) => args.push(value),
                        None => return None,
                    }
                }
                Some(predicate(&args))
            }
        }
    }
}

fn eval_lit(lit: &Lit, values: &[Option<i64>]) -> Option<bool> {
    lit.eval(values)
}

pub struct BacktrackingEngine {
    domains: Vec<Vec<i64>>,
    assignment: Vec<Option<i64>>,
    constraints: Vec<PostedConstraint>,
    /// For each variable, indices into `constraints` that reference it.
    watchers: Vec<Vec<usize>>,
    conflict_labels: HashSet<ConstraintLabel>,
    nodes_visited: u64,
}

impl BacktrackingEngine {
    pub fn new() -> Self {
        BacktrackingEngine {
            domains: Vec::new(),
            assignment: Vec::new(),
            constraints: Vec::new(),
            watchers: Vec::new(),
            conflict_labels: HashSet::new(),
            nodes_visited: 0,
        }
    }

    pub fn nodes_visited(&self) -> u64 {
        self.nodes_visited
    }

    fn register(&mut self, body: ConstraintBody, label: ConstraintLabel) {
        let constraint = PostedConstraint { body, label };
        let scope = constraint.scope();
        let index = self.constraints.len();
        self.constraints.push(constraint);
        for var in scope {
            self.watchers[var].push(index);
        }
    }

    /// Checks every constraint watching `var` (the variable just
    /// assigned); returns `false` (and records the offending label, if
    /// tracking) the moment one is violated.
    fn consistent_after(&mut self, var: usize, track_labels: bool) -> bool {
        // Borrow-split: evaluate against `self.assignment` without holding
        // `self.constraints` mutably borrowed at the same time.
        let indices = self.watchers[var].clone();
        for idx in indices {
            if self.constraints[idx].evaluate(&self.assignment) == Some(false) {
                if track_labels {
                    self.conflict_labels
                        .insert(self.constraints[idx].label.clone());
                }
                return false;
            }
        }
        true
    }

    fn search(&mut self, depth: usize, deadline: Instant, track_labels: bool) -> SolveOutcome {
        if depth == self.domains.len() {
            return SolveOutcome::Satisfiable;
        }
        if Instant::now() >= deadline {
            return SolveOutcome::TimedOut;
        }
        let candidates = self.domains[depth].clone();
        for value in candidates {
            self.nodes_visited += 1;
            self.assignment[depth] = Some(value);
            if self.consistent_after(depth, track_labels) {
                match self.search(depth + 1, deadline, track_labels) {
                    SolveOutcome::Satisfiable => return SolveOutcome::Satisfiable,
                    SolveOutcome::TimedOut => return SolveOutcome::TimedOut,
                    SolveOutcome::Unsatisfiable { .. } => {}
                }
            }
            self.assignment[depth] = None;
        }
        trace!(depth, "exhausted domain, backtracking");
        SolveOutcome::Unsatisfiable {
            core: self.conflict_labels.iter().cloned().collect(),
        }
    }
}

impl Default for BacktrackingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintEngine for BacktrackingEngine {
    fn new_int_var(&mut self, domain: &[i64]) -> usize {
        let id = self.domains.len();
        self.domains.push(domain.to_vec());
        self.assignment.push(None);
        self.watchers.push(Vec::new());
        id
    }

    fn post_disjunction(&mut self, lits: Vec<Lit>, label: impl Into<ConstraintLabel>) {
        self.register(ConstraintBody::Disjunction(lits), label.into());
    }

    fn post_conjunction(&mut self, lits: Vec<Lit>, label: impl Into<ConstraintLabel>) {
        self.register(ConstraintBody::Conjunction(lits), label.into());
    }

    fn post_implication(
        &mut self,
        antecedent: Vec<Lit>,
        consequent: Lit,
        label: impl Into<ConstraintLabel>,
    ) {
        self.register(
            ConstraintBody::Implication(antecedent, consequent),
            label.into(),
        );
    }

    fn post_at_most_k(&mut self, indicators: Vec<Lit>, k: u32, label: impl Into<ConstraintLabel>) {
        self.register(ConstraintBody::AtMostK(indicators, k), label.into());
    }

    fn post_custom(
        &mut self,
        scope: Vec<usize>,
        predicate: CustomPredicate,
        label: impl Into<ConstraintLabel>,
    ) {
        self.register(ConstraintBody::Custom(scope, predicate), label.into());
    }

    fn check(&mut self, deadline: Instant, track_labels: bool) -> SolveOutcome {
        self.conflict_labels.clear();
        self.search(0, deadline, track_labels)
    }

    fn value_of(&self, var: usize) -> i64 {
        self.assignment[var].expect("value_of called before a satisfiable check()")
    }
}
