//! The polymorphic constraint-engine interface (§9's "Polymorphic engine
//! interface" design note, §4.4's "Engine contract").
//!
//! The rest of the pipeline never talks to a concrete solver; it talks to
//! this trait. An integer-domain variable is a [`VarId`]; a literal is a
//! conjunction of simple membership tests over those variables ([`Lit`]),
//! which is enough to express both a plain equality ("`slot[i] == 7`")
//! and a compound condition ("`slot[i] == 7 AND room[i] == 2`") without a
//! separate constraint shape for each. `post_custom` is the escape hatch
//! for the handful of constraints that do not reduce to a handful of
//! equality/disjunction clauses — the idle-gap bound and the PE
//! transition buffer (§4.4) — evaluated once every variable in its scope
//! is assigned, the same shape as the teacher's
//! `check_teacher_conflict`/`check_class_conflict` methods generalised
//! from a fixed bitmask scope to an arbitrary variable scope.

use std::rc::Rc;
use std::time::Instant;

pub type VarId = usize;
pub type ConstraintLabel = String;

/// A single membership test against one variable's assigned value.
#[derive(Debug, Clone)]
pub enum SimpleLit {
    Eq(VarId, i64),
    Neq(VarId, i64),
    In(VarId, Rc<Vec<i64>>),
}

impl SimpleLit {
    pub fn var(&self) -> VarId {
        match self {
            SimpleLit::Eq(v, _) | SimpleLit::Neq(v, _) | SimpleLit::In(v, _) => *v,
        }
    }

    /// `Some(true/false)` once `var` is assigned, `None` while unassigned.
    fn eval(&self, value: Option<i64>) -> Option<bool> {
        let value = value?;
        Some(match self {
            SimpleLit::Eq(_, want) => value == *want,
            SimpleLit::Neq(_, want) => value != *want,
            SimpleLit::In(_, set) => set.contains(&value),
        })
    }
}

/// A conjunction of [`SimpleLit`]s — a plain literal is a one-element
/// `Lit`; a compound one (e.g. "same slot AND same room") is several.
#[derive(Debug, Clone)]
pub struct Lit(pub Vec<SimpleLit>);

impl Lit {
    pub fn eq(var: VarId, value: i64) -> Lit {
        Lit(vec![SimpleLit::Eq(var, value)])
    }

    pub fn neq(var: VarId, value: i64) -> Lit {
        Lit(vec![SimpleLit::Neq(var, value)])
    }

    pub fn in_set(var: VarId, values: Rc<Vec<i64>>) -> Lit {
        Lit(vec![SimpleLit::In(var, values)])
    }

    pub fn and(mut self, other: SimpleLit) -> Lit {
        self.0.push(other);
        self
    }

    pub fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.0.iter().map(SimpleLit::var)
    }

    /// `Some(true)` once every component is known true, `Some(false)` as
    /// soon as one component is known false, `None` while still pending.
    pub(crate) fn eval(&self, values: &[Option<i64>]) -> Option<bool> {
        let mut pending = false;
        for simple in &self.0 {
            match simple.eval(values[simple.var()]) {
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
}

/// A scope-evaluated predicate for constraints that do not fit the
/// literal vocabulary (idle-gap bounds, transition buffers).
pub type CustomPredicate = Rc<dyn Fn(&[i64]) -> bool>;

#[derive(Debug, Clone)]
pub enum SolveOutcome {
    Satisfiable,
    Unsatisfiable { core: Vec<ConstraintLabel> },
    TimedOut,
}

/// The engine contract (§4.4). A single implementation,
/// [`super::backtracking::BacktrackingEngine`], ships in this crate.
pub trait ConstraintEngine {
    /// Declares a new integer variable ranging over `domain`. Variables
    /// are created in the order the model builder declares them
    /// (template index, occurrence — §4.4's ordering rule), and that
    /// order is what the engine's search follows.
    fn new_int_var(&mut self, domain: &[i64]) -> VarId;

    /// At least one of `lits` must hold.
    fn post_disjunction(&mut self, lits: Vec<Lit>, label: impl Into<ConstraintLabel>);

    /// Every one of `lits` must hold (used for the rare case a group of
    /// literals is forced together rather than left as a choice).
    fn post_conjunction(&mut self, lits: Vec<Lit>, label: impl Into<ConstraintLabel>);

    /// `antecedent` all holding implies `consequent` holds.
    fn post_implication(
        &mut self,
        antecedent: Vec<Lit>,
        consequent: Lit,
        label: impl Into<ConstraintLabel>,
    );

    /// At most `k` of `indicators` may hold simultaneously.
    fn post_at_most_k(&mut self, indicators: Vec<Lit>, k: u32, label: impl Into<ConstraintLabel>);

    /// `predicate` is evaluated once every variable in `scope` is
    /// assigned; a `false` result is treated as a violated constraint.
    fn post_custom(
        &mut self,
        scope: Vec<VarId>,
        predicate: CustomPredicate,
        label: impl Into<ConstraintLabel>,
    );

    /// Runs the search to completion or until `deadline`, whichever
    /// comes first. `track_labels` turns on conflict-label bookkeeping
    /// (§7's debug-mode unsat core); it costs a little bookkeeping
    /// overhead so is opt-in.
    fn check(&mut self, deadline: Instant, track_labels: bool) -> SolveOutcome;

    /// The value the search assigned to `var`. Only meaningful after
    /// `check` returned [`SolveOutcome::Satisfiable`].
    fn value_of(&self, var: VarId) -> i64;
}
