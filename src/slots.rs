//! The Slot Expander (§4.2): materialises the term's teaching grid.
//!
//! For each (week, weekday, daily-slot) triple this emits one concrete
//! [`Slot`], all minute fields pre-computed, carrying a [`Signature`] that
//! is stable across weeks — the same signature always denotes "the same
//! time of day", which is what lets the Solution Extractor replicate a
//! week-0 placement into every other week by lookup instead of re-solving.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::term::Term;
use crate::weekday::Weekday;

/// `(weekday, start, end)` — the cross-week equivalence class of "the same
/// time of day". Two slots in different weeks that share a signature are
/// considered the same teaching opportunity for pattern-replication
/// purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Signature {
    pub weekday: u8,
    pub start: u16,
    pub end: u16,
}

/// One concrete teaching opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub week: u32,
    pub weekday: u8,
    pub date: NaiveDate,
    pub start: u16,
    pub end: u16,
    pub signature: Signature,
}

impl Slot {
    pub fn duration(&self) -> u16 {
        self.end - self.start
    }
}

/// All slots for the term, indexed for the two lookups the rest of the
/// pipeline needs: "slots in week W" (session/constraint construction) and
/// "the slot in week W with signature S" (pattern replication at extraction
/// time).
#[derive(Debug, Clone)]
pub struct SlotGrid {
    slots: Vec<Slot>,
    /// Index of `slots` grouped by week, preserving (weekday, daily-slot)
    /// emission order.
    by_week: Vec<Vec<usize>>,
}

impl SlotGrid {
    /// Expands `term` into a full grid. One [`Slot`] is emitted per
    /// (week, weekday, daily-slot-template) triple in `term.days` order
    /// within each week, and `term.daily_slots` order within each day —
    /// this fixed emission order is what gives the engine's domain
    /// disjunctions a deterministic, reproducible ordering (§4.4).
    pub fn expand(term: &Term) -> SlotGrid {
        let mut slots = Vec::new();
        let mut by_week = vec![Vec::new(); term.weeks as usize];

        let first_week_dates: Vec<NaiveDate> = term
            .days
            .iter()
            .map(|day| term.first_week_date_for(*day))
            .collect();

        for week in 0..term.weeks {
            for (day, first_date) in term.days.iter().zip(first_week_dates.iter()) {
                let date = *first_date + chrono::Duration::days(7 * week as i64);
                for template in &term.daily_slots {
                    let index = slots.len();
                    slots.push(Slot {
                        week,
                        weekday: day.index(),
                        date,
                        start: template.start,
                        end: template.end,
                        signature: Signature {
                            weekday: day.index(),
                            start: template.start,
                            end: template.end,
                        },
                    });
                    by_week[week as usize].push(index);
                }
            }
        }

        SlotGrid { slots, by_week }
    }

    pub fn slot(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    /// Indices of every slot in `week`, in emission order.
    pub fn week(&self, week: u32) -> &[usize] {
        &self.by_week[week as usize]
    }

    /// Looks up the slot in `week` whose signature equals `signature` —
    /// this is the mechanism the extractor uses to replicate a week-0
    /// placement into every other week (§4.5). Signature -> slot is a
    /// bijection within a week (§3 invariant), so this is always either
    /// zero or one result.
    pub fn find_by_signature(&self, week: u32, signature: Signature) -> Option<usize> {
        self.by_week[week as usize]
            .iter()
            .copied()
            .find(|&idx| self.slots[idx].signature == signature)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{default_daily_slots, default_days};

    fn sample_term(weeks: u32) -> Term {
        Term {
            name: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            weeks,
            days: default_days(),
            daily_slots: default_daily_slots(),
        }
    }

    #[test]
    fn expands_one_slot_per_week_day_template_triple() {
        let term = sample_term(2);
        let grid = SlotGrid::expand(&term);
        assert_eq!(grid.len(), 2 * 5 * 6);
        assert_eq!(grid.week(0).len(), 5 * 6);
        assert_eq!(grid.week(1).len(), 5 * 6);
    }

    #[test]
    fn signature_is_a_bijection_across_weeks() {
        let term = sample_term(3);
        let grid = SlotGrid::expand(&term);
        let week0_signature = grid.slot(grid.week(0)[3]).signature;
        for week in 0..term.weeks {
            let found = grid.find_by_signature(week, week0_signature);
            assert!(found.is_some(), "signature missing in week {week}");
            assert_eq!(grid.slot(found.unwrap()).signature, week0_signature);
        }
    }

    #[test]
    fn same_signature_advances_date_by_seven_days_per_week() {
        let term = sample_term(3);
        let grid = SlotGrid::expand(&term);
        let sig = grid.slot(grid.week(0)[0]).signature;
        let d0 = grid.slot(grid.find_by_signature(0, sig).unwrap()).date;
        let d1 = grid.slot(grid.find_by_signature(1, sig).unwrap()).date;
        let d2 = grid.slot(grid.find_by_signature(2, sig).unwrap()).date;
        assert_eq!(d1 - d0, chrono::Duration::days(7));
        assert_eq!(d2 - d1, chrono::Duration::days(7));
    }
}
