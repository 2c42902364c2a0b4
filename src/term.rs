//! The term calendar: `Term` and `DailySlotTemplate`, built once from input
//! and immutable afterwards (§3 of the spec's data model).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::weekday::Weekday;

/// One period offered every teaching day, e.g. 08:30-09:30.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySlotTemplate {
    /// Minute of day the period starts, e.g. 8*60+30 = 510.
    pub start: u16,
    /// Minute of day the period ends. Always `> start`.
    pub end: u16,
}

impl DailySlotTemplate {
    pub fn duration(&self) -> u16 {
        self.end - self.start
    }
}

/// The six-slot default day used when a request omits `term.dailySlots`.
pub fn default_daily_slots() -> Vec<DailySlotTemplate> {
    [
        (8 * 60 + 30, 9 * 60 + 30),
        (9 * 60 + 45, 10 * 60 + 45),
        (11 * 60, 12 * 60),
        (12 * 60 + 45, 13 * 60 + 45),
        (14 * 60, 15 * 60),
        (15 * 60 + 15, 16 * 60 + 15),
    ]
    .into_iter()
    .map(|(start, end)| DailySlotTemplate { start, end })
    .collect()
}

/// The default Mon-Fri teaching week.
pub fn default_days() -> Vec<Weekday> {
    ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
        .into_iter()
        .map(|name| Weekday::parse(name).expect("default weekday names are always valid"))
        .collect()
}

/// A validated, immutable term calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub name: Option<String>,
    pub start_date: NaiveDate,
    pub weeks: u32,
    pub days: Vec<Weekday>,
    pub daily_slots: Vec<DailySlotTemplate>,
}

impl Term {
    /// The earliest date in the first week that falls on `weekday`.
    pub fn first_week_date_for(&self, weekday: Weekday) -> NaiveDate {
        let start_weekday = Weekday::from_chrono(self.start_date.weekday());
        let offset = (7 + weekday.index() as i64 - start_weekday.index() as i64) % 7;
        self.start_date + chrono::Duration::days(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_daily_slots_are_nonoverlapping_and_increasing() {
        let slots = default_daily_slots();
        for window in slots.windows(2) {
            assert!(window[0].end <= window[1].start);
        }
        for slot in &slots {
            assert!(slot.end > slot.start);
        }
    }

    #[test]
    fn first_week_date_aligns_forward_to_target_weekday() {
        // 2024-01-01 is a Monday.
        let term = Term {
            name: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            weeks: 1,
            days: default_days(),
            daily_slots: default_daily_slots(),
        };
        assert_eq!(
            term.first_week_date_for(Weekday::parse("Monday").unwrap()),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(
            term.first_week_date_for(Weekday::parse("Friday").unwrap()),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
    }

    #[test]
    fn first_week_date_never_precedes_term_start() {
        // 2024-01-03 is a Wednesday; the first Monday on or after it is
        // 2024-01-08, not the Monday of the same calendar week (which would
        // fall before the term even starts).
        let term = Term {
            name: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            weeks: 1,
            days: default_days(),
            daily_slots: default_daily_slots(),
        };
        assert_eq!(
            term.first_week_date_for(Weekday::parse("Monday").unwrap()),
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
        );
    }
}
