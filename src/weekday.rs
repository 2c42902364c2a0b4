//! Weekday representation and the English/Swedish alias table used to parse
//! `term.days`, `lessonTemplates[].fixedDay`, and `timeSlots[].day`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A day of the week, Monday-first (`Monday == 0`) to match `chrono::Weekday`
/// numbering used elsewhere in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Weekday(u8);

/// Canonical alias table. Case-insensitive; Swedish aliases cover the terms
/// this system was originally built for, English aliases cover the rest.
const ALIASES: &[(&str, u8)] = &[
    ("monday", 0),
    ("mon", 0),
    ("måndag", 0),
    ("mandag", 0),
    ("tuesday", 1),
    ("tue", 1),
    ("tisdag", 1),
    ("wednesday", 2),
    ("wed", 2),
    ("onsdag", 2),
    ("thursday", 3),
    ("thu", 3),
    ("torsdag", 3),
    ("friday", 4),
    ("fri", 4),
    ("fre", 4),
    ("fredag", 4),
    ("saturday", 5),
    ("sat", 5),
    ("lördag", 5),
    ("lordag", 5),
    ("lör", 5),
    ("sunday", 6),
    ("sun", 6),
    ("söndag", 6),
    ("sondag", 6),
    ("sön", 6),
];

const CANONICAL_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

impl Weekday {
    pub const MONDAY: Weekday = Weekday(0);

    /// Parses a weekday name against [`ALIASES`], case-insensitively.
    /// Returns `None` for anything not in the table.
    pub fn parse(raw: &str) -> Option<Weekday> {
        let normalized = raw.trim().to_lowercase();
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, idx)| Weekday(*idx))
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    /// Builds a `Weekday` directly from a `num_days_from_monday`-style
    /// index, as stored on [`crate::slots::Slot`]. Panics on `>= 7`, which
    /// never happens for indices produced by this crate.
    pub fn from_index(index: u8) -> Weekday {
        assert!(index < 7, "weekday index out of range: {index}");
        Weekday(index)
    }

    pub fn is_weekend(&self) -> bool {
        self.0 >= 5
    }

    pub fn canonical_name(&self) -> &'static str {
        CANONICAL_NAMES[self.0 as usize]
    }

    /// Maps from `chrono::Weekday::num_days_from_monday()`.
    pub fn from_chrono(weekday: chrono::Weekday) -> Weekday {
        Weekday(weekday.num_days_from_monday() as u8)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}
