//! The Solution Extractor (§4.5): turns a solved [`ModelOutcome`] (or the
//! basic-mode assignment list) back into human-usable [`Assignment`]s,
//! replicating each canonical (template, occurrence) placement into every
//! week of the term via signature lookup, and materialising per-class
//! lunch breaks on days that actually ended up populated.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::input::constraints::ConstraintConfig;
use crate::model::build::ModelOutcome;
use crate::sessions::Session;
use crate::slots::SlotGrid;
use crate::term::Term;
use crate::weekday::Weekday;

/// `HH:MM` rendering of a minute-of-day value, as the spec's `timeSlot`
/// fields require.
fn minutes_to_hhmm(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotInfo {
    pub date: String,
    pub day_name: String,
    pub start: String,
    pub end: String,
    /// 1-based, per §3's `Assignment.timeSlot.weekIndex`.
    pub week_index: u32,
}

/// One concrete (subject, class, teacher, classroom) placement, produced
/// once by the extractor (§3's `Assignment` entity). Lunch breaks are
/// rendered through the same shape (`subject == "Lunch"`, `teacher` and
/// `classroom` left empty) so they can share `scheduleByDay`'s per-day
/// lists without a second output shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub subject: String,
    pub class: String,
    pub teacher: String,
    pub classroom: String,
    pub duration: u16,
    /// 1-based term week.
    pub term_week: u32,
    pub time_slot: TimeSlotInfo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermMeta {
    pub name: Option<String>,
    pub start_date: String,
    pub weeks: u32,
    pub days: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub term: TermMeta,
    pub time_slots: Vec<String>,
    pub solver: String,
    pub status: String,
    pub solution_time: f64,
    pub total_sessions: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveOutput {
    pub assignments: Vec<Assignment>,
    pub schedule_by_day: BTreeMap<String, Vec<Assignment>>,
    pub meta: Meta,
}

impl SolveOutput {
    /// Sorts every per-day list by start-minute ascending (§4.5's final
    /// extraction step). Assumes `time_slot.start` is always "HH:MM".
    fn sort_schedule_by_day(&mut self) {
        for entries in self.schedule_by_day.values_mut() {
            entries.sort_by(|a, b| a.time_slot.start.cmp(&b.time_slot.start));
        }
    }
}

pub fn term_meta(term: &Term) -> TermMeta {
    TermMeta {
        name: term.name.clone(),
        start_date: term.start_date.to_string(),
        weeks: term.weeks,
        days: term.days.iter().map(|d| d.canonical_name().to_string()).collect(),
    }
}

pub fn daily_slot_labels(term: &Term) -> Vec<String> {
    term.daily_slots
        .iter()
        .map(|s| format!("{}-{}", minutes_to_hhmm(s.start), minutes_to_hhmm(s.end)))
        .collect()
}

/// Reconstructs structured-mode assignments from a solved [`ModelOutcome`]
/// (§4.5). `sessions` must be the full per-week session list the Session
/// Builder produced; only `week == 0` entries index into
/// `outcome.placements`, in the same order they were posted to the engine.
pub fn extract_structured(
    sessions: &[Session],
    grid: &SlotGrid,
    rooms: &[String],
    outcome: &ModelOutcome,
    constraints: &ConstraintConfig,
    term: &Term,
) -> SolveOutput {
    let canonical: Vec<&Session> = sessions.iter().filter(|s| s.week == 0).collect();
    debug_assert_eq!(canonical.len(), outcome.placements.len());

    let mut assignments = Vec::new();
    let mut schedule: BTreeMap<String, Vec<Assignment>> = BTreeMap::new();
    let mut class_names: HashMap<usize, String> = HashMap::new();
    let mut class_scheduled_days: HashMap<usize, HashSet<u8>> = HashMap::new();

    for (i, session) in canonical.iter().enumerate() {
        let placement = outcome.placements[i];
        let week0_slot = grid.slot(placement.slot_index);
        let signature = week0_slot.signature;
        let room_name = rooms
            .get(placement.room_index)
            .cloned()
            .unwrap_or_default();

        class_names
            .entry(session.class_index)
            .or_insert_with(|| session.class_name.clone());
        class_scheduled_days
            .entry(session.class_index)
            .or_default()
            .insert(week0_slot.weekday);

        for week in 0..term.weeks {
            let slot_index = grid
                .find_by_signature(week, signature)
                .expect("signature exists in every week by construction (§3 invariant)");
            let slot = grid.slot(slot_index);
            let assignment = Assignment {
                subject: session.subject_name.clone(),
                class: session.class_name.clone(),
                teacher: session.teacher_name.clone(),
                classroom: room_name.clone(),
                duration: session.duration,
                term_week: week + 1,
                time_slot: TimeSlotInfo {
                    date: slot.date.to_string(),
                    day_name: Weekday::from_index(slot.weekday).canonical_name().to_string(),
                    start: minutes_to_hhmm(slot.start),
                    end: minutes_to_hhmm(slot.end),
                    week_index: week + 1,
                },
            };
            schedule
                .entry(slot.date.to_string())
                .or_default()
                .push(assignment.clone());
            assignments.push(assignment);
        }
    }

    for ((class_idx, weekday), lunch_start) in &outcome.lunches {
        let populated = class_scheduled_days
            .get(class_idx)
            .is_some_and(|days| days.contains(weekday));
        if !populated {
            continue; // day turned out empty for this class; extractor skips it (§4.5)
        }
        let Some(class_name) = class_names.get(class_idx) else {
            continue;
        };
        for week in 0..term.weeks {
            let Some(date) = grid
                .week(week)
                .iter()
                .map(|&idx| grid.slot(idx))
                .find(|s| s.weekday == *weekday)
                .map(|s| s.date)
            else {
                continue;
            };
            let lunch_end = lunch_start + constraints.lunch_break.duration;
            let assignment = Assignment {
                subject: "Lunch".to_string(),
                class: class_name.clone(),
                teacher: String::new(),
                classroom: String::new(),
                duration: constraints.lunch_break.duration,
                term_week: week + 1,
                time_slot: TimeSlotInfo {
                    date: date.to_string(),
                    day_name: Weekday::from_index(*weekday).canonical_name().to_string(),
                    start: minutes_to_hhmm(*lunch_start),
                    end: minutes_to_hhmm(lunch_end),
                    week_index: week + 1,
                },
            };
            schedule.entry(date.to_string()).or_default().push(assignment);
        }
    }

    debug!(
        assignments = assignments.len(),
        days = schedule.len(),
        "extraction complete"
    );

    let mut output = SolveOutput {
        assignments,
        schedule_by_day: schedule,
        meta: Meta {
            term: term_meta(term),
            time_slots: daily_slot_labels(term),
            solver: "backtracking".to_string(),
            status: "solved".to_string(),
            solution_time: 0.0,
            total_sessions: sessions.len(),
        },
    };
    output.sort_schedule_by_day();
    output
}
