//! The basic solver profile (§2): when no `lessonTemplates` are supplied,
//! the request carries only flat entity lists and explicit `timeSlots`,
//! and the pipeline does a pure resource-exclusivity assignment instead of
//! the full constraint hierarchy (no idle-gap bounds, no PE buffers, no
//! lunch placement, no subject spread beyond what exclusivity already
//! gives for free).
//!
//! One obligation is built per subject, round-robining across the
//! declared classes/teachers/classrooms so every flat entity list gets
//! used even when its length does not match `subjects`. Obligations are
//! placed deterministically: earliest slot first, first class/teacher/room
//! combination that keeps every resource exclusive (§4.4's "Objective" —
//! the basic solver "may minimise slot indices" as a soft preference,
//! implemented directly by trying slots in ascending order rather than
//! through the engine).

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::PipelineError;
use crate::extract::{term_meta, Assignment, Meta, SolveOutput, TimeSlotInfo};
use crate::input::{BasicTimeSlot, Entities};
use crate::term::Term;
use crate::weekday::Weekday;

fn minutes_to_hhmm(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Assigns every subject in `entities.subjects` to a distinct `(day,
/// start)` slot, round-robining classes/teachers/classrooms, with full
/// resource exclusivity (§4.4's "Resource exclusivity", restricted to the
/// single term week basic mode always operates over).
pub fn solve_basic(entities: &Entities, time_slots: &[BasicTimeSlot]) -> Result<SolveOutput, PipelineError> {
    if entities.subjects.is_empty() {
        return Err(PipelineError::infeasible_input(
            "basic mode requires at least one subject",
        ));
    }

    let mut ordered_slots: Vec<(usize, &BasicTimeSlot)> = time_slots.iter().enumerate().collect();
    ordered_slots.sort_by_key(|(_, s)| (s.day.index(), s.start));

    let classes = non_empty_or_placeholder(&entities.classes, "Class 1");
    let teachers = non_empty_or_placeholder(&entities.teachers, "Teacher 1");
    let classrooms = non_empty_or_placeholder(&entities.classrooms, "");

    let mut used_slot_indices: HashSet<usize> = HashSet::new();
    let mut class_busy: HashSet<(usize, usize)> = HashSet::new(); // (class_idx, slot_ord)
    let mut teacher_busy: HashSet<(usize, usize)> = HashSet::new();
    let mut room_busy: HashSet<(usize, usize)> = HashSet::new();

    let mut assignments = Vec::new();
    let mut schedule: std::collections::BTreeMap<String, Vec<Assignment>> =
        std::collections::BTreeMap::new();

    // Built up front (rather than only for `Meta.term`) so each
    // assignment's `timeSlot.date` can be computed from it too — basic
    // mode has no real calendar, but §3's `Assignment.timeSlot` shape is
    // uniform across both modes and always carries a concrete date.
    let placeholder_term = Term {
        name: None,
        start_date: chrono::Utc::now().date_naive(),
        weeks: 1,
        days: distinct_days(time_slots),
        daily_slots: Vec::new(),
    };

    for (subject_idx, subject) in entities.subjects.iter().enumerate() {
        let class_idx = subject_idx % classes.len();
        let teacher_idx = subject_idx % teachers.len();
        let room_idx = subject_idx % classrooms.len();

        let placement = ordered_slots
            .iter()
            .enumerate()
            .find(|(ord, (raw_idx, _))| {
                !used_slot_indices.contains(raw_idx)
                    && !class_busy.contains(&(class_idx, *ord))
                    && !teacher_busy.contains(&(teacher_idx, *ord))
                    && !room_busy.contains(&(room_idx, *ord))
            })
            .map(|(ord, (raw_idx, slot))| (ord, *raw_idx, *slot));

        let Some((ord, raw_idx, slot)) = placement else {
            return Err(PipelineError::Infeasible {
                reason: format!(
                    "no exclusivity-respecting slot remains for subject '{subject}'"
                ),
                unsat_core: Vec::new(),
            });
        };

        used_slot_indices.insert(raw_idx);
        class_busy.insert((class_idx, ord));
        teacher_busy.insert((teacher_idx, ord));
        room_busy.insert((room_idx, ord));

        let duration = slot.end - slot.start;
        let assignment = Assignment {
            subject: subject.clone(),
            class: classes[class_idx].clone(),
            teacher: teachers[teacher_idx].clone(),
            classroom: classrooms[room_idx].clone(),
            duration,
            term_week: 1,
            time_slot: TimeSlotInfo {
                date: placeholder_term.first_week_date_for(slot.day).to_string(),
                day_name: slot.day.canonical_name().to_string(),
                start: minutes_to_hhmm(slot.start),
                end: minutes_to_hhmm(slot.end),
                week_index: 1,
            },
        };
        schedule
            .entry(assignment.time_slot.day_name.clone())
            .or_default()
            .push(assignment.clone());
        assignments.push(assignment);
    }

    for entries in schedule.values_mut() {
        entries.sort_by(|a, b| a.time_slot.start.cmp(&b.time_slot.start));
    }

    debug!(assignments = assignments.len(), "basic-mode solve complete");

    let total_sessions = assignments.len();
    Ok(SolveOutput {
        assignments,
        schedule_by_day: schedule,
        meta: Meta {
            term: term_meta(&placeholder_term),
            time_slots: time_slots
                .iter()
                .map(|s| format!("{}-{}", minutes_to_hhmm(s.start), minutes_to_hhmm(s.end)))
                .collect(),
            solver: "basic-exclusivity".to_string(),
            status: "solved".to_string(),
            solution_time: 0.0,
            total_sessions,
        },
    })
}

fn non_empty_or_placeholder(names: &[String], placeholder: &str) -> Vec<String> {
    if names.is_empty() {
        vec![placeholder.to_string()]
    } else {
        names.to_vec()
    }
}

fn distinct_days(time_slots: &[BasicTimeSlot]) -> Vec<Weekday> {
    let mut days = Vec::new();
    for slot in time_slots {
        if !days.contains(&slot.day) {
            days.push(slot.day);
        }
    }
    if days.is_empty() {
        days.push(Weekday::MONDAY);
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weekday::Weekday;

    fn slot(day: &str, start: u16, end: u16) -> BasicTimeSlot {
        BasicTimeSlot {
            day: Weekday::parse(day).unwrap(),
            start,
            end,
        }
    }

    #[test]
    fn three_subjects_land_on_three_distinct_slots() {
        let entities = Entities {
            classes: vec!["5A".to_string()],
            teachers: vec!["Alice".to_string()],
            classrooms: vec!["R1".to_string()],
            subjects: vec!["Math".to_string(), "English".to_string(), "Science".to_string()],
        };
        let time_slots = vec![
            slot("Monday", 8 * 60, 9 * 60),
            slot("Monday", 9 * 60, 10 * 60),
            slot("Monday", 10 * 60, 11 * 60),
        ];
        let output = solve_basic(&entities, &time_slots).unwrap();
        assert_eq!(output.assignments.len(), 3);
        let starts: HashSet<&str> = output
            .assignments
            .iter()
            .map(|a| a.time_slot.start.as_str())
            .collect();
        assert_eq!(starts.len(), 3);
        assert!(output.assignments.iter().all(|a| a.time_slot.day_name == "Monday"));
    }

    #[test]
    fn more_subjects_than_slots_is_infeasible() {
        let entities = Entities {
            classes: vec!["5A".to_string()],
            teachers: vec!["Alice".to_string()],
            classrooms: vec!["R1".to_string()],
            subjects: vec!["Math".to_string(), "English".to_string()],
        };
        let time_slots = vec![slot("Monday", 8 * 60, 9 * 60)];
        let result = solve_basic(&entities, &time_slots);
        assert!(matches!(result, Err(PipelineError::Infeasible { .. })));
    }
}
