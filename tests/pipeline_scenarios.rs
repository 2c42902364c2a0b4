//! Black-box, whole-pipeline tests driving `run_pipeline` directly with the
//! JSON bodies from spec.md §8's end-to-end scenario table. Scenarios 1, 3
//! and 6 are covered inline in `src/boundary.rs`'s unit tests; this file
//! covers 2, 4 and 5, which need more than one template or a non-default
//! constraint object to set up.

use std::collections::{HashMap, HashSet};

use pretty_assertions::assert_eq;
use schedule_solver::run_pipeline;
use serde_json::json;

fn minutes(hhmm: &str) -> u32 {
    let (h, m) = hhmm.split_once(':').unwrap();
    h.parse::<u32>().unwrap() * 60 + m.parse::<u32>().unwrap()
}

/// Scenario 2: a second template sharing the class but a different teacher
/// and a preferred room must not collide with the first on class, teacher
/// or room.
#[test]
fn scenario_two_two_templates_share_class_without_clashing() {
    let raw = json!({
        "term": {
            "startDate": "2024-01-01",
            "weeks": 1,
            "days": ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"],
            "dailySlots": [
                {"start": "08:30", "end": "09:30"},
                {"start": "09:45", "end": "10:45"}
            ]
        },
        "lessonTemplates": [
            {
                "class": "5A", "teacher": "Alice", "subject": "Math",
                "sessionsPerWeek": 2, "durationMinutes": 60
            },
            {
                "class": "5A", "teacher": "Bob", "subject": "English",
                "sessionsPerWeek": 2, "durationMinutes": 60, "preferredRoom": "R1"
            }
        ]
    });

    let output = run_pipeline(raw).expect("scenario 2 must be feasible");
    assert_eq!(output.assignments.len(), 4);

    let mut class_slots: HashSet<(String, String, String)> = HashSet::new();
    let mut teacher_slots: HashSet<(String, String, String)> = HashSet::new();
    let mut room_slots: HashMap<(String, String, String), u32> = HashMap::new();

    for a in &output.assignments {
        let key = (a.class.clone(), a.time_slot.day_name.clone(), a.time_slot.start.clone());
        assert!(class_slots.insert(key), "class 5A double-booked");
        let tkey = (a.teacher.clone(), a.time_slot.day_name.clone(), a.time_slot.start.clone());
        assert!(teacher_slots.insert(tkey));
        if !a.classroom.is_empty() {
            let rkey = (a.classroom.clone(), a.time_slot.day_name.clone(), a.time_slot.start.clone());
            *room_slots.entry(rkey).or_insert(0) += 1;
        }
    }
    assert!(room_slots.values().all(|&count| count == 1), "room double-booked");
}

/// Scenario 4: a PE session and a same-class Math session must respect the
/// transition buffer whenever they land on the same weekday.
#[test]
fn scenario_four_pe_transition_buffer_is_respected_when_same_day() {
    let raw = json!({
        "term": {
            "startDate": "2024-01-01",
            "weeks": 2,
            "days": ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
        },
        "lessonTemplates": [
            {
                "class": "5A", "teacher": "Carol", "subject": "idrott",
                "sessionsPerWeek": 1, "durationMinutes": 60
            },
            {
                "class": "5A", "teacher": "Alice", "subject": "Math",
                "sessionsPerWeek": 1, "durationMinutes": 60
            }
        ],
        "constraints": { "physicalEducationBufferMinutes": 15 }
    });

    let output = run_pipeline(raw).expect("scenario 4 must be feasible");
    let pe = output
        .assignments
        .iter()
        .find(|a| a.subject.eq_ignore_ascii_case("idrott") && a.term_week == 1)
        .expect("PE session present");
    let math = output
        .assignments
        .iter()
        .find(|a| a.subject == "Math" && a.term_week == 1)
        .expect("Math session present");

    if pe.time_slot.day_name == math.time_slot.day_name {
        assert!(
            minutes(&math.time_slot.start) >= minutes(&pe.time_slot.end) + 15,
            "Math must start at least 15 minutes after PE ends on the same day"
        );
    }
}

/// Scenario 5: a class with four back-to-back sessions spanning the lunch
/// window gets exactly one lunch per populated day, disjoint from every
/// session, landing on a granularity-aligned candidate start.
#[test]
fn scenario_five_lunch_is_placed_disjoint_from_every_session() {
    let raw = json!({
        "term": {
            "startDate": "2024-01-01",
            "weeks": 1,
            "days": ["Monday"],
            "dailySlots": [
                {"start": "08:30", "end": "09:30"},
                {"start": "09:30", "end": "10:30"},
                {"start": "10:30", "end": "11:30"},
                {"start": "11:30", "end": "12:30"}
            ]
        },
        "lessonTemplates": [
            {
                "class": "5A", "teacher": "Alice", "subject": "Math",
                "sessionsPerWeek": 1, "durationMinutes": 60
            },
            {
                "class": "5A", "teacher": "Bob", "subject": "English",
                "sessionsPerWeek": 1, "durationMinutes": 60
            },
            {
                "class": "5A", "teacher": "Carol", "subject": "Science",
                "sessionsPerWeek": 1, "durationMinutes": 60
            },
            {
                "class": "5A", "teacher": "Dave", "subject": "History",
                "sessionsPerWeek": 1, "durationMinutes": 60
            }
        ],
        "constraints": {
            "lunchBreak": {
                "windowStart": "11:00",
                "windowEnd": "12:30",
                "duration": 30,
                "granularity": 15
            }
        }
    });

    let output = run_pipeline(raw).expect("scenario 5 must be feasible");
    let lunches: Vec<_> = output.assignments.iter().filter(|a| a.subject == "Lunch").collect();
    assert_eq!(lunches.len(), 1, "exactly one Monday lunch for the class");

    let lunch = lunches[0];
    let lunch_start = minutes(&lunch.time_slot.start);
    let lunch_end = minutes(&lunch.time_slot.end);
    assert_eq!(lunch_end - lunch_start, 30);
    let candidates: HashSet<u32> = [660, 675, 690, 705, 720].into_iter().collect();
    assert!(candidates.contains(&lunch_start), "lunch start must be granularity-aligned");

    for a in &output.assignments {
        if a.subject == "Lunch" {
            continue;
        }
        let s = minutes(&a.time_slot.start);
        let e = minutes(&a.time_slot.end);
        assert!(e <= lunch_start || s >= lunch_end, "lunch must not overlap any session");
    }
}
