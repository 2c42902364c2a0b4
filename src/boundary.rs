//! The JSON Boundary (§4.6): the pipeline's only entry point,
//! `run_pipeline`, consumed by `src/bin/schedule-solver.rs`. Dispatches to
//! the basic or structured solver profile depending on whether
//! `lessonTemplates` is present (§2), and never touches stdin/stdout
//! itself — that stays in the binary so this function is unit-testable
//! without a process boundary.

use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{info, instrument};

use crate::basic;
use crate::error::{PipelineError, PipelineResult};
use crate::extract::{extract_structured, SolveOutput};
use crate::input::{self, NormalizedInput};
use crate::model::solve_structured;
use crate::sessions::{LessonTemplate, SessionBuilder};
use crate::slots::SlotGrid;

/// `SCHEDULE_SOLVER_TIMEOUT_SECONDS` env override for the solver's
/// wall-clock ceiling (§0.3/§5), read once per call rather than cached at
/// process startup so tests can vary it.
fn solver_timeout() -> Duration {
    std::env::var("SCHEDULE_SOLVER_TIMEOUT_SECONDS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(60))
}

#[instrument(skip_all)]
pub fn run_pipeline(raw: Value) -> PipelineResult<SolveOutput> {
    let started = Instant::now();
    let normalized = input::normalize(&raw)?;

    let mut output = if normalized.is_structured() {
        run_structured(&normalized)?
    } else {
        basic::solve_basic(&normalized.entities, &normalized.time_slots)?
    };

    output.meta.solution_time = started.elapsed().as_secs_f64();
    info!(
        solution_time = output.meta.solution_time,
        assignments = output.assignments.len(),
        "pipeline complete"
    );
    Ok(output)
}

fn run_structured(normalized: &NormalizedInput) -> PipelineResult<SolveOutput> {
    let grid = SlotGrid::expand(&normalized.term);
    let rooms = room_universe(normalized);
    let (class_indices, class_names) = index_universe(&normalized.entities.classes, &normalized.lesson_templates, |t| &t.class_name);
    let (teacher_indices, _) = index_universe(&normalized.entities.teachers, &normalized.lesson_templates, |t| &t.teacher_name);
    let _ = class_names;

    let builder = SessionBuilder::new(&normalized.term, &grid, &normalized.constraints, &rooms);
    let sessions = builder.build(&normalized.lesson_templates, &class_indices, &teacher_indices)?;

    let outcome = solve_structured(
        &sessions,
        &grid,
        &rooms,
        &normalized.constraints,
        solver_timeout(),
        normalized.debug,
    )?;

    Ok(extract_structured(
        &sessions,
        &grid,
        &rooms,
        &outcome,
        &normalized.constraints,
        &normalized.term,
    ))
}

/// Builds the room universe: declared `classrooms`, extended with every
/// room a template prefers or allows but that was not already declared
/// (§6: `classrooms` "seed[s] the universe in structured mode").
///
/// When nothing in the request names a room at all, a single unnamed
/// placeholder room is used so every session still gets a non-empty
/// room-domain (§4.3's "empty lists fall back to 'any room'" requires at
/// least one room to fall back to) instead of spuriously failing with
/// `InfeasibleInput` the moment no `classrooms` were declared.
fn room_universe(normalized: &NormalizedInput) -> Vec<String> {
    let mut rooms = normalized.entities.classrooms.clone();
    for template in &normalized.lesson_templates {
        for room in template.room_preference_order() {
            if !rooms.contains(&room) {
                rooms.push(room);
            }
        }
    }
    if rooms.is_empty() {
        rooms.push(String::new());
    }
    rooms
}

/// Builds a name -> index map covering the declared entity list extended
/// with every name a template references but that was not already
/// declared, preserving declaration order followed by first-reference
/// order (deterministic index assignment, §4.4's ordering rule).
fn index_universe(
    declared: &[String],
    templates: &[LessonTemplate],
    name_of: impl Fn(&LessonTemplate) -> &String,
) -> (hashbrown::HashMap<String, usize>, Vec<String>) {
    let mut names = declared.to_vec();
    for template in templates {
        let name = name_of(template);
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    let indices = names
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), idx))
        .collect();
    (indices, names)
}

/// The shape written to stdout on success or failure (§4.6/§6).
#[derive(Debug, serde::Serialize)]
#[serde(untagged)]
pub enum Response {
    Success {
        success: bool,
        assignments: Vec<crate::extract::Assignment>,
        #[serde(rename = "scheduleByDay")]
        schedule_by_day: std::collections::BTreeMap<String, Vec<crate::extract::Assignment>>,
        meta: crate::extract::Meta,
    },
    Failure {
        success: bool,
        error: String,
        #[serde(rename = "errorType")]
        error_type: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },
}

impl Response {
    pub fn success(output: SolveOutput) -> Response {
        Response::Success {
            success: true,
            assignments: output.assignments,
            schedule_by_day: output.schedule_by_day,
            meta: output.meta,
        }
    }

    pub fn failure(err: &PipelineError) -> Response {
        Response::Failure {
            success: false,
            error: err.to_string(),
            error_type: err.error_type(),
            details: err.details(),
        }
    }
}
