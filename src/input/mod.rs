//! The Input Normaliser (§4.1): validates and canonicalises the raw JSON
//! request into a [`NormalizedInput`] the rest of the pipeline can trust.

pub mod constraints;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::sessions::LessonTemplate;
use crate::term::{default_daily_slots, default_days, DailySlotTemplate, Term};
use crate::weekday::Weekday;
use constraints::ConstraintConfig;

/// An explicit time slot from `timeSlots` (basic mode only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicTimeSlot {
    pub day: Weekday,
    pub start: u16,
    pub end: u16,
}

/// The flat entity universe: `classes`, `teachers`, `classrooms`,
/// `subjects`, each either bare strings or `{name}` objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entities {
    pub classes: Vec<String>,
    pub teachers: Vec<String>,
    pub classrooms: Vec<String>,
    pub subjects: Vec<String>,
}

/// The validated, canonicalised request bundle handed to the rest of the
/// pipeline.
#[derive(Debug, Clone)]
pub struct NormalizedInput {
    pub term: Term,
    pub lesson_templates: Vec<LessonTemplate>,
    pub entities: Entities,
    pub time_slots: Vec<BasicTimeSlot>,
    pub constraints: ConstraintConfig,
    pub debug: bool,
}

impl NormalizedInput {
    /// Structured mode triggers whenever `lessonTemplates` is non-empty
    /// (§2); otherwise basic mode is used.
    pub fn is_structured(&self) -> bool {
        !self.lesson_templates.is_empty()
    }
}

/// Entry point: parses and validates the whole request body.
pub fn normalize(raw: &Value) -> PipelineResult<NormalizedInput> {
    let root = raw.as_object().ok_or_else(|| {
        PipelineError::invalid_input("$", "request body must be a JSON object")
    })?;

    let debug = root
        .get("debug")
        .or_else(|| root.get("debugMode"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let lesson_templates_raw = root.get("lessonTemplates").and_then(Value::as_array);
    let is_structured = lesson_templates_raw.map(|a| !a.is_empty()).unwrap_or(false);

    let slots_were_explicit = root
        .get("term")
        .and_then(|t| t.get("dailySlots"))
        .and_then(Value::as_array)
        .map(|a| !a.is_empty())
        .unwrap_or(false);

    let term = parse_term(root.get("term"), is_structured)?;

    let mut constraints = match root.get("constraints") {
        Some(value) => serde_json::from_value::<ConstraintConfig>(value.clone())
            .map_err(|e| PipelineError::invalid_input("constraints", e.to_string()))?,
        None => ConstraintConfig::default(),
    };

    // §9's resolved open question: when explicit daily slots are supplied
    // and neither earliest nor latest start was set by the user, no
    // class-start window is posted at all. When slots were defaulted, the
    // 08:00/10:00 preset from §4.1's table still applies.
    if !slots_were_explicit {
        if constraints.class_earliest_start_minutes.is_none() {
            constraints.class_earliest_start_minutes = Some(8 * 60);
        }
        if constraints.class_latest_start_minutes.is_none() {
            constraints.class_latest_start_minutes = Some(10 * 60);
        }
    }
    constraints.validate()?;

    let entities = parse_entities(root);

    let lesson_templates = match lesson_templates_raw {
        Some(raw_templates) => parse_lesson_templates(raw_templates)?,
        None => Vec::new(),
    };

    let time_slots = match root.get("timeSlots").and_then(Value::as_array) {
        Some(raw_slots) => parse_basic_time_slots(raw_slots),
        None => Vec::new(),
    };

    if !is_structured && entities.classes.is_empty()
        || !is_structured && entities.subjects.is_empty()
    {
        return Err(PipelineError::invalid_input(
            "classes/subjects",
            "basic mode requires at least one class and one subject",
        ));
    }
    if !is_structured && time_slots.is_empty() {
        return Err(PipelineError::invalid_input(
            "timeSlots",
            "basic mode requires at least one explicit time slot",
        ));
    }

    debug!(
        structured = is_structured,
        templates = lesson_templates.len(),
        time_slots = time_slots.len(),
        "input normalised"
    );

    Ok(NormalizedInput {
        term,
        lesson_templates,
        entities,
        time_slots,
        constraints,
        debug,
    })
}

fn parse_term(raw: Option<&Value>, is_structured: bool) -> PipelineResult<Term> {
    let obj = raw.and_then(Value::as_object);

    let start_date = match obj.and_then(|o| o.get("startDate")).and_then(Value::as_str) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| PipelineError::invalid_input("term.startDate", "must be YYYY-MM-DD"))?,
        None if is_structured => {
            return Err(PipelineError::invalid_input(
                "term.startDate",
                "is required in structured mode",
            ))
        }
        None => chrono::Utc::now().date_naive(),
    };

    let weeks = match obj.and_then(|o| o.get("weeks")) {
        Some(v) => coerce_positive_u32(v, "term.weeks")?,
        None => 2,
    };

    let days = match obj.and_then(|o| o.get("days")).and_then(Value::as_array) {
        Some(values) => parse_days(values)?,
        None => default_days(),
    };

    let daily_slots = match obj
        .and_then(|o| o.get("dailySlots"))
        .and_then(Value::as_array)
    {
        Some(values) if !values.is_empty() => parse_daily_slots(values)?,
        _ => default_daily_slots(),
    };

    let name = obj
        .and_then(|o| o.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Term {
        name,
        start_date,
        weeks,
        days,
        daily_slots,
    })
}

fn parse_days(values: &[Value]) -> PipelineResult<Vec<Weekday>> {
    let mut days = Vec::new();
    for value in values {
        let raw = value
            .as_str()
            .ok_or_else(|| PipelineError::invalid_input("term.days", "entries must be strings"))?;
        let day = Weekday::parse(raw)
            .ok_or_else(|| PipelineError::invalid_input("term.days", format!("unrecognised weekday '{raw}'")))?;
        if day.is_weekend() {
            return Err(PipelineError::invalid_input(
                "term.days",
                format!("'{raw}' is a weekend day; only Monday-Friday are supported"),
            ));
        }
        if !days.contains(&day) {
            days.push(day);
        }
    }
    if days.is_empty() {
        return Err(PipelineError::invalid_input(
            "term.days",
            "must include at least one weekday",
        ));
    }
    Ok(days)
}

fn parse_daily_slots(values: &[Value]) -> PipelineResult<Vec<DailySlotTemplate>> {
    let mut slots = Vec::new();
    for (idx, value) in values.iter().enumerate() {
        let obj = value.as_object().ok_or_else(|| {
            PipelineError::invalid_input(format!("term.dailySlots[{idx}]"), "must be an object")
        })?;
        let start = parse_minutes_field(obj.get("start"), &format!("term.dailySlots[{idx}].start"))?;
        let end = parse_minutes_field(obj.get("end"), &format!("term.dailySlots[{idx}].end"))?;
        if end <= start {
            return Err(PipelineError::invalid_input(
                format!("term.dailySlots[{idx}]"),
                "end must be after start",
            ));
        }
        slots.push(DailySlotTemplate { start, end });
    }
    if slots.is_empty() {
        return Err(PipelineError::invalid_input(
            "term.dailySlots",
            "must include at least one slot",
        ));
    }
    Ok(slots)
}

/// Parses "HH:MM" or a raw minute-of-day integer (§4.1).
fn parse_minutes_field(value: Option<&Value>, field: &str) -> PipelineResult<u16> {
    match value {
        Some(Value::String(s)) => parse_hhmm(s).map_err(|_| {
            PipelineError::invalid_input(field.to_string(), "must be \"HH:MM\" or a minute integer")
        }),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u16::try_from(v).ok())
            .ok_or_else(|| PipelineError::invalid_input(field.to_string(), "must be a non-negative integer")),
        _ => Err(PipelineError::invalid_input(field.to_string(), "is required")),
    }
}

fn parse_hhmm(raw: &str) -> Result<u16, ()> {
    let (h, m) = raw.split_once(':').ok_or(())?;
    let h: u16 = h.trim().parse().map_err(|_| ())?;
    let m: u16 = m.trim().parse().map_err(|_| ())?;
    if m >= 60 {
        return Err(());
    }
    Ok(h * 60 + m)
}

fn coerce_positive_u32(value: &Value, field: &str) -> PipelineResult<u32> {
    let n = value
        .as_i64()
        .ok_or_else(|| PipelineError::invalid_input(field.to_string(), "must be an integer"))?;
    if n <= 0 {
        return Err(PipelineError::invalid_input(
            field.to_string(),
            "must be greater than zero",
        ));
    }
    Ok(n as u32)
}

fn extract_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Object(obj) => obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

fn parse_entities(root: &serde_json::Map<String, Value>) -> Entities {
    let list = |key: &str| -> Vec<String> {
        root.get(key)
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(extract_name).collect())
            .unwrap_or_default()
    };
    Entities {
        classes: list("classes"),
        teachers: list("teachers"),
        classrooms: list("classrooms"),
        subjects: list("subjects"),
    }
}

/// Resolves the first present alias among `keys` in `obj`.
fn first_present<'a>(obj: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn parse_lesson_templates(raw: &[Value]) -> PipelineResult<Vec<LessonTemplate>> {
    let mut templates = Vec::with_capacity(raw.len());
    for (idx, entry) in raw.iter().enumerate() {
        let obj = entry.as_object().ok_or_else(|| {
            PipelineError::invalid_input(format!("lessonTemplates[{idx}]"), "must be an object")
        })?;

        let class_name = first_present(obj, &["class", "className"])
            .and_then(extract_name)
            .ok_or_else(|| {
                PipelineError::invalid_input(format!("lessonTemplates[{idx}].class"), "is required")
            })?;
        let teacher_name = first_present(obj, &["teacher", "teacherName"])
            .and_then(extract_name)
            .ok_or_else(|| {
                PipelineError::invalid_input(format!("lessonTemplates[{idx}].teacher"), "is required")
            })?;
        let subject_name = first_present(obj, &["subject", "subjectName"])
            .and_then(extract_name)
            .ok_or_else(|| {
                PipelineError::invalid_input(format!("lessonTemplates[{idx}].subject"), "is required")
            })?;

        let sessions_value = first_present(
            obj,
            &[
                "sessionsPerWeek",
                "lessonsPerWeek",
                "weeklyLessons",
                "frequencyPerWeek",
            ],
        )
        .ok_or_else(|| {
            PipelineError::invalid_input(
                format!("lessonTemplates[{idx}].sessionsPerWeek"),
                "is required",
            )
        })?;
        let sessions_per_week = coerce_positive_u32(
            sessions_value,
            &format!("lessonTemplates[{idx}].sessionsPerWeek"),
        )?;

        let duration_value =
            first_present(obj, &["durationMinutes", "duration", "lengthMinutes"]).ok_or_else(|| {
                PipelineError::invalid_input(
                    format!("lessonTemplates[{idx}].durationMinutes"),
                    "is required",
                )
            })?;
        let duration = coerce_positive_u32(
            duration_value,
            &format!("lessonTemplates[{idx}].durationMinutes"),
        )?;
        let duration = u16::try_from(duration).map_err(|_| {
            PipelineError::invalid_input(
                format!("lessonTemplates[{idx}].durationMinutes"),
                "is too large",
            )
        })?;

        let preferred_room = first_present(obj, &["preferredRoom", "room", "classroom"])
            .and_then(extract_name);

        let allowed_rooms = match first_present(obj, &["allowedRooms", "rooms"]) {
            Some(Value::Array(values)) => values.iter().filter_map(extract_name).collect(),
            Some(Value::String(s)) => vec![s.trim().to_string()],
            _ => Vec::new(),
        };

        templates.push(LessonTemplate {
            class_name,
            teacher_name,
            subject_name,
            sessions_per_week,
            duration,
            preferred_room,
            allowed_rooms,
        });
    }
    Ok(templates)
}

fn parse_basic_time_slots(raw: &[Value]) -> Vec<BasicTimeSlot> {
    let mut slots = Vec::new();
    for entry in raw {
        let (day_raw, start_raw, end_raw) = match entry {
            Value::Object(obj) => (
                obj.get("day").and_then(Value::as_str).unwrap_or("Monday").to_string(),
                obj.get("start").cloned(),
                obj.get("end").cloned(),
            ),
            Value::Array(items) if items.len() >= 2 => (
                items
                    .get(2)
                    .and_then(Value::as_str)
                    .unwrap_or("Monday")
                    .to_string(),
                items.first().cloned(),
                items.get(1).cloned(),
            ),
            _ => continue,
        };

        let Some(day) = Weekday::parse(&day_raw) else {
            warn!(day = %day_raw, "skipping time slot with unrecognised weekday");
            continue;
        };
        if day.is_weekend() {
            continue;
        }
        let (Some(start_raw), Some(end_raw)) = (start_raw, end_raw) else {
            continue;
        };
        let Ok(start) = parse_minutes_field(Some(&start_raw), "timeSlots[].start") else {
            continue;
        };
        let Ok(end) = parse_minutes_field(Some(&end_raw), "timeSlots[].end") else {
            continue;
        };
        if end <= start {
            continue;
        }
        slots.push(BasicTimeSlot { day, start, end });
    }
    slots
}
