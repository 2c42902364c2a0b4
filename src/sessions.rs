//! Lesson templates and the Session Builder (§4.3): expands each
//! [`LessonTemplate`] into one [`Session`] per (occurrence, week) and
//! prunes each session's slot-domain and room-domain before the
//! constraint model ever sees it.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::PipelineError;
use crate::input::constraints::ConstraintConfig;
use crate::slots::SlotGrid;
use crate::term::Term;

/// A catalogue entry: one subject taught to one class by one teacher,
/// `sessions_per_week` times, for `duration` minutes each time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonTemplate {
    pub class_name: String,
    pub teacher_name: String,
    pub subject_name: String,
    pub sessions_per_week: u32,
    pub duration: u16,
    pub preferred_room: Option<String>,
    /// Preferred room prepended if present; deduplicated.
    pub allowed_rooms: Vec<String>,
}

impl LessonTemplate {
    /// Builds the final ordered room list: preferred room first (if any),
    /// then the declared allowed rooms, each name appearing once.
    pub fn room_preference_order(&self) -> Vec<String> {
        let mut ordered = Vec::new();
        if let Some(preferred) = &self.preferred_room {
            ordered.push(preferred.clone());
        }
        for room in &self.allowed_rooms {
            if !ordered.contains(room) {
                ordered.push(room.clone());
            }
        }
        ordered
    }
}

/// One concrete teaching obligation: one (template, occurrence, week).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub template_index: usize,
    pub occurrence: u32,
    pub week: u32,
    pub class_name: String,
    pub teacher_name: String,
    pub subject_name: String,
    pub class_index: usize,
    pub teacher_index: usize,
    pub duration: u16,
    /// Indices into the term's [`SlotGrid`], restricted to this session's
    /// week, whose duration is sufficient and (if active) whose start is
    /// not before the class's earliest-start constraint.
    pub slot_domain: Vec<usize>,
    /// Indices into the global room list.
    pub room_domain: Vec<usize>,
    pub requires_buffer: bool,
    pub buffer_minutes: u32,
    pub color_index: u32,
}

/// Builds every [`Session`] for a term and lesson-template catalogue,
/// pruning domains as described in §4.3. Fails with
/// [`PipelineError::InfeasibleInput`] the moment any session's
/// slot-domain or room-domain would be empty.
pub struct SessionBuilder<'a> {
    term: &'a Term,
    slots: &'a SlotGrid,
    constraints: &'a ConstraintConfig,
    rooms: &'a [String],
}

impl<'a> SessionBuilder<'a> {
    pub fn new(
        term: &'a Term,
        slots: &'a SlotGrid,
        constraints: &'a ConstraintConfig,
        rooms: &'a [String],
    ) -> Self {
        SessionBuilder {
            term,
            slots,
            constraints,
            rooms,
        }
    }

    pub fn build(
        &self,
        templates: &[LessonTemplate],
        class_indices: &hashbrown::HashMap<String, usize>,
        teacher_indices: &hashbrown::HashMap<String, usize>,
    ) -> Result<Vec<Session>, PipelineError> {
        let mut sessions = Vec::new();
        let mut color_of_subject: hashbrown::HashMap<&str, u32> = hashbrown::HashMap::new();

        for (template_index, template) in templates.iter().enumerate() {
            let room_order = template.room_preference_order();
            let room_domain = self.room_domain_for(&room_order)?;
            let requires_buffer = self
                .constraints
                .is_physical_education(&template.subject_name);
            let color_index = *color_of_subject
                .entry(template.subject_name.as_str())
                .or_insert_with(|| color_of_subject.len() as u32)
                % 10;

            let class_index = *class_indices.get(&template.class_name).ok_or_else(|| {
                PipelineError::invalid_input(
                    format!("lessonTemplates[{template_index}].class"),
                    "references a class not present in the entity universe",
                )
            })?;
            let teacher_index = *teacher_indices.get(&template.teacher_name).ok_or_else(|| {
                PipelineError::invalid_input(
                    format!("lessonTemplates[{template_index}].teacher"),
                    "references a teacher not present in the entity universe",
                )
            })?;

            for week in 0..self.term.weeks {
                for occurrence in 0..template.sessions_per_week {
                    let slot_domain = self.slot_domain_for(week, template.duration);
                    if slot_domain.is_empty() {
                        return Err(PipelineError::infeasible_input(format!(
                            "no slot in week {} fits {} ({} minutes) for class {}",
                            week + 1,
                            template.subject_name,
                            template.duration,
                            template.class_name
                        )));
                    }
                    if room_domain.is_empty() {
                        return Err(PipelineError::infeasible_input(format!(
                            "no room available for {} ({})",
                            template.subject_name, template.class_name
                        )));
                    }

                    trace!(
                        template_index,
                        occurrence,
                        week,
                        slots = slot_domain.len(),
                        rooms = room_domain.len(),
                        "built session"
                    );

                    sessions.push(Session {
                        template_index,
                        occurrence,
                        week,
                        class_name: template.class_name.clone(),
                        teacher_name: template.teacher_name.clone(),
                        subject_name: template.subject_name.clone(),
                        class_index,
                        teacher_index,
                        duration: template.duration,
                        slot_domain: slot_domain.clone(),
                        room_domain: room_domain.clone(),
                        requires_buffer,
                        buffer_minutes: self.constraints.physical_education_buffer_minutes,
                        color_index,
                    });
                }
            }
        }

        debug!(total_sessions = sessions.len(), "session builder complete");
        Ok(sessions)
    }

    fn slot_domain_for(&self, week: u32, duration: u16) -> Vec<usize> {
        self.slots
            .week(week)
            .iter()
            .copied()
            .filter(|&idx| {
                let slot = self.slots.slot(idx);
                if slot.duration() < duration {
                    return false;
                }
                if let Some(earliest) = self.constraints.class_earliest_start_minutes {
                    if slot.start < earliest {
                        return false;
                    }
                }
                true
            })
            .collect()
    }

    /// Room indices drawn from the template's allowed-rooms list; an empty
    /// declared list falls back to "any room" (§4.3).
    fn room_domain_for(&self, room_order: &[String]) -> Result<Vec<usize>, PipelineError> {
        if room_order.is_empty() {
            return Ok((0..self.rooms.len()).collect());
        }
        let mut domain = Vec::new();
        for name in room_order {
            if let Some(idx) = self.rooms.iter().position(|r| r == name) {
                if !domain.contains(&idx) {
                    domain.push(idx);
                }
            }
        }
        if domain.is_empty() {
            Ok((0..self.rooms.len()).collect())
        } else {
            Ok(domain)
        }
    }
}
