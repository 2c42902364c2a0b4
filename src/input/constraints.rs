//! The `constraints` object (§4.1's option table): all fields optional,
//! each with a default matching the original solver's behaviour.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

use crate::error::PipelineError;

/// Parses "HH:MM" or a raw minute-of-day integer, the same rule §4.1
/// applies to `term.dailySlots` — every time-of-day field in the request
/// accepts either form, not just the term calendar's.
fn minutes_from_value(v: &serde_json::Value) -> Result<u16, String> {
    match v {
        serde_json::Value::String(s) => parse_hhmm(s)
            .map_err(|_| format!("'{s}' must be \"HH:MM\" or a minute-of-day integer")),
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|x| u16::try_from(x).ok())
            .ok_or_else(|| "must be a non-negative integer".to_string()),
        _ => Err("must be a string or integer".to_string()),
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

fn deserialize_minutes<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    minutes_from_value(&value).map_err(serde::de::Error::custom)
}

fn deserialize_minutes_opt<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => minutes_from_value(&v).map(Some).map_err(serde::de::Error::custom),
    }
}

fn default_max_class_sessions_per_day() -> u32 {
    5
}
fn default_max_teacher_sessions_per_day() -> u32 {
    3
}
fn default_max_class_idle_minutes() -> u32 {
    120
}
fn default_max_teacher_idle_minutes() -> u32 {
    180
}
fn default_pe_buffer_minutes() -> u32 {
    15
}
fn default_pe_subjects() -> BTreeSet<String> {
    [
        "idrott",
        "idrott och hälsa",
        "physical education",
        "pe",
        "gymnastik",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// The lunch-break sub-object, §4.1's last row and §4.4's lunch-placement
/// constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LunchConfig {
    #[serde(default = "default_lunch_enabled")]
    pub enabled: bool,
    #[serde(default = "default_lunch_window_start", deserialize_with = "deserialize_minutes")]
    pub window_start: u16,
    #[serde(default = "default_lunch_window_end", deserialize_with = "deserialize_minutes")]
    pub window_end: u16,
    #[serde(default = "default_lunch_duration")]
    pub duration: u16,
    #[serde(default = "default_lunch_granularity")]
    pub granularity: u16,
}

fn default_lunch_enabled() -> bool {
    true
}
fn default_lunch_window_start() -> u16 {
    10 * 60 + 30
}
fn default_lunch_window_end() -> u16 {
    12 * 60 + 30
}
fn default_lunch_duration() -> u16 {
    30
}
fn default_lunch_granularity() -> u16 {
    5
}

impl Default for LunchConfig {
    fn default() -> Self {
        LunchConfig {
            enabled: default_lunch_enabled(),
            window_start: default_lunch_window_start(),
            window_end: default_lunch_window_end(),
            duration: default_lunch_duration(),
            granularity: default_lunch_granularity(),
        }
    }
}

impl LunchConfig {
    /// The candidate lunch-start minutes: `{windowStart, windowStart +
    /// granularity, ..., windowEnd - duration}`.
    pub fn candidate_starts(&self) -> Vec<u16> {
        if !self.enabled || self.window_end < self.window_start + self.duration {
            return Vec::new();
        }
        let last = self.window_end - self.duration;
        let mut out = Vec::new();
        let mut minute = self.window_start;
        while minute <= last {
            out.push(minute);
            minute += self.granularity;
        }
        out
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.window_end <= self.window_start {
            return Err(PipelineError::invalid_input(
                "constraints.lunchBreak.windowEnd",
                "must be after windowStart",
            ));
        }
        if self.duration == 0 {
            return Err(PipelineError::invalid_input(
                "constraints.lunchBreak.duration",
                "must be positive",
            ));
        }
        if self.granularity == 0 {
            return Err(PipelineError::invalid_input(
                "constraints.lunchBreak.granularity",
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// The fully defaulted constraint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintConfig {
    #[serde(default = "default_max_class_sessions_per_day")]
    pub max_class_sessions_per_day: u32,
    #[serde(default = "default_max_teacher_sessions_per_day")]
    pub max_teacher_sessions_per_day: u32,
    #[serde(default = "default_max_class_idle_minutes")]
    pub max_class_idle_minutes: u32,
    #[serde(default = "default_max_teacher_idle_minutes")]
    pub max_teacher_idle_minutes: u32,
    #[serde(default)]
    pub disable_subject_spread: bool,
    #[serde(default)]
    pub disable_transition_buffers: bool,
    #[serde(default = "default_pe_buffer_minutes")]
    pub physical_education_buffer_minutes: u32,
    #[serde(default = "default_pe_subjects")]
    pub physical_education_subjects: BTreeSet<String>,
    /// `None` means "not configured". Left unset, no class-start window
    /// constraint is posted unless the request omitted `term.dailySlots`
    /// entirely (§9's resolved open question): when slots are defaulted,
    /// the solver still applies the 08:00/10:00 preset.
    #[serde(default, deserialize_with = "deserialize_minutes_opt")]
    pub class_earliest_start_minutes: Option<u16>,
    #[serde(default, deserialize_with = "deserialize_minutes_opt")]
    pub class_latest_start_minutes: Option<u16>,
    #[serde(default)]
    pub lunch_break: LunchConfig,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        ConstraintConfig {
            max_class_sessions_per_day: default_max_class_sessions_per_day(),
            max_teacher_sessions_per_day: default_max_teacher_sessions_per_day(),
            max_class_idle_minutes: default_max_class_idle_minutes(),
            max_teacher_idle_minutes: default_max_teacher_idle_minutes(),
            disable_subject_spread: false,
            disable_transition_buffers: false,
            physical_education_buffer_minutes: default_pe_buffer_minutes(),
            physical_education_subjects: default_pe_subjects(),
            class_earliest_start_minutes: None,
            class_latest_start_minutes: None,
            lunch_break: LunchConfig::default(),
        }
    }
}

impl ConstraintConfig {
    /// Case-insensitive exact-match PE check (§4.3's buffer-required rule).
    pub fn is_physical_education(&self, subject: &str) -> bool {
        let normalized = subject.trim().to_lowercase();
        self.physical_education_subjects
            .iter()
            .any(|candidate| candidate.to_lowercase() == normalized)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if let (Some(earliest), Some(latest)) = (
            self.class_earliest_start_minutes,
            self.class_latest_start_minutes,
        ) {
            if latest < earliest {
                return Err(PipelineError::invalid_input(
                    "constraints.classLatestStartMinutes",
                    "must be greater than or equal to classEarliestStartMinutes",
                ));
            }
        }
        self.lunch_break.validate()
    }
}
