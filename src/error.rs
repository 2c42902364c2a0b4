//! Pipeline-wide error taxonomy.
//!
//! Every stage (`input`, `slots`, `sessions`, `model`, `extract`) returns
//! `Result<_, PipelineError>`. The JSON boundary never sees anything else —
//! panics are converted to [`PipelineError::Internal`] via `catch_unwind`
//! in `src/bin/schedule-solver.rs`'s `main`, matching the teacher's
//! `SolverError` enum in `src/algorithm/solver.rs` one layer down.

use serde::Serialize;
use thiserror::Error;

/// The five error kinds the JSON boundary can surface, per the error
/// handling design: schema violations, pre-solve infeasibility, solver
/// UNSAT, engine misbehaviour, and anything uncaught.
#[derive(Debug, Error, Clone, Serialize)]
pub enum PipelineError {
    /// Schema, typing, or value violation in the request body.
    #[error("invalid input: {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// Structurally impossible before solving even starts (empty domain).
    #[error("infeasible input: {0}")]
    InfeasibleInput(String),

    /// The constraint engine proved the model unsatisfiable.
    #[error("infeasible: {reason}")]
    Infeasible {
        reason: String,
        /// Stable labels of the constraints implicated, populated only
        /// when `debug`/`debugMode` was set on the request.
        unsat_core: Vec<String>,
    },

    /// The engine itself misbehaved (timed out, returned an inconsistent
    /// model, etc.) independent of whether the input was satisfiable.
    #[error("engine error: {0}")]
    EngineError(String),

    /// Any bug that escaped the typed error paths, including caught panics.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infeasible_input(message: impl Into<String>) -> Self {
        PipelineError::InfeasibleInput(message.into())
    }

    /// The stable identifier reported in the JSON response's `errorType`
    /// field, matching the names used in §7 of the spec.
    pub fn error_type(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput { .. } => "InvalidInput",
            PipelineError::InfeasibleInput(_) => "InfeasibleInput",
            PipelineError::Infeasible { .. } => "Infeasible",
            PipelineError::EngineError(_) => "EngineError",
            PipelineError::Internal(_) => "InternalError",
        }
    }

    /// Debug-mode details attached to the response, if any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            PipelineError::Infeasible { unsat_core, .. } if !unsat_core.is_empty() => {
                Some(serde_json::json!({ "unsatCore": unsat_core }))
            }
            _ => None,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
