//! Constraint-based school timetable solver.
//!
//! Reads a JSON term/lesson-catalogue description and produces concrete
//! `(week, day, start-time, classroom)` session assignments such that no
//! teacher, class, or room is double-booked and the configured pedagogical
//! constraints hold (daily load caps, idle-gap bounds, PE transition
//! buffers, subject spread, lunch placement, weekly-pattern replication).
//!
//! Pipeline stages, leaves first:
//! - [`input`] — validates and canonicalises the raw request.
//! - [`slots`] — materialises the term's teaching grid.
//! - [`sessions`] — expands lesson templates into per-occurrence sessions
//!   with pre-pruned slot/room domains.
//! - [`model`] — the constraint engine: decision variables, every hard
//!   constraint, and the backtracking search that solves them.
//! - [`basic`] — the basic solver profile for requests with no lesson
//!   templates.
//! - [`extract`] — turns a solved model back into human-usable
//!   assignments.
//! - [`boundary`] — wires the above into `run_pipeline`, consumed by the
//!   `schedule-solver` binary's stdin/stdout JSON filter.

pub mod basic;
pub mod boundary;
pub mod error;
pub mod extract;
pub mod input;
pub mod logging;
pub mod model;
pub mod sessions;
pub mod slots;
pub mod term;
pub mod weekday;

pub use boundary::run_pipeline;
pub use error::{PipelineError, PipelineResult};
pub use logging::{init_default_logging, init_logging, LogConfig};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
