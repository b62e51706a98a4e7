//! Timetable generation.
//!
//! - [`TimetableGenerator`]: the entry point. Tries the exact CP path first
//!   and falls back to the greedy generator according to [`FallbackPolicy`].
//! - [`GreedyScheduler`]: randomized greedy placement with a per-lesson
//!   trial cap. Fast, never fails hard, not complete.
//! - [`ScheduleStats`]: lesson counts and quota fulfillment of a result.
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"

mod generator;
mod greedy;
mod stats;

pub use generator::{FallbackPolicy, GenerationReport, GeneratorConfig, Outcome, TimetableGenerator};
pub use greedy::{GreedyScheduler, TeacherPolicy, DEFAULT_MAX_TRIALS};
pub use stats::{QuotaStatus, ScheduleStats};
