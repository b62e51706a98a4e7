//! Timetable generation entry point.
//!
//! [`TimetableGenerator::generate`] runs one full generation:
//!
//! 1. Readiness: an empty catalog collection aborts the run.
//! 2. Validation: blocking issues abort; the rest become warnings.
//! 3. Exact path: build the CP model, solve it, decode the solution.
//! 4. Fallback: when the exact path yields nothing and the
//!    [`FallbackPolicy`] allows it, run the [`GreedyScheduler`].
//!
//! Predictable failures never escape as errors. They are collected as
//! [`Diagnostic`]s next to a (possibly empty or partial) [`Schedule`].

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::greedy::{GreedyScheduler, TeacherPolicy, DEFAULT_MAX_TRIALS};
use super::stats::ScheduleStats;
use crate::cp::{
    CpSolver, GoodLpSolver, Overload, OverloadedResource, SolveStatus, SolverConfig,
    TimetableCpBuilder, UnresolvedPair, UnresolvedReason,
};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Severity};
use crate::models::{Catalog, Schedule, SlotGrid};
use crate::validation::validate_catalog;

/// When the greedy generator may stand in for the exact path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackPolicy {
    /// Never; a failed exact solve yields an empty schedule.
    Never,
    /// Only when the solver ran out of budget without an answer.
    #[default]
    OnTimeout,
    /// On timeout and on proven infeasibility.
    OnNoSolution,
}

impl FallbackPolicy {
    /// Whether the fallback runs after an exact solve ending in `status`.
    pub fn allows(self, status: SolveStatus) -> bool {
        match self {
            Self::Never => false,
            Self::OnTimeout => status == SolveStatus::TimeoutNoSolution,
            Self::OnNoSolution => !status.has_solution(),
        }
    }
}

/// Generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Exact solver limits.
    pub solver: SolverConfig,
    /// Fallback policy.
    pub fallback: FallbackPolicy,
    /// Greedy RNG seed. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Greedy trial cap per lesson.
    pub max_trials: usize,
    /// Greedy teacher selection.
    pub teacher_policy: TeacherPolicy,
    /// Match room type and capacity on both paths.
    pub enforce_room_fit: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            fallback: FallbackPolicy::default(),
            seed: None,
            max_trials: DEFAULT_MAX_TRIALS,
            teacher_policy: TeacherPolicy::default(),
            enforce_room_fit: false,
        }
    }
}

impl GeneratorConfig {
    /// Sets the exact solver limits.
    pub fn with_solver_config(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Sets the exact solver's wall-clock budget.
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.solver.time_limit = time_limit;
        self
    }

    /// Sets the fallback policy.
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Fixes the greedy RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the greedy trial cap per lesson.
    pub fn with_max_trials(mut self, max_trials: usize) -> Self {
        self.max_trials = max_trials;
        self
    }

    /// Sets the greedy teacher policy.
    pub fn with_teacher_policy(mut self, policy: TeacherPolicy) -> Self {
        self.teacher_policy = policy;
        self
    }

    /// Enables room type and capacity matching.
    pub fn with_room_fit(mut self, enforce: bool) -> Self {
        self.enforce_room_fit = enforce;
        self
    }
}

/// Which path produced the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The exact solver's result. Without a solution the schedule is empty.
    Exact(SolveStatus),
    /// The greedy generator ran after the exact solve ended in `after`.
    Heuristic {
        /// Exact solve status that triggered the fallback.
        after: SolveStatus,
    },
    /// Nothing was attempted or the backend failed.
    Aborted,
}

/// Result of one generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Generated timetable; exclusivity always holds.
    pub schedule: Schedule,
    /// Findings, in the order they were raised.
    pub diagnostics: Vec<Diagnostic>,
    /// Path taken.
    pub outcome: Outcome,
    /// Summary against the catalog.
    pub stats: ScheduleStats,
}

impl GenerationReport {
    /// Whether every pair got exactly its weekly quota.
    pub fn is_complete(&self) -> bool {
        self.outcome != Outcome::Aborted && self.stats.is_fulfilled()
    }

    /// Whether the run produced no timetable because of a fatal problem.
    pub fn is_fatal(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Fatal)
    }

    /// Worst severity raised, if any.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.diagnostics.iter().map(|d| d.severity).max()
    }

    /// Diagnostics rendered for display.
    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }
}

/// Generates timetables with an exact solver and a greedy fallback.
///
/// # Example
///
/// ```
/// use u_timetable::models::{Catalog, ClassGroup, Room, SlotGrid, Subject, Teacher};
/// use u_timetable::scheduler::{GeneratorConfig, TimetableGenerator};
///
/// let catalog = Catalog::new()
///     .with_class_group(ClassGroup::new("6A", "6"))
///     .with_teacher(Teacher::new("Silva").with_subject("Math"))
///     .with_subject(Subject::new("Math", 3).for_group("6"))
///     .with_room(Room::new("R1"));
///
/// let report = TimetableGenerator::new(GeneratorConfig::default())
///     .generate(&catalog, &SlotGrid::two_blocks());
/// assert!(report.is_complete());
/// assert_eq!(report.schedule.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct TimetableGenerator<S = GoodLpSolver> {
    config: GeneratorConfig,
    solver: S,
}

impl TimetableGenerator<GoodLpSolver> {
    /// Creates a generator backed by [`GoodLpSolver`].
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            solver: GoodLpSolver::new(),
        }
    }
}

impl Default for TimetableGenerator<GoodLpSolver> {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl<S: CpSolver> TimetableGenerator<S> {
    /// Swaps the exact backend.
    pub fn with_solver<T: CpSolver>(self, solver: T) -> TimetableGenerator<T> {
        TimetableGenerator {
            config: self.config,
            solver,
        }
    }

    /// Current settings.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates a fresh timetable for `catalog` over `grid`.
    pub fn generate(&self, catalog: &Catalog, grid: &SlotGrid) -> GenerationReport {
        info!(
            class_groups = catalog.class_groups.len(),
            teachers = catalog.teachers.len(),
            subjects = catalog.subjects.len(),
            rooms = catalog.rooms.len(),
            slots = grid.slot_count(),
            "Generating timetable"
        );
        let mut diagnostics = Vec::new();

        if catalog.has_empty_collection() {
            diagnostics.push(Diagnostic::fatal(
                DiagnosticKind::EmptyCatalog,
                format!("catalog has no {}", empty_collections(catalog).join(", ")),
            ));
            return finish(catalog, Schedule::new(), diagnostics, Outcome::Aborted);
        }

        if let Err(errors) = validate_catalog(catalog) {
            let mut blocked = false;
            for err in errors {
                let severity = if err.kind.is_blocking() {
                    blocked = true;
                    Severity::Fatal
                } else {
                    Severity::Warning
                };
                diagnostics.push(Diagnostic::new(severity, DiagnosticKind::InvalidCatalog, err.message));
            }
            if blocked {
                return finish(catalog, Schedule::new(), diagnostics, Outcome::Aborted);
            }
        }

        let model = TimetableCpBuilder::new(catalog, grid)
            .with_room_fit(self.config.enforce_room_fit)
            .build();
        diagnostics.extend(model.unresolved().iter().map(unresolved_diagnostic));

        let status = if model.overloaded().is_empty() {
            match model.solve(&self.solver, &self.config.solver) {
                Ok((schedule, solution)) if solution.is_solution_found() => {
                    return finish(catalog, schedule, diagnostics, Outcome::Exact(solution.status));
                }
                Ok((_, solution)) => solution.status,
                Err(err) => {
                    error!(solver = self.solver.name(), %err, "Solver backend failed");
                    diagnostics.push(Diagnostic::fatal(DiagnosticKind::BackendFault, err.to_string()));
                    return finish(catalog, Schedule::new(), diagnostics, Outcome::Aborted);
                }
            }
        } else {
            diagnostics.extend(model.overloaded().iter().map(overload_diagnostic));
            SolveStatus::Infeasible
        };
        diagnostics.push(self.no_solution_diagnostic(status));

        if !self.config.fallback.allows(status) {
            warn!(?status, fallback = ?self.config.fallback, "No timetable produced");
            return finish(catalog, Schedule::new(), diagnostics, Outcome::Exact(status));
        }

        info!(?status, "Falling back to greedy generation");
        let greedy = GreedyScheduler::new()
            .with_max_trials(self.config.max_trials)
            .with_teacher_policy(self.config.teacher_policy)
            .with_room_fit(self.config.enforce_room_fit);
        let (schedule, warnings) = match self.config.seed {
            Some(seed) => greedy.schedule_seeded(catalog, grid, seed),
            None => greedy.schedule(catalog, grid, &mut SmallRng::from_os_rng()),
        };
        for warning in warnings {
            if !is_repeated(&diagnostics, &warning) {
                diagnostics.push(warning);
            }
        }
        finish(catalog, schedule, diagnostics, Outcome::Heuristic { after: status })
    }

    fn no_solution_diagnostic(&self, status: SolveStatus) -> Diagnostic {
        match status {
            SolveStatus::TimeoutNoSolution => Diagnostic::error(
                DiagnosticKind::Timeout,
                format!(
                    "no timetable found within {:?}",
                    self.config.solver.time_limit
                ),
            ),
            _ => Diagnostic::error(
                DiagnosticKind::Infeasible,
                "no timetable satisfies every constraint",
            ),
        }
    }
}

fn finish(
    catalog: &Catalog,
    schedule: Schedule,
    diagnostics: Vec<Diagnostic>,
    outcome: Outcome,
) -> GenerationReport {
    let stats = ScheduleStats::calculate(&schedule, catalog);
    info!(
        ?outcome,
        lessons = stats.total_lessons,
        required = stats.required_lessons,
        diagnostics = diagnostics.len(),
        "Generation finished"
    );
    GenerationReport {
        schedule,
        diagnostics,
        outcome,
        stats,
    }
}

fn empty_collections(catalog: &Catalog) -> Vec<&'static str> {
    [
        ("class-groups", catalog.class_groups.is_empty()),
        ("teachers", catalog.teachers.is_empty()),
        ("subjects", catalog.subjects.is_empty()),
        ("rooms", catalog.rooms.is_empty()),
    ]
    .into_iter()
    .filter_map(|(label, empty)| empty.then_some(label))
    .collect()
}

fn unresolved_diagnostic(pair: &UnresolvedPair) -> Diagnostic {
    let (kind, message) = match pair.reason {
        UnresolvedReason::NoQualifiedTeacher => (
            DiagnosticKind::NoQualifiedTeacher,
            format!("no teacher qualified for '{}'", pair.subject),
        ),
        UnresolvedReason::NoAvailableTeacher => (
            DiagnosticKind::NoAvailableSlot,
            "no qualified teacher is available at any slot".to_string(),
        ),
        UnresolvedReason::NoEligibleRoom => {
            (DiagnosticKind::NoEligibleRoom, "no eligible room".to_string())
        }
        UnresolvedReason::InsufficientSlots { available } => (
            DiagnosticKind::NoAvailableSlot,
            format!(
                "qualified teachers and eligible rooms meet in only {available} slots"
            ),
        ),
    };
    Diagnostic::warning(kind, format!("{message}; {} lessons omitted", pair.quota))
        .for_pair(&pair.class_group, &pair.subject)
}

fn overload_diagnostic(overload: &Overload) -> Diagnostic {
    let (demand, capacity) = (overload.demand, overload.capacity);
    match &overload.resource {
        OverloadedResource::ClassGroup(name) => Diagnostic::error(
            DiagnosticKind::DemandExceedsSlots,
            format!("needs {demand} lessons but the grid has {capacity} slots"),
        )
        .for_class_group(name),
        OverloadedResource::Teachers(names) => {
            let (label, verb) = if names.len() == 1 {
                ("teacher", "is")
            } else {
                ("teachers", "are")
            };
            Diagnostic::error(
                DiagnosticKind::DemandExceedsSlots,
                format!(
                    "{label} {} must give {demand} lessons but {verb} available in {capacity} slots",
                    names.join(", ")
                ),
            )
        }
        OverloadedResource::Rooms(names) => {
            let label = if names.len() == 1 { "room" } else { "rooms" };
            Diagnostic::error(
                DiagnosticKind::DemandExceedsSlots,
                format!(
                    "{label} {} must host {demand} lessons in {capacity} room-slots",
                    names.join(", ")
                ),
            )
        }
    }
}

// Pair-level findings the builder already reported; per-lesson ones always count.
fn is_repeated(existing: &[Diagnostic], warning: &Diagnostic) -> bool {
    warning.kind != DiagnosticKind::UnplacedLesson
        && existing.iter().any(|d| {
            d.kind == warning.kind
                && d.class_group == warning.class_group
                && d.subject == warning.subject
        })
}
