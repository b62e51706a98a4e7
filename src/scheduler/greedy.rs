//! Randomized greedy timetable generator.
//!
//! # Algorithm
//!
//! For each class-group (catalog order), for each subject taught to it
//! (catalog order):
//! 1. Resolve one teacher with the configured [`TeacherPolicy`].
//! 2. For each of the subject's weekly lessons, run up to `max_trials`
//!    trials. A trial picks a random day on which the teacher has an
//!    available period, takes the first period of that day where the
//!    class-group is free and the teacher available, picks a random room
//!    free at that slot, and commits through [`Schedule::try_insert`].
//! 3. A lesson that exhausts its trials is reported and skipped. Lessons
//!    beyond the grid's slot count are reported together without trials.
//!
//! Never fails hard; gaps come back as warnings.
//!
//! # Complexity
//! O(L * T * (P + R + A)) where L=lessons (capped at the slot count per
//! pair), T=max trials, P=periods per
//! day, R=rooms, A=assignments placed so far. Termination is guaranteed
//! by the trial cap.

use chrono::Weekday;
use rand::prelude::IndexedRandom;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::models::{
    Catalog, ClassGroup, LessonAssignment, Room, Schedule, Slot, SlotGrid, Subject, Teacher,
};

/// Default number of placement trials per lesson.
pub const DEFAULT_MAX_TRIALS: usize = 20;

/// How the greedy generator picks a teacher for a (class-group, subject) pair.
///
/// The exact path never uses this: its model lets the solver choose among
/// every qualified teacher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeacherPolicy {
    /// First qualified teacher in catalog order.
    #[default]
    FirstQualified,
    /// A qualified teacher drawn from the run's RNG.
    RandomQualified,
}

/// Randomized greedy generator with a per-lesson trial cap.
///
/// # Example
///
/// ```
/// use u_timetable::scheduler::GreedyScheduler;
/// use u_timetable::models::{Catalog, ClassGroup, Room, SlotGrid, Subject, Teacher};
///
/// let catalog = Catalog::new()
///     .with_class_group(ClassGroup::new("6A", "6"))
///     .with_teacher(Teacher::new("Silva").with_subject("Math"))
///     .with_subject(Subject::new("Math", 3).for_group("6"))
///     .with_room(Room::new("R1"));
///
/// let (schedule, warnings) = GreedyScheduler::new()
///     .schedule_seeded(&catalog, &SlotGrid::two_blocks(), 42);
/// assert!(schedule.conflicts().is_empty());
/// assert_eq!(schedule.len() + warnings.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct GreedyScheduler {
    max_trials: usize,
    teacher_policy: TeacherPolicy,
    enforce_room_fit: bool,
}

impl GreedyScheduler {
    /// Creates a generator with default settings.
    pub fn new() -> Self {
        Self {
            max_trials: DEFAULT_MAX_TRIALS,
            teacher_policy: TeacherPolicy::default(),
            enforce_room_fit: false,
        }
    }

    /// Sets the trial cap per lesson.
    pub fn with_max_trials(mut self, max_trials: usize) -> Self {
        self.max_trials = max_trials;
        self
    }

    /// Sets the teacher selection policy.
    pub fn with_teacher_policy(mut self, policy: TeacherPolicy) -> Self {
        self.teacher_policy = policy;
        self
    }

    /// Restricts rooms to those that fit the class-group and subject.
    pub fn with_room_fit(mut self, enforce: bool) -> Self {
        self.enforce_room_fit = enforce;
        self
    }

    /// Runs with a `SmallRng` seeded from `seed`.
    pub fn schedule_seeded(
        &self,
        catalog: &Catalog,
        grid: &SlotGrid,
        seed: u64,
    ) -> (Schedule, Vec<Diagnostic>) {
        let mut rng = SmallRng::seed_from_u64(seed);
        self.schedule(catalog, grid, &mut rng)
    }

    /// Builds a fresh schedule.
    ///
    /// Returns the schedule and one warning per skipped pair or
    /// unplaced lesson.
    pub fn schedule<R: Rng + ?Sized>(
        &self,
        catalog: &Catalog,
        grid: &SlotGrid,
        rng: &mut R,
    ) -> (Schedule, Vec<Diagnostic>) {
        let mut schedule = Schedule::new();
        let mut warnings = Vec::new();

        for group in &catalog.class_groups {
            for subject in catalog.subjects_for(group) {
                self.place_pair(catalog, grid, group, subject, &mut schedule, &mut warnings, rng);
            }
        }

        debug!(
            placed = schedule.len(),
            warnings = warnings.len(),
            "Greedy generation finished"
        );
        (schedule, warnings)
    }

    #[allow(clippy::too_many_arguments)]
    fn place_pair<R: Rng + ?Sized>(
        &self,
        catalog: &Catalog,
        grid: &SlotGrid,
        group: &ClassGroup,
        subject: &Subject,
        schedule: &mut Schedule,
        warnings: &mut Vec<Diagnostic>,
        rng: &mut R,
    ) {
        let Some(teacher) = self.pick_teacher(catalog, subject, rng) else {
            warnings.push(
                Diagnostic::warning(
                    DiagnosticKind::NoQualifiedTeacher,
                    format!("no teacher qualified for '{}'", subject.name),
                )
                .for_pair(&group.name, &subject.name),
            );
            return;
        };

        let rooms: Vec<&Room> = catalog
            .eligible_rooms(group, subject, self.enforce_room_fit)
            .collect();
        if rooms.is_empty() {
            warnings.push(
                Diagnostic::warning(DiagnosticKind::NoEligibleRoom, "no eligible room")
                    .for_pair(&group.name, &subject.name),
            );
            return;
        }

        let days: Vec<Weekday> = grid
            .days
            .iter()
            .copied()
            .filter(|&day| {
                grid.periods_on(day)
                    .into_iter()
                    .any(|p| teacher.is_available(Slot::new(day, p)))
            })
            .collect();
        if days.is_empty() {
            warnings.push(
                Diagnostic::warning(
                    DiagnosticKind::NoAvailableSlot,
                    format!("teacher '{}' is not available at any slot", teacher.name),
                )
                .for_pair(&group.name, &subject.name),
            );
            return;
        }

        // A class-group holds at most one lesson per slot.
        let slot_count = u32::try_from(grid.slot_count()).unwrap_or(u32::MAX);
        let placeable = subject.weekly_quota.min(slot_count);
        if placeable < subject.weekly_quota {
            warnings.push(
                Diagnostic::warning(
                    DiagnosticKind::UnplacedLesson,
                    format!(
                        "lessons {}..={} of {} exceed the grid's {} slots",
                        placeable + 1,
                        subject.weekly_quota,
                        subject.weekly_quota,
                        slot_count
                    ),
                )
                .for_pair(&group.name, &subject.name),
            );
        }

        for unit in 0..placeable {
            let placed = (0..self.max_trials).any(|_| {
                self.try_place(grid, group, subject, teacher, &rooms, &days, schedule, rng)
            });
            if !placed {
                warnings.push(
                    Diagnostic::warning(
                        DiagnosticKind::UnplacedLesson,
                        format!(
                            "lesson {} of {} not placed after {} trials",
                            unit + 1,
                            subject.weekly_quota,
                            self.max_trials
                        ),
                    )
                    .for_pair(&group.name, &subject.name),
                );
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn try_place<R: Rng + ?Sized>(
        &self,
        grid: &SlotGrid,
        group: &ClassGroup,
        subject: &Subject,
        teacher: &Teacher,
        rooms: &[&Room],
        days: &[Weekday],
        schedule: &mut Schedule,
        rng: &mut R,
    ) -> bool {
        let Some(&day) = days.choose(rng) else {
            return false;
        };
        let Some(slot) = grid
            .periods_on(day)
            .into_iter()
            .map(|p| Slot::new(day, p))
            .find(|&s| teacher.is_available(s) && schedule.is_class_group_free(&group.name, s))
        else {
            return false;
        };

        let free_rooms: Vec<&Room> = rooms
            .iter()
            .copied()
            .filter(|r| schedule.is_room_free(&r.name, slot))
            .collect();
        let Some(room) = free_rooms.choose(rng) else {
            return false;
        };

        let lesson = LessonAssignment::new(&group.name, &subject.name, &teacher.name, &room.name, slot);
        match schedule.try_insert(lesson) {
            Ok(_) => true,
            Err(conflict) => {
                trace!(%conflict, "Trial rejected");
                false
            }
        }
    }

    fn pick_teacher<'a, R: Rng + ?Sized>(
        &self,
        catalog: &'a Catalog,
        subject: &'a Subject,
        rng: &mut R,
    ) -> Option<&'a Teacher> {
        let mut qualified = catalog.qualified_teachers(&subject.name);
        match self.teacher_policy {
            TeacherPolicy::FirstQualified => qualified.next(),
            TeacherPolicy::RandomQualified => {
                let all: Vec<&'a Teacher> = qualified.collect();
                all.choose(rng).copied()
            }
        }
    }
}

impl Default for GreedyScheduler {
    fn default() -> Self {
        Self::new()
    }
}
