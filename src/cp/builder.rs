//! Timetable CP formulation.
//!
//! Translates a catalog and a slot grid into a boolean [`CpModel`]:
//!
//! - One variable per assignable (class-group, subject, teacher, room,
//!   slot) tuple. A tuple is assignable when the subject applies to the
//!   class-group, the teacher is qualified for the subject, the teacher is
//!   available at the slot, the slot is schedulable and (with room fit
//!   enforced) the room fits.
//! - Quota: `Σ vars(class-group, subject) == weekly_quota`
//! - Teacher exclusivity: `Σ vars(teacher, slot) ≤ 1`
//! - Room exclusivity: `Σ vars(room, slot) ≤ 1`
//! - Class-group exclusivity: `Σ vars(class-group, slot) ≤ 1`
//!
//! Pairs whose candidate lessons cannot meet the quota (no variable, or
//! fewer distinct slots than lessons) are recorded as [`UnresolvedPair`]s
//! and get no quota constraint, so the rest of the instance stays
//! solvable.
//!
//! Before any search, three pigeonhole checks look for an [`Overload`]:
//! a class-group needing more lessons than the grid has slots, a set of
//! teachers that alone must give more lessons than they have available
//! slots, and a set of rooms that alone must host more lessons than the
//! grid has slots.
//!
//! # Reference
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - de Werra (1985), "An introduction to timetabling"

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::model::{BoolVar, CpModel};
use super::solver::{CpSolution, CpSolver, SolverConfig, SolverError};
use crate::models::{Catalog, LessonAssignment, Room, Schedule, Slot, SlotGrid, Teacher};

/// The lesson a variable stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LessonKey<'a> {
    /// Class-group name.
    pub class_group: &'a str,
    /// Subject name.
    pub subject: &'a str,
    /// Teacher name.
    pub teacher: &'a str,
    /// Room name.
    pub room: &'a str,
    /// Slot.
    pub slot: Slot,
}

impl LessonKey<'_> {
    fn to_assignment(self) -> LessonAssignment {
        LessonAssignment::new(self.class_group, self.subject, self.teacher, self.room, self.slot)
    }
}

/// Why a (class-group, subject) pair was left out of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnresolvedReason {
    /// No teacher is qualified for the subject.
    NoQualifiedTeacher,
    /// Qualified teachers exist but none is available at any slot.
    NoAvailableTeacher,
    /// No room is eligible.
    NoEligibleRoom,
    /// Candidate lessons cover fewer distinct slots than the quota.
    InsufficientSlots {
        /// Distinct slots with at least one candidate lesson.
        available: usize,
    },
}

/// A pair left out of the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedPair {
    /// Class-group name.
    pub class_group: String,
    /// Subject name.
    pub subject: String,
    /// Lessons the pair needed.
    pub quota: u32,
    /// Cause.
    pub reason: UnresolvedReason,
}

/// The resource side of an [`Overload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OverloadedResource {
    /// A class-group, against the grid.
    ClassGroup(String),
    /// Teachers that are the only candidates of some pairs, against the
    /// slots they are available in.
    Teachers(Vec<String>),
    /// Rooms that are the only candidates of some pairs, against the grid.
    Rooms(Vec<String>),
}

/// Weekly demand that cannot fit a resource, found before solving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overload {
    /// Resource concerned.
    pub resource: OverloadedResource,
    /// Lessons that can only use the resource.
    pub demand: u32,
    /// Lessons the resource can take in a week.
    pub capacity: usize,
}

/// Number of constraints generated per family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConstraintCounts {
    /// Quota equalities.
    pub quota: usize,
    /// Teacher exclusivity inequalities.
    pub teacher: usize,
    /// Room exclusivity inequalities.
    pub room: usize,
    /// Class-group exclusivity inequalities.
    pub class_group: usize,
}

/// Builds the timetable CP model from catalog data.
///
/// # Example
/// ```
/// use u_timetable::cp::{BacktrackingSolver, SolverConfig, TimetableCpBuilder};
/// use u_timetable::models::{Catalog, ClassGroup, Room, SlotGrid, Subject, Teacher};
///
/// let catalog = Catalog::new()
///     .with_class_group(ClassGroup::new("6A", "6"))
///     .with_teacher(Teacher::new("Silva").with_subject("Math"))
///     .with_subject(Subject::new("Math", 2).for_group("6A"))
///     .with_room(Room::new("R1"));
/// let grid = SlotGrid::two_blocks();
///
/// let model = TimetableCpBuilder::new(&catalog, &grid).build();
/// let (schedule, solution) = model
///     .solve(&BacktrackingSolver::new(), &SolverConfig::default())
///     .unwrap();
/// assert!(solution.is_solution_found());
/// assert_eq!(schedule.len(), 2);
/// ```
pub struct TimetableCpBuilder<'a> {
    catalog: &'a Catalog,
    grid: &'a SlotGrid,
    enforce_room_fit: bool,
}

impl<'a> TimetableCpBuilder<'a> {
    /// Creates a builder.
    pub fn new(catalog: &'a Catalog, grid: &'a SlotGrid) -> Self {
        Self {
            catalog,
            grid,
            enforce_room_fit: false,
        }
    }

    /// Restricts rooms to those that fit the class-group and subject.
    pub fn with_room_fit(mut self, enforce: bool) -> Self {
        self.enforce_room_fit = enforce;
        self
    }

    /// Builds the model.
    pub fn build(&self) -> TimetableModel<'a> {
        let catalog = self.catalog;
        let slots = self.grid.slots();

        let mut model = CpModel::new("timetable");
        let mut keys: Vec<LessonKey<'a>> = Vec::new();
        let mut unresolved = Vec::new();
        let mut overloaded = Vec::new();
        let mut counts = ConstraintCounts::default();

        let mut by_teacher: BTreeMap<(&'a str, Slot), Vec<BoolVar>> = BTreeMap::new();
        let mut by_room: BTreeMap<(&'a str, Slot), Vec<BoolVar>> = BTreeMap::new();
        let mut by_group: BTreeMap<(&'a str, Slot), Vec<BoolVar>> = BTreeMap::new();

        // Quota per set of candidate teachers (rooms), for the overload check.
        let mut teacher_demand: BTreeMap<BTreeSet<&'a str>, u32> = BTreeMap::new();
        let mut room_demand: BTreeMap<BTreeSet<&'a str>, u32> = BTreeMap::new();
        let mut teacher_slots: BTreeMap<&'a str, usize> = BTreeMap::new();

        for group in &catalog.class_groups {
            let mut demand: u32 = 0;

            for subject in catalog.subjects_for(group) {
                let teachers: Vec<&'a Teacher> =
                    catalog.qualified_teachers(&subject.name).collect();
                let rooms: Vec<&'a Room> = catalog
                    .eligible_rooms(group, subject, self.enforce_room_fit)
                    .collect();

                let reason = if teachers.is_empty() {
                    Some(UnresolvedReason::NoQualifiedTeacher)
                } else if rooms.is_empty() {
                    Some(UnresolvedReason::NoEligibleRoom)
                } else {
                    None
                };

                let mut candidates = Vec::new();
                if reason.is_none() {
                    for &slot in &slots {
                        for teacher in teachers.iter().copied().filter(|t| t.is_available(slot)) {
                            for &room in &rooms {
                                candidates.push(LessonKey {
                                    class_group: &group.name,
                                    subject: &subject.name,
                                    teacher: &teacher.name,
                                    room: &room.name,
                                    slot,
                                });
                            }
                        }
                    }
                }

                // The class-group takes one lesson per slot.
                let covered = candidates.iter().map(|k| k.slot).collect::<BTreeSet<_>>().len();
                let reason = reason.or(if candidates.is_empty() {
                    Some(UnresolvedReason::NoAvailableTeacher)
                } else if covered < subject.weekly_quota as usize {
                    Some(UnresolvedReason::InsufficientSlots { available: covered })
                } else {
                    None
                });

                if let Some(reason) = reason {
                    debug!(
                        class_group = %group.name,
                        subject = %subject.name,
                        reason = ?reason,
                        "Pair left out of the model"
                    );
                    unresolved.push(UnresolvedPair {
                        class_group: group.name.clone(),
                        subject: subject.name.clone(),
                        quota: subject.weekly_quota,
                        reason,
                    });
                    continue;
                }

                let mut pair_vars = Vec::with_capacity(candidates.len());
                let mut pair_teachers = BTreeSet::new();
                for key in candidates {
                    let var = model.new_bool_var(format!(
                        "{}|{}|{}|{}|{}",
                        key.class_group, key.subject, key.teacher, key.room, key.slot
                    ));
                    keys.push(key);
                    pair_vars.push(var);
                    pair_teachers.insert(key.teacher);
                    by_teacher.entry((key.teacher, key.slot)).or_default().push(var);
                    by_room.entry((key.room, key.slot)).or_default().push(var);
                    by_group.entry((key.class_group, key.slot)).or_default().push(var);
                }
                for teacher in teachers
                    .iter()
                    .copied()
                    .filter(|t| pair_teachers.contains(t.name.as_str()))
                {
                    teacher_slots
                        .entry(teacher.name.as_str())
                        .or_insert_with(|| slots.iter().filter(|&&s| teacher.is_available(s)).count());
                }

                let quota = subject.weekly_quota;
                demand = demand.saturating_add(quota);
                add_demand(&mut teacher_demand, pair_teachers, quota);
                add_demand(&mut room_demand, rooms.iter().map(|&r| r.name.as_str()).collect(), quota);

                model.add_exactly(
                    format!("quota[{}/{}]", group.name, subject.name),
                    pair_vars,
                    quota,
                );
                counts.quota += 1;
            }

            if demand as usize > slots.len() {
                overloaded.push(Overload {
                    resource: OverloadedResource::ClassGroup(group.name.clone()),
                    demand,
                    capacity: slots.len(),
                });
            }
        }

        for (teachers, demand, capacity) in exclusive_overloads(&teacher_demand, |t| {
            teacher_slots.get(t).copied().unwrap_or(0)
        }) {
            overloaded.push(Overload {
                resource: OverloadedResource::Teachers(teachers),
                demand,
                capacity,
            });
        }
        for (rooms, demand, capacity) in exclusive_overloads(&room_demand, |_| slots.len()) {
            overloaded.push(Overload {
                resource: OverloadedResource::Rooms(rooms),
                demand,
                capacity,
            });
        }
        for overload in &overloaded {
            debug!(
                resource = ?overload.resource,
                demand = overload.demand,
                capacity = overload.capacity,
                "Demand exceeds capacity"
            );
        }

        // Single-variable groups can never exceed 1.
        for ((teacher, slot), vars) in by_teacher {
            if vars.len() > 1 {
                model.add_at_most(format!("teacher[{teacher}@{slot}]"), vars, 1);
                counts.teacher += 1;
            }
        }
        for ((room, slot), vars) in by_room {
            if vars.len() > 1 {
                model.add_at_most(format!("room[{room}@{slot}]"), vars, 1);
                counts.room += 1;
            }
        }
        for ((group, slot), vars) in by_group {
            if vars.len() > 1 {
                model.add_at_most(format!("class_group[{group}@{slot}]"), vars, 1);
                counts.class_group += 1;
            }
        }

        info!(
            vars = model.var_count(),
            quota = counts.quota,
            teacher = counts.teacher,
            room = counts.room,
            class_group = counts.class_group,
            unresolved = unresolved.len(),
            overloaded = overloaded.len(),
            "Timetable model built"
        );

        TimetableModel {
            model,
            keys,
            unresolved,
            overloaded,
            counts,
        }
    }
}

fn add_demand<'a>(demand: &mut BTreeMap<BTreeSet<&'a str>, u32>, set: BTreeSet<&'a str>, quota: u32) {
    let entry = demand.entry(set).or_insert(0);
    *entry = entry.saturating_add(quota);
}

/// Candidate sets whose exclusive demand exceeds their capacity.
///
/// Every lesson of a pair whose candidates all lie in `set` uses a member
/// of `set`, and a member takes one lesson per slot. So
/// `Σ demand(S ⊆ set) > Σ capacity(member)` proves infeasibility. Only the
/// sets that occur as some pair's candidates are tested, smallest first,
/// and a set is skipped once a reported subset explains it.
fn exclusive_overloads(
    demand: &BTreeMap<BTreeSet<&str>, u32>,
    capacity: impl Fn(&str) -> usize,
) -> Vec<(Vec<String>, u32, usize)> {
    let mut sets: Vec<&BTreeSet<&str>> = demand.keys().collect();
    sets.sort_by_key(|s| s.len());

    let mut reported: Vec<&BTreeSet<&str>> = Vec::new();
    let mut found = Vec::new();
    for set in sets {
        if reported.iter().any(|r| r.is_subset(set)) {
            continue;
        }
        let needed = demand
            .iter()
            .filter(|(s, _)| s.is_subset(set))
            .fold(0u32, |total, (_, &d)| total.saturating_add(d));
        let available: usize = set.iter().map(|&name| capacity(name)).sum();
        if needed as usize > available {
            found.push((set.iter().map(|s| s.to_string()).collect(), needed, available));
            reported.push(set);
        }
    }
    found
}

/// A built model with its variable → lesson mapping.
#[derive(Debug, Clone)]
pub struct TimetableModel<'a> {
    model: CpModel,
    keys: Vec<LessonKey<'a>>,
    unresolved: Vec<UnresolvedPair>,
    overloaded: Vec<Overload>,
    counts: ConstraintCounts,
}

impl<'a> TimetableModel<'a> {
    /// The underlying CP model.
    pub fn model(&self) -> &CpModel {
        &self.model
    }

    /// The lesson a variable stands for.
    pub fn key(&self, var: BoolVar) -> Option<&LessonKey<'a>> {
        self.keys.get(var.index())
    }

    /// Pairs left out of the model.
    pub fn unresolved(&self) -> &[UnresolvedPair] {
        &self.unresolved
    }

    /// Resources whose demand provably exceeds their capacity. A model
    /// with any overload has no solution.
    pub fn overloaded(&self) -> &[Overload] {
        &self.overloaded
    }

    /// Constraints per family.
    pub fn counts(&self) -> ConstraintCounts {
        self.counts
    }

    /// Number of decision variables.
    pub fn var_count(&self) -> usize {
        self.model.var_count()
    }

    /// Variables generated for a (class-group, subject) pair.
    pub fn pair_var_count(&self, class_group: &str, subject: &str) -> usize {
        self.keys
            .iter()
            .filter(|k| k.class_group == class_group && k.subject == subject)
            .count()
    }

    /// Materializes the true variables of `solution` into a fresh schedule.
    ///
    /// Returns an empty schedule when the solution holds no values.
    pub fn decode(&self, solution: &CpSolution) -> Schedule {
        let mut schedule = Schedule::new();
        if !solution.is_solution_found() {
            return schedule;
        }

        let lessons = solution
            .true_vars()
            .filter_map(|var| self.key(var))
            .map(|key| key.to_assignment());
        let rejected = schedule.replace_all(lessons);
        for conflict in rejected {
            warn!(%conflict, "Solver returned a conflicting lesson");
        }
        schedule
    }

    /// Solves the model and decodes the result.
    pub fn solve<S: CpSolver>(
        &self,
        solver: &S,
        config: &SolverConfig,
    ) -> Result<(Schedule, CpSolution), SolverError> {
        let solution = solver.solve(&self.model, config)?;
        info!(
            solver = solver.name(),
            status = ?solution.status,
            nodes = solution.nodes,
            elapsed_ms = solution.elapsed.as_millis() as u64,
            "Exact solve finished"
        );
        let schedule = self.decode(&solution);
        Ok((schedule, solution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{BacktrackingSolver, SolveStatus};
    use crate::models::{Availability, ClassGroup, RoomType, Subject};
    use chrono::Weekday;

    fn one_pair_catalog(quota: u32) -> Catalog {
        Catalog::new()
            .with_class_group(ClassGroup::new("6A", "6"))
            .with_teacher(Teacher::new("Silva").with_subject("Math"))
            .with_subject(Subject::new("Math", quota).for_group("6A"))
            .with_room(Room::new("R1"))
    }

    fn two_by_two_catalog() -> Catalog {
        Catalog::new()
            .with_class_group(ClassGroup::new("6A", "6"))
            .with_class_group(ClassGroup::new("6B", "6"))
            .with_teacher(Teacher::new("Silva").with_subject("Math"))
            .with_teacher(Teacher::new("Costa").with_subject("History"))
            .with_subject(Subject::new("Math", 2).for_group("6"))
            .with_subject(Subject::new("History", 2).for_group("6"))
            .with_room(Room::new("R1"))
            .with_room(Room::new("R2"))
    }

    fn solve(model: &TimetableModel<'_>) -> (Schedule, CpSolution) {
        model
            .solve(&BacktrackingSolver::new(), &SolverConfig::default())
            .unwrap()
    }

    #[test]
    fn test_variable_space() {
        let catalog = one_pair_catalog(2);
        let grid = SlotGrid::two_blocks();
        let model = TimetableCpBuilder::new(&catalog, &grid).build();

        // 1 group × 1 subject × 1 teacher × 1 room × 10 slots
        assert_eq!(model.var_count(), 10);
        assert_eq!(model.counts().quota, 1);
        // Every (teacher, slot) group holds a single variable
        assert_eq!(model.counts().teacher, 0);
        assert!(model.unresolved().is_empty());
    }

    #[test]
    fn test_quota_met_exactly() {
        let catalog = one_pair_catalog(2);
        let grid = SlotGrid::two_blocks();
        let model = TimetableCpBuilder::new(&catalog, &grid).build();
        let (schedule, solution) = solve(&model);

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(schedule.lesson_count("6A", "Math"), 2);
        assert_eq!(schedule.len(), 2);
    }

    #[test]
    fn test_unqualified_teacher_generates_no_variable() {
        let catalog = one_pair_catalog(2)
            .with_subject(Subject::new("Art", 1).for_group("6"));
        let grid = SlotGrid::two_blocks();
        let model = TimetableCpBuilder::new(&catalog, &grid).build();

        assert_eq!(model.pair_var_count("6A", "Art"), 0);
        assert_eq!(model.unresolved().len(), 1);
        assert_eq!(model.unresolved()[0].reason, UnresolvedReason::NoQualifiedTeacher);

        // The rest of the instance still solves.
        let (schedule, solution) = solve(&model);
        assert!(solution.is_solution_found());
        assert_eq!(schedule.lesson_count("6A", "Math"), 2);
        assert_eq!(schedule.lesson_count("6A", "Art"), 0);
    }

    #[test]
    fn test_teacher_never_available() {
        let mut blocked = Availability::always();
        for day in crate::models::WEEKDAYS {
            blocked = blocked.with_blocked_day(day);
        }
        let catalog = Catalog::new()
            .with_class_group(ClassGroup::new("6A", "6"))
            .with_teacher(Teacher::new("Silva").with_subject("Math").with_availability(blocked))
            .with_subject(Subject::new("Math", 2).for_group("6A"))
            .with_room(Room::new("R1"));
        let grid = SlotGrid::two_blocks();
        let model = TimetableCpBuilder::new(&catalog, &grid).build();

        assert_eq!(model.var_count(), 0);
        assert_eq!(model.unresolved()[0].reason, UnresolvedReason::NoAvailableTeacher);
    }

    #[test]
    fn test_availability_prunes_variables() {
        let catalog = Catalog::new()
            .with_class_group(ClassGroup::new("6A", "6"))
            .with_teacher(
                Teacher::new("Silva")
                    .with_subject("Math")
                    .with_availability(
                        Availability::always()
                            .with_blocked_day(Weekday::Mon)
                            .with_blocked_slot(Weekday::Tue, 0),
                    ),
            )
            .with_subject(Subject::new("Math", 3).for_group("6A"))
            .with_room(Room::new("R1"));
        let grid = SlotGrid::two_blocks();
        let model = TimetableCpBuilder::new(&catalog, &grid).build();

        // 10 slots - 2 (Monday) - 1 (Tuesday first block)
        assert_eq!(model.var_count(), 7);

        let (schedule, _) = solve(&model);
        assert_eq!(schedule.len(), 3);
        assert!(schedule
            .assignments()
            .iter()
            .all(|a| a.slot.day != Weekday::Mon && a.slot != Slot::new(Weekday::Tue, 0)));
    }

    #[test]
    fn test_breaks_generate_no_variable() {
        let catalog = one_pair_catalog(5);
        let grid = SlotGrid::lower_secondary();
        let model = TimetableCpBuilder::new(&catalog, &grid).build();

        assert_eq!(model.var_count(), 25);
        assert!((0..model.var_count()).all(|i| model.key(BoolVar(i)).unwrap().slot.period != 2));
    }

    #[test]
    fn test_end_to_end_two_by_two() {
        let catalog = two_by_two_catalog();
        let grid = SlotGrid::two_blocks();
        let model = TimetableCpBuilder::new(&catalog, &grid).build();
        let (schedule, solution) = solve(&model);

        assert!(solution.is_solution_found());
        assert_eq!(schedule.len(), 8);
        assert!(schedule.conflicts().is_empty());
        for group in ["6A", "6B"] {
            for subject in ["Math", "History"] {
                assert_eq!(schedule.lesson_count(group, subject), 2);
            }
        }
        assert!(model.model().is_satisfied_by(&solution.values));
    }

    #[test]
    fn test_exclusivity_families_are_generated() {
        let catalog = two_by_two_catalog();
        let grid = SlotGrid::two_blocks();
        let model = TimetableCpBuilder::new(&catalog, &grid).build();
        let counts = model.counts();

        assert_eq!(counts.quota, 4);
        // Each teacher serves two groups with two rooms at each of 10 slots
        assert_eq!(counts.teacher, 20);
        assert_eq!(counts.room, 20);
        assert_eq!(counts.class_group, 20);
    }

    #[test]
    fn test_over_demand_is_proven_infeasible() {
        // 4 lessons for one class-group, 2 slots
        let catalog = two_by_two_catalog();
        let catalog = Catalog {
            class_groups: vec![ClassGroup::new("6A", "6")],
            ..catalog
        };
        let grid = SlotGrid::new(vec![Weekday::Mon], SlotGrid::two_blocks().periods);
        let model = TimetableCpBuilder::new(&catalog, &grid).build();

        assert_eq!(model.overloaded().len(), 1);
        let overload = &model.overloaded()[0];
        assert_eq!(overload.resource, OverloadedResource::ClassGroup("6A".into()));
        assert_eq!(overload.demand, 4);
        assert_eq!(overload.capacity, 2);

        let (schedule, solution) = solve(&model);
        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_shared_teacher_overload_is_detected() {
        // One teacher, two groups, 2 lessons each, only 3 slots
        let catalog = Catalog::new()
            .with_class_group(ClassGroup::new("6A", "6"))
            .with_class_group(ClassGroup::new("6B", "6"))
            .with_teacher(Teacher::new("Silva").with_subject("Math"))
            .with_subject(Subject::new("Math", 2).for_group("6"))
            .with_room(Room::new("R1"))
            .with_room(Room::new("R2"));
        let grid = SlotGrid::new(vec![Weekday::Mon], SlotGrid::uniform(3).periods);
        let model = TimetableCpBuilder::new(&catalog, &grid).build();

        assert_eq!(
            model.overloaded(),
            &[Overload {
                resource: OverloadedResource::Teachers(vec!["Silva".into()]),
                demand: 4,
                capacity: 3,
            }]
        );
        let (_, solution) = solve(&model);
        assert_eq!(solution.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_teacher_load_counts_available_slots_only() {
        // 6 groups × 5 subjects × 5 lessons, one teacher per subject:
        // 30 lessons per teacher against 25 slots.
        let mut catalog = Catalog::new();
        for g in 0..6 {
            catalog = catalog
                .with_class_group(ClassGroup::new(format!("G{g}"), "all"))
                .with_room(Room::new(format!("R{g}")));
        }
        for s in 0..5 {
            catalog = catalog
                .with_subject(Subject::new(format!("S{s}"), 5).for_group("all"))
                .with_teacher(Teacher::new(format!("T{s}")).with_subject(format!("S{s}")));
        }
        let grid = SlotGrid::lower_secondary();
        let model = TimetableCpBuilder::new(&catalog, &grid).build();

        assert_eq!(model.var_count(), 6 * 5 * 6 * 25);
        let teachers: Vec<_> = model
            .overloaded()
            .iter()
            .map(|o| (&o.resource, o.demand, o.capacity))
            .collect();
        assert_eq!(teachers.len(), 5);
        for (s, (resource, demand, capacity)) in teachers.into_iter().enumerate() {
            assert_eq!(resource, &OverloadedResource::Teachers(vec![format!("T{s}")]));
            assert_eq!(demand, 30);
            assert_eq!(capacity, 25);
        }
    }

    #[test]
    fn test_teacher_set_overload_spans_shared_subjects() {
        // Math and History each have two teachers; together they owe 6
        // lessons but share 4 available slots.
        let monday = Availability::always()
            .with_blocked_day(Weekday::Tue)
            .with_blocked_day(Weekday::Wed)
            .with_blocked_day(Weekday::Thu)
            .with_blocked_day(Weekday::Fri);
        let catalog = Catalog::new()
            .with_class_group(ClassGroup::new("6A", "6"))
            .with_class_group(ClassGroup::new("6B", "6"))
            .with_class_group(ClassGroup::new("6C", "6"))
            .with_teacher(
                Teacher::new("Silva")
                    .with_subject("Math")
                    .with_subject("History")
                    .with_availability(monday.clone()),
            )
            .with_teacher(
                Teacher::new("Costa")
                    .with_subject("Math")
                    .with_subject("History")
                    .with_availability(monday),
            )
            .with_subject(Subject::new("Math", 1).for_group("6"))
            .with_subject(Subject::new("History", 1).for_group("6"))
            .with_room(Room::new("R1"))
            .with_room(Room::new("R2"))
            .with_room(Room::new("R3"));
        let grid = SlotGrid::two_blocks();
        let model = TimetableCpBuilder::new(&catalog, &grid).build();

        assert!(model.unresolved().is_empty());
        assert_eq!(model.overloaded().len(), 1);
        let overload = &model.overloaded()[0];
        assert_eq!(
            overload.resource,
            OverloadedResource::Teachers(vec!["Costa".into(), "Silva".into()])
        );
        assert_eq!(overload.demand, 6);
        assert_eq!(overload.capacity, 4);
    }

    #[test]
    fn test_room_overload_is_detected() {
        // 2 groups × 2 lessons, one room, 3 slots
        let catalog = Catalog::new()
            .with_class_group(ClassGroup::new("6A", "6"))
            .with_class_group(ClassGroup::new("6B", "6"))
            .with_teacher(Teacher::new("Silva").with_subject("Math"))
            .with_teacher(Teacher::new("Costa").with_subject("Math"))
            .with_subject(Subject::new("Math", 2).for_group("6"))
            .with_room(Room::new("R1"));
        let grid = SlotGrid::new(vec![Weekday::Mon], SlotGrid::uniform(3).periods);
        let model = TimetableCpBuilder::new(&catalog, &grid).build();

        assert_eq!(
            model.overloaded(),
            &[Overload {
                resource: OverloadedResource::Rooms(vec!["R1".into()]),
                demand: 4,
                capacity: 3,
            }]
        );
    }

    #[test]
    fn test_feasible_instance_has_no_overload() {
        let catalog = two_by_two_catalog();
        let grid = SlotGrid::two_blocks();
        let model = TimetableCpBuilder::new(&catalog, &grid).build();
        assert!(model.overloaded().is_empty());
    }

    #[test]
    fn test_pair_with_too_few_slots_is_unresolved() {
        // Math needs 3 lessons but its only teacher works 2 slots.
        let monday = Availability::always()
            .with_blocked_day(Weekday::Tue)
            .with_blocked_day(Weekday::Wed)
            .with_blocked_day(Weekday::Thu)
            .with_blocked_day(Weekday::Fri);
        let catalog = Catalog::new()
            .with_class_group(ClassGroup::new("6A", "6"))
            .with_teacher(Teacher::new("Silva").with_subject("Math").with_availability(monday))
            .with_teacher(Teacher::new("Costa").with_subject("History"))
            .with_subject(Subject::new("Math", 3).for_group("6A"))
            .with_subject(Subject::new("History", 2).for_group("6A"))
            .with_room(Room::new("R1"));
        let grid = SlotGrid::two_blocks();
        let model = TimetableCpBuilder::new(&catalog, &grid).build();

        assert_eq!(
            model.unresolved(),
            &[UnresolvedPair {
                class_group: "6A".into(),
                subject: "Math".into(),
                quota: 3,
                reason: UnresolvedReason::InsufficientSlots { available: 2 },
            }]
        );
        assert_eq!(model.pair_var_count("6A", "Math"), 0);
        assert_eq!(model.counts().quota, 1);

        let (schedule, solution) = solve(&model);
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(schedule.lesson_count("6A", "History"), 2);
        assert_eq!(schedule.lesson_count("6A", "Math"), 0);
    }

    #[test]
    fn test_room_fit_is_opt_in() {
        let catalog = Catalog::new()
            .with_class_group(ClassGroup::new("6A", "6").with_capacity(30))
            .with_teacher(Teacher::new("Lima").with_subject("Chemistry"))
            .with_subject(
                Subject::new("Chemistry", 2)
                    .for_group("6A")
                    .with_room_type(RoomType::Lab),
            )
            .with_room(Room::new("R1").with_capacity(40))
            .with_room(Room::new("Lab").with_type(RoomType::Lab).with_capacity(20));
        let grid = SlotGrid::two_blocks();

        let relaxed = TimetableCpBuilder::new(&catalog, &grid).build();
        assert_eq!(relaxed.var_count(), 20);

        // R1 has the wrong type, Lab is too small.
        let strict = TimetableCpBuilder::new(&catalog, &grid)
            .with_room_fit(true)
            .build();
        assert_eq!(strict.var_count(), 0);
        assert_eq!(strict.unresolved()[0].reason, UnresolvedReason::NoEligibleRoom);
    }

    #[test]
    fn test_solver_chooses_among_qualified_teachers() {
        // Two qualified teachers; the first is blocked on Monday and
        // Tuesday, so a solution needs both of them.
        let catalog = Catalog::new()
            .with_class_group(ClassGroup::new("6A", "6"))
            .with_class_group(ClassGroup::new("6B", "6"))
            .with_teacher(
                Teacher::new("Silva").with_subject("Math").with_availability(
                    Availability::always()
                        .with_blocked_day(Weekday::Mon)
                        .with_blocked_day(Weekday::Tue),
                ),
            )
            .with_teacher(Teacher::new("Costa").with_subject("Math"))
            .with_subject(Subject::new("Math", 2).for_group("6"))
            .with_room(Room::new("R1"))
            .with_room(Room::new("R2"));
        let grid = SlotGrid::new(
            vec![Weekday::Mon, Weekday::Tue, Weekday::Wed],
            SlotGrid::uniform(1).periods,
        );
        let model = TimetableCpBuilder::new(&catalog, &grid).build();
        let (schedule, solution) = solve(&model);

        assert!(solution.is_solution_found());
        assert_eq!(schedule.len(), 4);
        assert!(schedule.conflicts().is_empty());
        assert!(!schedule.for_teacher("Silva").is_empty());
        assert!(!schedule.for_teacher("Costa").is_empty());
    }

    #[test]
    fn test_deterministic_solution() {
        let catalog = two_by_two_catalog();
        let grid = SlotGrid::two_blocks();
        let model = TimetableCpBuilder::new(&catalog, &grid).build();

        let (_, a) = solve(&model);
        let (_, b) = solve(&model);
        assert_eq!(a.values, b.values);
    }
}
