//! Timetable summary statistics.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total lessons | Number of placed lessons |
//! | Class-groups served | Distinct class-groups with at least one lesson |
//! | Teachers used | Distinct teachers with at least one lesson |
//! | Rooms used | Distinct rooms with at least one lesson |
//! | Fulfillment rate | Placed / required lessons, capped per pair |
//! | Slot occupancy | Mean fraction of grid slots used per class-group |

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{Catalog, LessonAssignment, Schedule, SlotGrid};

/// Placed versus required lessons for one (class-group, subject) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    /// Class-group name.
    pub class_group: String,
    /// Subject name.
    pub subject: String,
    /// Weekly quota.
    pub required: u32,
    /// Lessons in the schedule.
    pub scheduled: u32,
}

impl QuotaStatus {
    /// Whether the pair got exactly its quota.
    pub fn is_met(&self) -> bool {
        self.scheduled == self.required
    }

    /// Lessons still missing.
    pub fn missing(&self) -> u32 {
        self.required.saturating_sub(self.scheduled)
    }
}

/// Summary of a generated timetable against its catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleStats {
    /// Placed lessons.
    pub total_lessons: usize,
    /// Distinct class-groups with lessons.
    pub class_groups_served: usize,
    /// Distinct teachers with lessons.
    pub teachers_used: usize,
    /// Distinct rooms with lessons.
    pub rooms_used: usize,
    /// Sum of weekly quotas over all pairs.
    pub required_lessons: u32,
    /// Per-pair quota status, in catalog order.
    pub quotas: Vec<QuotaStatus>,
    /// Placed over required lessons (0.0..=1.0).
    pub fulfillment_rate: f64,
    /// Lessons per class-group.
    pub lessons_by_class_group: BTreeMap<String, usize>,
}

impl ScheduleStats {
    /// Computes statistics for `schedule` against `catalog`.
    pub fn calculate(schedule: &Schedule, catalog: &Catalog) -> Self {
        let lessons = schedule.assignments();

        let mut lessons_by_class_group = BTreeMap::new();
        for lesson in lessons {
            *lessons_by_class_group
                .entry(lesson.class_group.clone())
                .or_insert(0) += 1;
        }

        let mut quotas = Vec::new();
        for group in &catalog.class_groups {
            for subject in catalog.subjects_for(group) {
                quotas.push(QuotaStatus {
                    class_group: group.name.clone(),
                    subject: subject.name.clone(),
                    required: subject.weekly_quota,
                    scheduled: schedule.lesson_count(&group.name, &subject.name) as u32,
                });
            }
        }

        let required_lessons = quotas
            .iter()
            .fold(0u32, |total, q| total.saturating_add(q.required));
        let fulfilled = quotas
            .iter()
            .fold(0u32, |total, q| total.saturating_add(q.scheduled.min(q.required)));
        let fulfillment_rate = if required_lessons == 0 {
            1.0
        } else {
            fulfilled as f64 / required_lessons as f64
        };

        Self {
            total_lessons: lessons.len(),
            class_groups_served: distinct(lessons, |a| &a.class_group),
            teachers_used: distinct(lessons, |a| &a.teacher),
            rooms_used: distinct(lessons, |a| &a.room),
            required_lessons,
            quotas,
            fulfillment_rate,
            lessons_by_class_group,
        }
    }

    /// Whether every pair got exactly its quota.
    pub fn is_fulfilled(&self) -> bool {
        self.quotas.iter().all(QuotaStatus::is_met)
    }

    /// Pairs that did not get their quota.
    pub fn unmet(&self) -> impl Iterator<Item = &QuotaStatus> {
        self.quotas.iter().filter(|q| !q.is_met())
    }

    /// Mean fraction of the grid's slots occupied per served class-group.
    pub fn slot_occupancy(&self, grid: &SlotGrid) -> f64 {
        let slots = grid.slot_count();
        if slots == 0 || self.lessons_by_class_group.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .lessons_by_class_group
            .values()
            .map(|&n| n as f64 / slots as f64)
            .sum();
        sum / self.lessons_by_class_group.len() as f64
    }
}

fn distinct<'a>(
    lessons: &'a [LessonAssignment],
    field: impl Fn(&'a LessonAssignment) -> &'a String,
) -> usize {
    lessons.iter().map(field).collect::<HashSet<_>>().len()
}
