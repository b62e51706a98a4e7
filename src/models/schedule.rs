//! Schedule (solution) model.
//!
//! A schedule is an ordered collection of lesson assignments. Every
//! insertion goes through [`Schedule::try_insert`], which enforces the
//! exclusivity invariant: two assignments sharing a slot never share a
//! teacher, a room or a class-group.
//!
//! The same primitive serves the exact solver, the greedy fallback and
//! manual edits made by callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::Slot;

/// One lesson: a class-group taking a subject with a teacher in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonAssignment {
    /// Generated identity.
    pub id: Uuid,
    /// Class-group name.
    pub class_group: String,
    /// Subject name.
    pub subject: String,
    /// Teacher name.
    pub teacher: String,
    /// Room name.
    pub room: String,
    /// When the lesson takes place.
    pub slot: Slot,
}

/// Why an assignment was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Conflict {
    /// The teacher already teaches at this slot.
    #[error("teacher '{teacher}' is already teaching at {slot}")]
    Teacher { teacher: String, slot: Slot },
    /// The room is already occupied at this slot.
    #[error("room '{room}' is already occupied at {slot}")]
    Room { room: String, slot: Slot },
    /// The class-group already has a lesson at this slot.
    #[error("class-group '{class_group}' already has a lesson at {slot}")]
    ClassGroup { class_group: String, slot: Slot },
}

impl LessonAssignment {
    /// Creates an assignment with a fresh v4 identity.
    pub fn new(
        class_group: impl Into<String>,
        subject: impl Into<String>,
        teacher: impl Into<String>,
        room: impl Into<String>,
        slot: Slot,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            class_group: class_group.into(),
            subject: subject.into(),
            teacher: teacher.into(),
            room: room.into(),
            slot,
        }
    }

    /// The first exclusivity rule `other` breaks against `self`, if any.
    pub fn conflict_with(&self, other: &LessonAssignment) -> Option<Conflict> {
        if self.slot != other.slot {
            return None;
        }
        if self.teacher == other.teacher {
            return Some(Conflict::Teacher {
                teacher: other.teacher.clone(),
                slot: other.slot,
            });
        }
        if self.room == other.room {
            return Some(Conflict::Room {
                room: other.room.clone(),
                slot: other.slot,
            });
        }
        if self.class_group == other.class_group {
            return Some(Conflict::ClassGroup {
                class_group: other.class_group.clone(),
                slot: other.slot,
            });
        }
        None
    }
}

/// A weekly timetable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    /// Schedule identity.
    pub id: Uuid,
    /// Lessons in insertion order.
    assignments: Vec<LessonAssignment>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last mutation.
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            assignments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Lessons in insertion order.
    pub fn assignments(&self) -> &[LessonAssignment] {
        &self.assignments
    }

    /// Checks `assignment` against every existing lesson.
    pub fn check(&self, assignment: &LessonAssignment) -> Result<(), Conflict> {
        match self
            .assignments
            .iter()
            .find_map(|existing| existing.conflict_with(assignment))
        {
            Some(conflict) => Err(conflict),
            None => Ok(()),
        }
    }

    /// Inserts an assignment if it breaks no exclusivity rule.
    ///
    /// On conflict the schedule is left unchanged.
    pub fn try_insert(&mut self, assignment: LessonAssignment) -> Result<Uuid, Conflict> {
        self.check(&assignment)?;
        let id = assignment.id;
        self.assignments.push(assignment);
        self.touch();
        Ok(id)
    }

    /// Replaces every lesson with `assignments`.
    ///
    /// Each entry goes through [`Schedule::try_insert`]; the rejected ones
    /// are returned.
    pub fn replace_all(
        &mut self,
        assignments: impl IntoIterator<Item = LessonAssignment>,
    ) -> Vec<Conflict> {
        self.assignments.clear();
        let rejected = assignments
            .into_iter()
            .filter_map(|a| self.try_insert(a).err())
            .collect();
        self.touch();
        rejected
    }

    /// Removes a lesson by identity.
    pub fn remove(&mut self, id: Uuid) -> Option<LessonAssignment> {
        let pos = self.assignments.iter().position(|a| a.id == id)?;
        let removed = self.assignments.remove(pos);
        self.touch();
        Some(removed)
    }

    /// Removes every lesson.
    pub fn clear(&mut self) {
        self.assignments.clear();
        self.touch();
    }

    /// Finds a lesson by identity.
    pub fn get(&self, id: Uuid) -> Option<&LessonAssignment> {
        self.assignments.iter().find(|a| a.id == id)
    }

    /// Lessons at a slot.
    pub fn at_slot(&self, slot: Slot) -> Vec<&LessonAssignment> {
        self.assignments.iter().filter(|a| a.slot == slot).collect()
    }

    /// Lessons of a class-group.
    pub fn for_class_group(&self, class_group: &str) -> Vec<&LessonAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.class_group == class_group)
            .collect()
    }

    /// Lessons taught by a teacher.
    pub fn for_teacher(&self, teacher: &str) -> Vec<&LessonAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.teacher == teacher)
            .collect()
    }

    /// Lessons held in a room.
    pub fn for_room(&self, room: &str) -> Vec<&LessonAssignment> {
        self.assignments.iter().filter(|a| a.room == room).collect()
    }

    /// Number of lessons of `subject` scheduled for `class_group`.
    pub fn lesson_count(&self, class_group: &str, subject: &str) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.class_group == class_group && a.subject == subject)
            .count()
    }

    /// Whether `teacher` has no lesson at `slot`.
    pub fn is_teacher_free(&self, teacher: &str, slot: Slot) -> bool {
        !self
            .assignments
            .iter()
            .any(|a| a.slot == slot && a.teacher == teacher)
    }

    /// Whether `room` is unoccupied at `slot`.
    pub fn is_room_free(&self, room: &str, slot: Slot) -> bool {
        !self
            .assignments
            .iter()
            .any(|a| a.slot == slot && a.room == room)
    }

    /// Whether `class_group` has no lesson at `slot`.
    pub fn is_class_group_free(&self, class_group: &str, slot: Slot) -> bool {
        !self
            .assignments
            .iter()
            .any(|a| a.slot == slot && a.class_group == class_group)
    }

    /// Lessons ordered by slot, then class-group name.
    pub fn sorted_by_slot(&self) -> Vec<&LessonAssignment> {
        let mut sorted: Vec<_> = self.assignments.iter().collect();
        sorted.sort_by(|a, b| {
            a.slot
                .cmp(&b.slot)
                .then_with(|| a.class_group.cmp(&b.class_group))
        });
        sorted
    }

    /// Audits every pair of lessons and returns all exclusivity violations.
    ///
    /// Always empty for schedules built through [`Schedule::try_insert`];
    /// useful for schedules deserialized from elsewhere.
    pub fn conflicts(&self) -> Vec<Conflict> {
        let mut found = Vec::new();
        for (i, a) in self.assignments.iter().enumerate() {
            for b in &self.assignments[i + 1..] {
                if let Some(c) = a.conflict_with(b) {
                    found.push(c);
                }
            }
        }
        found
    }

    /// Number of lessons.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether the schedule holds no lesson.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}
