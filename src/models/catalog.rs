//! Entity catalog: class-groups, teachers, subjects and rooms.
//!
//! Catalog records are passive data owned by the caller. The scheduler
//! only borrows them; it never mutates a catalog.
//!
//! # Applicability
//! A subject applies to a class-group when its `applies_to` list contains
//! either the class-group's name or its level tag. Entries that match no
//! class-group are simply unmatched.

use serde::{Deserialize, Serialize};

use super::{Availability, Slot, SlotGrid};

/// Lowest accepted weekly quota.
pub const MIN_WEEKLY_QUOTA: u32 = 1;
/// Highest accepted weekly quota.
pub const MAX_WEEKLY_QUOTA: u32 = 10;

const DEFAULT_CAPACITY: u32 = 25;

/// Records identified by a unique name.
pub trait Named {
    /// The record's unique name.
    fn name(&self) -> &str;
}

/// A class (student group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassGroup {
    /// Unique name (e.g. "6A").
    pub name: String,
    /// Grade/level tag (e.g. "6").
    pub level: String,
    /// Shift tag (e.g. "morning").
    pub shift: String,
    /// Number of students.
    pub capacity: u32,
    /// School segment; selects the bell schedule.
    #[serde(default)]
    pub segment: Segment,
}

/// School segment of a class-group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    /// Lower secondary (grades 6 to 9).
    #[default]
    LowerSecondary,
    /// Upper secondary (high school).
    UpperSecondary,
}

impl Segment {
    /// The segment's bell schedule.
    pub fn grid(self) -> SlotGrid {
        SlotGrid::for_segment(self)
    }
}

/// A teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    /// Unique name.
    pub name: String,
    /// Names of the subjects this teacher may teach.
    pub subjects: Vec<String>,
    /// When the teacher can be scheduled.
    #[serde(default)]
    pub availability: Availability,
}

/// A subject with its weekly lesson quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Unique name.
    pub name: String,
    /// Lessons per week for every class-group it applies to.
    pub weekly_quota: u32,
    /// Class-group names or level tags.
    pub applies_to: Vec<String>,
    /// Room type the lessons need. Ignored unless room fit is enforced.
    #[serde(default)]
    pub room_type: Option<RoomType>,
}

/// A room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Unique name.
    pub name: String,
    /// Seats.
    pub capacity: u32,
    /// Room classification.
    pub room_type: RoomType,
}

/// Room classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    /// Ordinary classroom.
    #[default]
    General,
    /// Laboratory.
    Lab,
    /// Auditorium.
    Auditorium,
}

impl ClassGroup {
    /// Creates a class-group with the default capacity.
    pub fn new(name: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: level.into(),
            shift: String::new(),
            capacity: DEFAULT_CAPACITY,
            segment: Segment::default(),
        }
    }

    /// Sets the school segment.
    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.segment = segment;
        self
    }

    /// Sets the shift tag.
    pub fn with_shift(mut self, shift: impl Into<String>) -> Self {
        self.shift = shift.into();
        self
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }
}

impl Teacher {
    /// Creates an always-available teacher with no qualifications.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subjects: Vec::new(),
            availability: Availability::default(),
        }
    }

    /// Adds a subject qualification.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subjects.push(subject.into());
        self
    }

    /// Sets the availability.
    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    /// Whether this teacher may teach `subject`.
    pub fn is_qualified(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }

    /// Whether this teacher is available at `slot`.
    pub fn is_available(&self, slot: Slot) -> bool {
        self.availability.is_available(slot)
    }
}

impl Subject {
    /// Creates a subject that applies to nobody yet.
    pub fn new(name: impl Into<String>, weekly_quota: u32) -> Self {
        Self {
            name: name.into(),
            weekly_quota,
            applies_to: Vec::new(),
            room_type: None,
        }
    }

    /// Adds a class-group name or level tag.
    pub fn for_group(mut self, target: impl Into<String>) -> Self {
        self.applies_to.push(target.into());
        self
    }

    /// Requires a room type (only with room fit enforcement).
    pub fn with_room_type(mut self, room_type: RoomType) -> Self {
        self.room_type = Some(room_type);
        self
    }

    /// Whether this subject is taught to `group`, by name or level.
    pub fn applies_to(&self, group: &ClassGroup) -> bool {
        self.applies_to
            .iter()
            .any(|t| *t == group.name || *t == group.level)
    }
}

impl Room {
    /// Creates a general-purpose room with the default capacity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: DEFAULT_CAPACITY,
            room_type: RoomType::General,
        }
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the room type.
    pub fn with_type(mut self, room_type: RoomType) -> Self {
        self.room_type = room_type;
        self
    }

    /// Whether this room can host `subject` for `group`.
    ///
    /// Seats must cover the class-group and, if the subject names a room
    /// type, the types must match.
    pub fn fits(&self, group: &ClassGroup, subject: &Subject) -> bool {
        self.capacity >= group.capacity
            && subject.room_type.is_none_or(|t| t == self.room_type)
    }
}

impl Named for ClassGroup {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Teacher {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Subject {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Room {
    fn name(&self) -> &str {
        &self.name
    }
}

/// The four read-only input collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Class-groups.
    pub class_groups: Vec<ClassGroup>,
    /// Teachers.
    pub teachers: Vec<Teacher>,
    /// Subjects.
    pub subjects: Vec<Subject>,
    /// Rooms.
    pub rooms: Vec<Room>,
}

fn find<'a, T: Named>(items: &'a [T], name: &str) -> Option<&'a T> {
    items.iter().find(|i| i.name() == name)
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class-group.
    pub fn with_class_group(mut self, group: ClassGroup) -> Self {
        self.class_groups.push(group);
        self
    }

    /// Adds a teacher.
    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }

    /// Adds a subject.
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Adds a room.
    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }

    /// Looks up a class-group by name.
    pub fn class_group(&self, name: &str) -> Option<&ClassGroup> {
        find(&self.class_groups, name)
    }

    /// Looks up a teacher by name.
    pub fn teacher(&self, name: &str) -> Option<&Teacher> {
        find(&self.teachers, name)
    }

    /// Looks up a subject by name.
    pub fn subject(&self, name: &str) -> Option<&Subject> {
        find(&self.subjects, name)
    }

    /// Looks up a room by name.
    pub fn room(&self, name: &str) -> Option<&Room> {
        find(&self.rooms, name)
    }

    /// Subjects taught to `group`, in catalog order.
    pub fn subjects_for<'a>(&'a self, group: &'a ClassGroup) -> impl Iterator<Item = &'a Subject> {
        self.subjects.iter().filter(move |s| s.applies_to(group))
    }

    /// Teachers qualified for `subject`, in catalog order.
    pub fn qualified_teachers<'a>(&'a self, subject: &'a str) -> impl Iterator<Item = &'a Teacher> {
        self.teachers.iter().filter(move |t| t.is_qualified(subject))
    }

    /// Rooms eligible for (`group`, `subject`).
    ///
    /// With `enforce_fit` off every room is eligible.
    pub fn eligible_rooms<'a>(
        &'a self,
        group: &'a ClassGroup,
        subject: &'a Subject,
        enforce_fit: bool,
    ) -> impl Iterator<Item = &'a Room> {
        self.rooms
            .iter()
            .filter(move |r| !enforce_fit || r.fits(group, subject))
    }

    /// Sum of weekly quotas over the subjects taught to `group`.
    pub fn weekly_demand(&self, group: &ClassGroup) -> u32 {
        self.subjects_for(group)
            .fold(0, |total: u32, s| total.saturating_add(s.weekly_quota))
    }

    /// A copy holding only the class-groups of `segment`.
    ///
    /// Teachers, subjects and rooms are kept whole; pair this with
    /// [`SlotGrid::for_segment`] to generate one segment at a time.
    pub fn for_segment(&self, segment: Segment) -> Catalog {
        Catalog {
            class_groups: self
                .class_groups
                .iter()
                .filter(|g| g.segment == segment)
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    /// Whether any of the four collections is empty.
    pub fn has_empty_collection(&self) -> bool {
        self.class_groups.is_empty()
            || self.teachers.is_empty()
            || self.subjects.is_empty()
            || self.rooms.is_empty()
    }
}
