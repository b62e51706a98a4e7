//! Timetabling domain models.
//!
//! Provides the core data types for describing a weekly school timetable
//! problem and its solution.
//!
//! # Domain Mappings
//!
//! | u-timetable | School | Training center | Clinic rota |
//! |-------------|--------|-----------------|-------------|
//! | ClassGroup | Class | Cohort | Patient group |
//! | Teacher | Teacher | Instructor | Therapist |
//! | Subject | Subject | Course module | Session type |
//! | Room | Classroom | Training room | Treatment room |
//! | Schedule | Timetable | Course plan | Weekly rota |

mod availability;
mod catalog;
mod schedule;
mod slot;

pub use availability::Availability;
pub use catalog::{
    Catalog, ClassGroup, Named, Room, RoomType, Segment, Subject, Teacher, MAX_WEEKLY_QUOTA,
    MIN_WEEKLY_QUOTA,
};
pub use schedule::{Conflict, LessonAssignment, Schedule};
pub use slot::{PeriodDef, Slot, SlotGrid, WEEKDAYS};
