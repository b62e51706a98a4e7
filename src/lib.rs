//! Weekly school timetable generation.
//!
//! Assigns (class-group, subject, teacher, room) lessons to (weekday, period)
//! slots so that each class-group receives every subject's weekly quota and
//! no teacher, room, or class-group is double-booked.
//!
//! # Modules
//!
//! - **`models`**: Catalog records (`ClassGroup`, `Teacher`, `Subject`, `Room`),
//!   `Availability`, the `SlotGrid`, and the conflict-checked `Schedule`
//! - **`validation`**: Catalog integrity checks (empty or duplicate names,
//!   quota range, qualification references)
//! - **`cp`**: Boolean CP formulation, pre-solve overload checks, the
//!   `CpSolver` contract, a `good_lp` integer-programming backend (the
//!   default) and a deterministic backtracking backend
//! - **`scheduler`**: The `TimetableGenerator` entry point, the greedy
//!   fallback, and result statistics
//! - **`diagnostics`**: Warnings and errors attached to a generation run
//!
//! # Example
//!
//! ```
//! use u_timetable::models::{Catalog, ClassGroup, Room, SlotGrid, Subject, Teacher};
//! use u_timetable::scheduler::{GeneratorConfig, TimetableGenerator};
//!
//! let catalog = Catalog::new()
//!     .with_class_group(ClassGroup::new("6A", "6"))
//!     .with_class_group(ClassGroup::new("6B", "6"))
//!     .with_teacher(Teacher::new("Silva").with_subject("Math"))
//!     .with_teacher(Teacher::new("Costa").with_subject("History"))
//!     .with_subject(Subject::new("Math", 2).for_group("6"))
//!     .with_subject(Subject::new("History", 2).for_group("6"))
//!     .with_room(Room::new("R1"))
//!     .with_room(Room::new("R2"));
//!
//! let report = TimetableGenerator::new(GeneratorConfig::default())
//!     .generate(&catalog, &SlotGrid::two_blocks());
//! assert!(report.is_complete());
//! assert_eq!(report.schedule.len(), 8);
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming"

pub mod cp;
pub mod diagnostics;
pub mod models;
pub mod scheduler;
pub mod validation;
