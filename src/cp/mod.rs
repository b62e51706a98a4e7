//! CP-based timetable formulation and exact solving.
//!
//! - `model`: boolean decision variables and cardinality constraints.
//! - `solver`: the [`CpSolver`] contract and the bounded
//!   [`BacktrackingSolver`] backend.
//! - `lp`: [`GoodLpSolver`], the default backend, which solves the model
//!   as a 0/1 integer program through `good_lp`.
//! - `builder`: [`TimetableCpBuilder`], which turns a catalog and a
//!   slot grid into a [`TimetableModel`] and decodes solutions back into a
//!   [`Schedule`](crate::models::Schedule).
//!
//! # Reference
//! - Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming"
//! - Schaerf (1999), "A Survey of Automated Timetabling"

mod builder;
mod lp;
mod model;
mod solver;

pub use builder::{
    ConstraintCounts, LessonKey, Overload, OverloadedResource, TimetableCpBuilder, TimetableModel,
    UnresolvedPair, UnresolvedReason,
};
pub use lp::GoodLpSolver;
pub use model::{BoolVar, Cardinality, CpModel, LinearConstraint};
pub use solver::{
    BacktrackingSolver, CpSolution, CpSolver, SolveStatus, SolverConfig, SolverError,
    DEFAULT_TIME_LIMIT,
};
