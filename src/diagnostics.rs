//! Generation diagnostics.
//!
//! Every predictable failure mode of a generation run is captured as a
//! [`Diagnostic`] instead of escaping as an error. Callers tell "no
//! timetable at all" from "timetable with gaps" by looking at the
//! severities together with the returned schedule.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How bad a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Some lessons are missing; the rest of the timetable stands.
    Warning,
    /// The exact path produced no timetable.
    Error,
    /// Nothing could be generated.
    Fatal,
}

/// Classification of diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// One of the four catalog collections is empty.
    EmptyCatalog,
    /// The catalog failed a validation check.
    InvalidCatalog,
    /// No teacher is qualified (and available) for a pair.
    NoQualifiedTeacher,
    /// No room is eligible for a pair.
    NoEligibleRoom,
    /// A pair's teachers and rooms cannot cover its quota in distinct
    /// slots, or the chosen teacher has no schedulable slot at all.
    NoAvailableSlot,
    /// A class-group, teacher set or room set owes more lessons than it
    /// has slots.
    DemandExceedsSlots,
    /// The exact solver proved there is no solution.
    Infeasible,
    /// The exact solver ran out of time without a solution.
    Timeout,
    /// The greedy generator could not place a lesson unit.
    UnplacedLesson,
    /// The solver backend failed.
    BackendFault,
}

/// A human-readable finding attached to a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Category.
    pub kind: DiagnosticKind,
    /// Class-group concerned, if any.
    pub class_group: Option<String>,
    /// Subject concerned, if any.
    pub subject: Option<String>,
    /// Description.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic without a pair attached.
    pub fn new(severity: Severity, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            class_group: None,
            subject: None,
            message: message.into(),
        }
    }

    /// Creates a warning.
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, kind, message)
    }

    /// Creates an error.
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, message)
    }

    /// Creates a fatal diagnostic.
    pub fn fatal(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, kind, message)
    }

    /// Attaches the (class-group, subject) pair concerned.
    pub fn for_pair(mut self, class_group: impl Into<String>, subject: impl Into<String>) -> Self {
        self.class_group = Some(class_group.into());
        self.subject = Some(subject.into());
        self
    }

    /// Attaches a class-group only.
    pub fn for_class_group(mut self, class_group: impl Into<String>) -> Self {
        self.class_group = Some(class_group.into());
        self
    }

    /// Whether this diagnostic concerns the given pair.
    pub fn concerns(&self, class_group: &str, subject: &str) -> bool {
        self.class_group.as_deref() == Some(class_group) && self.subject.as_deref() == Some(subject)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.severity)?;
        match (&self.class_group, &self.subject) {
            (Some(g), Some(s)) => write!(f, "[{g} / {s}] ")?,
            (Some(g), None) => write!(f, "[{g}] ")?,
            _ => {}
        }
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_pair() {
        let d = Diagnostic::warning(DiagnosticKind::NoQualifiedTeacher, "no qualified teacher")
            .for_pair("6A", "Math");
        assert_eq!(d.to_string(), "warning: [6A / Math] no qualified teacher");
        assert!(d.concerns("6A", "Math"));
        assert!(!d.concerns("6A", "Art"));
    }

    #[test]
    fn test_display_without_pair() {
        let d = Diagnostic::fatal(DiagnosticKind::EmptyCatalog, "no rooms registered");
        assert_eq!(d.to_string(), "fatal: no rooms registered");

        let g = Diagnostic::error(DiagnosticKind::DemandExceedsSlots, "too many lessons")
            .for_class_group("6A");
        assert_eq!(g.to_string(), "error: [6A] too many lessons");
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }
}
