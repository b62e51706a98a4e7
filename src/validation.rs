//! Catalog validation.
//!
//! Checks the cross-record integrity of a catalog before scheduling.
//! Detects:
//! - Empty collections
//! - Empty or duplicate names
//! - Weekly quotas outside the accepted range
//! - Teacher qualifications naming unknown subjects
//!
//! Subject targets that match no class-group are not reported: they are
//! simply unmatched.

use crate::models::{Catalog, Named, MAX_WEEKLY_QUOTA, MIN_WEEKLY_QUOTA};
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// One of the four collections has no records.
    EmptyCollection,
    /// A record has an empty name.
    EmptyName,
    /// Two records of the same kind share a name.
    DuplicateName,
    /// A subject's weekly quota is outside the accepted range.
    QuotaOutOfRange,
    /// A teacher is qualified for a subject that doesn't exist.
    UnknownSubject,
}

impl ValidationErrorKind {
    /// Whether scheduling cannot proceed with this error present.
    ///
    /// Names are the join keys of the whole model and quotas size it, so
    /// empty or duplicate names and out-of-range quotas block. Unknown
    /// qualifications only degrade the result.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, Self::UnknownSubject)
    }
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a catalog.
///
/// Checks:
/// 1. No collection is empty
/// 2. No record has an empty name
/// 3. No two records of the same kind share a name
/// 4. All weekly quotas are within `MIN_WEEKLY_QUOTA..=MAX_WEEKLY_QUOTA`
/// 5. All teacher qualifications point to existing subjects
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_catalog(catalog: &Catalog) -> ValidationResult {
    let mut errors = Vec::new();

    check_collection(&catalog.class_groups, "class-group", &mut errors);
    check_collection(&catalog.teachers, "teacher", &mut errors);
    check_collection(&catalog.subjects, "subject", &mut errors);
    check_collection(&catalog.rooms, "room", &mut errors);

    for subject in &catalog.subjects {
        if !(MIN_WEEKLY_QUOTA..=MAX_WEEKLY_QUOTA).contains(&subject.weekly_quota) {
            errors.push(ValidationError::new(
                ValidationErrorKind::QuotaOutOfRange,
                format!(
                    "Subject '{}' has weekly quota {} (expected {}..={})",
                    subject.name, subject.weekly_quota, MIN_WEEKLY_QUOTA, MAX_WEEKLY_QUOTA
                ),
            ));
        }
    }

    let subject_names: HashSet<&str> = catalog.subjects.iter().map(|s| s.name()).collect();
    for teacher in &catalog.teachers {
        for qualification in &teacher.subjects {
            if !subject_names.contains(qualification.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownSubject,
                    format!(
                        "Teacher '{}' is qualified for unknown subject '{}'",
                        teacher.name, qualification
                    ),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_collection<T: Named>(items: &[T], label: &str, errors: &mut Vec<ValidationError>) {
    if items.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyCollection,
            format!("No {label} registered"),
        ));
        return;
    }

    let mut seen = HashSet::new();
    for item in items {
        let name = item.name();
        if name.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyName,
                format!("A {label} has an empty name"),
            ));
        } else if !seen.insert(name) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateName,
                format!("Duplicate {label} name: {name}"),
            ));
        }
    }
}
