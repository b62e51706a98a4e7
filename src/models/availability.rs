//! Teacher availability model.
//!
//! Availability is a hard constraint: no lesson may be placed at a slot
//! where its teacher is unavailable.
//!
//! # Precedence
//! Blocked entries only ever remove availability. A slot is available iff:
//! - Its day is NOT in `blocked_days`, AND
//! - The slot itself is NOT in `blocked_slots`.
//!
//! An empty availability (the default) is always available.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Slot;

/// Per-teacher availability over days and (day, period) slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// Whole days when the teacher is unavailable.
    #[serde(default)]
    pub blocked_days: Vec<Weekday>,
    /// Individual slots when the teacher is unavailable.
    #[serde(default)]
    pub blocked_slots: BTreeSet<Slot>,
}

impl Availability {
    /// Creates an availability with no restrictions.
    pub fn always() -> Self {
        Self::default()
    }

    /// Blocks an entire day.
    pub fn with_blocked_day(mut self, day: Weekday) -> Self {
        if !self.blocked_days.contains(&day) {
            self.blocked_days.push(day);
        }
        self
    }

    /// Blocks a single (day, period) slot.
    pub fn with_blocked_slot(mut self, day: Weekday, period: usize) -> Self {
        self.blocked_slots.insert(Slot::new(day, period));
        self
    }

    /// Whether the teacher can work on `day` at all.
    ///
    /// A day with every period blocked individually still counts as
    /// available here; use [`Availability::is_available`] per slot.
    pub fn is_day_available(&self, day: Weekday) -> bool {
        !self.blocked_days.contains(&day)
    }

    /// Whether the teacher is available at `slot`.
    pub fn is_available(&self, slot: Slot) -> bool {
        self.is_day_available(slot.day) && !self.blocked_slots.contains(&slot)
    }

    /// Whether no restriction has been recorded.
    pub fn is_unrestricted(&self) -> bool {
        self.blocked_days.is_empty() && self.blocked_slots.is_empty()
    }
}
