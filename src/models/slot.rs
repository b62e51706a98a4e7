//! Slot grid model.
//!
//! The slot grid is the finite set of schedulable (day, period)
//! coordinates. It is configuration, not derived data: every constraint
//! in the timetabling problem is expressed against it.
//!
//! # Periods
//! Periods are zero-based indices into the grid's period list. A period
//! may be marked non-schedulable (a break); it keeps its index so that
//! labels line up with the school's bell schedule, but no lesson is ever
//! placed in it.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::Segment;

/// Monday to Friday, in order.
pub const WEEKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// A (day, period) coordinate.
///
/// Ordered by day (Monday first), then by period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    /// Day of the week.
    pub day: Weekday,
    /// Zero-based period index within the day.
    pub period: usize,
}

impl Slot {
    /// Creates a new slot.
    pub fn new(day: Weekday, period: usize) -> Self {
        Self { day, period }
    }
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.day
            .num_days_from_monday()
            .cmp(&other.day.num_days_from_monday())
            .then(self.period.cmp(&other.period))
    }
}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.day, self.period)
    }
}

/// A period definition within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDef {
    /// Display label (e.g. "07:50-08:40").
    pub label: String,
    /// Whether lessons may be placed in this period.
    pub schedulable: bool,
}

impl PeriodDef {
    /// A teaching period.
    pub fn lesson(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            schedulable: true,
        }
    }

    /// A break. Keeps its index, never receives lessons.
    pub fn pause(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            schedulable: false,
        }
    }
}

/// The weekly slot grid: ordered days × ordered periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGrid {
    /// Teaching days, in order.
    pub days: Vec<Weekday>,
    /// Periods of each day, in order.
    pub periods: Vec<PeriodDef>,
}

impl SlotGrid {
    /// Creates a grid from explicit days and periods.
    pub fn new(days: Vec<Weekday>, periods: Vec<PeriodDef>) -> Self {
        Self { days, periods }
    }

    /// Monday–Friday with `periods` unlabeled teaching periods.
    pub fn uniform(periods: usize) -> Self {
        Self::new(
            WEEKDAYS.to_vec(),
            (0..periods)
                .map(|p| PeriodDef::lesson(format!("P{}", p + 1)))
                .collect(),
        )
    }

    /// Two 2-hour blocks per day.
    pub fn two_blocks() -> Self {
        Self::new(
            WEEKDAYS.to_vec(),
            vec![
                PeriodDef::lesson("08:00-10:00"),
                PeriodDef::lesson("10:30-12:30"),
            ],
        )
    }

    /// Lower-secondary morning: six periods, the third is the break.
    pub fn lower_secondary() -> Self {
        Self::new(
            WEEKDAYS.to_vec(),
            vec![
                PeriodDef::lesson("07:50-08:40"),
                PeriodDef::lesson("08:40-09:30"),
                PeriodDef::pause("09:30-09:50"),
                PeriodDef::lesson("09:50-10:40"),
                PeriodDef::lesson("10:40-11:30"),
                PeriodDef::lesson("11:30-12:20"),
            ],
        )
    }

    /// Upper-secondary morning: seven periods, the fourth is the break.
    pub fn upper_secondary() -> Self {
        Self::new(
            WEEKDAYS.to_vec(),
            vec![
                PeriodDef::lesson("07:00-07:50"),
                PeriodDef::lesson("07:50-08:40"),
                PeriodDef::lesson("08:40-09:30"),
                PeriodDef::pause("09:30-09:50"),
                PeriodDef::lesson("09:50-10:40"),
                PeriodDef::lesson("10:40-11:30"),
                PeriodDef::lesson("11:30-12:20"),
            ],
        )
    }

    /// The bell schedule of a school segment.
    pub fn for_segment(segment: Segment) -> Self {
        match segment {
            Segment::LowerSecondary => Self::lower_secondary(),
            Segment::UpperSecondary => Self::upper_secondary(),
        }
    }

    /// Schedulable period indices of a day, ascending.
    pub fn periods_on(&self, day: Weekday) -> Vec<usize> {
        if !self.days.contains(&day) {
            return Vec::new();
        }
        self.periods
            .iter()
            .enumerate()
            .filter(|(_, p)| p.schedulable)
            .map(|(i, _)| i)
            .collect()
    }

    /// All schedulable slots, day-major.
    pub fn slots(&self) -> Vec<Slot> {
        self.days
            .iter()
            .flat_map(|&day| {
                self.periods
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.schedulable)
                    .map(move |(i, _)| Slot::new(day, i))
            })
            .collect()
    }

    /// Number of schedulable slots.
    pub fn slot_count(&self) -> usize {
        self.days.len() * self.periods.iter().filter(|p| p.schedulable).count()
    }

    /// Whether `slot` is a schedulable slot of this grid.
    pub fn contains(&self, slot: Slot) -> bool {
        self.days.contains(&slot.day)
            && self
                .periods
                .get(slot.period)
                .is_some_and(|p| p.schedulable)
    }

    /// Label of a period, if it exists.
    pub fn label(&self, period: usize) -> Option<&str> {
        self.periods.get(period).map(|p| p.label.as_str())
    }
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self::two_blocks()
    }
}
