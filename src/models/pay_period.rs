//! Cutoff period and holiday calendar models.
//!
//! This module contains the [`CutoffPeriod`] a payroll run covers and the
//! organization [`HolidayCalendar`] consulted for leave day-counting and for
//! tagging imported attendance.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The kind of a holiday, which selects the pay multiplier.
///
/// A record carries at most one kind, so regular and special pay can never
/// both apply to the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayKind {
    /// Regular holiday, paid at the regular-holiday multiplier.
    Regular,
    /// Special non-working day, paid at the special-holiday multiplier.
    Special,
    /// Special working day; special multiplier with ordinary overtime rules on top.
    SpecialWorking,
}

impl std::fmt::Display for HolidayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HolidayKind::Regular => write!(f, "regular"),
            HolidayKind::Special => write!(f, "special"),
            HolidayKind::SpecialWorking => write!(f, "special_working"),
        }
    }
}

/// A holiday in an organization's calendar.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{Holiday, HolidayKind};
/// use chrono::NaiveDate;
///
/// let holiday = Holiday {
///     date: NaiveDate::from_ymd_opt(2026, 6, 12).unwrap(),
///     name: "Independence Day".to_string(),
///     kind: HolidayKind::Regular,
///     region: "national".to_string(),
/// };
/// assert_eq!(holiday.kind, HolidayKind::Regular);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// The date of the holiday.
    pub date: NaiveDate,
    /// The name of the holiday.
    pub name: String,
    /// Regular, special, or special working.
    pub kind: HolidayKind,
    /// The region where this holiday applies (e.g., "national").
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    "national".to_string()
}

/// The pay-period date range a payroll run covers.
///
/// Both ends are inclusive and a valid period satisfies `start_date < end_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CutoffPeriod {
    /// The first day of the period (inclusive).
    pub start_date: NaiveDate,
    /// The last day of the period (inclusive).
    pub end_date: NaiveDate,
}

impl CutoffPeriod {
    /// Creates a validated cutoff period.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::CutoffPeriod;
    /// use chrono::NaiveDate;
    ///
    /// let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    /// let end = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
    /// assert!(CutoffPeriod::new(start, end).is_ok());
    /// assert!(CutoffPeriod::new(end, start).is_err());
    /// ```
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> EngineResult<Self> {
        let period = Self {
            start_date,
            end_date,
        };
        period.validate()?;
        Ok(period)
    }

    /// Checks the `start < end` invariant.
    pub fn validate(&self) -> EngineResult<()> {
        if self.start_date < self.end_date {
            Ok(())
        } else {
            Err(EngineError::InvalidCutoffPeriod {
                start: self.start_date,
                end: self.end_date,
            })
        }
    }

    /// Checks if a given date falls within this period (inclusive).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Iterates every calendar date of the period in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |d| *d <= self.end_date)
    }

    /// Returns the overlap of this period with an inclusive date range, if any.
    pub fn clamp_range(&self, start: NaiveDate, end: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let from = start.max(self.start_date);
        let to = end.min(self.end_date);
        (from <= to).then_some((from, to))
    }
}

/// An organization's holiday calendar, keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    holidays: BTreeMap<NaiveDate, Holiday>,
}

impl HolidayCalendar {
    /// Creates a calendar from a list of holidays; later duplicates win.
    pub fn new(holidays: Vec<Holiday>) -> Self {
        let mut calendar = Self::default();
        for holiday in holidays {
            calendar.holidays.insert(holiday.date, holiday);
        }
        calendar
    }

    /// Merges a fixed holiday set into the calendar.
    ///
    /// Dates already present keep their existing entry, so re-seeding never
    /// overrides an organization's own edits. Returns the number of holidays added.
    pub fn seed(&mut self, holidays: &[Holiday]) -> usize {
        let mut added = 0;
        for holiday in holidays {
            if !self.holidays.contains_key(&holiday.date) {
                self.holidays.insert(holiday.date, holiday.clone());
                added += 1;
            }
        }
        added
    }

    /// Returns the holiday on `date`, if any.
    pub fn get(&self, date: NaiveDate) -> Option<&Holiday> {
        self.holidays.get(&date)
    }

    /// Checks if `date` is a holiday.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains_key(&date)
    }

    /// Returns the holidays within a period, in date order.
    pub fn in_period(&self, period: CutoffPeriod) -> impl Iterator<Item = &Holiday> {
        self.holidays
            .range(period.start_date..=period.end_date)
            .map(|(_, h)| h)
    }

    /// Number of holidays in the calendar.
    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    /// Returns true if the calendar has no holidays.
    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }
}
