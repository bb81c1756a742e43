//! Attendance record model and related types.
//!
//! An [`AttendanceRecord`] is one employee's scheduled and actual clock times
//! for one calendar date, plus the manual fields HR may correct.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::HolidayKind;

/// A manually correctable value on an attendance record.
///
/// `Keep` carries whatever is currently stored (possibly nothing),
/// `Override` replaces it, and `Recalculate` discards any stored override so
/// the resolver computes the value from clock times.
///
/// # Example
///
/// ```
/// use payroll_engine::models::ManualOverride;
/// use rust_decimal::Decimal;
///
/// let stored = ManualOverride::Override(Decimal::new(5, 0));
/// assert_eq!(stored.resolve(Decimal::new(15, 0)), Decimal::new(5, 0));
/// assert_eq!(ManualOverride::<Decimal>::Recalculate.resolve(Decimal::new(15, 0)), Decimal::new(15, 0));
/// assert_eq!(ManualOverride::<Decimal>::Keep(None).resolve(Decimal::new(15, 0)), Decimal::new(15, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum ManualOverride<T> {
    /// Keep the stored override, if one exists.
    Keep(Option<T>),
    /// Use this value instead of the computed one.
    Override(T),
    /// Ignore any stored override and use the computed value.
    Recalculate,
}

impl<T> Default for ManualOverride<T> {
    fn default() -> Self {
        ManualOverride::Keep(None)
    }
}

impl<T: Copy> ManualOverride<T> {
    /// Returns the effective value given the value computed from clock times.
    pub fn resolve(&self, computed: T) -> T {
        match self {
            ManualOverride::Keep(Some(value)) | ManualOverride::Override(value) => *value,
            ManualOverride::Keep(None) | ManualOverride::Recalculate => computed,
        }
    }

    /// Returns the manual value in effect, if any.
    pub fn manual_value(&self) -> Option<T> {
        match self {
            ManualOverride::Keep(value) => *value,
            ManualOverride::Override(value) => Some(*value),
            ManualOverride::Recalculate => None,
        }
    }

    /// Applies an incoming correction to this stored value.
    ///
    /// The result is always a `Keep`, the normalized stored form.
    pub fn apply(self, incoming: ManualOverride<T>) -> ManualOverride<T> {
        match incoming {
            ManualOverride::Keep(_) => ManualOverride::Keep(self.manual_value()),
            ManualOverride::Override(value) => ManualOverride::Keep(Some(value)),
            ManualOverride::Recalculate => ManualOverride::Keep(None),
        }
    }
}

/// Attendance status for a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// The employee reported for work.
    Present,
    /// The employee did not report for work.
    Absent,
    /// The employee worked a half day.
    HalfDay,
    /// The date is covered by a leave request.
    Leave,
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "present"),
            AttendanceStatus::Absent => write!(f, "absent"),
            AttendanceStatus::HalfDay => write!(f, "half_day"),
            AttendanceStatus::Leave => write!(f, "leave"),
        }
    }
}

/// One employee's attendance for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Unique identifier for the record.
    pub id: String,
    /// The owning organization.
    pub organization_id: String,
    /// The employee this record belongs to.
    pub employee_id: String,
    /// The calendar date of the record.
    pub date: NaiveDate,
    /// Scheduled clock-in time.
    pub schedule_in: NaiveTime,
    /// Scheduled clock-out time.
    pub schedule_out: NaiveTime,
    /// Actual clock-in time (absent when the employee did not report).
    #[serde(default)]
    pub actual_in: Option<NaiveTime>,
    /// Actual clock-out time.
    #[serde(default)]
    pub actual_out: Option<NaiveTime>,
    /// Manually logged overtime hours.
    #[serde(default)]
    pub overtime_hours: Option<Decimal>,
    /// Late minutes override.
    #[serde(default)]
    pub late_override: ManualOverride<Decimal>,
    /// Undertime hours override.
    #[serde(default)]
    pub undertime_override: ManualOverride<Decimal>,
    /// The holiday kind for this date, if it is a holiday.
    #[serde(default)]
    pub holiday: Option<HolidayKind>,
    /// Free-text remark.
    #[serde(default)]
    pub remark: Option<String>,
    /// Attendance status.
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    /// Returns true if pay for this date derives from the leave ledger.
    pub fn is_leave(&self) -> bool {
        self.status == AttendanceStatus::Leave
    }

    /// Applies a correction in place.
    ///
    /// Fields left as `None` in the correction are untouched; override fields
    /// follow [`ManualOverride::apply`].
    pub fn apply_correction(&mut self, correction: AttendanceCorrection) {
        if let Some(actual_in) = correction.actual_in {
            self.actual_in = actual_in;
        }
        if let Some(actual_out) = correction.actual_out {
            self.actual_out = actual_out;
        }
        if let Some(overtime) = correction.overtime_hours {
            self.overtime_hours = overtime;
        }
        if let Some(holiday) = correction.holiday {
            self.holiday = holiday;
        }
        if let Some(status) = correction.status {
            self.status = status;
        }
        if let Some(remark) = correction.remark {
            self.remark = Some(remark);
        }
        self.late_override = self.late_override.apply(correction.late_override);
        self.undertime_override = self.undertime_override.apply(correction.undertime_override);
    }
}

/// A partial update to an [`AttendanceRecord`].
///
/// Nested options distinguish "leave as is" (`None`, field omitted) from
/// "clear" (`Some(None)`, explicit `null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceCorrection {
    /// New actual clock-in time.
    #[serde(default, deserialize_with = "present_field")]
    pub actual_in: Option<Option<NaiveTime>>,
    /// New actual clock-out time.
    #[serde(default, deserialize_with = "present_field")]
    pub actual_out: Option<Option<NaiveTime>>,
    /// New manual overtime hours.
    #[serde(default, deserialize_with = "present_field")]
    pub overtime_hours: Option<Option<Decimal>>,
    /// Late minutes override instruction.
    #[serde(default)]
    pub late_override: ManualOverride<Decimal>,
    /// Undertime hours override instruction.
    #[serde(default)]
    pub undertime_override: ManualOverride<Decimal>,
    /// New holiday tag.
    #[serde(default, deserialize_with = "present_field")]
    pub holiday: Option<Option<HolidayKind>>,
    /// New status.
    #[serde(default)]
    pub status: Option<AttendanceStatus>,
    /// New remark.
    #[serde(default)]
    pub remark: Option<String>,
}

/// Maps a present field (including `null`) to `Some`, so an explicit `null`
/// clears the stored value instead of being treated as omitted.
fn present_field<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
