//! Attendance time resolution.
//!
//! This module converts a single [`AttendanceRecord`] into derived time
//! quantities: late minutes, undertime hours, worked hours and
//! night-differential-eligible hours. Dates that are not worked are
//! forwarded with a [`Disposition`] instead of being paid from clock times.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PayPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceRecord, AttendanceStatus, AuditStep, HolidayKind};

use super::rounding::{minutes_between, minutes_to_hours};

/// How a resolved date feeds into pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Paid from clock times.
    Worked,
    /// Not worked; no attendance pay.
    Absent,
    /// Half day; forwarded without attendance pay.
    HalfDay,
    /// Covered by the leave ledger.
    Leave,
}

/// The derived time quantities for one attendance record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTime {
    /// The attendance record resolved.
    pub record_id: String,
    /// The employee the record belongs to.
    pub employee_id: String,
    /// The record's date.
    pub date: NaiveDate,
    /// Whether the date is paid from clock times or forwarded.
    pub disposition: Disposition,
    /// Minutes late (override wins over computed).
    pub late_minutes: Decimal,
    /// Hours of undertime (override wins over computed).
    pub undertime_hours: Decimal,
    /// Hours between clock-in and clock-out less the unpaid break.
    pub worked_hours: Decimal,
    /// Hours inside the night window.
    pub night_hours: Decimal,
    /// Manually logged overtime hours.
    pub overtime_hours: Decimal,
    /// Holiday kind carried from the record.
    pub holiday: Option<HolidayKind>,
    /// The audit step recording this resolution.
    pub audit_step: AuditStep,
}

impl ResolvedTime {
    /// Worked hours that are not overtime.
    pub fn ordinary_hours(&self) -> Decimal {
        (self.worked_hours - self.overtime_hours).max(Decimal::ZERO)
    }
}

/// Checks the schedule, clock times and manual values of a record.
///
/// # Errors
///
/// - `InvalidScheduleRange` if schedule-out is not after schedule-in
/// - `InvalidAttendanceRange` if actual-out is before actual-in, if a present
///   record has actual-in without actual-out, if a leave record carries clock
///   times, or if a manual value is negative
pub fn validate_record(record: &AttendanceRecord) -> EngineResult<()> {
    if record.schedule_out <= record.schedule_in {
        return Err(EngineError::InvalidScheduleRange {
            record_id: record.id.clone(),
            message: format!(
                "schedule-out {} is not after schedule-in {}",
                record.schedule_out, record.schedule_in
            ),
        });
    }

    if record.status == AttendanceStatus::Leave
        && (record.actual_in.is_some() || record.actual_out.is_some())
    {
        return Err(EngineError::InvalidAttendanceRange {
            record_id: record.id.clone(),
            message: "a leave record cannot carry clock times".to_string(),
        });
    }

    match (record.actual_in, record.actual_out) {
        (Some(actual_in), Some(actual_out)) if actual_out < actual_in => {
            return Err(EngineError::InvalidAttendanceRange {
                record_id: record.id.clone(),
                message: format!(
                    "actual-out {} is before actual-in {}",
                    actual_out, actual_in
                ),
            });
        }
        (Some(actual_in), None) if record.status == AttendanceStatus::Present => {
            return Err(EngineError::InvalidAttendanceRange {
                record_id: record.id.clone(),
                message: format!("actual-in {} has no matching actual-out", actual_in),
            });
        }
        (None, Some(actual_out)) => {
            return Err(EngineError::InvalidAttendanceRange {
                record_id: record.id.clone(),
                message: format!("actual-out {} has no matching actual-in", actual_out),
            });
        }
        _ => {}
    }

    let manual_values = [
        ("overtime hours", record.overtime_hours),
        ("late override", record.late_override.manual_value()),
        ("undertime override", record.undertime_override.manual_value()),
    ];
    for (name, value) in manual_values {
        if let Some(value) = value.filter(|v| *v < Decimal::ZERO) {
            return Err(EngineError::InvalidAttendanceRange {
                record_id: record.id.clone(),
                message: format!("{} cannot be negative, got {}", name, value),
            });
        }
    }

    Ok(())
}

/// Hours of `[start, end]` that fall inside the policy's night window.
///
/// The window may wrap midnight (e.g. 22:00 to 06:00), in which case it is
/// treated as the two same-day spans `[window_start, 24:00)` and
/// `[00:00, window_end)`.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::night_hours;
/// use payroll_engine::config::PayPolicy;
/// use chrono::NaiveTime;
/// use rust_decimal::Decimal;
///
/// let policy = PayPolicy::default(); // 22:00 to 06:00
/// let start = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
/// let end = NaiveTime::from_hms_opt(23, 30, 0).unwrap();
/// assert_eq!(night_hours(start, end, &policy), Decimal::new(15, 1));
/// ```
pub fn night_hours(start: NaiveTime, end: NaiveTime, policy: &PayPolicy) -> Decimal {
    let window_start = policy.night_window_start;
    let window_end = policy.night_window_end;
    let day_start = Decimal::ZERO;
    let day_end = Decimal::new(24 * 60, 0);

    let to_minutes = |t: NaiveTime| minutes_between(NaiveTime::MIN, t);
    let (span_start, span_end) = (to_minutes(start), to_minutes(end));

    let windows: Vec<(Decimal, Decimal)> = if window_start < window_end {
        vec![(to_minutes(window_start), to_minutes(window_end))]
    } else if window_start > window_end {
        vec![
            (to_minutes(window_start), day_end),
            (day_start, to_minutes(window_end)),
        ]
    } else {
        Vec::new()
    };

    let overlap_minutes: Decimal = windows
        .into_iter()
        .map(|(w_start, w_end)| {
            (span_end.min(w_end) - span_start.max(w_start)).max(Decimal::ZERO)
        })
        .sum();

    minutes_to_hours(overlap_minutes)
}

/// Resolves one attendance record into derived time quantities.
///
/// # Rules
///
/// - A record that is not `present`, or has no actual-in, is forwarded with
///   zero worked, night and overtime hours
/// - Late minutes = `max(0, actual_in - schedule_in)` unless overridden
/// - Undertime hours = `max(0, schedule_out - actual_out)` unless overridden
/// - Worked hours = `(actual_out - actual_in) - unpaid break`, floored at 0
/// - Overtime hours are the manual value; absence means zero
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::resolve;
/// use payroll_engine::config::PayPolicy;
/// use payroll_engine::models::{AttendanceRecord, AttendanceStatus, ManualOverride};
/// use chrono::{NaiveDate, NaiveTime};
/// use rust_decimal::Decimal;
///
/// let record = AttendanceRecord {
///     id: "att_001".to_string(),
///     organization_id: "org_001".to_string(),
///     employee_id: "emp_001".to_string(),
///     date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
///     schedule_in: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
///     schedule_out: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
///     actual_in: Some(NaiveTime::from_hms_opt(9, 15, 0).unwrap()),
///     actual_out: Some(NaiveTime::from_hms_opt(18, 0, 0).unwrap()),
///     overtime_hours: None,
///     late_override: ManualOverride::default(),
///     undertime_override: ManualOverride::default(),
///     holiday: None,
///     remark: None,
///     status: AttendanceStatus::Present,
/// };
///
/// let policy = PayPolicy { unpaid_break_minutes: 0, ..PayPolicy::default() };
/// let resolved = resolve(&record, &policy, 1).unwrap();
/// assert_eq!(resolved.late_minutes, Decimal::new(15, 0));
/// assert_eq!(resolved.undertime_hours, Decimal::ZERO);
/// assert_eq!(resolved.worked_hours, Decimal::new(875, 2));
/// ```
pub fn resolve(
    record: &AttendanceRecord,
    policy: &PayPolicy,
    step_number: u32,
) -> EngineResult<ResolvedTime> {
    validate_record(record)?;

    let clock = match (record.status, record.actual_in, record.actual_out) {
        (AttendanceStatus::Present, Some(actual_in), Some(actual_out)) => {
            Some((actual_in, actual_out))
        }
        _ => None,
    };

    let Some((actual_in, actual_out)) = clock else {
        return Ok(forward(record, step_number));
    };

    let computed_late = minutes_between(record.schedule_in, actual_in).max(Decimal::ZERO);
    let computed_undertime =
        minutes_to_hours(minutes_between(actual_out, record.schedule_out)).max(Decimal::ZERO);
    let late_minutes = record.late_override.resolve(computed_late);
    let undertime_hours = record.undertime_override.resolve(computed_undertime);

    let break_minutes = Decimal::from(policy.unpaid_break_minutes);
    let span_minutes = minutes_between(actual_in, actual_out);
    let worked_hours = minutes_to_hours((span_minutes - break_minutes).max(Decimal::ZERO));
    let night = night_hours(actual_in, actual_out, policy);
    let overtime_hours = record.overtime_hours.unwrap_or(Decimal::ZERO);

    let audit_step = AuditStep {
        step_number,
        rule_id: "time_resolution".to_string(),
        rule_name: "Time Resolution".to_string(),
        config_ref: "policy.unpaid_break_minutes".to_string(),
        input: serde_json::json!({
            "record_id": record.id,
            "date": record.date.to_string(),
            "schedule_in": record.schedule_in.to_string(),
            "schedule_out": record.schedule_out.to_string(),
            "actual_in": actual_in.to_string(),
            "actual_out": actual_out.to_string(),
            "late_override": record.late_override.manual_value().map(|v| v.to_string()),
            "undertime_override": record.undertime_override.manual_value().map(|v| v.to_string()),
            "overtime_hours": overtime_hours.to_string(),
            "unpaid_break_minutes": policy.unpaid_break_minutes
        }),
        output: serde_json::json!({
            "disposition": Disposition::Worked,
            "late_minutes": late_minutes.to_string(),
            "undertime_hours": undertime_hours.to_string(),
            "worked_hours": worked_hours.to_string(),
            "night_hours": night.to_string(),
            "overtime_hours": overtime_hours.to_string(),
            "holiday": record.holiday
        }),
        reasoning: format!(
            "Worked {} to {} less {} min break = {}h; late {} min, undertime {}h, night {}h",
            actual_in,
            actual_out,
            policy.unpaid_break_minutes,
            worked_hours.normalize(),
            late_minutes.normalize(),
            undertime_hours.normalize(),
            night.normalize()
        ),
    };

    Ok(ResolvedTime {
        record_id: record.id.clone(),
        employee_id: record.employee_id.clone(),
        date: record.date,
        disposition: Disposition::Worked,
        late_minutes,
        undertime_hours,
        worked_hours,
        night_hours: night,
        overtime_hours,
        holiday: record.holiday,
        audit_step,
    })
}

/// Builds the result for a date that is not paid from clock times.
fn forward(record: &AttendanceRecord, step_number: u32) -> ResolvedTime {
    let disposition = match record.status {
        AttendanceStatus::Leave => Disposition::Leave,
        AttendanceStatus::HalfDay => Disposition::HalfDay,
        AttendanceStatus::Absent | AttendanceStatus::Present => Disposition::Absent,
    };
    let late_minutes = record.late_override.resolve(Decimal::ZERO);
    let undertime_hours = record.undertime_override.resolve(Decimal::ZERO);

    let audit_step = AuditStep {
        step_number,
        rule_id: "time_resolution".to_string(),
        rule_name: "Time Resolution".to_string(),
        config_ref: "attendance.status".to_string(),
        input: serde_json::json!({
            "record_id": record.id,
            "date": record.date.to_string(),
            "status": record.status,
            "has_actual_in": record.actual_in.is_some(),
            "overtime_hours": record.overtime_hours.map(|v| v.to_string())
        }),
        output: serde_json::json!({
            "disposition": disposition,
            "worked_hours": "0"
        }),
        reasoning: format!(
            "Status '{}' is not paid from clock times; date forwarded as {:?}",
            record.status, disposition
        ),
    };

    ResolvedTime {
        record_id: record.id.clone(),
        employee_id: record.employee_id.clone(),
        date: record.date,
        disposition,
        late_minutes,
        undertime_hours,
        worked_hours: Decimal::ZERO,
        night_hours: Decimal::ZERO,
        overtime_hours: Decimal::ZERO,
        holiday: record.holiday,
        audit_step,
    }
}
