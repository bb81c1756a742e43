//! Bulk attendance import.
//!
//! Imports are all-or-nothing: every row is validated before any row is
//! accepted, and the first invalid row is reported by record id.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceRecord, HolidayCalendar};

use super::time_resolver::validate_record;

/// Validates and tags a batch of attendance rows.
///
/// Rows without a holiday kind are tagged from the organization's holiday
/// calendar. Rows that already carry a kind keep it.
///
/// # Errors
///
/// - `InvalidScheduleRange` / `InvalidAttendanceRange` for an invalid row
/// - `DuplicateAttendance` for a second row with the same employee and date
pub fn import_attendance(
    rows: Vec<AttendanceRecord>,
    calendar: &HolidayCalendar,
) -> EngineResult<Vec<AttendanceRecord>> {
    let mut seen: HashSet<(String, NaiveDate)> = HashSet::with_capacity(rows.len());
    let mut imported = Vec::with_capacity(rows.len());
    let mut tagged = 0usize;

    for mut row in rows {
        validate_record(&row)?;

        if !seen.insert((row.employee_id.clone(), row.date)) {
            return Err(EngineError::DuplicateAttendance {
                employee_id: row.employee_id,
                date: row.date,
            });
        }

        if row.holiday.is_none() {
            if let Some(holiday) = calendar.get(row.date) {
                debug!(record_id = %row.id, date = %row.date, holiday = %holiday.name, "Tagged holiday");
                row.holiday = Some(holiday.kind);
                tagged += 1;
            }
        }

        imported.push(row);
    }

    info!(rows = imported.len(), holidays_tagged = tagged, "Imported attendance");
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, Holiday, HolidayKind, ManualOverride};
    use chrono::NaiveTime;

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(id: &str, employee_id: &str, day: NaiveDate) -> AttendanceRecord {
        AttendanceRecord {
            id: id.to_string(),
            organization_id: "org_001".to_string(),
            employee_id: employee_id.to_string(),
            date: day,
            schedule_in: time("09:00"),
            schedule_out: time("18:00"),
            actual_in: Some(time("09:00")),
            actual_out: Some(time("18:00")),
            overtime_hours: None,
            late_override: ManualOverride::default(),
            undertime_override: ManualOverride::default(),
            holiday: None,
            remark: None,
            status: AttendanceStatus::Present,
        }
    }

    fn calendar() -> HolidayCalendar {
        HolidayCalendar::new(vec![Holiday {
            date: date(2026, 6, 12),
            name: "Independence Day".to_string(),
            kind: HolidayKind::Regular,
            region: "national".to_string(),
        }])
    }

    #[test]
    fn test_import_tags_holidays_from_calendar() {
        let rows = vec![
            row("att_001", "emp_001", date(2026, 6, 11)),
            row("att_002", "emp_001", date(2026, 6, 12)),
        ];
        let imported = import_attendance(rows, &calendar()).unwrap();
        assert_eq!(imported[0].holiday, None);
        assert_eq!(imported[1].holiday, Some(HolidayKind::Regular));
    }

    #[test]
    fn test_import_keeps_explicit_holiday_kind() {
        let mut explicit = row("att_001", "emp_001", date(2026, 6, 12));
        explicit.holiday = Some(HolidayKind::Special);
        let imported = import_attendance(vec![explicit], &calendar()).unwrap();
        assert_eq!(imported[0].holiday, Some(HolidayKind::Special));
    }

    #[test]
    fn test_import_rejects_duplicate_employee_date() {
        let rows = vec![
            row("att_001", "emp_001", date(2026, 6, 11)),
            row("att_002", "emp_002", date(2026, 6, 11)),
            row("att_003", "emp_001", date(2026, 6, 11)),
        ];
        match import_attendance(rows, &calendar()) {
            Err(EngineError::DuplicateAttendance { employee_id, date: d }) => {
                assert_eq!(employee_id, "emp_001");
                assert_eq!(d, date(2026, 6, 11));
            }
            other => panic!("Expected DuplicateAttendance, got {:?}", other),
        }
    }

    #[test]
    fn test_import_reports_first_invalid_row() {
        let mut bad = row("att_002", "emp_001", date(2026, 6, 12));
        bad.actual_out = Some(time("08:00"));
        let rows = vec![row("att_001", "emp_001", date(2026, 6, 11)), bad];

        match import_attendance(rows, &calendar()) {
            Err(EngineError::InvalidAttendanceRange { record_id, .. }) => {
                assert_eq!(record_id, "att_002");
            }
            other => panic!("Expected InvalidAttendanceRange, got {:?}", other),
        }
    }
}
