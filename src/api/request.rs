//! Request types for the Payroll Computation Engine API.
//!
//! This module defines the JSON request structures for the
//! `/attendance/resolve` and `/payroll/calculate` endpoints.

use chrono::{NaiveDate, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    AttendanceRecord, AttendanceStatus, DeductionSetting, Employee, HolidayKind, LineItem,
    ManualOverride,
};

/// Request body for the `/attendance/resolve` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// The organization the records belong to.
    pub organization_id: String,
    /// The attendance rows to validate and resolve.
    pub records: Vec<AttendanceRecordRequest>,
}

/// Request body for the `/payroll/calculate` endpoint.
///
/// Contains everything needed to compute one employee's gross and net pay
/// for one cutoff period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// The employee information.
    pub employee: EmployeeRequest,
    /// The cutoff period.
    pub period: PeriodRequest,
    /// Attendance within the period.
    #[serde(default)]
    pub attendance: Vec<AttendanceRecordRequest>,
    /// Paid leave days drawn from the leave ledger for this period.
    #[serde(default)]
    pub paid_leave_days: Decimal,
    /// Statutory deduction toggles; all enabled in full when omitted.
    #[serde(default)]
    pub deductions: DeductionSetting,
    /// Ad-hoc deductions.
    #[serde(default)]
    pub ad_hoc_deductions: Vec<LineItem>,
    /// Incentives.
    #[serde(default)]
    pub incentives: Vec<LineItem>,
}

/// Employee information in a calculation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRequest {
    /// Unique identifier for the employee.
    pub id: String,
    /// The organization the employee belongs to.
    pub organization_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Monthly basic salary.
    pub monthly_salary: Decimal,
    /// Optional override for the daily rate.
    #[serde(default)]
    pub daily_rate: Option<Decimal>,
    /// Rest days, e.g. `["Sun"]`.
    #[serde(default)]
    pub rest_days: Vec<Weekday>,
}

/// Cutoff period in a calculation request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PeriodRequest {
    /// First day of the period (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the period (inclusive).
    pub end_date: NaiveDate,
}

/// One attendance row in a request. The organization is taken from the
/// enclosing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecordRequest {
    /// Unique identifier for the record.
    pub id: String,
    /// The employee.
    pub employee_id: String,
    /// Calendar date.
    pub date: NaiveDate,
    /// Scheduled clock-in.
    pub schedule_in: NaiveTime,
    /// Scheduled clock-out.
    pub schedule_out: NaiveTime,
    /// Actual clock-in.
    #[serde(default)]
    pub actual_in: Option<NaiveTime>,
    /// Actual clock-out.
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
    /// Holiday kind; tagged from the holiday calendar when omitted.
    #[serde(default)]
    pub holiday: Option<HolidayKind>,
    /// Free-text remark.
    #[serde(default)]
    pub remark: Option<String>,
    /// Attendance status.
    #[serde(default = "default_status")]
    pub status: AttendanceStatus,
}

fn default_status() -> AttendanceStatus {
    AttendanceStatus::Present
}

impl AttendanceRecordRequest {
    /// Converts the row into a record owned by `organization_id`.
    pub fn into_record(self, organization_id: &str) -> AttendanceRecord {
        AttendanceRecord {
            id: self.id,
            organization_id: organization_id.to_string(),
            employee_id: self.employee_id,
            date: self.date,
            schedule_in: self.schedule_in,
            schedule_out: self.schedule_out,
            actual_in: self.actual_in,
            actual_out: self.actual_out,
            overtime_hours: self.overtime_hours,
            late_override: self.late_override,
            undertime_override: self.undertime_override,
            holiday: self.holiday,
            remark: self.remark,
            status: self.status,
        }
    }
}

impl From<EmployeeRequest> for Employee {
    fn from(req: EmployeeRequest) -> Self {
        Employee {
            id: req.id,
            organization_id: req.organization_id,
            name: req.name,
            monthly_salary: req.monthly_salary,
            daily_rate: req.daily_rate,
            rest_days: req.rest_days,
        }
    }
}
