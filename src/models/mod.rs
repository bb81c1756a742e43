//! Core data models for the Payroll Computation Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod calculation_result;
mod deduction;
mod employee;
mod leave;
mod pay_period;

pub use attendance::{AttendanceCorrection, AttendanceRecord, AttendanceStatus, ManualOverride};
pub use calculation_result::{
    AuditStep, AuditTrace, AuditWarning, GrossBreakdown, NetBreakdown, PayCategory, PayLine,
    PayrollSummaryLine, StatutoryDeduction, TimeTotals,
};
pub use deduction::{
    DeductionFrequency, DeductionSetting, DeductionToggle, LineItem, StatutoryKind,
};
pub use employee::Employee;
pub use leave::{
    CashConversion, LeaveAuditEntry, LeaveCredit, LeaveRequest, LeaveRequestStatus, LeaveType,
    LedgerAction,
};
pub use pay_period::{CutoffPeriod, Holiday, HolidayCalendar, HolidayKind};
