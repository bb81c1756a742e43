//! Error types for the Payroll Computation Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while resolving attendance,
//! mutating the leave ledger, computing pay, or driving a payroll run.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for the Payroll Computation Engine.
///
/// Validation errors always identify the offending record so the caller can
/// surface it; nothing is silently skipped.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::RateTableMissing {
///     organization_id: "org_001".to_string(),
/// };
/// assert_eq!(error.to_string(), "No rate table configured for organization 'org_001'");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The organization has no configured rate table.
    #[error("No rate table configured for organization '{organization_id}'")]
    RateTableMissing {
        /// The organization without rates.
        organization_id: String,
    },

    /// A rate table contains values the calculator cannot honour.
    #[error("Invalid rate table for organization '{organization_id}': {message}")]
    InvalidRateTable {
        /// The organization owning the rate table.
        organization_id: String,
        /// What is wrong with the table.
        message: String,
    },

    /// Actual clock times of an attendance record are inconsistent.
    #[error("Invalid attendance range on record '{record_id}': {message}")]
    InvalidAttendanceRange {
        /// The offending attendance record.
        record_id: String,
        /// A description of the problem.
        message: String,
    },

    /// Scheduled times of an attendance record are inconsistent.
    #[error("Invalid schedule range on record '{record_id}': {message}")]
    InvalidScheduleRange {
        /// The offending attendance record.
        record_id: String,
        /// A description of the problem.
        message: String,
    },

    /// Two attendance rows exist for the same employee and date.
    #[error("Duplicate attendance for employee '{employee_id}' on {date}")]
    DuplicateAttendance {
        /// The employee.
        employee_id: String,
        /// The duplicated date.
        date: NaiveDate,
    },

    /// An attendance record was handed to a period it does not belong to.
    #[error("Attendance record '{record_id}' on {date} does not belong to this computation")]
    RecordOutsidePeriod {
        /// The offending attendance record.
        record_id: String,
        /// The record's date.
        date: NaiveDate,
    },

    /// A cutoff period does not satisfy `start < end`.
    #[error("Invalid cutoff period: {start} to {end}")]
    InvalidCutoffPeriod {
        /// Period start.
        start: NaiveDate,
        /// Period end.
        end: NaiveDate,
    },

    /// An employee referenced by a run or request is unknown.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The unknown employee id.
        employee_id: String,
    },

    /// A leave operation would drive a balance below zero.
    #[error(
        "Insufficient {leave_type} balance for employee '{employee_id}': requested {requested}, available {available}"
    )]
    InsufficientLeaveBalance {
        /// The employee.
        employee_id: String,
        /// The leave type.
        leave_type: String,
        /// Days requested.
        requested: Decimal,
        /// Days available.
        available: Decimal,
    },

    /// The leave type has no settings entry for the organization.
    #[error("Leave type not configured: {leave_type}")]
    LeaveTypeNotConfigured {
        /// The leave type.
        leave_type: String,
    },

    /// A leave request is not in a state that allows the requested action.
    #[error("Cannot {action} leave request {request_id} in state '{status}'")]
    InvalidLeaveTransition {
        /// The leave request.
        request_id: Uuid,
        /// The request's current status.
        status: String,
        /// The attempted action.
        action: String,
    },

    /// A leave request or ledger mutation carries invalid data.
    #[error("Invalid leave operation: {message}")]
    InvalidLeaveRequest {
        /// A description of the problem.
        message: String,
    },

    /// An ad-hoc deduction or incentive line item is invalid.
    #[error("Invalid line item '{label}': {message}")]
    InvalidLineItem {
        /// The line item label.
        label: String,
        /// A description of the problem.
        message: String,
    },

    /// A payroll run was mutated after finalization or a wizard stage was skipped.
    #[error("Stale payroll run state for run {run_id}: {message}")]
    StaleRunState {
        /// The payroll run.
        run_id: Uuid,
        /// A description of the rejected transition.
        message: String,
    },

    /// A run cannot be finalized while negative net pay lines are unacknowledged.
    #[error("Negative net pay not acknowledged for employees: {}", employee_ids.join(", "))]
    UnacknowledgedNegativePay {
        /// Employees whose negative net pay still needs acknowledgement.
        employee_ids: Vec<String>,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/rates.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/rates.yaml"
        );
    }

    #[test]
    fn test_invalid_attendance_range_names_record() {
        let error = EngineError::InvalidAttendanceRange {
            record_id: "att_001".to_string(),
            message: "actual-out 08:00 is before actual-in 09:00".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid attendance range on record 'att_001': actual-out 08:00 is before actual-in 09:00"
        );
    }

    #[test]
    fn test_insufficient_balance_displays_amounts() {
        let error = EngineError::InsufficientLeaveBalance {
            employee_id: "emp_001".to_string(),
            leave_type: "vacation".to_string(),
            requested: Decimal::from_str("5").unwrap(),
            available: Decimal::from_str("2").unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "Insufficient vacation balance for employee 'emp_001': requested 5, available 2"
        );
    }

    #[test]
    fn test_unacknowledged_negative_pay_lists_employees() {
        let error = EngineError::UnacknowledgedNegativePay {
            employee_ids: vec!["emp_001".to_string(), "emp_002".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Negative net pay not acknowledged for employees: emp_001, emp_002"
        );
    }

    #[test]
    fn test_invalid_cutoff_period_displays_dates() {
        let error = EngineError::InvalidCutoffPeriod {
            start: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid cutoff period: 2026-01-15 to 2026-01-01"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_missing_rates() -> EngineResult<()> {
            Err(EngineError::RateTableMissing {
                organization_id: "org_404".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_missing_rates()?;
            Ok(())
        }

        assert!(matches!(
            propagates_error(),
            Err(EngineError::RateTableMissing { .. })
        ));
    }
}
