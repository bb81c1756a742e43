//! Calculation result models for the Payroll Computation Engine.
//!
//! This module contains the [`PayrollSummaryLine`] type and the breakdowns
//! that make it up: per-record pay lines, the gross breakdown, statutory and
//! ad-hoc deductions, incentives, and the audit trace explaining every step.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{DeductionFrequency, LineItem, StatutoryKind};

/// Represents the category of pay for a pay line.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PayCategory;
///
/// let category = PayCategory::NightDifferential;
/// assert_eq!(serde_json::to_string(&category).unwrap(), "\"night_differential\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayCategory {
    /// Ordinary hours on a non-holiday.
    Base,
    /// Manually logged overtime.
    Overtime,
    /// Ordinary hours on a holiday.
    Holiday,
    /// Night-differential premium.
    NightDifferential,
    /// Paid leave days.
    PaidLeave,
}

/// A single line item in a gross pay calculation.
///
/// Amounts on pay lines are exact; rounding happens once per component total
/// in [`GrossBreakdown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayLine {
    /// The date this pay line applies to.
    pub date: NaiveDate,
    /// The attendance record this pay line originated from (empty for leave pay).
    pub record_id: String,
    /// The category of pay.
    pub category: PayCategory,
    /// Hours (or days, for paid leave) in this category.
    pub units: Decimal,
    /// The effective rate per unit.
    pub rate: Decimal,
    /// units × rate, unrounded.
    pub amount: Decimal,
    /// The configuration key the rate came from.
    pub config_ref: String,
}

/// Time totals for an employee over a cutoff period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTotals {
    /// Worked hours from clock times.
    pub worked_hours: Decimal,
    /// Ordinary (non-overtime) hours on non-holidays.
    pub base_hours: Decimal,
    /// Ordinary hours on holidays.
    pub holiday_hours: Decimal,
    /// Manually logged overtime hours.
    pub overtime_hours: Decimal,
    /// Night-differential-eligible hours.
    pub night_hours: Decimal,
    /// Late minutes.
    pub late_minutes: Decimal,
    /// Undertime hours.
    pub undertime_hours: Decimal,
    /// Dates recorded as absent.
    pub days_absent: u32,
    /// Dates recorded as half-day.
    pub days_half: u32,
    /// Dates recorded as leave.
    pub days_on_leave: u32,
}

/// Gross pay broken down by component.
///
/// Each component is rounded half-up to the currency unit exactly once and
/// `gross_pay` is the sum of the rounded components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossBreakdown {
    /// Daily rate used.
    pub daily_rate: Decimal,
    /// Hourly rate used.
    pub hourly_rate: Decimal,
    /// Ordinary non-holiday pay.
    pub base_pay: Decimal,
    /// Overtime pay.
    pub overtime_pay: Decimal,
    /// Holiday pay.
    pub holiday_pay: Decimal,
    /// Night-differential premium.
    pub night_diff_pay: Decimal,
    /// Paid-leave pay.
    pub paid_leave_pay: Decimal,
    /// Paid leave days behind `paid_leave_pay`.
    pub paid_leave_days: Decimal,
    /// Sum of the rounded components.
    pub gross_pay: Decimal,
    /// Time totals behind the amounts.
    pub time: TimeTotals,
}

/// One statutory deduction applied in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatutoryDeduction {
    /// Which deduction.
    pub kind: StatutoryKind,
    /// Full or half.
    pub frequency: DeductionFrequency,
    /// The bracket amount for a full period.
    pub full_period_amount: Decimal,
    /// The amount withheld this run, rounded to the currency unit.
    pub withheld: Decimal,
}

/// Net pay broken down into deductions and incentives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetBreakdown {
    /// Gross pay the deductions apply to.
    pub gross_pay: Decimal,
    /// Enabled statutory deductions.
    pub statutory: Vec<StatutoryDeduction>,
    /// Ad-hoc deductions.
    pub ad_hoc_deductions: Vec<LineItem>,
    /// Incentives.
    pub incentives: Vec<LineItem>,
    /// Σ statutory withheld.
    pub total_statutory: Decimal,
    /// Σ ad-hoc deductions.
    pub total_ad_hoc: Decimal,
    /// Σ all deductions.
    pub total_deductions: Decimal,
    /// Σ incentives.
    pub total_incentives: Decimal,
    /// gross − deductions + incentives; may be negative.
    pub net_pay: Decimal,
    /// Set when `net_pay` is below zero; needs acknowledgement before finalizing.
    pub negative_net_pay: bool,
}

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The configuration key the rule read.
    pub config_ref: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate conditions that don't prevent calculation but need a
/// human to look at them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for one employee's computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
}

/// One employee's payroll result for one run. Purely derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollSummaryLine {
    /// The employee.
    pub employee_id: String,
    /// The employee's display name.
    pub employee_name: String,
    /// Gross breakdown.
    pub gross: GrossBreakdown,
    /// Deductions, incentives and net pay.
    pub net: NetBreakdown,
    /// Exact pay lines behind the gross breakdown.
    pub pay_lines: Vec<PayLine>,
    /// Complete audit trace of calculation decisions.
    pub audit_trace: AuditTrace,
}

impl PayrollSummaryLine {
    /// Net pay for the line.
    pub fn net_pay(&self) -> Decimal {
        self.net.net_pay
    }

    /// Returns true if the line needs negative-pay acknowledgement.
    pub fn is_negative(&self) -> bool {
        self.net.negative_net_pay
    }
}
