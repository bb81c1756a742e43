//! Gross pay calculation.
//!
//! This module combines resolved attendance for a cutoff period with the
//! organization's rate table, paid leave days and holiday multipliers into a
//! per-employee [`GrossBreakdown`].
//!
//! ## Components
//!
//! - **Base pay:** ordinary hours on non-holidays × hourly rate
//! - **Holiday pay:** ordinary hours on holidays × hourly rate × holiday multiplier
//! - **Overtime pay:** overtime hours × hourly rate × overtime multiplier, combined
//!   with the holiday multiplier on holidays
//! - **Night differential:** night hours × hourly rate × percent / 100
//! - **Paid leave:** paid leave days × daily rate
//!
//! Pay lines carry exact amounts; each component total is rounded half-up to
//! the currency scale once, and gross pay is the sum of the rounded components.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{NightOvertimeOverlap, OvertimeStacking, PayPolicy, RateTable};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, CutoffPeriod, Employee, GrossBreakdown, HolidayKind, PayCategory, PayLine,
    TimeTotals,
};

use super::rates::derive_rates;
use super::rounding::round_currency;
use super::time_resolver::{Disposition, ResolvedTime};

/// The result of a gross pay calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossResult {
    /// Rounded component totals and time totals.
    pub breakdown: GrossBreakdown,
    /// Exact pay lines behind the breakdown.
    pub pay_lines: Vec<PayLine>,
    /// Audit steps recording each decision.
    pub audit_steps: Vec<AuditStep>,
}

/// The cash value of converted leave days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveCashEquivalent {
    /// Daily rate used.
    pub daily_rate: Decimal,
    /// days × daily rate, rounded half-up to the currency scale.
    pub amount: Decimal,
}

/// Returns the overtime multiplier for a date.
///
/// The base overtime multiplier is the rest-day rate on the employee's rest
/// day and the regular rate otherwise. On regular and special holidays it is
/// combined with the holiday multiplier per the stacking policy; special
/// working days always multiply the special rate by the base overtime rate.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::overtime_multiplier;
/// use payroll_engine::config::{PayPolicy, RateTable};
/// use payroll_engine::models::HolidayKind;
/// use rust_decimal::Decimal;
///
/// let rates = RateTable {
///     night_diff_percent: Decimal::new(10, 0),
///     regular_holiday_rate: Decimal::new(2, 0),
///     special_holiday_rate: Decimal::new(13, 1),
///     overtime_regular_rate: Decimal::new(125, 2),
///     overtime_rest_day_rate: Decimal::new(13, 1),
/// };
/// let policy = PayPolicy::default();
///
/// assert_eq!(overtime_multiplier(None, false, &rates, &policy), Decimal::new(125, 2));
/// assert_eq!(
///     overtime_multiplier(Some(HolidayKind::Regular), false, &rates, &policy),
///     Decimal::new(25, 1)
/// );
/// ```
pub fn overtime_multiplier(
    holiday: Option<HolidayKind>,
    rest_day: bool,
    rates: &RateTable,
    policy: &PayPolicy,
) -> Decimal {
    let base = if rest_day {
        rates.overtime_rest_day_rate
    } else {
        rates.overtime_regular_rate
    };

    match holiday {
        None => base,
        Some(HolidayKind::SpecialWorking) => rates.special_holiday_rate * base,
        Some(kind) => {
            let holiday_rate = rates.holiday_rate(kind);
            match policy.holiday_overtime_stacking {
                OvertimeStacking::Multiplicative => holiday_rate * base,
                OvertimeStacking::Additive => holiday_rate + base - Decimal::ONE,
            }
        }
    }
}

fn holiday_config_ref(kind: HolidayKind) -> &'static str {
    match kind {
        HolidayKind::Regular => "rates.regular_holiday_rate",
        HolidayKind::Special | HolidayKind::SpecialWorking => "rates.special_holiday_rate",
    }
}

/// Computes gross pay for one employee over one cutoff period.
///
/// # Arguments
///
/// * `employee` - The employee being paid
/// * `period` - The cutoff period
/// * `resolved` - Resolved attendance for the employee within the period
/// * `leave_days_paid` - Paid leave days from the leave ledger
/// * `rates` - The organization's rate table
/// * `policy` - The pay policy
/// * `step_number_start` - The first audit step number to use
///
/// # Errors
///
/// - `RecordOutsidePeriod` if a resolved record belongs to another employee
///   or falls outside the period; records are never skipped
/// - `InvalidCutoffPeriod` if the period is invalid
/// - `CalculationError` for a negative leave day count or invalid salary
pub fn compute_gross(
    employee: &Employee,
    period: CutoffPeriod,
    resolved: &[ResolvedTime],
    leave_days_paid: Decimal,
    rates: &RateTable,
    policy: &PayPolicy,
    step_number_start: u32,
) -> EngineResult<GrossResult> {
    period.validate()?;
    rates.validate(&employee.organization_id)?;

    if leave_days_paid < Decimal::ZERO {
        return Err(EngineError::CalculationError {
            message: format!(
                "Paid leave days for employee '{}' cannot be negative, got {}",
                employee.id, leave_days_paid
            ),
        });
    }

    let mut step_number = step_number_start;
    let mut audit_steps = Vec::new();
    let mut pay_lines = Vec::new();
    let mut time = TimeTotals::default();

    let derivation = derive_rates(employee, policy, step_number)?;
    let (daily_rate, hourly_rate) = (derivation.daily_rate, derivation.hourly_rate);
    audit_steps.push(derivation.audit_step);
    step_number += 1;

    let night_rate = hourly_rate * rates.night_diff_percent / Decimal::ONE_HUNDRED;

    for entry in resolved {
        if entry.employee_id != employee.id || !period.contains_date(entry.date) {
            return Err(EngineError::RecordOutsidePeriod {
                record_id: entry.record_id.clone(),
                date: entry.date,
            });
        }

        time.late_minutes += entry.late_minutes;
        time.undertime_hours += entry.undertime_hours;

        match entry.disposition {
            Disposition::Worked => {}
            Disposition::Absent => {
                time.days_absent += 1;
                continue;
            }
            Disposition::HalfDay => {
                time.days_half += 1;
                continue;
            }
            Disposition::Leave => {
                time.days_on_leave += 1;
                continue;
            }
        }

        let ordinary = entry.ordinary_hours();
        let overtime = entry.overtime_hours;
        let rest_day = employee.is_rest_day(entry.date);
        time.worked_hours += entry.worked_hours;
        time.overtime_hours += overtime;

        let ordinary_line = match entry.holiday {
            None => {
                time.base_hours += ordinary;
                PayLine {
                    date: entry.date,
                    record_id: entry.record_id.clone(),
                    category: PayCategory::Base,
                    units: ordinary,
                    rate: hourly_rate,
                    amount: ordinary * hourly_rate,
                    config_ref: "employee.hourly_rate".to_string(),
                }
            }
            Some(kind) => {
                time.holiday_hours += ordinary;
                let rate = hourly_rate * rates.holiday_rate(kind);
                PayLine {
                    date: entry.date,
                    record_id: entry.record_id.clone(),
                    category: PayCategory::Holiday,
                    units: ordinary,
                    rate,
                    amount: ordinary * rate,
                    config_ref: holiday_config_ref(kind).to_string(),
                }
            }
        };

        let ot_multiplier = overtime_multiplier(entry.holiday, rest_day, rates, policy);
        let night_eligible = match policy.night_overtime_overlap {
            NightOvertimeOverlap::Stack => entry.night_hours,
            NightOvertimeOverlap::ExcludeOvertime => {
                (entry.night_hours - overtime).max(Decimal::ZERO)
            }
        };
        time.night_hours += night_eligible;

        audit_steps.push(AuditStep {
            step_number,
            rule_id: "record_pay".to_string(),
            rule_name: "Record Pay".to_string(),
            config_ref: ordinary_line.config_ref.clone(),
            input: serde_json::json!({
                "record_id": entry.record_id,
                "date": entry.date.to_string(),
                "worked_hours": entry.worked_hours.to_string(),
                "overtime_hours": overtime.to_string(),
                "night_hours": entry.night_hours.to_string(),
                "holiday": entry.holiday,
                "rest_day": rest_day,
                "hourly_rate": hourly_rate.to_string()
            }),
            output: serde_json::json!({
                "ordinary_category": ordinary_line.category,
                "ordinary_hours": ordinary.to_string(),
                "ordinary_rate": ordinary_line.rate.to_string(),
                "overtime_multiplier": ot_multiplier.to_string(),
                "night_eligible_hours": night_eligible.to_string()
            }),
            reasoning: format!(
                "{}h ordinary at {}, {}h overtime at {}x, {}h night at {}%",
                ordinary.normalize(),
                ordinary_line.rate.round_dp(4),
                overtime.normalize(),
                ot_multiplier.normalize(),
                night_eligible.normalize(),
                rates.night_diff_percent.normalize()
            ),
        });
        step_number += 1;

        if ordinary > Decimal::ZERO {
            pay_lines.push(ordinary_line);
        }

        if overtime > Decimal::ZERO {
            let rate = hourly_rate * ot_multiplier;
            pay_lines.push(PayLine {
                date: entry.date,
                record_id: entry.record_id.clone(),
                category: PayCategory::Overtime,
                units: overtime,
                rate,
                amount: overtime * rate,
                config_ref: if rest_day {
                    "rates.overtime_rest_day_rate".to_string()
                } else {
                    "rates.overtime_regular_rate".to_string()
                },
            });
        }

        if night_eligible > Decimal::ZERO {
            pay_lines.push(PayLine {
                date: entry.date,
                record_id: entry.record_id.clone(),
                category: PayCategory::NightDifferential,
                units: night_eligible,
                rate: night_rate,
                amount: night_eligible * night_rate,
                config_ref: "rates.night_diff_percent".to_string(),
            });
        }
    }

    if leave_days_paid > Decimal::ZERO {
        pay_lines.push(PayLine {
            date: period.start_date,
            record_id: String::new(),
            category: PayCategory::PaidLeave,
            units: leave_days_paid,
            rate: daily_rate,
            amount: leave_days_paid * daily_rate,
            config_ref: "leave_types.is_paid".to_string(),
        });
    }

    let scale = policy.currency_scale;
    let component = |category: PayCategory| {
        let exact: Decimal = pay_lines
            .iter()
            .filter(|line| line.category == category)
            .map(|line| line.amount)
            .sum();
        round_currency(exact, scale)
    };

    let base_pay = component(PayCategory::Base);
    let overtime_pay = component(PayCategory::Overtime);
    let holiday_pay = component(PayCategory::Holiday);
    let night_diff_pay = component(PayCategory::NightDifferential);
    let paid_leave_pay = component(PayCategory::PaidLeave);
    let gross_pay = base_pay + overtime_pay + holiday_pay + night_diff_pay + paid_leave_pay;

    audit_steps.push(AuditStep {
        step_number,
        rule_id: "gross_pay".to_string(),
        rule_name: "Gross Pay".to_string(),
        config_ref: "policy.currency_scale".to_string(),
        input: serde_json::json!({
            "employee_id": employee.id,
            "period_start": period.start_date.to_string(),
            "period_end": period.end_date.to_string(),
            "records": resolved.len(),
            "paid_leave_days": leave_days_paid.to_string()
        }),
        output: serde_json::json!({
            "base_pay": base_pay.to_string(),
            "overtime_pay": overtime_pay.to_string(),
            "holiday_pay": holiday_pay.to_string(),
            "night_diff_pay": night_diff_pay.to_string(),
            "paid_leave_pay": paid_leave_pay.to_string(),
            "gross_pay": gross_pay.to_string()
        }),
        reasoning: format!(
            "Components rounded half-up to {} places: base {} + overtime {} + holiday {} + night {} + leave {} = {}",
            scale, base_pay, overtime_pay, holiday_pay, night_diff_pay, paid_leave_pay, gross_pay
        ),
    });

    Ok(GrossResult {
        breakdown: GrossBreakdown {
            daily_rate,
            hourly_rate,
            base_pay,
            overtime_pay,
            holiday_pay,
            night_diff_pay,
            paid_leave_pay,
            paid_leave_days: leave_days_paid,
            gross_pay,
            time,
        },
        pay_lines,
        audit_steps,
    })
}

/// Computes the cash equivalent of leave days at the employee's daily rate.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::leave_cash_equivalent;
/// use payroll_engine::config::PayPolicy;
/// use payroll_engine::models::Employee;
/// use rust_decimal::Decimal;
///
/// let employee = Employee {
///     id: "emp_001".to_string(),
///     organization_id: "org_001".to_string(),
///     name: String::new(),
///     monthly_salary: Decimal::new(22000, 0),
///     daily_rate: None,
///     rest_days: vec![],
/// };
/// let cash = leave_cash_equivalent(&employee, Decimal::new(3, 0), &PayPolicy::default()).unwrap();
/// assert_eq!(cash.amount, Decimal::new(3000, 0));
/// ```
pub fn leave_cash_equivalent(
    employee: &Employee,
    days: Decimal,
    policy: &PayPolicy,
) -> EngineResult<LeaveCashEquivalent> {
    let derivation = derive_rates(employee, policy, 1)?;
    Ok(LeaveCashEquivalent {
        daily_rate: derivation.daily_rate,
        amount: round_currency(days * derivation.daily_rate, policy.currency_scale),
    })
}
