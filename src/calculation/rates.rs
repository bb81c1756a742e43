//! Daily and hourly rate derivation.
//!
//! This module derives an employee's daily and hourly rates, either from
//! their daily-rate override or from their monthly salary and the pay policy.

use rust_decimal::Decimal;

use crate::config::PayPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, Employee};

/// The result of a rate derivation, including both rates and the audit step.
#[derive(Debug, Clone)]
pub struct RateDerivation {
    /// The daily rate.
    pub daily_rate: Decimal,
    /// The hourly rate.
    pub hourly_rate: Decimal,
    /// The audit step recording this derivation.
    pub audit_step: AuditStep,
}

/// Derives an employee's daily and hourly rates.
///
/// The daily rate is chosen by the following priority:
/// 1. If `employee.daily_rate` is `Some`, use that override value
/// 2. Otherwise, `monthly_salary / working_days_per_month`
///
/// The hourly rate is always `daily_rate / standard_hours_per_day`. Neither
/// rate is rounded; rounding happens on component totals.
///
/// # Errors
///
/// Returns `CalculationError` if the salary or override is negative, or if
/// a policy divisor is not positive.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::derive_rates;
/// use payroll_engine::config::PayPolicy;
/// use payroll_engine::models::Employee;
/// use rust_decimal::Decimal;
///
/// let employee = Employee {
///     id: "emp_001".to_string(),
///     organization_id: "org_001".to_string(),
///     name: "Maria Santos".to_string(),
///     monthly_salary: Decimal::new(22000, 0),
///     daily_rate: None,
///     rest_days: vec![],
/// };
///
/// let rates = derive_rates(&employee, &PayPolicy::default(), 1).unwrap();
/// assert_eq!(rates.daily_rate, Decimal::new(1000, 0));
/// assert_eq!(rates.hourly_rate, Decimal::new(125, 0));
/// ```
pub fn derive_rates(
    employee: &Employee,
    policy: &PayPolicy,
    step_number: u32,
) -> EngineResult<RateDerivation> {
    policy
        .validate()
        .map_err(|message| EngineError::CalculationError { message })?;

    if employee.monthly_salary < Decimal::ZERO {
        return Err(EngineError::CalculationError {
            message: format!(
                "Employee '{}' has a negative monthly salary {}",
                employee.id, employee.monthly_salary
            ),
        });
    }

    let (daily_rate, source, config_ref) = match employee.daily_rate {
        Some(override_rate) if override_rate < Decimal::ZERO => {
            return Err(EngineError::CalculationError {
                message: format!(
                    "Employee '{}' has a negative daily rate override {}",
                    employee.id, override_rate
                ),
            });
        }
        Some(override_rate) => (override_rate, "employee_override", "employee.daily_rate"),
        None => (
            employee.monthly_salary / policy.working_days_per_month,
            "monthly_salary",
            "policy.working_days_per_month",
        ),
    };
    let hourly_rate = daily_rate / policy.standard_hours_per_day;

    let reasoning = match employee.daily_rate {
        Some(_) => format!(
            "Using daily rate override {} ÷ {} hours = {} per hour",
            daily_rate, policy.standard_hours_per_day, hourly_rate
        ),
        None => format!(
            "Monthly salary {} ÷ {} working days = {} per day; ÷ {} hours = {} per hour",
            employee.monthly_salary,
            policy.working_days_per_month,
            daily_rate,
            policy.standard_hours_per_day,
            hourly_rate
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "rate_derivation".to_string(),
        rule_name: "Rate Derivation".to_string(),
        config_ref: config_ref.to_string(),
        input: serde_json::json!({
            "employee_id": employee.id,
            "monthly_salary": employee.monthly_salary.to_string(),
            "daily_rate_override": employee.daily_rate.map(|r| r.to_string()),
            "working_days_per_month": policy.working_days_per_month.to_string(),
            "standard_hours_per_day": policy.standard_hours_per_day.to_string()
        }),
        output: serde_json::json!({
            "daily_rate": daily_rate.to_string(),
            "hourly_rate": hourly_rate.to_string(),
            "source": source
        }),
        reasoning,
    };

    Ok(RateDerivation {
        daily_rate,
        hourly_rate,
        audit_step,
    })
}
