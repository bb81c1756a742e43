//! Configuration types for payroll computation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::models::{Holiday, HolidayKind, LeaveType, StatutoryKind};

/// Pay multipliers for one organization.
///
/// There is a single active version per organization and replacing it is a
/// full replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    /// Night-differential premium as a percentage of the hourly rate (e.g. 10).
    pub night_diff_percent: Decimal,
    /// Multiplier for hours worked on a regular holiday.
    pub regular_holiday_rate: Decimal,
    /// Multiplier for hours worked on a special holiday.
    pub special_holiday_rate: Decimal,
    /// Multiplier for overtime on an ordinary day.
    pub overtime_regular_rate: Decimal,
    /// Multiplier for overtime on the employee's rest day.
    pub overtime_rest_day_rate: Decimal,
}

impl RateTable {
    /// Validates the table for an organization.
    ///
    /// Every multiplier must be at least 1 and the night-differential percent
    /// must lie within 0..=100.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::config::RateTable;
    /// use rust_decimal::Decimal;
    ///
    /// let mut rates = RateTable {
    ///     night_diff_percent: Decimal::new(10, 0),
    ///     regular_holiday_rate: Decimal::new(2, 0),
    ///     special_holiday_rate: Decimal::new(13, 1),
    ///     overtime_regular_rate: Decimal::new(125, 2),
    ///     overtime_rest_day_rate: Decimal::new(13, 1),
    /// };
    /// assert!(rates.validate("org_001").is_ok());
    ///
    /// rates.regular_holiday_rate = Decimal::new(5, 1);
    /// assert!(rates.validate("org_001").is_err());
    /// ```
    pub fn validate(&self, organization_id: &str) -> EngineResult<()> {
        let multipliers = [
            ("regular_holiday_rate", self.regular_holiday_rate),
            ("special_holiday_rate", self.special_holiday_rate),
            ("overtime_regular_rate", self.overtime_regular_rate),
            ("overtime_rest_day_rate", self.overtime_rest_day_rate),
        ];

        for (name, value) in multipliers {
            if value < Decimal::ONE {
                return Err(EngineError::InvalidRateTable {
                    organization_id: organization_id.to_string(),
                    message: format!("{} must be at least 1, got {}", name, value),
                });
            }
        }

        if self.night_diff_percent < Decimal::ZERO || self.night_diff_percent > Decimal::ONE_HUNDRED
        {
            return Err(EngineError::InvalidRateTable {
                organization_id: organization_id.to_string(),
                message: format!(
                    "night_diff_percent must be within 0..=100, got {}",
                    self.night_diff_percent
                ),
            });
        }

        Ok(())
    }

    /// Returns the multiplier for a holiday kind.
    pub fn holiday_rate(&self, kind: HolidayKind) -> Decimal {
        match kind {
            HolidayKind::Regular => self.regular_holiday_rate,
            HolidayKind::Special | HolidayKind::SpecialWorking => self.special_holiday_rate,
        }
    }
}

/// rates.yaml file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Map of organization id to its rate table.
    pub organizations: HashMap<String, RateTable>,
}

/// How a holiday multiplier combines with an overtime multiplier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OvertimeStacking {
    /// holiday × overtime.
    #[default]
    Multiplicative,
    /// holiday + overtime − 1.
    Additive,
}

/// Whether night hours that are also overtime earn the night premium.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NightOvertimeOverlap {
    /// Night premium applies to every night-eligible hour.
    #[default]
    Stack,
    /// Overtime hours are taken out of the night-eligible hours first.
    ExcludeOvertime,
}

/// Deployment-wide pay policy from policy.yaml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPolicy {
    /// Unpaid break deducted from every worked record.
    pub unpaid_break_minutes: u32,
    /// Start of the night-differential window.
    pub night_window_start: NaiveTime,
    /// End of the night-differential window; may be earlier than the start
    /// when the window wraps midnight.
    pub night_window_end: NaiveTime,
    /// Hours in a standard working day (hourly-rate divisor).
    pub standard_hours_per_day: Decimal,
    /// Working days in a month (daily-rate divisor).
    pub working_days_per_month: Decimal,
    /// Decimal places of the smallest currency unit.
    #[serde(default = "default_currency_scale")]
    pub currency_scale: u32,
    /// Holiday and overtime multiplier stacking.
    #[serde(default)]
    pub holiday_overtime_stacking: OvertimeStacking,
    /// Night and overtime overlap handling.
    #[serde(default)]
    pub night_overtime_overlap: NightOvertimeOverlap,
}

fn default_currency_scale() -> u32 {
    2
}

impl Default for PayPolicy {
    fn default() -> Self {
        Self {
            unpaid_break_minutes: 60,
            night_window_start: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
            night_window_end: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN),
            standard_hours_per_day: Decimal::new(8, 0),
            working_days_per_month: Decimal::new(22, 0),
            currency_scale: default_currency_scale(),
            holiday_overtime_stacking: OvertimeStacking::default(),
            night_overtime_overlap: NightOvertimeOverlap::default(),
        }
    }
}

impl PayPolicy {
    /// Checks that the rate divisors are positive.
    pub fn validate(&self) -> Result<(), String> {
        if self.standard_hours_per_day <= Decimal::ZERO {
            return Err("standard_hours_per_day must be positive".to_string());
        }
        if self.working_days_per_month <= Decimal::ZERO {
            return Err("working_days_per_month must be positive".to_string());
        }
        Ok(())
    }
}

/// When an approved leave request may still be cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationPolicy {
    /// Only before the first day of leave.
    #[default]
    BeforeStart,
    /// At any time.
    Anytime,
}

/// Settings for one leave type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveTypeSetting {
    /// The leave type these settings apply to.
    #[serde(rename = "type")]
    pub leave_type: LeaveType,
    /// Display name.
    pub name: String,
    /// Days granted per cycle.
    pub default_credits: Decimal,
    /// Whether approved days are paid at the daily rate.
    pub is_paid: bool,
    /// Whether requests need an approver; otherwise they approve on submit.
    #[serde(default = "default_true")]
    pub requires_approval: bool,
    /// Longest single request in days.
    #[serde(default)]
    pub max_consecutive_days: Option<Decimal>,
    /// Whether unused balance carries over at year end.
    #[serde(default)]
    pub carry_over: bool,
    /// Cap on carried-over days.
    #[serde(default)]
    pub max_carry_over: Option<Decimal>,
    /// Whether the balance may go below zero.
    #[serde(default)]
    pub allow_negative_balance: bool,
    /// Whether holidays inside a request count against the balance.
    #[serde(default = "default_true")]
    pub debit_on_holidays: bool,
    /// When approved requests may be cancelled.
    #[serde(default)]
    pub cancellation: CancellationPolicy,
}

fn default_true() -> bool {
    true
}

/// leave_types.yaml file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveTypesConfig {
    /// All configured leave types.
    pub leave_types: Vec<LeaveTypeSetting>,
}

/// One row of a statutory bracket table.
///
/// A bracket covers gross in `[lower, upper)`; the last bracket has no upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatutoryBracket {
    /// Inclusive lower bound.
    pub lower: Decimal,
    /// Exclusive upper bound.
    #[serde(default)]
    pub upper: Option<Decimal>,
    /// Fixed amount for the bracket.
    #[serde(default)]
    pub fixed: Decimal,
    /// Rate applied to the gross above `lower`.
    #[serde(default)]
    pub rate: Decimal,
}

impl StatutoryBracket {
    /// Returns true if `gross` falls in this bracket.
    pub fn contains(&self, gross: Decimal) -> bool {
        gross >= self.lower && self.upper.is_none_or(|upper| gross < upper)
    }
}

/// A statutory bracket table, ordered by lower bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatutoryTable {
    brackets: Vec<StatutoryBracket>,
}

impl StatutoryTable {
    /// Creates a table, sorting the brackets by lower bound.
    pub fn new(brackets: Vec<StatutoryBracket>) -> Self {
        let mut sorted = brackets;
        sorted.sort_by(|a, b| a.lower.cmp(&b.lower));
        Self { brackets: sorted }
    }

    /// Returns the bracket containing `gross`, if any.
    pub fn bracket_for(&self, gross: Decimal) -> Option<&StatutoryBracket> {
        self.brackets.iter().find(|b| b.contains(gross))
    }

    /// Full-period amount for `gross`; zero below the first bracket.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::config::{StatutoryBracket, StatutoryTable};
    /// use rust_decimal::Decimal;
    ///
    /// let table = StatutoryTable::new(vec![StatutoryBracket {
    ///     lower: Decimal::new(10000, 0),
    ///     upper: None,
    ///     fixed: Decimal::new(500, 0),
    ///     rate: Decimal::new(5, 2),
    /// }]);
    /// assert_eq!(table.amount_for(Decimal::new(5000, 0)), Decimal::ZERO);
    /// assert_eq!(table.amount_for(Decimal::new(12000, 0)), Decimal::new(600, 0));
    /// ```
    pub fn amount_for(&self, gross: Decimal) -> Decimal {
        self.bracket_for(gross)
            .map(|b| b.fixed + b.rate * (gross - b.lower))
            .unwrap_or(Decimal::ZERO)
    }

    /// Returns the brackets in order.
    pub fn brackets(&self) -> &[StatutoryBracket] {
        &self.brackets
    }

    /// Checks that brackets are non-empty ranges that do not overlap.
    pub fn validate(&self) -> Result<(), String> {
        for (index, bracket) in self.brackets.iter().enumerate() {
            if let Some(upper) = bracket.upper {
                if upper <= bracket.lower {
                    return Err(format!(
                        "bracket {} has upper {} not above lower {}",
                        index, upper, bracket.lower
                    ));
                }
            } else if index + 1 != self.brackets.len() {
                return Err(format!("open-ended bracket {} is not the last", index));
            }
            if let Some(next) = self.brackets.get(index + 1) {
                if bracket.upper.is_some_and(|upper| next.lower < upper) {
                    return Err(format!("bracket {} overlaps bracket {}", index, index + 1));
                }
            }
        }
        Ok(())
    }
}

/// statutory.yaml file structure: one table per statutory kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatutoryTables {
    /// SSS contribution table.
    pub sss: StatutoryTable,
    /// Pag-IBIG contribution table.
    pub pag_ibig: StatutoryTable,
    /// PhilHealth contribution table.
    pub philhealth: StatutoryTable,
    /// Withholding tax table.
    pub tax: StatutoryTable,
}

impl StatutoryTables {
    /// Returns the table for a statutory kind.
    pub fn table(&self, kind: StatutoryKind) -> &StatutoryTable {
        match kind {
            StatutoryKind::Sss => &self.sss,
            StatutoryKind::PagIbig => &self.pag_ibig,
            StatutoryKind::Philhealth => &self.philhealth,
            StatutoryKind::Tax => &self.tax,
        }
    }
}

/// holidays.yaml file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct HolidaysConfig {
    /// The fixed regional holiday set.
    pub holidays: Vec<Holiday>,
}

/// The complete payroll configuration loaded from YAML files.
///
/// This struct aggregates all configuration loaded from the various
/// YAML files in a configuration directory.
#[derive(Debug, Clone)]
pub struct PayrollConfig {
    /// Rate tables by organization.
    rates: HashMap<String, RateTable>,
    /// Deployment pay policy.
    policy: PayPolicy,
    /// Leave type settings, in file order.
    leave_types: Vec<LeaveTypeSetting>,
    /// Statutory bracket tables.
    statutory: StatutoryTables,
    /// Holiday seed set.
    holidays: Vec<Holiday>,
}

impl PayrollConfig {
    /// Creates a new PayrollConfig from its component parts.
    pub fn new(
        rates: HashMap<String, RateTable>,
        policy: PayPolicy,
        leave_types: Vec<LeaveTypeSetting>,
        statutory: StatutoryTables,
        holidays: Vec<Holiday>,
    ) -> Self {
        let mut sorted_holidays = holidays;
        sorted_holidays.sort_by(|a, b| a.date.cmp(&b.date));
        Self {
            rates,
            policy,
            leave_types,
            statutory,
            holidays: sorted_holidays,
        }
    }

    /// Returns all rate tables.
    pub fn rates(&self) -> &HashMap<String, RateTable> {
        &self.rates
    }

    /// Returns the rate tables for mutation.
    pub(crate) fn rates_mut(&mut self) -> &mut HashMap<String, RateTable> {
        &mut self.rates
    }

    /// Returns the pay policy.
    pub fn policy(&self) -> &PayPolicy {
        &self.policy
    }

    /// Returns all leave type settings.
    pub fn leave_types(&self) -> &[LeaveTypeSetting] {
        &self.leave_types
    }

    /// Returns the statutory tables.
    pub fn statutory(&self) -> &StatutoryTables {
        &self.statutory
    }

    /// Returns the holiday seed set, sorted by date.
    pub fn holidays(&self) -> &[Holiday] {
        &self.holidays
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rates() -> RateTable {
        RateTable {
            night_diff_percent: dec("10"),
            regular_holiday_rate: dec("2.0"),
            special_holiday_rate: dec("1.3"),
            overtime_regular_rate: dec("1.25"),
            overtime_rest_day_rate: dec("1.3"),
        }
    }

    #[test]
    fn test_rate_table_valid() {
        assert!(rates().validate("org_001").is_ok());
    }

    #[test]
    fn test_rate_table_rejects_multiplier_below_one() {
        let mut table = rates();
        table.overtime_rest_day_rate = dec("0.9");
        match table.validate("org_001") {
            Err(EngineError::InvalidRateTable {
                organization_id,
                message,
            }) => {
                assert_eq!(organization_id, "org_001");
                assert!(message.contains("overtime_rest_day_rate"));
            }
            other => panic!("Expected InvalidRateTable, got {:?}", other),
        }
    }

    #[test]
    fn test_rate_table_rejects_night_percent_out_of_range() {
        let mut table = rates();
        table.night_diff_percent = dec("101");
        assert!(table.validate("org_001").is_err());
        table.night_diff_percent = dec("-1");
        assert!(table.validate("org_001").is_err());
        table.night_diff_percent = dec("100");
        assert!(table.validate("org_001").is_ok());
    }

    #[test]
    fn test_holiday_rate_by_kind() {
        let table = rates();
        assert_eq!(table.holiday_rate(HolidayKind::Regular), dec("2.0"));
        assert_eq!(table.holiday_rate(HolidayKind::Special), dec("1.3"));
        assert_eq!(table.holiday_rate(HolidayKind::SpecialWorking), dec("1.3"));
    }

    #[test]
    fn test_bracket_upper_bound_is_exclusive() {
        let table = StatutoryTable::new(vec![
            StatutoryBracket {
                lower: dec("0"),
                upper: Some(dec("10000")),
                fixed: dec("100"),
                rate: dec("0"),
            },
            StatutoryBracket {
                lower: dec("10000"),
                upper: None,
                fixed: dec("200"),
                rate: dec("0"),
            },
        ]);
        assert_eq!(table.amount_for(dec("9999.99")), dec("100"));
        assert_eq!(table.amount_for(dec("10000")), dec("200"));
    }

    #[test]
    fn test_gross_below_first_bracket_is_zero() {
        let table = StatutoryTable::new(vec![StatutoryBracket {
            lower: dec("20833"),
            upper: None,
            fixed: dec("0"),
            rate: dec("0.15"),
        }]);
        assert_eq!(table.amount_for(dec("15000")), Decimal::ZERO);
        assert_eq!(table.amount_for(dec("30833")), dec("1500.00"));
    }

    #[test]
    fn test_table_validate_detects_overlap() {
        let table = StatutoryTable::new(vec![
            StatutoryBracket {
                lower: dec("0"),
                upper: Some(dec("5000")),
                fixed: dec("0"),
                rate: dec("0"),
            },
            StatutoryBracket {
                lower: dec("4000"),
                upper: None,
                fixed: dec("0"),
                rate: dec("0"),
            },
        ]);
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_policy_defaults() {
        let policy = PayPolicy::default();
        assert_eq!(policy.unpaid_break_minutes, 60);
        assert_eq!(policy.currency_scale, 2);
        assert_eq!(policy.holiday_overtime_stacking, OvertimeStacking::Multiplicative);
        assert_eq!(policy.night_overtime_overlap, NightOvertimeOverlap::Stack);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_leave_type_setting_defaults_from_yaml() {
        let yaml = r#"
type: vacation
name: Vacation Leave
default_credits: "15"
is_paid: true
"#;
        let setting: LeaveTypeSetting = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(setting.leave_type, LeaveType::Vacation);
        assert!(setting.requires_approval);
        assert!(setting.debit_on_holidays);
        assert!(!setting.allow_negative_balance);
        assert_eq!(setting.cancellation, CancellationPolicy::BeforeStart);
        assert_eq!(setting.max_consecutive_days, None);
    }
}
