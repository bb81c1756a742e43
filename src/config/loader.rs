//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading payroll
//! configuration from YAML files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::{HolidayCalendar, LeaveType, StatutoryKind};

use super::types::{
    HolidaysConfig, LeaveTypeSetting, LeaveTypesConfig, PayPolicy, PayrollConfig, RateTable,
    RatesConfig, StatutoryTables,
};

/// Loads and provides access to payroll configuration.
///
/// The `ConfigLoader` reads YAML configuration files from a directory
/// and provides methods to query rate tables, policy, leave types and
/// statutory tables.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── rates.yaml        # Rate tables keyed by organization id
/// ├── policy.yaml       # Break, night window, rate divisors, stacking
/// ├── leave_types.yaml  # Leave type settings
/// ├── statutory.yaml    # SSS, Pag-IBIG, PhilHealth and tax brackets
/// └── holidays.yaml     # Fixed regional holiday seed
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// let rates = loader.rate_table("org_001").unwrap();
/// println!("Regular holiday multiplier: {}", rates.regular_holiday_rate);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: PayrollConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if any file is missing or unparseable, if a rate
    /// table is invalid, or if the policy or a statutory table is inconsistent.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use payroll_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/default")?;
    /// # Ok::<(), payroll_engine::error::EngineError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let rates = Self::load_yaml::<RatesConfig>(&path.join("rates.yaml"))?;

        let policy_path = path.join("policy.yaml");
        let policy = Self::load_yaml::<PayPolicy>(&policy_path)?;
        policy
            .validate()
            .map_err(|message| EngineError::ConfigParseError {
                path: policy_path.display().to_string(),
                message,
            })?;

        let leave_types = Self::load_yaml::<LeaveTypesConfig>(&path.join("leave_types.yaml"))?;

        let statutory_path = path.join("statutory.yaml");
        let statutory = Self::load_yaml::<StatutoryTables>(&statutory_path)?;
        for kind in StatutoryKind::ALL {
            statutory
                .table(kind)
                .validate()
                .map_err(|message| EngineError::ConfigParseError {
                    path: statutory_path.display().to_string(),
                    message: format!("{}: {}", kind, message),
                })?;
        }

        let holidays = Self::load_yaml::<HolidaysConfig>(&path.join("holidays.yaml"))?;

        let loader = Self::from_config(PayrollConfig::new(
            rates.organizations,
            policy,
            leave_types.leave_types,
            statutory,
            holidays.holidays,
        ))?;

        info!(
            path = %path.display(),
            organizations = loader.config.rates().len(),
            leave_types = loader.config.leave_types().len(),
            holidays = loader.config.holidays().len(),
            "Loaded payroll configuration"
        );

        Ok(loader)
    }

    /// Wraps an already-built configuration, validating every rate table.
    pub fn from_config(config: PayrollConfig) -> EngineResult<Self> {
        for (organization_id, table) in config.rates() {
            table.validate(organization_id)?;
        }
        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        debug!(path = %path_str, "Parsing configuration file");

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying payroll configuration.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Returns the pay policy.
    pub fn policy(&self) -> &PayPolicy {
        self.config.policy()
    }

    /// Returns the statutory tables.
    pub fn statutory(&self) -> &StatutoryTables {
        self.config.statutory()
    }

    /// Gets the active rate table for an organization.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use payroll_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/default")?;
    /// let rates = loader.rate_table("org_001")?;
    /// println!("Night differential: {}%", rates.night_diff_percent);
    /// # Ok::<(), payroll_engine::error::EngineError>(())
    /// ```
    pub fn rate_table(&self, organization_id: &str) -> EngineResult<&RateTable> {
        self.config
            .rates()
            .get(organization_id)
            .ok_or_else(|| EngineError::RateTableMissing {
                organization_id: organization_id.to_string(),
            })
    }

    /// Replaces an organization's rate table with a validated new version.
    pub fn replace_rate_table(&mut self, organization_id: &str, table: RateTable) -> EngineResult<()> {
        table.validate(organization_id)?;
        self.config
            .rates_mut()
            .insert(organization_id.to_string(), table);
        info!(organization_id, "Replaced rate table");
        Ok(())
    }

    /// Gets the settings for a leave type.
    pub fn leave_type(&self, leave_type: &LeaveType) -> EngineResult<&LeaveTypeSetting> {
        self.config
            .leave_types()
            .iter()
            .find(|s| &s.leave_type == leave_type)
            .ok_or_else(|| EngineError::LeaveTypeNotConfigured {
                leave_type: leave_type.to_string(),
            })
    }

    /// Returns leave type settings keyed by type.
    pub fn leave_type_map(&self) -> HashMap<LeaveType, LeaveTypeSetting> {
        self.config
            .leave_types()
            .iter()
            .map(|s| (s.leave_type.clone(), s.clone()))
            .collect()
    }

    /// Builds a holiday calendar seeded with the configured holiday set.
    pub fn holiday_calendar(&self) -> HolidayCalendar {
        let mut calendar = HolidayCalendar::default();
        calendar.seed(self.config.holidays());
        calendar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config/default"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
    }

    #[test]
    fn test_rate_table_for_default_org() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        let rates = loader.rate_table("org_001").unwrap();
        assert_eq!(rates.night_diff_percent, dec("10"));
        assert_eq!(rates.regular_holiday_rate, dec("2.0"));
        assert_eq!(rates.special_holiday_rate, dec("1.3"));
        assert_eq!(rates.overtime_regular_rate, dec("1.25"));
        assert_eq!(rates.overtime_rest_day_rate, dec("1.3"));
    }

    #[test]
    fn test_rate_table_unknown_org_returns_error() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        match loader.rate_table("org_unknown") {
            Err(EngineError::RateTableMissing { organization_id }) => {
                assert_eq!(organization_id, "org_unknown");
            }
            other => panic!("Expected RateTableMissing error, got {:?}", other),
        }
    }

    #[test]
    fn test_replace_rate_table_is_full_replace() {
        let mut loader = ConfigLoader::load(config_path()).unwrap();
        let mut table = loader.rate_table("org_001").unwrap().clone();
        table.regular_holiday_rate = dec("2.5");

        loader.replace_rate_table("org_001", table).unwrap();
        assert_eq!(
            loader.rate_table("org_001").unwrap().regular_holiday_rate,
            dec("2.5")
        );
    }

    #[test]
    fn test_replace_rate_table_rejects_invalid_and_keeps_old() {
        let mut loader = ConfigLoader::load(config_path()).unwrap();
        let mut table = loader.rate_table("org_001").unwrap().clone();
        table.overtime_regular_rate = dec("0.5");

        let result = loader.replace_rate_table("org_001", table);
        assert!(matches!(result, Err(EngineError::InvalidRateTable { .. })));
        assert_eq!(
            loader.rate_table("org_001").unwrap().overtime_regular_rate,
            dec("1.25")
        );
    }

    #[test]
    fn test_leave_types_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        let vacation = loader.leave_type(&LeaveType::Vacation).unwrap();
        assert_eq!(vacation.default_credits, dec("15"));
        assert!(vacation.is_paid);

        let result = loader.leave_type(&LeaveType::Custom("sabbatical".to_string()));
        assert!(matches!(
            result,
            Err(EngineError::LeaveTypeNotConfigured { .. })
        ));
    }

    #[test]
    fn test_policy_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let policy = loader.policy();
        assert_eq!(policy.unpaid_break_minutes, 60);
        assert_eq!(policy.standard_hours_per_day, dec("8"));
        assert_eq!(policy.working_days_per_month, dec("22"));
    }

    #[test]
    fn test_statutory_tables_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        for kind in StatutoryKind::ALL {
            assert!(
                !loader.statutory().table(kind).brackets().is_empty(),
                "{} table should not be empty",
                kind
            );
        }
    }

    #[test]
    fn test_holiday_calendar_seeded() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let calendar = loader.holiday_calendar();
        assert!(calendar.is_holiday(NaiveDate::from_ymd_opt(2026, 6, 12).unwrap()));
        assert!(!calendar.is_holiday(NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()));
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("rates.yaml"));
            }
            other => panic!("Expected ConfigNotFound error, got {:?}", other),
        }
    }
}
