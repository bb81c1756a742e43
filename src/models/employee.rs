//! Employee model.
//!
//! This module defines the [`Employee`] struct used by the pay calculator to
//! derive daily and hourly rates and to detect rest days.

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents an employee on an organization's payroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// The organization the employee belongs to.
    pub organization_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Monthly basic salary, the source of the derived daily and hourly rates.
    pub monthly_salary: Decimal,
    /// Optional override for the daily rate.
    #[serde(default)]
    pub daily_rate: Option<Decimal>,
    /// Weekdays that are the employee's rest days.
    #[serde(default)]
    pub rest_days: Vec<Weekday>,
}

impl Employee {
    /// Returns true if `date` falls on one of the employee's rest days.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::Employee;
    /// use chrono::{NaiveDate, Weekday};
    /// use rust_decimal::Decimal;
    ///
    /// let employee = Employee {
    ///     id: "emp_001".to_string(),
    ///     organization_id: "org_001".to_string(),
    ///     name: "Maria Santos".to_string(),
    ///     monthly_salary: Decimal::new(20000, 0),
    ///     daily_rate: None,
    ///     rest_days: vec![Weekday::Sun],
    /// };
    /// // 2026-01-18 is a Sunday
    /// assert!(employee.is_rest_day(NaiveDate::from_ymd_opt(2026, 1, 18).unwrap()));
    /// assert!(!employee.is_rest_day(NaiveDate::from_ymd_opt(2026, 1, 19).unwrap()));
    /// ```
    pub fn is_rest_day(&self, date: NaiveDate) -> bool {
        self.rest_days.contains(&date.weekday())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_employee() -> Employee {
        Employee {
            id: "emp_001".to_string(),
            organization_id: "org_001".to_string(),
            name: "Maria Santos".to_string(),
            monthly_salary: Decimal::new(20000, 0),
            daily_rate: None,
            rest_days: vec![Weekday::Sat, Weekday::Sun],
        }
    }

    #[test]
    fn test_deserialize_employee_with_defaults() {
        let json = r#"{
            "id": "emp_001",
            "organization_id": "org_001",
            "monthly_salary": "20000"
        }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.id, "emp_001");
        assert_eq!(employee.monthly_salary, Decimal::new(20000, 0));
        assert_eq!(employee.daily_rate, None);
        assert!(employee.rest_days.is_empty());
        assert!(employee.name.is_empty());
    }

    #[test]
    fn test_deserialize_employee_with_rest_days_and_override() {
        let json = r#"{
            "id": "emp_002",
            "organization_id": "org_001",
            "name": "Jose Rizal",
            "monthly_salary": "30000",
            "daily_rate": "1500.50",
            "rest_days": ["Sun"]
        }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.daily_rate, Some(Decimal::new(150050, 2)));
        assert_eq!(employee.rest_days, vec![Weekday::Sun]);
    }

    #[test]
    fn test_weekend_rest_days() {
        let employee = create_test_employee();
        // 2026-01-17 Saturday, 2026-01-18 Sunday, 2026-01-16 Friday
        assert!(employee.is_rest_day(NaiveDate::from_ymd_opt(2026, 1, 17).unwrap()));
        assert!(employee.is_rest_day(NaiveDate::from_ymd_opt(2026, 1, 18).unwrap()));
        assert!(!employee.is_rest_day(NaiveDate::from_ymd_opt(2026, 1, 16).unwrap()));
    }

    #[test]
    fn test_employee_serialization_preserves_fields() {
        let employee = create_test_employee();
        let json = serde_json::to_string(&employee).unwrap();
        assert!(json.contains("\"monthly_salary\":\"20000\""));

        let deserialized: Employee = serde_json::from_str(&json).unwrap();
        assert_eq!(employee, deserialized);
    }
}
