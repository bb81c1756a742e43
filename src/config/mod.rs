//! Configuration loading and management for the Payroll Computation Engine.
//!
//! This module provides functionality to load payroll configuration from YAML
//! files, including per-organization rate tables, the pay policy, leave type
//! settings, statutory bracket tables and the holiday seed.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Break minutes: {}", config.policy().unpaid_break_minutes);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    CancellationPolicy, HolidaysConfig, LeaveTypeSetting, LeaveTypesConfig, NightOvertimeOverlap,
    OvertimeStacking, PayPolicy, PayrollConfig, RateTable, RatesConfig, StatutoryBracket,
    StatutoryTable, StatutoryTables,
};
