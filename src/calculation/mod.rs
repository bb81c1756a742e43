//! Calculation logic for the Payroll Computation Engine.
//!
//! This module contains the pure calculation functions for a payroll run:
//! attendance import and validation, time resolution (late, undertime,
//! worked and night hours), rate derivation, gross pay with holiday,
//! overtime and night differential multipliers, and net pay after
//! statutory and ad-hoc deductions.

mod attendance_import;
mod deductions;
mod pay_calculator;
mod rates;
mod rounding;
mod time_resolver;

pub use attendance_import::import_attendance;
pub use deductions::{NetResult, compute_net, validate_line_items};
pub use pay_calculator::{
    GrossResult, LeaveCashEquivalent, compute_gross, leave_cash_equivalent, overtime_multiplier,
};
pub use rates::{RateDerivation, derive_rates};
pub use rounding::round_currency;
pub use time_resolver::{Disposition, ResolvedTime, night_hours, resolve, validate_record};
