//! Payroll Computation Engine
//!
//! This crate turns time-and-attendance records and per-organization pay
//! rules into per-employee, per-cutoff-period payroll results, and keeps the
//! leave credit balances that feed into them.
//!
//! - [`calculation`]: time resolution, gross pay and net pay
//! - [`ledger`]: leave credits and their audit trail
//! - [`payroll`]: the multi-step payroll run workflow
//! - [`api`]: the HTTP surface for the stateless computations

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod payroll;
