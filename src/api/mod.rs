//! HTTP API module for the Payroll Computation Engine.
//!
//! This module exposes the stateless computations over HTTP: attendance
//! resolution and single-employee gross/net pay calculation.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    AttendanceRecordRequest, CalculationRequest, EmployeeRequest, PeriodRequest, ResolveRequest,
};
pub use response::{ApiError, CalculationResponse, ResolveResponse};
pub use state::AppState;
