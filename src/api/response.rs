//! Response types for the Payroll Computation Engine API.
//!
//! This module defines the success and error response structures and the
//! mapping from [`EngineError`] to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculation::ResolvedTime;
use crate::error::EngineError;
use crate::models::{CutoffPeriod, PayrollSummaryLine};

/// Response body for `/attendance/resolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    /// Correlation id of the request.
    pub correlation_id: Uuid,
    /// Resolved rows, in request order.
    pub resolved: Vec<ResolvedTime>,
}

/// Response body for `/payroll/calculate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResponse {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation ran.
    pub timestamp: DateTime<Utc>,
    /// Engine version that produced the result.
    pub engine_version: String,
    /// The cutoff period computed.
    pub period: CutoffPeriod,
    /// The employee's summary line.
    pub summary: PayrollSummaryLine,
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    fn new(status: StatusCode, code: &str, error: &EngineError) -> Self {
        Self {
            status,
            error: ApiError::new(code, error.to_string()),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let (status, code) = match &error {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR")
            }
            EngineError::RateTableMissing { .. } => (StatusCode::NOT_FOUND, "RATE_TABLE_MISSING"),
            EngineError::InvalidRateTable { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_RATE_TABLE")
            }
            EngineError::InvalidAttendanceRange { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_ATTENDANCE_RANGE")
            }
            EngineError::InvalidScheduleRange { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_SCHEDULE_RANGE")
            }
            EngineError::DuplicateAttendance { .. } => {
                (StatusCode::BAD_REQUEST, "DUPLICATE_ATTENDANCE")
            }
            EngineError::RecordOutsidePeriod { .. } => {
                (StatusCode::BAD_REQUEST, "RECORD_OUTSIDE_PERIOD")
            }
            EngineError::InvalidCutoffPeriod { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_CUTOFF_PERIOD")
            }
            EngineError::EmployeeNotFound { .. } => (StatusCode::NOT_FOUND, "EMPLOYEE_NOT_FOUND"),
            EngineError::InsufficientLeaveBalance { .. } => {
                (StatusCode::CONFLICT, "INSUFFICIENT_LEAVE_BALANCE")
            }
            EngineError::LeaveTypeNotConfigured { .. } => {
                (StatusCode::NOT_FOUND, "LEAVE_TYPE_NOT_CONFIGURED")
            }
            EngineError::InvalidLeaveTransition { .. } => {
                (StatusCode::CONFLICT, "INVALID_LEAVE_TRANSITION")
            }
            EngineError::InvalidLeaveRequest { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_LEAVE_REQUEST")
            }
            EngineError::InvalidLineItem { .. } => (StatusCode::BAD_REQUEST, "INVALID_LINE_ITEM"),
            EngineError::StaleRunState { .. } => (StatusCode::CONFLICT, "STALE_RUN_STATE"),
            EngineError::UnacknowledgedNegativePay { .. } => {
                (StatusCode::CONFLICT, "UNACKNOWLEDGED_NEGATIVE_PAY")
            }
            EngineError::CalculationError { .. } => {
                return ApiErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: ApiError::with_details(
                        "CALCULATION_ERROR",
                        "Calculation failed",
                        error.to_string(),
                    ),
                };
            }
        };
        ApiErrorResponse::new(status, code, &error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_api_error_with_details_serialization() {
        let error = ApiError::with_details("TEST_ERROR", "Test message", "Some details");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"details\":\"Some details\""));
    }

    #[test]
    fn test_attendance_range_maps_to_bad_request() {
        let api_error: ApiErrorResponse = EngineError::InvalidAttendanceRange {
            record_id: "att_001".to_string(),
            message: "actual-out before actual-in".to_string(),
        }
        .into();
        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.error.code, "INVALID_ATTENDANCE_RANGE");
        assert!(api_error.error.message.contains("att_001"));
    }

    #[test]
    fn test_missing_rate_table_maps_to_not_found() {
        let api_error: ApiErrorResponse = EngineError::RateTableMissing {
            organization_id: "org_404".to_string(),
        }
        .into();
        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.error.code, "RATE_TABLE_MISSING");
    }

    #[test]
    fn test_invalid_period_maps_to_bad_request() {
        let api_error: ApiErrorResponse = EngineError::InvalidCutoffPeriod {
            start: NaiveDate::from_ymd_opt(2026, 6, 15).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        }
        .into();
        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_calculation_error_carries_details() {
        let api_error: ApiErrorResponse = EngineError::CalculationError {
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.error.details.as_deref(), Some("Calculation error: boom"));
    }
}
