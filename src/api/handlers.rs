//! HTTP request handlers for the Payroll Computation Engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{compute_gross, compute_net, import_attendance, resolve};
use crate::config::ConfigLoader;
use crate::error::EngineResult;
use crate::models::{AuditTrace, CutoffPeriod, Employee, PayrollSummaryLine};

use super::request::{CalculationRequest, ResolveRequest};
use super::response::{ApiError, ApiErrorResponse, CalculationResponse, ResolveResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/attendance/resolve", post(resolve_handler))
        .route("/payroll/calculate", post(calculate_handler))
        .with_state(state)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(correlation_id: Uuid, err: crate::error::EngineError) -> Response {
    warn!(correlation_id = %correlation_id, error = %err, "Request failed");
    let api_error: ApiErrorResponse = err.into();
    json_response(api_error.status, api_error.error)
}

/// Maps a JSON extraction failure to a 400 response.
fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    json_response(StatusCode::BAD_REQUEST, error)
}

/// Handler for POST /attendance/resolve.
///
/// Validates the rows as an import batch, tags holidays from the configured
/// calendar, and returns the resolved time quantities per row.
async fn resolve_handler(
    State(state): State<AppState>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing attendance resolution request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let organization_id = request.organization_id;
    let rows = request
        .records
        .into_iter()
        .map(|row| row.into_record(&organization_id))
        .collect();

    let config = state.config();
    let result = import_attendance(rows, &config.holiday_calendar()).and_then(|records| {
        records
            .iter()
            .enumerate()
            .map(|(i, record)| resolve(record, config.policy(), i as u32 + 1))
            .collect::<EngineResult<Vec<_>>>()
    });

    match result {
        Ok(resolved) => {
            info!(
                correlation_id = %correlation_id,
                organization_id = %organization_id,
                records = resolved.len(),
                "Attendance resolved"
            );
            json_response(
                StatusCode::OK,
                ResolveResponse {
                    correlation_id,
                    resolved,
                },
            )
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Handler for POST /payroll/calculate.
///
/// Computes one employee's gross and net pay for one cutoff period.
async fn calculate_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing calculation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    match perform_calculation(request, state.config()) {
        Ok(response) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = %response.summary.employee_id,
                gross_pay = %response.summary.gross.gross_pay,
                net_pay = %response.summary.net_pay(),
                duration_us = start_time.elapsed().as_micros(),
                "Calculation completed successfully"
            );
            json_response(StatusCode::OK, response)
        }
        Err(err) => error_response(correlation_id, err),
    }
}

/// Runs the single-employee pipeline for a calculation request.
fn perform_calculation(
    request: CalculationRequest,
    config: &ConfigLoader,
) -> EngineResult<CalculationResponse> {
    let employee: Employee = request.employee.into();
    let period = CutoffPeriod::new(request.period.start_date, request.period.end_date)?;
    let rates = config.rate_table(&employee.organization_id)?;
    let policy = config.policy();

    let rows = request
        .attendance
        .into_iter()
        .map(|row| row.into_record(&employee.organization_id))
        .collect();
    let records = import_attendance(rows, &config.holiday_calendar())?;

    let mut trace = AuditTrace::default();
    let mut step_number = 1;
    let mut resolved = Vec::with_capacity(records.len());
    for record in &records {
        let time = resolve(record, policy, step_number)?;
        trace.steps.push(time.audit_step.clone());
        step_number += 1;
        resolved.push(time);
    }

    let gross = compute_gross(
        &employee,
        period,
        &resolved,
        request.paid_leave_days,
        rates,
        policy,
        step_number,
    )?;
    step_number += gross.audit_steps.len() as u32;
    trace.steps.extend(gross.audit_steps);

    let net = compute_net(
        gross.breakdown.gross_pay,
        &request.deductions,
        &request.ad_hoc_deductions,
        &request.incentives,
        config.statutory(),
        policy,
        step_number,
    )?;
    trace.steps.extend(net.audit_steps);
    trace.warnings.extend(net.warnings);

    Ok(CalculationResponse {
        calculation_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        period,
        summary: PayrollSummaryLine {
            employee_id: employee.id,
            employee_name: employee.name,
            gross: gross.breakdown,
            net: net.breakdown,
            pay_lines: gross.pay_lines,
            audit_trace: trace,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::request::{AttendanceRecordRequest, EmployeeRequest, PeriodRequest};
    use crate::models::{AttendanceStatus, DeductionSetting, ManualOverride};
    use axum::{body::Body, http::Request};
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tower::ServiceExt;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_state() -> AppState {
        let config = ConfigLoader::load("./config/default").expect("Failed to load config");
        AppState::new(config)
    }

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn make_time(time_str: &str) -> NaiveTime {
        NaiveTime::parse_from_str(time_str, "%H:%M").unwrap()
    }

    fn row(id: &str, date: &str, actual_in: &str, actual_out: &str) -> AttendanceRecordRequest {
        AttendanceRecordRequest {
            id: id.to_string(),
            employee_id: "emp_001".to_string(),
            date: make_date(date),
            schedule_in: make_time("09:00"),
            schedule_out: make_time("18:00"),
            actual_in: Some(make_time(actual_in)),
            actual_out: Some(make_time(actual_out)),
            overtime_hours: None,
            late_override: ManualOverride::default(),
            undertime_override: ManualOverride::default(),
            holiday: None,
            remark: None,
            status: AttendanceStatus::Present,
        }
    }

    fn create_valid_request() -> CalculationRequest {
        CalculationRequest {
            employee: EmployeeRequest {
                id: "emp_001".to_string(),
                organization_id: "org_001".to_string(),
                name: "Maria Santos".to_string(),
                monthly_salary: dec("22000"),
                daily_rate: None,
                rest_days: vec![],
            },
            period: PeriodRequest {
                start_date: make_date("2026-06-01"),
                end_date: make_date("2026-06-15"),
            },
            attendance: vec![row("att_001", "2026-06-01", "09:00", "18:00")],
            paid_leave_days: Decimal::ZERO,
            deductions: DeductionSetting::default(),
            ad_hoc_deductions: vec![],
            incentives: vec![],
        }
    }

    async fn post(router: Router, uri: &str, body: String) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_api_001_valid_request_returns_200() {
        let router = create_router(create_test_state());
        let body = serde_json::to_string(&create_valid_request()).unwrap();

        let (status, body) = post(router, "/payroll/calculate", body).await;

        assert_eq!(status, StatusCode::OK);
        let result: CalculationResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(result.summary.employee_id, "emp_001");
        assert_eq!(result.summary.gross.base_pay, dec("1000"));
        assert!(!result.summary.audit_trace.steps.is_empty());
    }

    #[tokio::test]
    async fn test_api_002_malformed_json_returns_400() {
        let router = create_router(create_test_state());
        let (status, body) = post(router, "/payroll/calculate", "{invalid json".to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_api_003_missing_field_returns_400() {
        let router = create_router(create_test_state());
        let body = r#"{
            "employee": {"id": "emp_001", "organization_id": "org_001"},
            "period": {"start_date": "2026-06-01", "end_date": "2026-06-15"}
        }"#;

        let (status, body) = post(router, "/payroll/calculate", body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "VALIDATION_ERROR");
        assert!(error.message.contains("monthly_salary"));
    }

    #[tokio::test]
    async fn test_api_004_unknown_organization_returns_404() {
        let router = create_router(create_test_state());
        let mut request = create_valid_request();
        request.employee.organization_id = "org_404".to_string();
        let body = serde_json::to_string(&request).unwrap();

        let (status, body) = post(router, "/payroll/calculate", body).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "RATE_TABLE_MISSING");
    }

    #[tokio::test]
    async fn test_api_005_out_before_in_returns_400() {
        let router = create_router(create_test_state());
        let mut request = create_valid_request();
        request.attendance = vec![row("att_bad", "2026-06-02", "18:00", "09:00")];
        let body = serde_json::to_string(&request).unwrap();

        let (status, body) = post(router, "/payroll/calculate", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "INVALID_ATTENDANCE_RANGE");
        assert!(error.message.contains("att_bad"));
    }

    #[tokio::test]
    async fn test_api_006_holiday_tagged_from_calendar() {
        let router = create_router(create_test_state());
        let mut request = create_valid_request();
        // 2026-06-12 is Independence Day in the default holiday seed
        request.attendance = vec![row("att_001", "2026-06-12", "09:00", "18:00")];
        let body = serde_json::to_string(&request).unwrap();

        let (status, body) = post(router, "/payroll/calculate", body).await;

        assert_eq!(status, StatusCode::OK);
        let result: CalculationResponse = serde_json::from_slice(&body).unwrap();
        // 8 hours × 125 × 2.0
        assert_eq!(result.summary.gross.holiday_pay, dec("2000"));
        assert_eq!(result.summary.gross.base_pay, dec("0"));
    }

    #[tokio::test]
    async fn test_api_007_resolve_late_example() {
        let router = create_router(create_test_state());
        let request = ResolveRequest {
            organization_id: "org_001".to_string(),
            records: vec![row("att_001", "2026-06-01", "09:15", "18:00")],
        };
        let body = serde_json::to_string(&request).unwrap();

        let (status, body) = post(router, "/attendance/resolve", body).await;

        assert_eq!(status, StatusCode::OK);
        let result: ResolveResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(result.resolved.len(), 1);
        assert_eq!(result.resolved[0].late_minutes, dec("15"));
        assert_eq!(result.resolved[0].undertime_hours, dec("0"));
    }

    #[tokio::test]
    async fn test_api_008_resolve_duplicate_rows_rejected() {
        let router = create_router(create_test_state());
        let request = ResolveRequest {
            organization_id: "org_001".to_string(),
            records: vec![
                row("att_001", "2026-06-01", "09:00", "18:00"),
                row("att_002", "2026-06-01", "09:00", "18:00"),
            ],
        };
        let body = serde_json::to_string(&request).unwrap();

        let (status, body) = post(router, "/attendance/resolve", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "DUPLICATE_ATTENDANCE");
    }
}
