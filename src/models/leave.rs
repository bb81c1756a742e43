//! Leave credit, leave request and ledger audit models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A leave type.
///
/// Built-in types serialize as snake_case strings; organization-specific
/// types serialize as `{"custom": "<name>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    /// Vacation leave.
    Vacation,
    /// Sick leave.
    Sick,
    /// Emergency leave.
    Emergency,
    /// Maternity leave.
    Maternity,
    /// Paternity leave.
    Paternity,
    /// An organization-defined leave type.
    Custom(String),
}

impl std::fmt::Display for LeaveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeaveType::Vacation => write!(f, "vacation"),
            LeaveType::Sick => write!(f, "sick"),
            LeaveType::Emergency => write!(f, "emergency"),
            LeaveType::Maternity => write!(f, "maternity"),
            LeaveType::Paternity => write!(f, "paternity"),
            LeaveType::Custom(name) => write!(f, "{}", name),
        }
    }
}

impl std::str::FromStr for LeaveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Leave type cannot be empty".to_string());
        }
        Ok(match trimmed.to_lowercase().as_str() {
            "vacation" => LeaveType::Vacation,
            "sick" => LeaveType::Sick,
            "emergency" => LeaveType::Emergency,
            "maternity" => LeaveType::Maternity,
            "paternity" => LeaveType::Paternity,
            _ => LeaveType::Custom(trimmed.to_string()),
        })
    }
}

/// An employee's credit balance for one leave type.
///
/// `balance == total - used` holds until an explicit adjustment is recorded;
/// from then on `balance` is authoritative and `adjusted` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveCredit {
    /// The owning organization.
    pub organization_id: String,
    /// The employee.
    pub employee_id: String,
    /// The leave type.
    pub leave_type: LeaveType,
    /// Days granted for the current cycle.
    pub total: Decimal,
    /// Days consumed by approved leave.
    pub used: Decimal,
    /// Days available.
    pub balance: Decimal,
    /// Set once a manual adjustment has made `balance` authoritative.
    #[serde(default)]
    pub adjusted: bool,
}

impl LeaveCredit {
    /// Creates a fresh credit with `total` days and nothing used.
    pub fn new(
        organization_id: impl Into<String>,
        employee_id: impl Into<String>,
        leave_type: LeaveType,
        total: Decimal,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            employee_id: employee_id.into(),
            leave_type,
            total,
            used: Decimal::ZERO,
            balance: total,
            adjusted: false,
        }
    }

    /// Returns true if the balance invariant holds or an adjustment excuses it.
    pub fn is_consistent(&self) -> bool {
        self.adjusted || self.balance == self.total - self.used
    }
}

/// The state of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveRequestStatus {
    /// Awaiting a decision.
    Pending,
    /// Approved and debited from the ledger.
    Approved,
    /// Rejected; terminal.
    Rejected,
    /// Cancelled; terminal.
    Cancelled,
}

impl std::fmt::Display for LeaveRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeaveRequestStatus::Pending => write!(f, "pending"),
            LeaveRequestStatus::Approved => write!(f, "approved"),
            LeaveRequestStatus::Rejected => write!(f, "rejected"),
            LeaveRequestStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A request for leave over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Unique identifier for the request.
    pub id: Uuid,
    /// The owning organization.
    pub organization_id: String,
    /// The requesting employee.
    pub employee_id: String,
    /// The leave type requested.
    pub leave_type: LeaveType,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Why leave is requested.
    #[serde(default)]
    pub reason: String,
    /// References to supporting documents held by the file store.
    #[serde(default)]
    pub supporting_documents: Vec<String>,
    /// Current state.
    pub status: LeaveRequestStatus,
    /// Approver or rejecter remarks.
    #[serde(default)]
    pub remarks: Option<String>,
    /// Days debited on approval; set while the request is approved.
    #[serde(default)]
    pub days_debited: Option<Decimal>,
}

impl LeaveRequest {
    /// Creates a pending request.
    pub fn new(
        organization_id: impl Into<String>,
        employee_id: impl Into<String>,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id: organization_id.into(),
            employee_id: employee_id.into(),
            leave_type,
            start_date,
            end_date,
            reason: reason.into(),
            supporting_documents: Vec::new(),
            status: LeaveRequestStatus::Pending,
            remarks: None,
            days_debited: None,
        }
    }
}

/// The kind of ledger mutation recorded in an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerAction {
    /// Credits granted or re-granted.
    Grant,
    /// Leave request approved.
    Approve,
    /// Leave request rejected.
    Reject,
    /// Leave request cancelled.
    Cancel,
    /// Manual balance adjustment.
    Adjust,
    /// Balance converted to cash.
    ConvertToCash,
    /// Year-end carry-over.
    CarryOver,
}

/// An immutable record of one ledger mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveAuditEntry {
    /// Unique identifier for the entry.
    pub id: Uuid,
    /// When the mutation was applied.
    pub timestamp: DateTime<Utc>,
    /// The owning organization.
    pub organization_id: String,
    /// The employee.
    pub employee_id: String,
    /// The leave type.
    pub leave_type: LeaveType,
    /// The mutation kind.
    pub action: LedgerAction,
    /// The related leave request, if any.
    pub request_id: Option<Uuid>,
    /// Signed change to the balance.
    pub delta: Decimal,
    /// Balance before the mutation.
    pub balance_before: Decimal,
    /// Balance after the mutation.
    pub balance_after: Decimal,
    /// Why the mutation was made.
    pub reason: String,
    /// Set when an insufficient balance was explicitly overridden.
    pub override_applied: bool,
}

/// The cash equivalent of converted leave days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashConversion {
    /// The employee.
    pub employee_id: String,
    /// The leave type converted.
    pub leave_type: LeaveType,
    /// Days converted.
    pub days: Decimal,
    /// Daily rate used.
    pub daily_rate: Decimal,
    /// Cash credit, rounded to the currency unit.
    pub amount: Decimal,
    /// The audit entry recording the conversion.
    pub audit_entry: LeaveAuditEntry,
}
