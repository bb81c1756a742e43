//! The leave ledger.
//!
//! Credits are held per (employee, leave type) behind their own mutex, so
//! mutations for one key are serialized while different employees proceed
//! in parallel. Every mutation appends an immutable [`LeaveAuditEntry`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::leave_cash_equivalent;
use crate::config::{CancellationPolicy, ConfigLoader, LeaveTypeSetting, PayPolicy};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CashConversion, CutoffPeriod, Employee, HolidayCalendar, LeaveAuditEntry, LeaveCredit,
    LeaveRequest, LeaveRequestStatus, LeaveType, LedgerAction,
};

type CreditKey = (String, LeaveType);

/// Approval details for a pending leave request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveApproval {
    /// Optional approver remarks.
    #[serde(default)]
    pub remarks: Option<String>,
    /// Approve even if the balance would go negative. Audited.
    #[serde(default)]
    pub override_insufficient_balance: bool,
}

/// Per-organization leave credit balances and their audit trail.
#[derive(Debug)]
pub struct LeaveLedger {
    organization_id: String,
    settings: HashMap<LeaveType, LeaveTypeSetting>,
    calendar: HolidayCalendar,
    credits: RwLock<HashMap<CreditKey, Arc<Mutex<LeaveCredit>>>>,
    approved: Mutex<HashMap<Uuid, ApprovedLeave>>,
    audit: Mutex<Vec<LeaveAuditEntry>>,
    revision: AtomicU64,
}

/// A request this ledger approved and debited. Pay reads these, never the
/// caller's copy of the request.
#[derive(Debug, Clone)]
struct ApprovedLeave {
    employee_id: String,
    leave_type: LeaveType,
    start_date: NaiveDate,
    end_date: NaiveDate,
    days_debited: Decimal,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl LeaveLedger {
    /// Creates an empty ledger for an organization.
    pub fn new(
        organization_id: impl Into<String>,
        settings: HashMap<LeaveType, LeaveTypeSetting>,
        calendar: HolidayCalendar,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            settings,
            calendar,
            credits: RwLock::new(HashMap::new()),
            approved: Mutex::new(HashMap::new()),
            audit: Mutex::new(Vec::new()),
            revision: AtomicU64::new(0),
        }
    }

    /// Creates an empty ledger using the loaded leave types and holiday seed.
    pub fn from_config(organization_id: impl Into<String>, config: &ConfigLoader) -> Self {
        Self::new(
            organization_id,
            config.leave_type_map(),
            config.holiday_calendar(),
        )
    }

    /// The organization this ledger belongs to.
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// The holiday calendar used for day counting.
    pub fn calendar(&self) -> &HolidayCalendar {
        &self.calendar
    }

    /// Returns a snapshot of an employee's credit, if one has been created.
    pub fn credit(&self, employee_id: &str, leave_type: &LeaveType) -> Option<LeaveCredit> {
        let credits = self.credits.read().unwrap_or_else(PoisonError::into_inner);
        credits
            .get(&(employee_id.to_string(), leave_type.clone()))
            .map(|entry| lock(entry).clone())
    }

    /// A counter that moves whenever paid leave changes: an approval or the
    /// cancellation of an approved request.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Returns every audit entry recorded so far, oldest first.
    pub fn audit_trail(&self) -> Vec<LeaveAuditEntry> {
        lock(&self.audit).clone()
    }

    /// Returns the audit entries for one employee, oldest first.
    pub fn audit_trail_for(&self, employee_id: &str) -> Vec<LeaveAuditEntry> {
        lock(&self.audit)
            .iter()
            .filter(|entry| entry.employee_id == employee_id)
            .cloned()
            .collect()
    }

    fn setting(&self, leave_type: &LeaveType) -> EngineResult<&LeaveTypeSetting> {
        self.settings
            .get(leave_type)
            .ok_or_else(|| EngineError::LeaveTypeNotConfigured {
                leave_type: leave_type.to_string(),
            })
    }

    /// Returns the credit entry for a key, seeding it from the leave type's
    /// default credits on first use.
    fn entry(
        &self,
        employee_id: &str,
        leave_type: &LeaveType,
    ) -> EngineResult<Arc<Mutex<LeaveCredit>>> {
        let key = (employee_id.to_string(), leave_type.clone());
        {
            let credits = self.credits.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = credits.get(&key) {
                return Ok(Arc::clone(entry));
            }
        }

        let setting = self.setting(leave_type)?;
        let mut credits = self.credits.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = credits.get(&key) {
            return Ok(Arc::clone(entry));
        }

        let credit = LeaveCredit::new(
            self.organization_id.clone(),
            employee_id,
            leave_type.clone(),
            setting.default_credits,
        );
        debug!(
            employee_id,
            leave_type = %leave_type,
            credits = %setting.default_credits,
            "Seeded leave credit"
        );
        self.record(
            &credit,
            LedgerAction::Grant,
            None,
            setting.default_credits,
            Decimal::ZERO,
            "Initial grant of default credits".to_string(),
            false,
        );
        let entry = Arc::new(Mutex::new(credit));
        credits.insert(key, Arc::clone(&entry));
        Ok(entry)
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        credit: &LeaveCredit,
        action: LedgerAction,
        request_id: Option<Uuid>,
        delta: Decimal,
        balance_before: Decimal,
        reason: String,
        override_applied: bool,
    ) -> LeaveAuditEntry {
        let entry = LeaveAuditEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            organization_id: credit.organization_id.clone(),
            employee_id: credit.employee_id.clone(),
            leave_type: credit.leave_type.clone(),
            action,
            request_id,
            delta,
            balance_before,
            balance_after: credit.balance,
            reason,
            override_applied,
        };
        lock(&self.audit).push(entry.clone());
        entry
    }

    fn check_request(&self, request: &LeaveRequest) -> EngineResult<()> {
        if request.organization_id != self.organization_id {
            return Err(EngineError::InvalidLeaveRequest {
                message: format!(
                    "Leave request {} belongs to organization '{}', not '{}'",
                    request.id, request.organization_id, self.organization_id
                ),
            });
        }
        if request.end_date < request.start_date {
            return Err(EngineError::InvalidLeaveRequest {
                message: format!(
                    "Leave request {} ends {} before it starts {}",
                    request.id, request.end_date, request.start_date
                ),
            });
        }
        Ok(())
    }

    /// The debitable days of an inclusive range.
    ///
    /// Holidays are skipped when the leave type does not debit on holidays.
    fn debited_days<'a>(
        &'a self,
        setting: &'a LeaveTypeSetting,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = NaiveDate> + 'a {
        start
            .iter_days()
            .take_while(move |day| *day <= end)
            .filter(move |day| setting.debit_on_holidays || !self.calendar.is_holiday(*day))
    }

    fn count_days(&self, setting: &LeaveTypeSetting, start: NaiveDate, end: NaiveDate) -> Decimal {
        Decimal::from(self.debited_days(setting, start, end).count())
    }

    /// Returns the number of days a request would debit.
    ///
    /// # Errors
    ///
    /// Returns `LeaveTypeNotConfigured` or `InvalidLeaveRequest`.
    pub fn day_count(&self, request: &LeaveRequest) -> EngineResult<Decimal> {
        self.check_request(request)?;
        let setting = self.setting(&request.leave_type)?;
        Ok(self.count_days(setting, request.start_date, request.end_date))
    }

    /// Submits a new request.
    ///
    /// Leave types that do not require approval are approved immediately and
    /// the approval's audit entry is returned.
    pub fn submit(&self, request: &mut LeaveRequest) -> EngineResult<Option<LeaveAuditEntry>> {
        self.check_request(request)?;
        let setting = self.setting(&request.leave_type)?;

        info!(
            request_id = %request.id,
            employee_id = %request.employee_id,
            leave_type = %request.leave_type,
            "Leave request submitted"
        );

        if setting.requires_approval {
            return Ok(None);
        }

        let approval = LeaveApproval {
            remarks: Some("Approved automatically; leave type requires no approval".to_string()),
            override_insufficient_balance: false,
        };
        self.approve(request, approval).map(Some)
    }

    /// Approves a pending request and debits the ledger.
    ///
    /// # Errors
    ///
    /// - `InvalidLeaveTransition` if the request is not pending
    /// - `InvalidLeaveRequest` if the day count exceeds `max_consecutive_days`
    /// - `InsufficientLeaveBalance` if the balance would go negative and
    ///   neither the leave type nor the approval allows it
    pub fn approve(
        &self,
        request: &mut LeaveRequest,
        approval: LeaveApproval,
    ) -> EngineResult<LeaveAuditEntry> {
        if request.status != LeaveRequestStatus::Pending {
            return Err(EngineError::InvalidLeaveTransition {
                request_id: request.id,
                status: request.status.to_string(),
                action: "approve".to_string(),
            });
        }

        let days = self.day_count(request)?;
        let setting = self.setting(&request.leave_type)?;

        if let Some(max) = setting.max_consecutive_days {
            if days > max {
                return Err(EngineError::InvalidLeaveRequest {
                    message: format!(
                        "{} leave of {} days exceeds the maximum of {} consecutive days",
                        request.leave_type, days, max
                    ),
                });
            }
        }

        let entry = self.entry(&request.employee_id, &request.leave_type)?;
        let mut credit = lock(&entry);
        let balance_before = credit.balance;

        let shortfall = balance_before - days < Decimal::ZERO;
        let override_applied = shortfall && !setting.allow_negative_balance;
        if override_applied && !approval.override_insufficient_balance {
            return Err(EngineError::InsufficientLeaveBalance {
                employee_id: request.employee_id.clone(),
                leave_type: request.leave_type.to_string(),
                requested: days,
                available: balance_before,
            });
        }

        credit.used += days;
        credit.balance -= days;

        request.status = LeaveRequestStatus::Approved;
        request.remarks = approval.remarks.clone();
        request.days_debited = Some(days);
        lock(&self.approved).insert(
            request.id,
            ApprovedLeave {
                employee_id: request.employee_id.clone(),
                leave_type: request.leave_type.clone(),
                start_date: request.start_date,
                end_date: request.end_date,
                days_debited: days,
            },
        );
        self.revision.fetch_add(1, Ordering::SeqCst);

        if override_applied {
            warn!(
                request_id = %request.id,
                employee_id = %request.employee_id,
                balance = %credit.balance,
                "Leave approved over an insufficient balance"
            );
        }
        info!(
            request_id = %request.id,
            employee_id = %request.employee_id,
            leave_type = %request.leave_type,
            days = %days,
            balance = %credit.balance,
            "Leave request approved"
        );

        let reason = approval
            .remarks
            .unwrap_or_else(|| "Leave request approved".to_string());
        Ok(self.record(
            &credit,
            LedgerAction::Approve,
            Some(request.id),
            -days,
            balance_before,
            reason,
            override_applied,
        ))
    }

    /// Rejects a pending request. Remarks are required.
    pub fn reject(
        &self,
        request: &mut LeaveRequest,
        remarks: impl Into<String>,
    ) -> EngineResult<LeaveAuditEntry> {
        let remarks = remarks.into();
        if remarks.trim().is_empty() {
            return Err(EngineError::InvalidLeaveRequest {
                message: format!("Rejecting leave request {} requires remarks", request.id),
            });
        }
        if request.status != LeaveRequestStatus::Pending {
            return Err(EngineError::InvalidLeaveTransition {
                request_id: request.id,
                status: request.status.to_string(),
                action: "reject".to_string(),
            });
        }
        self.check_request(request)?;

        let entry = self.entry(&request.employee_id, &request.leave_type)?;
        let credit = lock(&entry);

        request.status = LeaveRequestStatus::Rejected;
        request.remarks = Some(remarks.clone());

        info!(request_id = %request.id, employee_id = %request.employee_id, "Leave request rejected");
        Ok(self.record(
            &credit,
            LedgerAction::Reject,
            Some(request.id),
            Decimal::ZERO,
            credit.balance,
            remarks,
            false,
        ))
    }

    /// Cancels a request.
    ///
    /// Pending requests cancel without touching the ledger and return `None`.
    /// Approved requests reverse their debit exactly, subject to the leave
    /// type's cancellation policy.
    pub fn cancel(
        &self,
        request: &mut LeaveRequest,
        today: NaiveDate,
    ) -> EngineResult<Option<LeaveAuditEntry>> {
        match request.status {
            LeaveRequestStatus::Pending => {
                request.status = LeaveRequestStatus::Cancelled;
                info!(request_id = %request.id, "Pending leave request cancelled");
                Ok(None)
            }
            LeaveRequestStatus::Approved => {
                self.check_request(request)?;
                let setting = self.setting(&request.leave_type)?;
                if setting.cancellation == CancellationPolicy::BeforeStart
                    && today >= request.start_date
                {
                    return Err(EngineError::InvalidLeaveRequest {
                        message: format!(
                            "Approved {} leave starting {} can only be cancelled before it starts",
                            request.leave_type, request.start_date
                        ),
                    });
                }
                let recorded = lock(&self.approved).remove(&request.id).ok_or_else(|| {
                    EngineError::InvalidLeaveRequest {
                        message: format!(
                            "Leave request {} was not approved by this ledger",
                            request.id
                        ),
                    }
                })?;
                let days = recorded.days_debited;

                let entry = match self.entry(&recorded.employee_id, &recorded.leave_type) {
                    Ok(entry) => entry,
                    Err(error) => {
                        lock(&self.approved).insert(request.id, recorded);
                        return Err(error);
                    }
                };
                let mut credit = lock(&entry);
                let balance_before = credit.balance;
                credit.used -= days;
                credit.balance += days;
                self.revision.fetch_add(1, Ordering::SeqCst);

                request.status = LeaveRequestStatus::Cancelled;
                request.days_debited = None;

                info!(
                    request_id = %request.id,
                    employee_id = %request.employee_id,
                    days = %days,
                    balance = %credit.balance,
                    "Approved leave request cancelled"
                );
                Ok(Some(self.record(
                    &credit,
                    LedgerAction::Cancel,
                    Some(request.id),
                    days,
                    balance_before,
                    "Approved leave cancelled; debit reversed".to_string(),
                    false,
                )))
            }
            status => Err(EngineError::InvalidLeaveTransition {
                request_id: request.id,
                status: status.to_string(),
                action: "cancel".to_string(),
            }),
        }
    }

    /// Applies a manual balance adjustment. The adjusted balance becomes
    /// authoritative over `total - used`.
    pub fn adjust(
        &self,
        employee_id: &str,
        leave_type: &LeaveType,
        delta: Decimal,
        reason: impl Into<String>,
    ) -> EngineResult<LeaveAuditEntry> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(EngineError::InvalidLeaveRequest {
                message: "A balance adjustment requires a reason".to_string(),
            });
        }
        let setting = self.setting(leave_type)?;
        let entry = self.entry(employee_id, leave_type)?;
        let mut credit = lock(&entry);
        let balance_before = credit.balance;

        if balance_before + delta < Decimal::ZERO && !setting.allow_negative_balance {
            return Err(EngineError::InsufficientLeaveBalance {
                employee_id: employee_id.to_string(),
                leave_type: leave_type.to_string(),
                requested: -delta,
                available: balance_before,
            });
        }

        credit.balance += delta;
        credit.adjusted = true;

        info!(
            employee_id,
            leave_type = %leave_type,
            delta = %delta,
            balance = %credit.balance,
            "Leave balance adjusted"
        );
        Ok(self.record(
            &credit,
            LedgerAction::Adjust,
            None,
            delta,
            balance_before,
            reason,
            false,
        ))
    }

    /// Converts leave days to cash at the employee's daily rate.
    ///
    /// Only the balance is reduced; `used` is untouched, so the credit is
    /// marked adjusted.
    pub fn convert_to_cash(
        &self,
        employee: &Employee,
        leave_type: &LeaveType,
        days: Decimal,
        reason: impl Into<String>,
        policy: &PayPolicy,
    ) -> EngineResult<CashConversion> {
        if days <= Decimal::ZERO {
            return Err(EngineError::InvalidLeaveRequest {
                message: format!("Days to convert must be positive, got {}", days),
            });
        }
        if employee.organization_id != self.organization_id {
            return Err(EngineError::InvalidLeaveRequest {
                message: format!(
                    "Employee '{}' does not belong to organization '{}'",
                    employee.id, self.organization_id
                ),
            });
        }

        let cash = leave_cash_equivalent(employee, days, policy)?;
        let entry = self.entry(&employee.id, leave_type)?;
        let mut credit = lock(&entry);
        let balance_before = credit.balance;

        if days > balance_before {
            return Err(EngineError::InsufficientLeaveBalance {
                employee_id: employee.id.clone(),
                leave_type: leave_type.to_string(),
                requested: days,
                available: balance_before,
            });
        }

        credit.balance -= days;
        credit.adjusted = true;

        info!(
            employee_id = %employee.id,
            leave_type = %leave_type,
            days = %days,
            amount = %cash.amount,
            "Leave converted to cash"
        );
        let audit_entry = self.record(
            &credit,
            LedgerAction::ConvertToCash,
            None,
            -days,
            balance_before,
            reason.into(),
            false,
        );

        Ok(CashConversion {
            employee_id: employee.id.clone(),
            leave_type: leave_type.clone(),
            days,
            daily_rate: cash.daily_rate,
            amount: cash.amount,
            audit_entry,
        })
    }

    /// Starts a fresh credit cycle with `total` days, or the leave type's
    /// default credits when `None`.
    pub fn grant(
        &self,
        employee_id: &str,
        leave_type: &LeaveType,
        total: Option<Decimal>,
    ) -> EngineResult<LeaveAuditEntry> {
        let setting = self.setting(leave_type)?;
        let total = total.unwrap_or(setting.default_credits);
        if total < Decimal::ZERO {
            return Err(EngineError::InvalidLeaveRequest {
                message: format!("Granted credits cannot be negative, got {}", total),
            });
        }

        let entry = self.entry(employee_id, leave_type)?;
        let mut credit = lock(&entry);
        let balance_before = credit.balance;
        credit.total = total;
        credit.used = Decimal::ZERO;
        credit.balance = total;
        credit.adjusted = false;

        info!(employee_id, leave_type = %leave_type, total = %total, "Leave credits granted");
        Ok(self.record(
            &credit,
            LedgerAction::Grant,
            None,
            total - balance_before,
            balance_before,
            format!("Granted {} days", total),
            false,
        ))
    }

    /// Closes the year for one credit: unused balance carries into a fresh
    /// cycle of default credits, capped by `max_carry_over`. Leave types
    /// without carry-over start the new cycle from default credits alone.
    pub fn carry_over(
        &self,
        employee_id: &str,
        leave_type: &LeaveType,
        reason: impl Into<String>,
    ) -> EngineResult<LeaveAuditEntry> {
        let setting = self.setting(leave_type)?;
        let entry = self.entry(employee_id, leave_type)?;
        let mut credit = lock(&entry);
        let balance_before = credit.balance;

        let carried = if setting.carry_over {
            let unused = balance_before.max(Decimal::ZERO);
            setting
                .max_carry_over
                .map_or(unused, |cap| unused.min(cap))
        } else {
            Decimal::ZERO
        };

        let total = setting.default_credits + carried;
        credit.total = total;
        credit.used = Decimal::ZERO;
        credit.balance = total;
        credit.adjusted = false;

        info!(
            employee_id,
            leave_type = %leave_type,
            carried = %carried,
            balance = %total,
            "Leave balance carried over"
        );
        Ok(self.record(
            &credit,
            LedgerAction::CarryOver,
            None,
            total - balance_before,
            balance_before,
            reason.into(),
            false,
        ))
    }

    /// Lists the paid leave dates this ledger has approved for an employee
    /// inside a cutoff period, in date order.
    ///
    /// Unpaid leave types are left out. A date appears once per approved
    /// request covering it.
    pub fn paid_leave_dates(
        &self,
        employee_id: &str,
        period: CutoffPeriod,
    ) -> EngineResult<Vec<NaiveDate>> {
        let approved: Vec<ApprovedLeave> = lock(&self.approved)
            .values()
            .filter(|leave| leave.employee_id == employee_id)
            .cloned()
            .collect();

        let mut dates = Vec::new();
        for leave in approved {
            let setting = self.setting(&leave.leave_type)?;
            if !setting.is_paid {
                continue;
            }
            if let Some((from, to)) = period.clamp_range(leave.start_date, leave.end_date) {
                dates.extend(self.debited_days(setting, from, to));
            }
        }
        dates.sort();
        Ok(dates)
    }

    /// Sums the paid leave days this ledger has approved for an employee
    /// inside a cutoff period, for the Pay Calculator.
    pub fn paid_leave_days(&self, employee_id: &str, period: CutoffPeriod) -> EngineResult<Decimal> {
        Ok(Decimal::from(self.paid_leave_dates(employee_id, period)?.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Holiday, HolidayKind};
    use std::str::FromStr;
    use std::thread;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setting(leave_type: LeaveType, credits: &str) -> LeaveTypeSetting {
        LeaveTypeSetting {
            leave_type,
            name: "Test Leave".to_string(),
            default_credits: dec(credits),
            is_paid: true,
            requires_approval: true,
            max_consecutive_days: None,
            carry_over: false,
            max_carry_over: None,
            allow_negative_balance: false,
            debit_on_holidays: true,
            cancellation: CancellationPolicy::BeforeStart,
        }
    }

    fn create_test_ledger() -> LeaveLedger {
        let mut vacation = setting(LeaveType::Vacation, "10");
        vacation.max_consecutive_days = Some(dec("5"));
        vacation.carry_over = true;
        vacation.max_carry_over = Some(dec("3"));

        let mut sick = setting(LeaveType::Sick, "5");
        sick.debit_on_holidays = false;
        sick.cancellation = CancellationPolicy::Anytime;

        let mut emergency = setting(LeaveType::Emergency, "1");
        emergency.requires_approval = false;

        let mut unpaid = setting(LeaveType::Custom("unpaid".to_string()), "30");
        unpaid.is_paid = false;
        unpaid.allow_negative_balance = true;

        let settings = [vacation, sick, emergency, unpaid]
            .into_iter()
            .map(|s| (s.leave_type.clone(), s))
            .collect();

        let calendar = HolidayCalendar::new(vec![Holiday {
            date: date(2026, 6, 12),
            name: "Independence Day".to_string(),
            kind: HolidayKind::Regular,
            region: "national".to_string(),
        }]);

        LeaveLedger::new("org_001", settings, calendar)
    }

    fn request(leave_type: LeaveType, start: NaiveDate, end: NaiveDate) -> LeaveRequest {
        LeaveRequest::new("org_001", "emp_001", leave_type, start, end, "personal")
    }

    fn employee() -> Employee {
        Employee {
            id: "emp_001".to_string(),
            organization_id: "org_001".to_string(),
            name: "Juan dela Cruz".to_string(),
            monthly_salary: dec("20000"),
            daily_rate: None,
            rest_days: vec![],
        }
    }

    #[test]
    fn test_approve_debits_balance() {
        let ledger = create_test_ledger();
        let mut req = request(LeaveType::Vacation, date(2026, 3, 2), date(2026, 3, 4));

        let entry = ledger.approve(&mut req, LeaveApproval::default()).unwrap();

        assert_eq!(req.status, LeaveRequestStatus::Approved);
        assert_eq!(req.days_debited, Some(dec("3")));
        assert_eq!(entry.delta, dec("-3"));
        assert_eq!(entry.balance_before, dec("10"));
        assert_eq!(entry.balance_after, dec("7"));

        let credit = ledger.credit("emp_001", &LeaveType::Vacation).unwrap();
        assert_eq!(credit.used, dec("3"));
        assert_eq!(credit.balance, dec("7"));
        assert!(credit.is_consistent());
    }

    #[test]
    fn test_first_use_seeds_default_credits_with_audit() {
        let ledger = create_test_ledger();
        assert!(ledger.credit("emp_001", &LeaveType::Vacation).is_none());

        let mut req = request(LeaveType::Vacation, date(2026, 3, 2), date(2026, 3, 2));
        ledger.approve(&mut req, LeaveApproval::default()).unwrap();

        let trail = ledger.audit_trail();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].action, LedgerAction::Grant);
        assert_eq!(trail[0].balance_after, dec("10"));
        assert_eq!(trail[1].action, LedgerAction::Approve);
    }

    #[test]
    fn test_approve_then_cancel_restores_balance() {
        let ledger = create_test_ledger();
        let mut req = request(LeaveType::Vacation, date(2026, 3, 2), date(2026, 3, 4));
        ledger.approve(&mut req, LeaveApproval::default()).unwrap();

        let entry = ledger.cancel(&mut req, date(2026, 2, 20)).unwrap().unwrap();

        assert_eq!(req.status, LeaveRequestStatus::Cancelled);
        assert_eq!(entry.delta, dec("3"));
        let credit = ledger.credit("emp_001", &LeaveType::Vacation).unwrap();
        assert_eq!(credit.balance, dec("10"));
        assert_eq!(credit.used, dec("0"));
    }

    #[test]
    fn test_cancel_after_start_rejected_for_before_start_policy() {
        let ledger = create_test_ledger();
        let mut req = request(LeaveType::Vacation, date(2026, 3, 2), date(2026, 3, 4));
        ledger.approve(&mut req, LeaveApproval::default()).unwrap();

        let result = ledger.cancel(&mut req, date(2026, 3, 2));
        assert!(matches!(result, Err(EngineError::InvalidLeaveRequest { .. })));
        assert_eq!(req.status, LeaveRequestStatus::Approved);
    }

    #[test]
    fn test_cancel_anytime_policy_allows_cancel_during_leave() {
        let ledger = create_test_ledger();
        let mut req = request(LeaveType::Sick, date(2026, 3, 2), date(2026, 3, 3));
        ledger.approve(&mut req, LeaveApproval::default()).unwrap();

        assert!(ledger.cancel(&mut req, date(2026, 3, 3)).unwrap().is_some());
        let credit = ledger.credit("emp_001", &LeaveType::Sick).unwrap();
        assert_eq!(credit.balance, dec("5"));
    }

    #[test]
    fn test_cancel_pending_leaves_ledger_untouched() {
        let ledger = create_test_ledger();
        let mut req = request(LeaveType::Vacation, date(2026, 3, 2), date(2026, 3, 4));

        assert!(ledger.cancel(&mut req, date(2026, 3, 1)).unwrap().is_none());
        assert_eq!(req.status, LeaveRequestStatus::Cancelled);
        assert!(ledger.audit_trail().is_empty());
    }

    #[test]
    fn test_insufficient_balance_rejected() {
        let ledger = create_test_ledger();
        ledger
            .adjust("emp_001", &LeaveType::Vacation, dec("-8"), "correction")
            .unwrap();
        let mut req = request(LeaveType::Vacation, date(2026, 3, 2), date(2026, 3, 4));

        match ledger.approve(&mut req, LeaveApproval::default()) {
            Err(EngineError::InsufficientLeaveBalance {
                requested,
                available,
                ..
            }) => {
                assert_eq!(requested, dec("3"));
                assert_eq!(available, dec("2"));
            }
            other => panic!("Expected InsufficientLeaveBalance, got {:?}", other),
        }
        assert_eq!(req.status, LeaveRequestStatus::Pending);
    }

    #[test]
    fn test_override_flag_allows_negative_and_is_audited() {
        let ledger = create_test_ledger();
        ledger
            .adjust("emp_001", &LeaveType::Vacation, dec("-8"), "correction")
            .unwrap();
        let mut req = request(LeaveType::Vacation, date(2026, 3, 2), date(2026, 3, 4));

        let entry = ledger
            .approve(
                &mut req,
                LeaveApproval {
                    remarks: Some("HR approved advance".to_string()),
                    override_insufficient_balance: true,
                },
            )
            .unwrap();

        assert!(entry.override_applied);
        assert_eq!(entry.balance_after, dec("-1"));
        assert_eq!(entry.reason, "HR approved advance");
    }

    #[test]
    fn test_negative_allowed_leave_type_needs_no_override() {
        let ledger = create_test_ledger();
        let unpaid = LeaveType::Custom("unpaid".to_string());
        ledger.grant("emp_001", &unpaid, Some(dec("0"))).unwrap();
        let mut req = request(unpaid.clone(), date(2026, 3, 2), date(2026, 3, 3));

        let entry = ledger.approve(&mut req, LeaveApproval::default()).unwrap();
        assert!(!entry.override_applied);
        assert_eq!(entry.balance_after, dec("-2"));
    }

    #[test]
    fn test_max_consecutive_days_enforced() {
        let ledger = create_test_ledger();
        let mut req = request(LeaveType::Vacation, date(2026, 3, 2), date(2026, 3, 7));
        let result = ledger.approve(&mut req, LeaveApproval::default());
        assert!(matches!(result, Err(EngineError::InvalidLeaveRequest { .. })));
    }

    #[test]
    fn test_non_debiting_leave_skips_holidays() {
        let ledger = create_test_ledger();
        let mut req = request(LeaveType::Sick, date(2026, 6, 11), date(2026, 6, 13));
        ledger.approve(&mut req, LeaveApproval::default()).unwrap();
        assert_eq!(req.days_debited, Some(dec("2")));

        let mut vacation = request(LeaveType::Vacation, date(2026, 6, 11), date(2026, 6, 13));
        assert_eq!(ledger.day_count(&vacation).unwrap(), dec("3"));
        ledger
            .approve(&mut vacation, LeaveApproval::default())
            .unwrap();
    }

    #[test]
    fn test_only_pending_requests_can_be_approved_or_rejected() {
        let ledger = create_test_ledger();
        let mut req = request(LeaveType::Vacation, date(2026, 3, 2), date(2026, 3, 2));
        ledger.reject(&mut req, "team coverage").unwrap();

        assert!(matches!(
            ledger.approve(&mut req, LeaveApproval::default()),
            Err(EngineError::InvalidLeaveTransition { .. })
        ));
        assert!(matches!(
            ledger.cancel(&mut req, date(2026, 3, 1)),
            Err(EngineError::InvalidLeaveTransition { .. })
        ));
    }

    #[test]
    fn test_reject_requires_remarks() {
        let ledger = create_test_ledger();
        let mut req = request(LeaveType::Vacation, date(2026, 3, 2), date(2026, 3, 2));
        assert!(ledger.reject(&mut req, "  ").is_err());
        assert_eq!(req.status, LeaveRequestStatus::Pending);
    }

    #[test]
    fn test_submit_auto_approves_when_no_approval_required() {
        let ledger = create_test_ledger();
        let mut emergency = request(LeaveType::Emergency, date(2026, 3, 2), date(2026, 3, 2));
        assert!(ledger.submit(&mut emergency).unwrap().is_some());
        assert_eq!(emergency.status, LeaveRequestStatus::Approved);

        let mut vacation = request(LeaveType::Vacation, date(2026, 3, 2), date(2026, 3, 2));
        assert!(ledger.submit(&mut vacation).unwrap().is_none());
        assert_eq!(vacation.status, LeaveRequestStatus::Pending);
    }

    #[test]
    fn test_unknown_leave_type_rejected() {
        let ledger = create_test_ledger();
        let mut req = request(LeaveType::Maternity, date(2026, 3, 2), date(2026, 3, 2));
        assert!(matches!(
            ledger.submit(&mut req),
            Err(EngineError::LeaveTypeNotConfigured { .. })
        ));
    }

    #[test]
    fn test_adjust_marks_balance_authoritative() {
        let ledger = create_test_ledger();
        let entry = ledger
            .adjust("emp_001", &LeaveType::Sick, dec("1.5"), "tenure bonus")
            .unwrap();
        assert_eq!(entry.action, LedgerAction::Adjust);
        assert_eq!(entry.balance_after, dec("6.5"));

        let credit = ledger.credit("emp_001", &LeaveType::Sick).unwrap();
        assert!(credit.adjusted);
        assert!(credit.is_consistent());
    }

    /// LL-001: converting 3 of 10 days leaves 7 and pays 3 × daily rate
    #[test]
    fn test_ll_001_convert_to_cash() {
        let ledger = create_test_ledger();
        let conversion = ledger
            .convert_to_cash(
                &employee(),
                &LeaveType::Vacation,
                dec("3"),
                "year-end conversion",
                &PayPolicy::default(),
            )
            .unwrap();

        // 20000 / 22 × 3 = 2727.2727… → 2727.27
        assert_eq!(conversion.amount, dec("2727.27"));
        assert_eq!(conversion.audit_entry.balance_after, dec("7"));
        let credit = ledger.credit("emp_001", &LeaveType::Vacation).unwrap();
        assert_eq!(credit.balance, dec("7"));
        assert_eq!(credit.used, dec("0"));
    }

    #[test]
    fn test_convert_more_than_balance_rejected() {
        let ledger = create_test_ledger();
        let result = ledger.convert_to_cash(
            &employee(),
            &LeaveType::Sick,
            dec("6"),
            "conversion",
            &PayPolicy::default(),
        );
        assert!(matches!(
            result,
            Err(EngineError::InsufficientLeaveBalance { .. })
        ));
        assert_eq!(
            ledger.credit("emp_001", &LeaveType::Sick).unwrap().balance,
            dec("5")
        );
    }

    #[test]
    fn test_carry_over_caps_unused_balance() {
        let ledger = create_test_ledger();
        let mut req = request(LeaveType::Vacation, date(2026, 3, 2), date(2026, 3, 3));
        ledger.approve(&mut req, LeaveApproval::default()).unwrap();

        let entry = ledger
            .carry_over("emp_001", &LeaveType::Vacation, "year end 2026")
            .unwrap();

        // 8 unused, capped at 3, on top of 10 default credits
        assert_eq!(entry.balance_after, dec("13"));
        let credit = ledger.credit("emp_001", &LeaveType::Vacation).unwrap();
        assert_eq!(credit.total, dec("13"));
        assert_eq!(credit.used, dec("0"));
    }

    #[test]
    fn test_carry_over_disabled_resets_to_default() {
        let ledger = create_test_ledger();
        ledger
            .adjust("emp_001", &LeaveType::Sick, dec("-2"), "correction")
            .unwrap();
        let entry = ledger
            .carry_over("emp_001", &LeaveType::Sick, "year end 2026")
            .unwrap();
        assert_eq!(entry.balance_after, dec("5"));
    }

    #[test]
    fn test_paid_leave_days_clamped_to_period() {
        let ledger = create_test_ledger();
        let mut vacation = request(LeaveType::Vacation, date(2026, 3, 14), date(2026, 3, 17));
        ledger
            .approve(&mut vacation, LeaveApproval::default())
            .unwrap();
        let mut unpaid = request(
            LeaveType::Custom("unpaid".to_string()),
            date(2026, 3, 2),
            date(2026, 3, 3),
        );
        ledger.approve(&mut unpaid, LeaveApproval::default()).unwrap();
        let mut pending = request(LeaveType::Vacation, date(2026, 3, 5), date(2026, 3, 5));
        ledger.submit(&mut pending).unwrap();

        let period = CutoffPeriod::new(date(2026, 3, 1), date(2026, 3, 15)).unwrap();
        assert_eq!(ledger.paid_leave_days("emp_001", period).unwrap(), dec("2"));
        assert_eq!(
            ledger.paid_leave_dates("emp_001", period).unwrap(),
            vec![date(2026, 3, 14), date(2026, 3, 15)]
        );
        assert_eq!(ledger.paid_leave_days("emp_002", period).unwrap(), dec("0"));
    }

    /// LL-010: Pay follows the ledger's own approvals, not the caller's copy.
    #[test]
    fn test_paid_leave_ignores_requests_marked_approved_outside_ledger() {
        let ledger = create_test_ledger();
        let mut forged = request(LeaveType::Vacation, date(2026, 3, 2), date(2026, 3, 3));
        forged.status = LeaveRequestStatus::Approved;
        forged.days_debited = Some(dec("2"));

        let period = CutoffPeriod::new(date(2026, 3, 1), date(2026, 3, 15)).unwrap();
        assert_eq!(ledger.paid_leave_days("emp_001", period).unwrap(), dec("0"));

        let result = ledger.cancel(&mut forged, date(2026, 3, 1));
        assert!(matches!(
            result,
            Err(EngineError::InvalidLeaveRequest { .. })
        ));
        assert!(ledger.credit("emp_001", &LeaveType::Vacation).is_none());
    }

    #[test]
    fn test_cancel_removes_paid_leave_and_moves_revision() {
        let ledger = create_test_ledger();
        let period = CutoffPeriod::new(date(2026, 3, 1), date(2026, 3, 15)).unwrap();
        let start = ledger.revision();

        let mut req = request(LeaveType::Vacation, date(2026, 3, 9), date(2026, 3, 10));
        ledger.approve(&mut req, LeaveApproval::default()).unwrap();
        assert!(ledger.revision() > start);
        assert_eq!(ledger.paid_leave_days("emp_001", period).unwrap(), dec("2"));

        let approved_at = ledger.revision();
        ledger.cancel(&mut req, date(2026, 3, 1)).unwrap();
        assert!(ledger.revision() > approved_at);
        assert_eq!(ledger.paid_leave_days("emp_001", period).unwrap(), dec("0"));
    }

    #[test]
    fn test_cancel_rejects_request_from_other_organization() {
        let ledger = create_test_ledger();
        let mut req = request(LeaveType::Vacation, date(2026, 3, 9), date(2026, 3, 10));
        ledger.approve(&mut req, LeaveApproval::default()).unwrap();

        let mut foreign = req.clone();
        foreign.organization_id = "org_002".to_string();
        let result = ledger.cancel(&mut foreign, date(2026, 3, 1));

        assert!(matches!(
            result,
            Err(EngineError::InvalidLeaveRequest { .. })
        ));
        let credit = ledger.credit("emp_001", &LeaveType::Vacation).unwrap();
        assert_eq!(credit.balance, dec("8"));
        assert_eq!(foreign.status, LeaveRequestStatus::Approved);
    }

    #[test]
    fn test_concurrent_approvals_serialize_per_key() {
        let ledger = Arc::new(create_test_ledger());
        ledger
            .grant("emp_001", &LeaveType::Vacation, Some(dec("100")))
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    let day = date(2026, 4, 1 + i);
                    let mut req = request(LeaveType::Vacation, day, day);
                    ledger.approve(&mut req, LeaveApproval::default()).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let credit = ledger.credit("emp_001", &LeaveType::Vacation).unwrap();
        assert_eq!(credit.used, dec("8"));
        assert_eq!(credit.balance, dec("92"));
    }
}
