//! The payroll run orchestrator.
//!
//! Drives the per-employee pipeline (time resolution, gross pay, net pay)
//! over a pre-fetched data set and keeps a run's summary current as its
//! inputs are edited.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::calculation::{
    Disposition, compute_gross, compute_net, import_attendance, resolve, validate_line_items,
    validate_record,
};
use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::ledger::LeaveLedger;
use crate::models::{
    AttendanceCorrection, AttendanceRecord, AuditTrace, CutoffPeriod, DeductionSetting, Employee,
    PayrollSummaryLine,
};

use super::run::{EmployeeLineItems, InputRevision, PayrollRun, RunAction};

/// The pre-fetched organization data a run computes over.
///
/// Paid leave is not part of the inputs: it is read from the leave ledger's
/// own approvals each time a summary is computed.
#[derive(Debug, Clone, Default)]
pub struct PayrollInputs {
    /// Employees that may be selected.
    pub employees: Vec<Employee>,
    /// Attendance records; may span more than one cutoff period.
    pub attendance: Vec<AttendanceRecord>,
}

/// Runs the payroll wizard for one organization.
pub struct PayrollOrchestrator {
    config: Arc<ConfigLoader>,
    ledger: Arc<LeaveLedger>,
    employees: HashMap<String, Employee>,
    attendance: HashMap<String, Vec<AttendanceRecord>>,
    attendance_revision: u64,
    workers: usize,
}

impl PayrollOrchestrator {
    /// Creates an orchestrator over a validated data set.
    ///
    /// Attendance is imported through [`import_attendance`], so invalid or
    /// duplicate rows fail here and holidays are tagged from the ledger's
    /// calendar.
    ///
    /// # Errors
    ///
    /// - `RateTableMissing` if the organization has no rate table
    /// - `CalculationError` if an employee or attendance record belongs to
    ///   another organization
    /// - any attendance import error
    pub fn new(
        config: Arc<ConfigLoader>,
        ledger: Arc<LeaveLedger>,
        inputs: PayrollInputs,
    ) -> EngineResult<Self> {
        let organization_id = ledger.organization_id().to_string();
        config.rate_table(&organization_id)?;

        let mut employees = HashMap::with_capacity(inputs.employees.len());
        for employee in inputs.employees {
            if employee.organization_id != organization_id {
                return Err(EngineError::CalculationError {
                    message: format!(
                        "Employee '{}' belongs to organization '{}', not '{}'",
                        employee.id, employee.organization_id, organization_id
                    ),
                });
            }
            employees.insert(employee.id.clone(), employee);
        }

        if let Some(foreign) = inputs
            .attendance
            .iter()
            .find(|r| r.organization_id != organization_id)
        {
            return Err(EngineError::CalculationError {
                message: format!(
                    "Attendance record '{}' belongs to organization '{}', not '{}'",
                    foreign.id, foreign.organization_id, organization_id
                ),
            });
        }

        let mut attendance: HashMap<String, Vec<AttendanceRecord>> = HashMap::new();
        for record in import_attendance(inputs.attendance, ledger.calendar())? {
            attendance
                .entry(record.employee_id.clone())
                .or_default()
                .push(record);
        }
        for records in attendance.values_mut() {
            records.sort_by_key(|r| r.date);
        }

        let workers = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);

        info!(
            organization_id = %organization_id,
            employees = employees.len(),
            workers,
            "Payroll orchestrator ready"
        );

        Ok(Self {
            config,
            ledger,
            employees,
            attendance,
            attendance_revision: 0,
            workers,
        })
    }

    /// Sets the number of worker threads used for summary generation.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// The leave ledger pay is drawn from.
    pub fn ledger(&self) -> &LeaveLedger {
        &self.ledger
    }

    /// The current revision of the inputs summaries are computed from.
    pub fn input_revision(&self) -> InputRevision {
        InputRevision {
            attendance: self.attendance_revision,
            leave: self.ledger.revision(),
        }
    }

    /// Starts a new draft run for the ledger's organization.
    pub fn create_run(&self) -> PayrollRun {
        let run = PayrollRun::new(self.ledger.organization_id());
        info!(run_id = %run.id(), "Payroll run created");
        run
    }

    /// Applies `edit` to a copy of the run, regenerates the summary if one
    /// exists, and only then commits. On error the run is left untouched.
    fn edit<F>(&self, run: &mut PayrollRun, action: RunAction, edit: F) -> EngineResult<()>
    where
        F: FnOnce(&mut PayrollRun) -> EngineResult<()>,
    {
        run.check(action)?;
        let mut candidate = run.clone();
        edit(&mut candidate)?;
        candidate.advance(action);

        if run.summary().is_empty() && action != RunAction::GenerateSummary {
            *run = candidate;
            return Ok(());
        }

        let revision = self.input_revision();
        let summary = self.compute_summary(&candidate)?;
        candidate.replace_summary(summary, revision);
        *run = candidate;
        Ok(())
    }

    /// Chooses the cutoff period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCutoffPeriod` unless `start < end`.
    pub fn select_dates(
        &self,
        run: &mut PayrollRun,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<()> {
        self.edit(run, RunAction::SelectDates, |candidate| {
            let period = CutoffPeriod::new(start, end)?;
            candidate.set_period(period);
            Ok(())
        })?;
        info!(run_id = %run.id(), start = %start, end = %end, "Cutoff dates selected");
        Ok(())
    }

    /// Chooses the employee roster. Duplicates are dropped, keeping the
    /// first occurrence.
    ///
    /// # Errors
    ///
    /// - `EmployeeNotFound` for an id not in the data set
    /// - `StaleRunState` for an empty roster
    pub fn select_employees(
        &self,
        run: &mut PayrollRun,
        employee_ids: Vec<String>,
    ) -> EngineResult<()> {
        let mut seen = HashSet::new();
        let mut roster = Vec::with_capacity(employee_ids.len());
        for id in employee_ids {
            if !self.employees.contains_key(&id) {
                return Err(EngineError::EmployeeNotFound { employee_id: id });
            }
            if seen.insert(id.clone()) {
                roster.push(id);
            }
        }

        let count = roster.len();
        self.edit(run, RunAction::SelectEmployees, |candidate| {
            if roster.is_empty() {
                return Err(EngineError::StaleRunState {
                    run_id: candidate.id(),
                    message: "at least one employee must be selected".to_string(),
                });
            }
            candidate.set_employees(roster);
            Ok(())
        })?;
        info!(run_id = %run.id(), employees = count, "Employees selected");
        Ok(())
    }

    fn require_selected(run: &PayrollRun, employee_id: &str) -> EngineResult<()> {
        if run.is_selected(employee_id) {
            Ok(())
        } else {
            Err(EngineError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            })
        }
    }

    /// Sets one employee's statutory deduction toggles.
    pub fn configure_deductions(
        &self,
        run: &mut PayrollRun,
        employee_id: &str,
        setting: DeductionSetting,
    ) -> EngineResult<()> {
        self.edit(run, RunAction::ConfigureDeductions, |candidate| {
            Self::require_selected(candidate, employee_id)?;
            candidate.set_deduction_setting(employee_id, setting);
            Ok(())
        })?;
        debug!(run_id = %run.id(), employee_id, "Deduction setting updated");
        Ok(())
    }

    /// Replaces one employee's ad-hoc deductions and incentives.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLineItem` for a negative amount.
    pub fn set_line_items(
        &self,
        run: &mut PayrollRun,
        employee_id: &str,
        items: EmployeeLineItems,
    ) -> EngineResult<()> {
        validate_line_items(&items.deductions)?;
        validate_line_items(&items.incentives)?;
        self.edit(run, RunAction::SetLineItems, |candidate| {
            Self::require_selected(candidate, employee_id)?;
            candidate.set_line_items(employee_id, items);
            Ok(())
        })?;
        debug!(run_id = %run.id(), employee_id, "Line items updated");
        Ok(())
    }

    /// Corrects a stored attendance record and refreshes the run's summary.
    ///
    /// The correction is validated before it is stored; an invalid result
    /// leaves the stored record unchanged. Other runs over the same data
    /// become stale and must regenerate before they can be finalized.
    pub fn correct_attendance(
        &mut self,
        run: &mut PayrollRun,
        record_id: &str,
        correction: AttendanceCorrection,
    ) -> EngineResult<()> {
        run.check(RunAction::CorrectAttendance)?;

        let (employee_id, index) = self
            .attendance
            .iter()
            .find_map(|(employee_id, records)| {
                records
                    .iter()
                    .position(|r| r.id == record_id)
                    .map(|i| (employee_id.clone(), i))
            })
            .ok_or_else(|| EngineError::CalculationError {
                message: format!("Attendance record '{}' not found", record_id),
            })?;

        let records = self
            .attendance
            .get_mut(&employee_id)
            .ok_or_else(|| EngineError::EmployeeNotFound {
                employee_id: employee_id.clone(),
            })?;
        let mut corrected = records[index].clone();
        corrected.apply_correction(correction);
        validate_record(&corrected)?;
        let previous = std::mem::replace(&mut records[index], corrected);
        self.attendance_revision += 1;

        if let Err(error) = self.edit(run, RunAction::CorrectAttendance, |_| Ok(())) {
            if let Some(records) = self.attendance.get_mut(&employee_id) {
                records[index] = previous;
            }
            self.attendance_revision -= 1;
            return Err(error);
        }

        info!(run_id = %run.id(), record_id, employee_id = %employee_id, "Attendance corrected");
        Ok(())
    }

    /// Computes every selected employee's summary line from scratch.
    ///
    /// The previous summary is replaced only if every line succeeds.
    ///
    /// # Errors
    ///
    /// - `StaleRunState` if no employees are selected
    /// - the first pipeline error, in roster order
    pub fn generate_summary(&self, run: &mut PayrollRun) -> EngineResult<()> {
        run.check(RunAction::GenerateSummary)?;
        if run.employee_ids().is_empty() {
            return Err(EngineError::StaleRunState {
                run_id: run.id(),
                message: "at least one employee must be selected".to_string(),
            });
        }
        self.edit(run, RunAction::GenerateSummary, |_| Ok(()))?;

        let negative = run.unacknowledged_negative();
        if !negative.is_empty() {
            warn!(run_id = %run.id(), employees = ?negative, "Summary has negative net pay");
        }
        info!(
            run_id = %run.id(),
            lines = run.summary().len(),
            total_net = %run.total_net_pay(),
            "Payroll summary generated"
        );
        Ok(())
    }

    /// Writes a reviewer note on an (employee, date). Notes never affect pay.
    pub fn add_note(
        &self,
        run: &mut PayrollRun,
        employee_id: &str,
        date: NaiveDate,
        text: impl Into<String>,
    ) -> EngineResult<()> {
        run.check(RunAction::AddNote)?;
        Self::require_selected(run, employee_id)?;
        run.upsert_note(employee_id, date, text.into());
        run.advance(RunAction::AddNote);
        debug!(run_id = %run.id(), employee_id, date = %date, "Note saved");
        Ok(())
    }

    /// Accepts an employee's negative net pay so the run can be finalized.
    ///
    /// The acknowledgement lapses if a later regeneration changes the
    /// employee's net pay.
    pub fn acknowledge_negative_pay(
        &self,
        run: &mut PayrollRun,
        employee_id: &str,
    ) -> EngineResult<()> {
        run.check(RunAction::AcknowledgeNegativePay)?;
        let line = run
            .summary_line(employee_id)
            .ok_or_else(|| EngineError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            })?;
        if !line.is_negative() {
            return Err(EngineError::CalculationError {
                message: format!(
                    "Net pay for employee '{}' is {}, nothing to acknowledge",
                    employee_id,
                    line.net_pay()
                ),
            });
        }
        let net_pay = line.net_pay();
        run.acknowledge(employee_id, net_pay);
        run.advance(RunAction::AcknowledgeNegativePay);
        info!(run_id = %run.id(), employee_id, net_pay = %net_pay, "Negative net pay acknowledged");
        Ok(())
    }

    /// Closes the run.
    ///
    /// # Errors
    ///
    /// - `StaleRunState` if no summary has been generated, the summary is
    ///   empty, the summary predates a change to attendance or paid leave,
    ///   or the run is already finalized
    /// - `UnacknowledgedNegativePay` listing employees still to acknowledge
    pub fn finalize(&self, run: &mut PayrollRun) -> EngineResult<()> {
        run.check(RunAction::Finalize)?;
        if run.summary().is_empty() {
            return Err(EngineError::StaleRunState {
                run_id: run.id(),
                message: "cannot finalize a run with an empty summary".to_string(),
            });
        }
        let current = self.input_revision();
        if run.summary_revision() != Some(current) {
            warn!(run_id = %run.id(), "Finalize refused; summary is out of date");
            return Err(EngineError::StaleRunState {
                run_id: run.id(),
                message: "attendance or paid leave changed since the summary was generated; \
                          regenerate it before finalizing"
                    .to_string(),
            });
        }
        let pending = run.unacknowledged_negative();
        if !pending.is_empty() {
            return Err(EngineError::UnacknowledgedNegativePay {
                employee_ids: pending,
            });
        }
        run.mark_finalized();
        info!(run_id = %run.id(), total_net = %run.total_net_pay(), "Payroll run finalized");
        Ok(())
    }

    /// Computes the summary for a run's current inputs without touching it.
    fn compute_summary(&self, run: &PayrollRun) -> EngineResult<Vec<PayrollSummaryLine>> {
        let period = run.period().ok_or_else(|| EngineError::StaleRunState {
            run_id: run.id(),
            message: "no cutoff period selected".to_string(),
        })?;
        let roster = run.employee_ids();
        let chunk_size = roster.len().div_ceil(self.workers).max(1);

        let results: Vec<EngineResult<PayrollSummaryLine>> = thread::scope(|scope| {
            let handles: Vec<_> = roster
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|id| self.compute_line(run, id, period))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(lines) => lines,
                    Err(_) => vec![Err(EngineError::CalculationError {
                        message: "payroll worker thread panicked".to_string(),
                    })],
                })
                .collect()
        });

        results.into_iter().collect()
    }

    /// Runs the pipeline for one employee.
    fn compute_line(
        &self,
        run: &PayrollRun,
        employee_id: &str,
        period: CutoffPeriod,
    ) -> EngineResult<PayrollSummaryLine> {
        let employee =
            self.employees
                .get(employee_id)
                .ok_or_else(|| EngineError::EmployeeNotFound {
                    employee_id: employee_id.to_string(),
                })?;
        let policy = self.config.policy();
        let rates = self.config.rate_table(&employee.organization_id)?;

        let mut step_number = 1;
        let mut trace = AuditTrace::default();
        let mut resolved = Vec::new();
        for record in self
            .attendance
            .get(employee_id)
            .into_iter()
            .flatten()
            .filter(|r| period.contains_date(r.date))
        {
            let time = resolve(record, policy, step_number)?;
            trace.steps.push(time.audit_step.clone());
            step_number += 1;
            resolved.push(time);
        }

        let leave_dates = self.ledger.paid_leave_dates(employee_id, period)?;
        if let Some(conflict) = resolved
            .iter()
            .find(|t| t.disposition == Disposition::Worked && leave_dates.contains(&t.date))
        {
            return Err(EngineError::InvalidAttendanceRange {
                record_id: conflict.record_id.clone(),
                message: format!(
                    "worked time on {} overlaps approved paid leave",
                    conflict.date
                ),
            });
        }
        let leave_days = Decimal::from(leave_dates.len());

        let gross = compute_gross(
            employee,
            period,
            &resolved,
            leave_days,
            rates,
            policy,
            step_number,
        )?;
        step_number += gross.audit_steps.len() as u32;
        trace.steps.extend(gross.audit_steps);

        let items = run.line_items(employee_id);
        let net = compute_net(
            gross.breakdown.gross_pay,
            &run.deduction_setting(employee_id),
            &items.deductions,
            &items.incentives,
            self.config.statutory(),
            policy,
            step_number,
        )?;
        trace.steps.extend(net.audit_steps);
        trace.warnings.extend(net.warnings);

        if leave_days > Decimal::ZERO {
            debug!(employee_id, leave_days = %leave_days, "Paid leave included");
        }

        Ok(PayrollSummaryLine {
            employee_id: employee.id.clone(),
            employee_name: employee.name.clone(),
            gross: gross.breakdown,
            net: net.breakdown,
            pay_lines: gross.pay_lines,
            audit_trace: trace,
        })
    }
}
