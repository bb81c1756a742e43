//! Payroll run state and the wizard transition table.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{CutoffPeriod, DeductionSetting, LineItem, PayrollSummaryLine};

/// The step a payroll run has reached in the review wizard.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WizardStage {
    /// Created; nothing selected yet.
    #[default]
    Draft,
    /// Cutoff dates chosen.
    DatesSelected,
    /// Employee roster chosen.
    EmployeesSelected,
    /// At least one deduction setting or line item edited.
    DeductionsConfigured,
    /// A summary has been generated and is kept current.
    SummaryGenerated,
}

impl std::fmt::Display for WizardStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WizardStage::Draft => write!(f, "draft"),
            WizardStage::DatesSelected => write!(f, "dates_selected"),
            WizardStage::EmployeesSelected => write!(f, "employees_selected"),
            WizardStage::DeductionsConfigured => write!(f, "deductions_configured"),
            WizardStage::SummaryGenerated => write!(f, "summary_generated"),
        }
    }
}

/// Whether a run can still change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Editable.
    #[default]
    Draft,
    /// Closed; every mutation is rejected.
    Finalized,
}

/// A mutating entry point of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunAction {
    /// Choose the cutoff period.
    SelectDates,
    /// Choose the employee roster.
    SelectEmployees,
    /// Edit one employee's deduction setting.
    ConfigureDeductions,
    /// Edit one employee's ad-hoc deductions and incentives.
    SetLineItems,
    /// Correct a stored attendance record.
    CorrectAttendance,
    /// Compute the summary.
    GenerateSummary,
    /// Attach a note to an (employee, date).
    AddNote,
    /// Accept an employee's negative net pay.
    AcknowledgeNegativePay,
    /// Close the run.
    Finalize,
}

/// `(action, minimum stage, stage reached)`; `None` leaves the stage as is.
const TRANSITIONS: [(RunAction, WizardStage, Option<WizardStage>); 9] = [
    (
        RunAction::SelectDates,
        WizardStage::Draft,
        Some(WizardStage::DatesSelected),
    ),
    (
        RunAction::SelectEmployees,
        WizardStage::DatesSelected,
        Some(WizardStage::EmployeesSelected),
    ),
    (
        RunAction::ConfigureDeductions,
        WizardStage::EmployeesSelected,
        Some(WizardStage::DeductionsConfigured),
    ),
    (
        RunAction::SetLineItems,
        WizardStage::EmployeesSelected,
        Some(WizardStage::DeductionsConfigured),
    ),
    (RunAction::CorrectAttendance, WizardStage::DatesSelected, None),
    (
        RunAction::GenerateSummary,
        WizardStage::EmployeesSelected,
        Some(WizardStage::SummaryGenerated),
    ),
    (RunAction::AddNote, WizardStage::SummaryGenerated, None),
    (
        RunAction::AcknowledgeNegativePay,
        WizardStage::SummaryGenerated,
        None,
    ),
    (RunAction::Finalize, WizardStage::SummaryGenerated, None),
];

impl RunAction {
    fn transition(&self) -> (WizardStage, Option<WizardStage>) {
        TRANSITIONS
            .iter()
            .find(|(action, _, _)| action == self)
            .map(|(_, required, target)| (*required, *target))
            .unwrap_or((WizardStage::SummaryGenerated, None))
    }

    /// The stage a run must have reached before this action.
    pub fn required_stage(&self) -> WizardStage {
        self.transition().0
    }

    /// The stage this action moves a run to, if it moves it at all.
    pub fn target_stage(&self) -> Option<WizardStage> {
        self.transition().1
    }
}

/// Ad-hoc deductions and incentives for one employee in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeLineItems {
    /// Deductions such as cash advances or loans.
    #[serde(default)]
    pub deductions: Vec<LineItem>,
    /// Incentives such as allowances or bonuses.
    #[serde(default)]
    pub incentives: Vec<LineItem>,
}

/// The versions of the orchestrator's inputs a summary was computed from.
///
/// `attendance` moves on every attendance correction and `leave` on every
/// ledger change that affects paid leave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputRevision {
    /// Attendance revision.
    pub attendance: u64,
    /// Leave ledger revision.
    pub leave: u64,
}

/// A free-text reviewer note on an (employee, date). Never affects pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunNote {
    /// The employee.
    pub employee_id: String,
    /// The date the note refers to.
    pub date: NaiveDate,
    /// Note text.
    pub text: String,
    /// When the note was last written.
    pub updated_at: DateTime<Utc>,
}

/// A payroll run over one cutoff period.
///
/// Fields are read through accessors; all mutation goes through
/// [`PayrollOrchestrator`](super::PayrollOrchestrator), which enforces the
/// wizard order and rejects changes once the run is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRun {
    id: Uuid,
    organization_id: String,
    period: Option<CutoffPeriod>,
    employee_ids: Vec<String>,
    deduction_settings: BTreeMap<String, DeductionSetting>,
    line_items: BTreeMap<String, EmployeeLineItems>,
    summary: Vec<PayrollSummaryLine>,
    summary_revision: Option<InputRevision>,
    notes: Vec<RunNote>,
    acknowledged_negative: BTreeMap<String, Decimal>,
    stage: WizardStage,
    status: RunStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    finalized_at: Option<DateTime<Utc>>,
}

impl PayrollRun {
    pub(crate) fn new(organization_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id: organization_id.into(),
            period: None,
            employee_ids: Vec::new(),
            deduction_settings: BTreeMap::new(),
            line_items: BTreeMap::new(),
            summary: Vec::new(),
            summary_revision: None,
            notes: Vec::new(),
            acknowledged_negative: BTreeMap::new(),
            stage: WizardStage::Draft,
            status: RunStatus::Draft,
            created_at: now,
            updated_at: now,
            finalized_at: None,
        }
    }

    /// Run id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Owning organization.
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// The cutoff period, once selected.
    pub fn period(&self) -> Option<CutoffPeriod> {
        self.period
    }

    /// Selected employees, in selection order.
    pub fn employee_ids(&self) -> &[String] {
        &self.employee_ids
    }

    /// The deduction setting for an employee; the default if never edited.
    pub fn deduction_setting(&self, employee_id: &str) -> DeductionSetting {
        self.deduction_settings
            .get(employee_id)
            .copied()
            .unwrap_or_default()
    }

    /// Ad-hoc line items for an employee.
    pub fn line_items(&self, employee_id: &str) -> EmployeeLineItems {
        self.line_items.get(employee_id).cloned().unwrap_or_default()
    }

    /// Generated summary lines, in roster order.
    pub fn summary(&self) -> &[PayrollSummaryLine] {
        &self.summary
    }

    /// The summary line for one employee.
    pub fn summary_line(&self, employee_id: &str) -> Option<&PayrollSummaryLine> {
        self.summary.iter().find(|l| l.employee_id == employee_id)
    }

    /// The input revision the current summary was computed from.
    pub fn summary_revision(&self) -> Option<InputRevision> {
        self.summary_revision
    }

    /// Reviewer notes.
    pub fn notes(&self) -> &[RunNote] {
        &self.notes
    }

    /// Current wizard stage.
    pub fn stage(&self) -> WizardStage {
        self.stage
    }

    /// Draft or finalized.
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time of the last accepted mutation.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Finalization time, if finalized.
    pub fn finalized_at(&self) -> Option<DateTime<Utc>> {
        self.finalized_at
    }

    /// Returns true if the run has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.status == RunStatus::Finalized
    }

    /// Returns true if an employee's negative net pay has been acknowledged.
    pub fn is_acknowledged(&self, employee_id: &str) -> bool {
        self.acknowledged_negative.contains_key(employee_id)
    }

    /// Employees whose negative net pay still needs acknowledgement.
    pub fn unacknowledged_negative(&self) -> Vec<String> {
        self.summary
            .iter()
            .filter(|l| l.is_negative() && !self.is_acknowledged(&l.employee_id))
            .map(|l| l.employee_id.clone())
            .collect()
    }

    /// Sum of net pay over the summary.
    pub fn total_net_pay(&self) -> Decimal {
        self.summary.iter().map(|l| l.net_pay()).sum()
    }

    /// Rejects `action` if the run is finalized or has not reached the
    /// stage the action requires.
    pub fn check(&self, action: RunAction) -> EngineResult<()> {
        if self.is_finalized() {
            return Err(EngineError::StaleRunState {
                run_id: self.id,
                message: format!("run is finalized; {:?} is not allowed", action),
            });
        }
        let required = action.required_stage();
        if self.stage < required {
            return Err(EngineError::StaleRunState {
                run_id: self.id,
                message: format!(
                    "{:?} requires stage '{}', run is at '{}'",
                    action, required, self.stage
                ),
            });
        }
        Ok(())
    }

    /// Moves the stage forward for `action`; never moves it back.
    pub(crate) fn advance(&mut self, action: RunAction) {
        if let Some(target) = action.target_stage() {
            self.stage = self.stage.max(target);
        }
        self.updated_at = Utc::now();
    }

    pub(crate) fn set_period(&mut self, period: CutoffPeriod) {
        self.period = Some(period);
    }

    /// Replaces the roster and drops settings of employees no longer selected.
    pub(crate) fn set_employees(&mut self, employee_ids: Vec<String>) {
        self.deduction_settings
            .retain(|id, _| employee_ids.contains(id));
        self.line_items.retain(|id, _| employee_ids.contains(id));
        self.notes.retain(|n| employee_ids.contains(&n.employee_id));
        self.employee_ids = employee_ids;
    }

    pub(crate) fn is_selected(&self, employee_id: &str) -> bool {
        self.employee_ids.iter().any(|id| id == employee_id)
    }

    pub(crate) fn set_deduction_setting(&mut self, employee_id: &str, setting: DeductionSetting) {
        self.deduction_settings
            .insert(employee_id.to_string(), setting);
    }

    pub(crate) fn set_line_items(&mut self, employee_id: &str, items: EmployeeLineItems) {
        self.line_items.insert(employee_id.to_string(), items);
    }

    /// Swaps in a freshly computed summary.
    ///
    /// An acknowledgement survives only if the employee's net pay is unchanged.
    pub(crate) fn replace_summary(
        &mut self,
        summary: Vec<PayrollSummaryLine>,
        revision: InputRevision,
    ) {
        self.acknowledged_negative.retain(|employee_id, acknowledged| {
            summary
                .iter()
                .any(|l| &l.employee_id == employee_id && l.net_pay() == *acknowledged)
        });
        self.summary = summary;
        self.summary_revision = Some(revision);
    }

    /// Writes a note, replacing any existing note on the same (employee, date).
    pub(crate) fn upsert_note(&mut self, employee_id: &str, date: NaiveDate, text: String) {
        let updated_at = Utc::now();
        match self
            .notes
            .iter_mut()
            .find(|n| n.employee_id == employee_id && n.date == date)
        {
            Some(note) => {
                note.text = text;
                note.updated_at = updated_at;
            }
            None => self.notes.push(RunNote {
                employee_id: employee_id.to_string(),
                date,
                text,
                updated_at,
            }),
        }
    }

    pub(crate) fn acknowledge(&mut self, employee_id: &str, net_pay: Decimal) {
        self.acknowledged_negative
            .insert(employee_id.to_string(), net_pay);
    }

    pub(crate) fn mark_finalized(&mut self) {
        let now = Utc::now();
        self.status = RunStatus::Finalized;
        self.finalized_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_is_draft() {
        let run = PayrollRun::new("org_001");
        assert_eq!(run.stage(), WizardStage::Draft);
        assert_eq!(run.status(), RunStatus::Draft);
        assert!(run.summary().is_empty());
    }

    #[test]
    fn test_stages_are_ordered() {
        assert!(WizardStage::Draft < WizardStage::DatesSelected);
        assert!(WizardStage::EmployeesSelected < WizardStage::DeductionsConfigured);
        assert!(WizardStage::DeductionsConfigured < WizardStage::SummaryGenerated);
    }

    #[test]
    fn test_every_action_has_a_transition() {
        for action in [
            RunAction::SelectDates,
            RunAction::SelectEmployees,
            RunAction::ConfigureDeductions,
            RunAction::SetLineItems,
            RunAction::CorrectAttendance,
            RunAction::GenerateSummary,
            RunAction::AddNote,
            RunAction::AcknowledgeNegativePay,
            RunAction::Finalize,
        ] {
            assert!(TRANSITIONS.iter().any(|(a, _, _)| *a == action), "{:?}", action);
        }
    }

    #[test]
    fn test_check_rejects_skipped_stage() {
        let run = PayrollRun::new("org_001");
        assert!(run.check(RunAction::SelectDates).is_ok());
        assert!(matches!(
            run.check(RunAction::SelectEmployees),
            Err(EngineError::StaleRunState { .. })
        ));
        assert!(run.check(RunAction::Finalize).is_err());
    }

    #[test]
    fn test_advance_never_moves_back() {
        let mut run = PayrollRun::new("org_001");
        run.stage = WizardStage::SummaryGenerated;
        run.advance(RunAction::SelectDates);
        assert_eq!(run.stage(), WizardStage::SummaryGenerated);
    }

    #[test]
    fn test_finalized_run_rejects_everything() {
        let mut run = PayrollRun::new("org_001");
        run.stage = WizardStage::SummaryGenerated;
        run.mark_finalized();
        for action in [RunAction::SelectDates, RunAction::AddNote, RunAction::Finalize] {
            assert!(matches!(
                run.check(action),
                Err(EngineError::StaleRunState { .. })
            ));
        }
    }

    #[test]
    fn test_note_upsert_replaces_same_key() {
        let mut run = PayrollRun::new("org_001");
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        run.upsert_note("emp_001", date, "first".to_string());
        run.upsert_note("emp_001", date, "second".to_string());
        run.upsert_note("emp_002", date, "other".to_string());

        assert_eq!(run.notes().len(), 2);
        assert_eq!(run.notes()[0].text, "second");
    }

    #[test]
    fn test_set_employees_drops_deselected_settings() {
        let mut run = PayrollRun::new("org_001");
        run.set_employees(vec!["emp_001".to_string(), "emp_002".to_string()]);
        run.set_line_items("emp_002", EmployeeLineItems::default());
        run.set_employees(vec!["emp_001".to_string()]);
        assert!(!run.line_items.contains_key("emp_002"));
    }
}
