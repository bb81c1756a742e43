//! Payroll runs.
//!
//! A [`PayrollRun`] moves through the wizard stages date selection, employee
//! selection, deduction configuration and summary generation before it is
//! finalized. The [`PayrollOrchestrator`] owns the pre-fetched data set and
//! drives every stage.

mod orchestrator;
mod run;

pub use orchestrator::{PayrollInputs, PayrollOrchestrator};
pub use run::{
    EmployeeLineItems, InputRevision, PayrollRun, RunAction, RunNote, RunStatus, WizardStage,
};
