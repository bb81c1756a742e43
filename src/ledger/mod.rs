//! Leave credit ledger.
//!
//! This module maintains per-employee, per-leave-type credit balances and
//! processes leave approval, rejection, cancellation, manual adjustment,
//! cash conversion, grants and year-end carry-over.

mod leave_ledger;

pub use leave_ledger::{LeaveApproval, LeaveLedger};
