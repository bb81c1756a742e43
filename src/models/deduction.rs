//! Deduction settings and ad-hoc line items for payroll runs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A government-mandated withholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatutoryKind {
    /// Social Security System contribution.
    Sss,
    /// Pag-IBIG (HDMF) contribution.
    PagIbig,
    /// PhilHealth contribution.
    Philhealth,
    /// Withholding tax.
    Tax,
}

impl StatutoryKind {
    /// All statutory kinds, in the order they appear on a payslip.
    pub const ALL: [StatutoryKind; 4] = [
        StatutoryKind::Sss,
        StatutoryKind::PagIbig,
        StatutoryKind::Philhealth,
        StatutoryKind::Tax,
    ];
}

impl std::fmt::Display for StatutoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatutoryKind::Sss => write!(f, "sss"),
            StatutoryKind::PagIbig => write!(f, "pag_ibig"),
            StatutoryKind::Philhealth => write!(f, "philhealth"),
            StatutoryKind::Tax => write!(f, "tax"),
        }
    }
}

/// Whether the full-period amount or half of it is withheld in a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionFrequency {
    /// Withhold 100% of the full-period amount.
    #[default]
    Full,
    /// Withhold 50%, for semi-monthly splitting.
    Half,
}

impl DeductionFrequency {
    /// The share of the full-period amount withheld.
    ///
    /// ```
    /// use payroll_engine::models::DeductionFrequency;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(DeductionFrequency::Full.factor(), Decimal::ONE);
    /// assert_eq!(DeductionFrequency::Half.factor(), Decimal::new(5, 1));
    /// ```
    pub fn factor(&self) -> Decimal {
        match self {
            DeductionFrequency::Full => Decimal::ONE,
            DeductionFrequency::Half => Decimal::new(5, 1),
        }
    }
}

/// Enabled flag and frequency for one statutory deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionToggle {
    /// Whether the deduction is withheld at all.
    pub enabled: bool,
    /// Full or half withholding.
    #[serde(default)]
    pub frequency: DeductionFrequency,
}

impl Default for DeductionToggle {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency: DeductionFrequency::Full,
        }
    }
}

/// Per-employee statutory deduction configuration for one payroll run.
///
/// The default withholds every deduction in full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionSetting {
    /// SSS.
    #[serde(default)]
    pub sss: DeductionToggle,
    /// Pag-IBIG.
    #[serde(default)]
    pub pag_ibig: DeductionToggle,
    /// PhilHealth.
    #[serde(default)]
    pub philhealth: DeductionToggle,
    /// Withholding tax.
    #[serde(default)]
    pub tax: DeductionToggle,
}

impl DeductionSetting {
    /// Returns the toggle for a statutory kind.
    pub fn toggle(&self, kind: StatutoryKind) -> DeductionToggle {
        match kind {
            StatutoryKind::Sss => self.sss,
            StatutoryKind::PagIbig => self.pag_ibig,
            StatutoryKind::Philhealth => self.philhealth,
            StatutoryKind::Tax => self.tax,
        }
    }

    /// Returns a mutable reference to the toggle for a statutory kind.
    pub fn toggle_mut(&mut self, kind: StatutoryKind) -> &mut DeductionToggle {
        match kind {
            StatutoryKind::Sss => &mut self.sss,
            StatutoryKind::PagIbig => &mut self.pag_ibig,
            StatutoryKind::Philhealth => &mut self.philhealth,
            StatutoryKind::Tax => &mut self.tax,
        }
    }
}

/// An ad-hoc deduction or incentive on a payroll run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// What the amount is for (e.g., "cash advance", "perfect attendance").
    pub label: String,
    /// The amount; must not be negative.
    pub amount: Decimal,
}

impl LineItem {
    /// Creates a line item.
    pub fn new(label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}
