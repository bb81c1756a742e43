//! Statutory and ad-hoc deductions.
//!
//! This module applies the government deduction tables (SSS, Pag-IBIG,
//! PhilHealth, withholding tax) with a full/half frequency selector, then the
//! employee's ad-hoc deductions and incentives, to produce net pay.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{PayPolicy, StatutoryTables};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditWarning, DeductionSetting, LineItem, NetBreakdown, StatutoryDeduction,
    StatutoryKind,
};

use super::rounding::round_currency;

/// The result of a net pay calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetResult {
    /// Deductions, incentives and net pay.
    pub breakdown: NetBreakdown,
    /// Audit steps recording each deduction.
    pub audit_steps: Vec<AuditStep>,
    /// Warnings raised, e.g. for negative net pay.
    pub warnings: Vec<AuditWarning>,
}

/// Rejects line items with negative amounts.
pub fn validate_line_items(items: &[LineItem]) -> EngineResult<()> {
    match items.iter().find(|item| item.amount < Decimal::ZERO) {
        Some(item) => Err(EngineError::InvalidLineItem {
            label: item.label.clone(),
            message: format!("amount cannot be negative, got {}", item.amount),
        }),
        None => Ok(()),
    }
}

/// Computes net pay from gross pay.
///
/// For each enabled statutory kind the full-period amount is looked up from
/// its bracket table, rounded, and multiplied by the frequency factor (full
/// = 100%, half = 50%). Net pay = gross − statutory − ad-hoc + incentives.
/// Negative net pay is flagged, never clamped.
///
/// # Errors
///
/// Returns `InvalidLineItem` if any ad-hoc deduction or incentive is negative.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::compute_net;
/// use payroll_engine::config::{PayPolicy, StatutoryBracket, StatutoryTable, StatutoryTables};
/// use payroll_engine::models::{DeductionFrequency, DeductionSetting, DeductionToggle};
/// use rust_decimal::Decimal;
///
/// let tables = StatutoryTables {
///     sss: StatutoryTable::new(vec![StatutoryBracket {
///         lower: Decimal::ZERO,
///         upper: None,
///         fixed: Decimal::new(1000, 0),
///         rate: Decimal::ZERO,
///     }]),
///     ..StatutoryTables::default()
/// };
/// let setting = DeductionSetting {
///     sss: DeductionToggle { enabled: true, frequency: DeductionFrequency::Half },
///     ..DeductionSetting::default()
/// };
///
/// let result = compute_net(
///     Decimal::new(15000, 0), &setting, &[], &[], &tables, &PayPolicy::default(), 1,
/// ).unwrap();
/// assert_eq!(result.breakdown.statutory[0].withheld, Decimal::new(500, 0));
/// ```
pub fn compute_net(
    gross_pay: Decimal,
    setting: &DeductionSetting,
    ad_hoc_deductions: &[LineItem],
    incentives: &[LineItem],
    tables: &StatutoryTables,
    policy: &PayPolicy,
    step_number_start: u32,
) -> EngineResult<NetResult> {
    validate_line_items(ad_hoc_deductions)?;
    validate_line_items(incentives)?;

    let scale = policy.currency_scale;
    let mut step_number = step_number_start;
    let mut audit_steps = Vec::new();
    let mut statutory = Vec::new();

    for kind in StatutoryKind::ALL {
        let toggle = setting.toggle(kind);
        if !toggle.enabled {
            continue;
        }

        let table = tables.table(kind);
        let bracket = table.bracket_for(gross_pay);
        let full_period_amount = round_currency(table.amount_for(gross_pay), scale);
        let withheld = round_currency(full_period_amount * toggle.frequency.factor(), scale);

        audit_steps.push(AuditStep {
            step_number,
            rule_id: format!("statutory_{}", kind),
            rule_name: format!("Statutory Deduction ({})", kind),
            config_ref: format!("statutory.{}", kind),
            input: serde_json::json!({
                "gross_pay": gross_pay.to_string(),
                "bracket_lower": bracket.map(|b| b.lower.to_string()),
                "bracket_upper": bracket.and_then(|b| b.upper).map(|u| u.to_string()),
                "frequency": toggle.frequency
            }),
            output: serde_json::json!({
                "full_period_amount": full_period_amount.to_string(),
                "withheld": withheld.to_string()
            }),
            reasoning: match bracket {
                Some(b) => format!(
                    "Gross {} in bracket from {}: {} + {} × ({} − {}) = {}; {:?} frequency withholds {}",
                    gross_pay,
                    b.lower,
                    b.fixed,
                    b.rate,
                    gross_pay,
                    b.lower,
                    full_period_amount,
                    toggle.frequency,
                    withheld
                ),
                None => format!("Gross {} is below the first {} bracket", gross_pay, kind),
            },
        });
        step_number += 1;

        statutory.push(StatutoryDeduction {
            kind,
            frequency: toggle.frequency,
            full_period_amount,
            withheld,
        });
    }

    let total_statutory: Decimal = statutory.iter().map(|d| d.withheld).sum();
    let total_ad_hoc = round_currency(ad_hoc_deductions.iter().map(|d| d.amount).sum(), scale);
    let total_incentives = round_currency(incentives.iter().map(|i| i.amount).sum(), scale);
    let total_deductions = total_statutory + total_ad_hoc;
    let net_pay = gross_pay - total_deductions + total_incentives;
    let negative_net_pay = net_pay < Decimal::ZERO;

    audit_steps.push(AuditStep {
        step_number,
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        config_ref: "deduction_setting".to_string(),
        input: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "ad_hoc_deductions": ad_hoc_deductions.len(),
            "incentives": incentives.len()
        }),
        output: serde_json::json!({
            "total_statutory": total_statutory.to_string(),
            "total_ad_hoc": total_ad_hoc.to_string(),
            "total_incentives": total_incentives.to_string(),
            "net_pay": net_pay.to_string(),
            "negative_net_pay": negative_net_pay
        }),
        reasoning: format!(
            "{} − {} statutory − {} ad-hoc + {} incentives = {}",
            gross_pay, total_statutory, total_ad_hoc, total_incentives, net_pay
        ),
    });

    let mut warnings = Vec::new();
    if negative_net_pay {
        warnings.push(AuditWarning {
            code: "NEGATIVE_NET_PAY".to_string(),
            message: format!(
                "Net pay {} is negative and must be acknowledged before finalizing",
                net_pay
            ),
            severity: "high".to_string(),
        });
    }

    Ok(NetResult {
        breakdown: NetBreakdown {
            gross_pay,
            statutory,
            ad_hoc_deductions: ad_hoc_deductions.to_vec(),
            incentives: incentives.to_vec(),
            total_statutory,
            total_ad_hoc,
            total_deductions,
            total_incentives,
            net_pay,
            negative_net_pay,
        },
        audit_steps,
        warnings,
    })
}
