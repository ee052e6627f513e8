//! Ledger computation: derived invoice figures from items and payments.
//!
//! Totals are recomputed from scratch on every call; nothing derived is ever
//! trusted from input. Accumulation is item by item through [`Money`]
//! addition, so every intermediate figure is already rounded to the cent.
//! Figures too large for the decimal range fail the whole computation.

use serde::{Deserialize, Serialize};

use billforge_core::{DomainError, DomainResult, Money};

use crate::invoice::Invoice;
use crate::line_item::LineItem;
use crate::payment::Payment;

/// Result of one ledger computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Tax-inclusive total per item, in item order.
    pub line_totals: Vec<Money>,
    pub sub_total: Money,
    pub tax_total: Money,
    pub total: Money,
    pub paid: Money,
    pub balance_due: Money,
}

/// Compute every derived figure without touching the aggregate.
pub fn compute(items: &[LineItem], payments: &[Payment]) -> DomainResult<LedgerTotals> {
    let mut line_totals = Vec::with_capacity(items.len());
    let mut sub_total = Money::ZERO;
    let mut tax_total = Money::ZERO;
    let mut total = Money::ZERO;

    for item in items {
        let overflow = || {
            DomainError::invariant(format!("line item {} overflows the money range", item.id_typed()))
        };
        let line = item.line_amount().ok_or_else(overflow)?;
        let tax = item.tax_amount().ok_or_else(overflow)?;
        let line_total = line.checked_add(tax).ok_or_else(overflow)?;

        sub_total = sub_total.checked_add(line).ok_or_else(|| totals_overflow("sub_total"))?;
        tax_total = tax_total.checked_add(tax).ok_or_else(|| totals_overflow("tax_total"))?;
        total = total.checked_add(line_total).ok_or_else(|| totals_overflow("total"))?;
        line_totals.push(line_total);
    }

    let paid = Money::checked_sum(payments.iter().map(Payment::amount))
        .ok_or_else(|| totals_overflow("paid"))?;
    let balance_due = total
        .checked_sub(paid)
        .ok_or_else(|| totals_overflow("balance_due"))?;

    Ok(LedgerTotals {
        line_totals,
        sub_total,
        tax_total,
        total,
        paid,
        balance_due,
    })
}

fn totals_overflow(field: &str) -> DomainError {
    DomainError::invariant(format!("invoice {field} overflows the money range"))
}

/// Recompute line totals, header totals and status in place.
///
/// Idempotent: a second call with no intervening mutation changes nothing.
/// All figures are computed before any field is written; on error the
/// invoice is untouched.
pub fn recompute_totals(invoice: &mut Invoice) -> DomainResult<()> {
    let totals = compute(invoice.items(), invoice.payments())?;
    invoice.apply_totals(&totals);
    Ok(())
}
