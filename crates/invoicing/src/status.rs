use serde::{Deserialize, Serialize};

use billforge_core::Money;

/// Invoice status lifecycle.
///
/// | State            | Entered by                          |
/// |------------------|-------------------------------------|
/// | `Draft`          | creation                            |
/// | `Sent`           | finalize from `Draft`               |
/// | `PartiallyPaid`  | recompute with payments outstanding |
/// | `Paid`           | recompute with a zero balance       |
/// | `Overdue`/`Void` | declared; never assigned here       |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    PartiallyPaid,
    Paid,
    Overdue,
    Void,
}

impl InvoiceStatus {
    /// Status after a ledger recompute.
    ///
    /// Rules are applied in order and evaluated fresh on every call:
    /// 1. `Draft` never moves (only finalize leaves `Draft`).
    /// 2. zero balance with at least one payment: `Paid`.
    /// 3. anything paid: `PartiallyPaid`.
    /// 4. otherwise unchanged.
    ///
    /// An overpaid invoice has a negative balance and therefore lands in
    /// `PartiallyPaid`.
    pub fn refine(self, balance_due: Money, paid: Money, has_payments: bool) -> Self {
        if self == InvoiceStatus::Draft {
            return self;
        }
        if balance_due.is_zero() && has_payments {
            InvoiceStatus::Paid
        } else if paid.is_positive() {
            InvoiceStatus::PartiallyPaid
        } else {
            self
        }
    }

    /// Target of the finalize action, if finalize applies from this state.
    pub fn finalize(self) -> Option<Self> {
        match self {
            InvoiceStatus::Draft => Some(InvoiceStatus::Sent),
            _ => None,
        }
    }

    pub fn is_finalized(self) -> bool {
        self != InvoiceStatus::Draft
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::PartiallyPaid => "PARTIALLY_PAID",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
            InvoiceStatus::Void => "VOID",
        };
        f.write_str(s)
    }
}
