use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use billforge_core::{Entity, EntityId, Money};

use crate::invoice::InvoiceId;

/// Line item identifier (unique within the owning invoice and globally).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItemId(pub EntityId);

impl LineItemId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LineItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Caller-supplied line item values.
///
/// Numerics may be absent; an absent value counts as zero. There is no line
/// total here: it is always derived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub description: String,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    /// Percentage, e.g. `10.00` for 10%.
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
}

/// Invoice line, owned by exactly one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    id: LineItemId,
    invoice_id: InvoiceId,
    description: String,
    /// Kept at the precision it was supplied with.
    quantity: Decimal,
    unit_price: Money,
    tax_rate: Decimal,
    #[serde(default)]
    line_total: Money,
}

impl LineItem {
    pub(crate) fn attach(invoice_id: InvoiceId, input: NewLineItem) -> Self {
        Self {
            id: LineItemId::new(EntityId::new()),
            invoice_id,
            description: input.description,
            quantity: input.quantity.unwrap_or(Decimal::ZERO),
            unit_price: Money::scale(input.unit_price),
            tax_rate: input.tax_rate.unwrap_or(Decimal::ZERO),
            line_total: Money::ZERO,
        }
    }

    pub fn id_typed(&self) -> LineItemId {
        self.id
    }

    pub fn invoice_id(&self) -> InvoiceId {
        self.invoice_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// Last computed tax-inclusive total.
    pub fn line_total(&self) -> Money {
        self.line_total
    }

    /// Pre-tax amount: `round(quantity × unit_price)`; `None` on overflow.
    pub fn line_amount(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }

    /// Tax on the *rounded* line amount: `round(line_amount × tax_rate / 100)`;
    /// `None` on overflow.
    pub fn tax_amount(&self) -> Option<Money> {
        self.line_amount()?.checked_mul(self.tax_fraction())
    }

    /// `round(tax_rate / 100)` to two digits, i.e. whole percentage points.
    ///
    /// Rounding the rate to an integer and shifting by two places gives the
    /// same value as dividing first, without the division losing digits when
    /// the rate already uses most of the 28-digit precision.
    pub fn tax_fraction(&self) -> Decimal {
        let whole = self
            .tax_rate
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Decimal::from_i128_with_scale(whole.mantissa(), 2)
    }

    pub(crate) fn set_line_total(&mut self, line_total: Money) {
        self.line_total = line_total;
    }
}

impl Entity for LineItem {
    type Id = LineItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
