use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billforge_core::{Entity, EntityId, Money};

use crate::invoice::InvoiceId;

/// Payment identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub EntityId);

impl PaymentId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Check,
    #[default]
    Other,
}

/// Caller-supplied payment values. An absent amount is zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
    /// Defaults to the time the payment is recorded.
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

/// Recorded payment. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    invoice_id: InvoiceId,
    amount: Money,
    method: PaymentMethod,
    reference: Option<String>,
    paid_at: DateTime<Utc>,
}

impl Payment {
    pub(crate) fn record(invoice_id: InvoiceId, input: NewPayment, now: DateTime<Utc>) -> Self {
        Self {
            id: PaymentId::new(EntityId::new()),
            invoice_id,
            amount: Money::scale(input.amount),
            method: input.method,
            reference: input.reference,
            paid_at: input.paid_at.unwrap_or(now),
        }
    }

    pub fn id_typed(&self) -> PaymentId {
        self.id
    }

    pub fn invoice_id(&self) -> InvoiceId {
        self.invoice_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn paid_at(&self) -> DateTime<Utc> {
        self.paid_at
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
