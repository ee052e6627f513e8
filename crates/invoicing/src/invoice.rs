use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use billforge_core::{AggregateId, AggregateRoot, DomainError, DomainResult, Money};

use crate::ledger::LedgerTotals;
use crate::line_item::{LineItem, LineItemId, NewLineItem};
use crate::numbering::InvoiceNumber;
use crate::payment::Payment;
use crate::status::InvoiceStatus;

/// Invoice identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub AggregateId);

impl InvoiceId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Reference to the billed customer (resolved by the caller).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub AggregateId);

impl CustomerId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Input: create a draft invoice.
///
/// Absent dates and currency fall back to [`InvoicingConfig`](crate::InvoicingConfig)
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<NewLineItem>,
}

/// Input: replace an invoice's header fields and its whole item collection.
///
/// `None` dates/currency keep the current value; `notes` is replaced as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceUpdate {
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<NewLineItem>,
}

/// Aggregate root: Invoice.
///
/// Owns its line items and payments. The derived money fields are only ever
/// written by [`recompute_totals`](crate::recompute_totals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    #[serde(default)]
    invoice_number: Option<InvoiceNumber>,
    customer_id: CustomerId,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    currency: String,
    #[serde(default)]
    status: InvoiceStatus,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    sub_total: Money,
    #[serde(default)]
    tax_total: Money,
    #[serde(default)]
    discount_total: Money,
    #[serde(default)]
    total: Money,
    #[serde(default)]
    balance_due: Money,
    #[serde(default)]
    items: Vec<LineItem>,
    #[serde(default)]
    payments: Vec<Payment>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    version: u64,
}

impl Invoice {
    pub(crate) fn draft(
        id: InvoiceId,
        customer_id: CustomerId,
        issue_date: NaiveDate,
        due_date: NaiveDate,
        currency: String,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            invoice_number: None,
            customer_id,
            issue_date,
            due_date,
            currency,
            status: InvoiceStatus::Draft,
            notes,
            sub_total: Money::ZERO,
            tax_total: Money::ZERO,
            discount_total: Money::ZERO,
            total: Money::ZERO,
            balance_due: Money::ZERO,
            items: Vec::new(),
            payments: Vec::new(),
            created_at: now,
            updated_at: None,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn invoice_number(&self) -> Option<&InvoiceNumber> {
        self.invoice_number.as_ref()
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    /// Informational only; amounts are never converted.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn sub_total(&self) -> Money {
        self.sub_total
    }

    pub fn tax_total(&self) -> Money {
        self.tax_total
    }

    /// Always zero; no discount rules are applied.
    pub fn discount_total(&self) -> Money {
        self.discount_total
    }

    pub fn total(&self) -> Money {
        self.total
    }

    /// `total - paid`; negative when overpaid.
    pub fn balance_due(&self) -> Money {
        self.balance_due
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn item(&self, id: LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id_typed() == id)
    }

    /// Every line item and payment must refer back to this invoice.
    ///
    /// Construction through [`InvoiceService`](crate::InvoiceService) always
    /// holds this; deserialized aggregates are checked with it.
    pub fn check_ownership(&self) -> DomainResult<()> {
        if let Some(item) = self.items.iter().find(|i| i.invoice_id() != self.id) {
            return Err(DomainError::invariant(format!(
                "line item {} belongs to invoice {}, not {}",
                item.id_typed(),
                item.invoice_id(),
                self.id
            )));
        }
        if let Some(payment) = self.payments.iter().find(|p| p.invoice_id() != self.id) {
            return Err(DomainError::invariant(format!(
                "payment {} belongs to invoice {}, not {}",
                payment.id_typed(),
                payment.invoice_id(),
                self.id
            )));
        }
        Ok(())
    }

    pub(crate) fn push_item(&mut self, input: NewLineItem) -> LineItemId {
        let item = LineItem::attach(self.id, input);
        let id = item.id_typed();
        self.items.push(item);
        id
    }

    /// Discard every current item and attach the new ones.
    pub(crate) fn replace_items(&mut self, inputs: Vec<NewLineItem>) {
        self.items.clear();
        for input in inputs {
            self.push_item(input);
        }
    }

    pub(crate) fn take_item(&mut self, id: LineItemId) -> Option<LineItem> {
        let pos = self.items.iter().position(|i| i.id_typed() == id)?;
        Some(self.items.remove(pos))
    }

    pub(crate) fn push_payment(&mut self, payment: Payment) {
        self.payments.push(payment);
    }

    pub(crate) fn apply_header(&mut self, update: &InvoiceUpdate) {
        if let Some(issue_date) = update.issue_date {
            self.issue_date = issue_date;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(currency) = &update.currency {
            self.currency = currency.clone();
        }
        self.notes = update.notes.clone();
    }

    pub(crate) fn assign_number(&mut self, number: InvoiceNumber, status: InvoiceStatus) {
        self.invoice_number = Some(number);
        self.status = status;
    }

    /// Stamp a mutation: bump the version and record the time.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = Some(now);
    }

    /// Commit a complete ledger computation in one step.
    pub(crate) fn apply_totals(&mut self, totals: &LedgerTotals) {
        for (item, line_total) in self.items.iter_mut().zip(&totals.line_totals) {
            item.set_line_total(*line_total);
        }
        self.sub_total = totals.sub_total;
        self.tax_total = totals.tax_total;
        self.discount_total = Money::ZERO;
        self.total = totals.total;
        self.balance_due = totals.balance_due;
        self.status = self
            .status
            .refine(totals.balance_due, totals.paid, !self.payments.is_empty());
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_invoice() -> Invoice {
        let today = Utc::now().date_naive();
        Invoice::draft(
            InvoiceId::new(AggregateId::new()),
            CustomerId::new(AggregateId::new()),
            today,
            today,
            "USD".to_string(),
            None,
            Utc::now(),
        )
    }

    fn widget(price: rust_decimal::Decimal) -> NewLineItem {
        NewLineItem {
            description: "Widget".to_string(),
            quantity: Some(dec!(1)),
            unit_price: Some(price),
            tax_rate: None,
        }
    }

    #[test]
    fn draft_starts_with_zero_totals() {
        let inv = test_invoice();
        assert_eq!(inv.status(), InvoiceStatus::Draft);
        assert_eq!(inv.invoice_number(), None);
        assert_eq!(inv.total(), Money::ZERO);
        assert_eq!(inv.balance_due(), Money::ZERO);
        assert_eq!(inv.version(), 0);
    }

    #[test]
    fn attached_items_point_back_to_invoice() {
        let mut inv = test_invoice();
        let id = inv.push_item(widget(dec!(5)));
        let item = inv.item(id).unwrap();
        assert_eq!(item.invoice_id(), inv.id_typed());
    }

    #[test]
    fn foreign_children_fail_ownership_check() {
        let mut inv = test_invoice();
        inv.push_item(widget(dec!(5)));
        assert_eq!(inv.check_ownership(), Ok(()));

        let other = test_invoice();
        inv.items.push(LineItem::attach(other.id_typed(), widget(dec!(1))));
        match inv.check_ownership() {
            Err(DomainError::InvariantViolation(msg)) if msg.contains("line item") => {}
            other => panic!("Expected InvariantViolation, got {other:?}"),
        }

        inv.items.pop();
        inv.push_payment(Payment::record(
            other.id_typed(),
            crate::payment::NewPayment::default(),
            Utc::now(),
        ));
        match inv.check_ownership() {
            Err(DomainError::InvariantViolation(msg)) if msg.contains("payment") => {}
            other => panic!("Expected InvariantViolation, got {other:?}"),
        }
    }

    #[test]
    fn replace_items_discards_previous_collection() {
        let mut inv = test_invoice();
        let old = inv.push_item(widget(dec!(5)));
        inv.replace_items(vec![widget(dec!(7)), widget(dec!(8))]);

        assert_eq!(inv.items().len(), 2);
        assert!(inv.item(old).is_none());
    }

    #[test]
    fn take_item_removes_only_that_item() {
        let mut inv = test_invoice();
        let a = inv.push_item(widget(dec!(5)));
        let b = inv.push_item(widget(dec!(6)));

        let taken = inv.take_item(a).unwrap();
        assert_eq!(taken.id_typed(), a);
        assert!(inv.take_item(a).is_none());
        assert!(inv.item(b).is_some());
    }

    #[test]
    fn header_update_keeps_absent_fields() {
        let mut inv = test_invoice();
        let due = inv.issue_date().succ_opt().unwrap();
        inv.apply_header(&InvoiceUpdate {
            due_date: Some(due),
            notes: Some("Net 30".to_string()),
            ..InvoiceUpdate::default()
        });

        assert_eq!(inv.due_date(), due);
        assert_eq!(inv.currency(), "USD");
        assert_eq!(inv.notes(), Some("Net 30"));
    }
}
