//! Entry points the (external) application layer calls.
//!
//! Each operation takes an already-loaded aggregate, mutates it and leaves it
//! ready to persist. Nothing here performs IO; lookups of invoices or
//! customers by id are the caller's job.

use std::sync::Arc;

use chrono::{Days, Utc};

use billforge_core::{AggregateId, AggregateRoot, DomainError, DomainResult, ExpectedVersion};

use crate::config::InvoicingConfig;
use crate::invoice::{Invoice, InvoiceId, InvoiceUpdate, NewInvoice};
use crate::ledger::recompute_totals;
use crate::line_item::{LineItem, LineItemId, NewLineItem};
use crate::numbering::{AtomicInvoiceNumberIssuer, InvoiceNumber, InvoiceNumberIssuer};
use crate::payment::{NewPayment, Payment};

pub struct InvoiceService {
    issuer: Arc<dyn InvoiceNumberIssuer>,
    config: InvoicingConfig,
}

impl InvoiceService {
    pub fn new(issuer: Arc<dyn InvoiceNumberIssuer>, config: InvoicingConfig) -> Self {
        Self { issuer, config }
    }

    /// Wire an in-process [`AtomicInvoiceNumberIssuer`] seeded from the config.
    pub fn from_config(config: InvoicingConfig) -> Self {
        let issuer = Arc::new(AtomicInvoiceNumberIssuer::starting_at(config.number_start));
        Self::new(issuer, config)
    }

    pub fn config(&self) -> &InvoicingConfig {
        &self.config
    }

    /// Create a draft invoice with its items attached and totals computed.
    pub fn create(&self, input: NewInvoice) -> DomainResult<Invoice> {
        let now = Utc::now();
        let issue_date = input.issue_date.unwrap_or_else(|| now.date_naive());
        let due_date = input.due_date.unwrap_or_else(|| {
            issue_date
                .checked_add_days(Days::new(u64::from(self.config.payment_terms_days)))
                .unwrap_or(issue_date)
        });
        let currency = input
            .currency
            .unwrap_or_else(|| self.config.default_currency.clone());

        let mut invoice = Invoice::draft(
            InvoiceId::new(AggregateId::new()),
            input.customer_id,
            issue_date,
            due_date,
            currency,
            input.notes,
            now,
        );
        for item in input.items {
            invoice.push_item(item);
        }
        invoice.touch(now);
        self.recompute(&mut invoice)?;
        Ok(invoice)
    }

    /// Replace header fields and the whole item collection.
    ///
    /// On a version mismatch or a failed recompute the aggregate is left
    /// untouched.
    pub fn update(
        &self,
        invoice: &mut Invoice,
        update: InvoiceUpdate,
        expected: ExpectedVersion,
    ) -> DomainResult<()> {
        if let Err(err) = expected.check(invoice.version()) {
            tracing::warn!(invoice_id = %invoice.id_typed(), error = %err, "rejected stale invoice update");
            return Err(err);
        }

        self.commit(invoice, |next| {
            next.apply_header(&update);
            next.replace_items(update.items);
            Ok(())
        })
    }

    pub fn add_item(&self, invoice: &mut Invoice, item: NewLineItem) -> DomainResult<LineItemId> {
        self.commit(invoice, |next| Ok(next.push_item(item)))
    }

    pub fn remove_item(&self, invoice: &mut Invoice, item_id: LineItemId) -> DomainResult<LineItem> {
        self.commit(invoice, |next| {
            next.take_item(item_id).ok_or_else(DomainError::not_found)
        })
    }

    /// Record a payment and recompute. The returned copy is what the caller
    /// persists as the payment row.
    pub fn add_payment(&self, invoice: &mut Invoice, payment: NewPayment) -> DomainResult<Payment> {
        let payment = Payment::record(invoice.id_typed(), payment, Utc::now());
        self.commit(invoice, |next| {
            next.push_payment(payment.clone());
            Ok(payment)
        })
    }

    /// Assign a number and move `Draft` to `Sent`.
    ///
    /// Returns the newly assigned number, or `None` (and changes nothing) when
    /// the invoice has already left `Draft`.
    pub fn finalize(&self, invoice: &mut Invoice) -> Option<InvoiceNumber> {
        let next_status = invoice.status().finalize()?;
        let number = self.issuer.next();
        invoice.assign_number(number.clone(), next_status);
        invoice.touch(Utc::now());
        tracing::info!(invoice_id = %invoice.id_typed(), invoice_number = %number, "invoice finalized");
        Some(number)
    }

    /// Run `change` on a copy, stamp and recompute it, and only then replace
    /// `invoice`. Any error leaves `invoice` as it was.
    fn commit<T>(
        &self,
        invoice: &mut Invoice,
        change: impl FnOnce(&mut Invoice) -> DomainResult<T>,
    ) -> DomainResult<T> {
        let mut next = invoice.clone();
        let out = change(&mut next)?;
        next.touch(Utc::now());
        self.recompute(&mut next)?;
        *invoice = next;
        Ok(out)
    }

    fn recompute(&self, invoice: &mut Invoice) -> DomainResult<()> {
        if let Err(err) = recompute_totals(invoice) {
            tracing::warn!(invoice_id = %invoice.id_typed(), error = %err, "invoice totals not recomputed");
            return Err(err);
        }
        tracing::debug!(
            invoice_id = %invoice.id_typed(),
            sub_total = %invoice.sub_total(),
            tax_total = %invoice.tax_total(),
            total = %invoice.total(),
            balance_due = %invoice.balance_due(),
            status = %invoice.status(),
            "invoice totals recomputed"
        );
        Ok(())
    }
}
