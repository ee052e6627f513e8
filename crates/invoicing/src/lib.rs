//! Invoicing domain module.
//!
//! This crate contains the invoice ledger: line items, payments, derived totals,
//! the status lifecycle those totals drive and invoice number issuance. It is
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage);
//! callers load an [`Invoice`] aggregate, hand it to [`InvoiceService`] and
//! persist what comes back.

pub mod config;
pub mod invoice;
pub mod ledger;
pub mod line_item;
pub mod numbering;
pub mod payment;
pub mod service;
pub mod status;

pub use config::InvoicingConfig;
pub use invoice::{CustomerId, Invoice, InvoiceId, InvoiceUpdate, NewInvoice};
pub use ledger::{LedgerTotals, compute, recompute_totals};
pub use line_item::{LineItem, LineItemId, NewLineItem};
pub use numbering::{AtomicInvoiceNumberIssuer, InvoiceNumber, InvoiceNumberIssuer};
pub use payment::{NewPayment, Payment, PaymentId, PaymentMethod};
pub use service::InvoiceService;
pub use status::InvoiceStatus;
