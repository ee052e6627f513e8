//! End-to-end invoice lifecycle through the public service API.

use std::sync::Arc;

use billforge_core::{AggregateId, AggregateRoot, ExpectedVersion, Money};
use billforge_invoicing::{
    AtomicInvoiceNumberIssuer, CustomerId, Invoice, InvoiceNumberIssuer, InvoiceService,
    InvoiceStatus, InvoiceUpdate, InvoicingConfig, LineItem, NewInvoice, NewLineItem, NewPayment,
    PaymentMethod, recompute_totals,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn service() -> InvoiceService {
    InvoiceService::from_config(InvoicingConfig::default())
}

fn item(description: &str, quantity: Decimal, unit_price: Decimal, tax_rate: Decimal) -> NewLineItem {
    NewLineItem {
        description: description.to_string(),
        quantity: Some(quantity),
        unit_price: Some(unit_price),
        tax_rate: Some(tax_rate),
    }
}

fn payment(amount: Decimal) -> NewPayment {
    NewPayment {
        amount: Some(amount),
        method: PaymentMethod::BankTransfer,
        reference: Some("WIRE-001".to_string()),
        paid_at: None,
    }
}

fn draft(svc: &InvoiceService, items: Vec<NewLineItem>) -> Invoice {
    svc.create(NewInvoice {
        customer_id: CustomerId::new(AggregateId::new()),
        issue_date: None,
        due_date: None,
        currency: None,
        notes: Some("Thank you for your business".to_string()),
        items,
    })
    .unwrap()
}

#[test]
fn payment_then_new_item_moves_paid_back_to_partially_paid() {
    let svc = service();
    let mut inv = draft(&svc, vec![item("Retainer", dec!(1), dec!(1000.00), dec!(10.00))]);
    assert_eq!(inv.total().amount(), dec!(1100.00));

    svc.finalize(&mut inv).unwrap();
    recompute_totals(&mut inv).unwrap();
    assert_eq!(inv.status(), InvoiceStatus::Sent);

    svc.add_payment(&mut inv, payment(dec!(1100.00))).unwrap();
    assert_eq!(inv.balance_due().amount(), dec!(0.00));
    assert_eq!(inv.status(), InvoiceStatus::Paid);

    svc.add_item(&mut inv, item("Extra hours", dec!(2), dec!(50.00), dec!(0))).unwrap();
    assert_eq!(inv.balance_due().amount(), dec!(100.00));
    assert_eq!(inv.status(), InvoiceStatus::PartiallyPaid);

    svc.add_payment(&mut inv, payment(dec!(100.00))).unwrap();
    assert_eq!(inv.status(), InvoiceStatus::Paid);
}

#[test]
fn overpayment_is_recorded_as_partially_paid() {
    let svc = service();
    let mut inv = draft(&svc, vec![item("Widget", dec!(1), dec!(100.00), dec!(0))]);
    svc.finalize(&mut inv).unwrap();

    svc.add_payment(&mut inv, payment(dec!(150.00))).unwrap();

    assert_eq!(inv.balance_due().amount(), dec!(-50.00));
    assert!(inv.balance_due().is_negative());
    assert_eq!(inv.status(), InvoiceStatus::PartiallyPaid);
}

#[test]
fn recompute_twice_is_stable() {
    let svc = service();
    let mut inv = draft(
        &svc,
        vec![
            item("A", dec!(1.333), dec!(19.99), dec!(7.5)),
            item("B", dec!(0.5), dec!(0.01), dec!(20)),
        ],
    );
    svc.finalize(&mut inv).unwrap();
    svc.add_payment(&mut inv, payment(dec!(3.333))).unwrap();

    recompute_totals(&mut inv).unwrap();
    let once = inv.clone();
    recompute_totals(&mut inv).unwrap();

    assert_eq!(inv, once);
    assert_eq!(Some(inv.total()), inv.sub_total().checked_add(inv.tax_total()));
    let line_sum = Money::checked_sum(inv.items().iter().map(LineItem::line_total));
    assert_eq!(Some(inv.total()), line_sum);
}

#[test]
fn update_after_payment_keeps_payments_and_rederives_status() {
    let svc = service();
    let mut inv = draft(&svc, vec![item("Plan", dec!(1), dec!(200.00), dec!(0))]);
    svc.finalize(&mut inv).unwrap();
    svc.add_payment(&mut inv, payment(dec!(100.00))).unwrap();
    assert_eq!(inv.status(), InvoiceStatus::PartiallyPaid);

    let version = inv.version();
    svc.update(
        &mut inv,
        InvoiceUpdate {
            items: vec![item("Plan (discounted)", dec!(1), dec!(100.00), dec!(0))],
            ..InvoiceUpdate::default()
        },
        ExpectedVersion::Exact(version),
    )
    .unwrap();

    assert_eq!(inv.payments().len(), 1);
    assert_eq!(inv.balance_due(), Money::ZERO);
    assert_eq!(inv.status(), InvoiceStatus::Paid);
    // Numbering is untouched by updates.
    assert_eq!(inv.invoice_number().map(|n| n.as_str()), Some("00000001"));
}

#[test]
fn concurrent_finalize_yields_distinct_numbers() {
    let issuer: Arc<dyn InvoiceNumberIssuer> = Arc::new(AtomicInvoiceNumberIssuer::new());
    let svc = InvoiceService::new(issuer, InvoicingConfig::default());

    let mut numbers: Vec<String> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    (0..50)
                        .map(|_| {
                            let mut inv = draft(&svc, vec![]);
                            svc.finalize(&mut inv).unwrap().to_string()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    });

    numbers.sort();
    let expected: Vec<String> = (1..=400).map(|n| format!("{n:08}")).collect();
    assert_eq!(numbers, expected);
}

#[test]
fn aggregate_survives_json_handoff() {
    let svc = service();
    let mut inv = draft(&svc, vec![item("Hosting", dec!(12), dec!(9.99), dec!(10))]);
    svc.finalize(&mut inv).unwrap();
    svc.add_payment(&mut inv, payment(dec!(50))).unwrap();

    let json = serde_json::to_string(&inv).unwrap();
    assert!(json.contains("\"status\":\"PARTIALLY_PAID\""));
    assert!(json.contains("\"total\":\"131.87\""));

    let mut loaded: Invoice = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded, inv);

    loaded.check_ownership().unwrap();
    recompute_totals(&mut loaded).unwrap();
    assert_eq!(loaded, inv);
}
