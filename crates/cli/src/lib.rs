//! Offline ledger replay.
//!
//! Takes an invoice aggregate as exported by the persistence layer, re-derives
//! every line total, header total and status, and emits the result. Used to
//! verify stored figures against the engine.

use anyhow::Context;

use billforge_invoicing::{Invoice, recompute_totals};

/// Outcome of recomputing one stored invoice.
#[derive(Debug)]
pub struct Replay {
    pub invoice: Invoice,
    /// Whether any derived field differed from the stored aggregate.
    pub changed: bool,
}

pub fn replay(input: &str) -> anyhow::Result<Replay> {
    let stored: Invoice = serde_json::from_str(input).context("input is not a valid invoice aggregate")?;
    stored
        .check_ownership()
        .context("invoice aggregate is inconsistent")?;
    let mut invoice = stored.clone();
    recompute_totals(&mut invoice).context("invoice ledger cannot be recomputed")?;
    let changed = invoice != stored;
    Ok(Replay { invoice, changed })
}

pub fn render(replay: &Replay) -> anyhow::Result<String> {
    serde_json::to_string_pretty(&replay.invoice).context("failed to serialize invoice")
}
