use std::io::Read;

use anyhow::Context;

fn main() -> anyhow::Result<()> {
    billforge_observability::init();

    let input = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read invoice from stdin")?;
            buf
        }
    };

    let replay = billforge_cli::replay(&input)?;
    if replay.changed {
        tracing::warn!(invoice_id = %replay.invoice.id_typed(), "stored figures differ from recomputed ledger");
    } else {
        tracing::info!(invoice_id = %replay.invoice.id_typed(), "stored figures match");
    }

    println!("{}", billforge_cli::render(&replay)?);
    Ok(())
}
