//! Dump command implementation.

use std::path::Path;
use tally_core::{Ledger, LegTarget};

/// Runs the dump command: loads the ledger and prints its contents.
pub fn run(path: &Path, limit: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::new();
    ledger.load(path)?;

    println!("accounts:");
    for account in ledger.accounts().iter() {
        let link = match account.linked_account().and_then(|id| ledger.accounts().get(id)) {
            Some(target) => format!("  -> {}", target.name()),
            None => String::new(),
        };
        println!(
            "  [{:>4}] {} ({:?}){}{}",
            account.id().as_u32(),
            account.name(),
            account.kind(),
            if account.is_hidden() { "  hidden" } else { "" },
            link,
        );
    }

    println!("categories:");
    for category in ledger.categories().iter() {
        println!(
            "  [{:>4}] {} ({:?})",
            category.id().as_u32(),
            category.name(),
            category.kind(),
        );
    }

    println!("securities:");
    for security in ledger.securities().iter() {
        println!(
            "  [{:>4}] {}{}",
            security.id().as_u32(),
            security.name(),
            security
                .symbol()
                .map(|s| format!(" ({s})"))
                .unwrap_or_default(),
        );
    }

    println!("transactions:");
    let limit = limit.unwrap_or(usize::MAX);
    for txn in ledger.transactions().iter().take(limit) {
        println!("  {}  {:>12}  {}", txn.date, txn.amount.to_string(), txn.payee);
        if txn.has_splits() {
            for leg in txn.legs() {
                let target = match leg.target {
                    LegTarget::Category(id) => ledger
                        .categories()
                        .get(id)
                        .map(|c| c.name().to_string())
                        .unwrap_or_else(|| format!("category {}", id.as_u32())),
                    LegTarget::Account(id) => ledger
                        .accounts()
                        .get(id)
                        .map(|a| a.name().to_string())
                        .unwrap_or_else(|| format!("account {}", id.as_u32())),
                    LegTarget::None => "-".to_string(),
                };
                println!("      split {:>12}  {}", leg.amount.to_string(), target);
            }
        }
    }
    let shown = ledger.transactions().len().min(limit);
    if shown < ledger.transactions().len() {
        println!("  ... {} more", ledger.transactions().len() - shown);
    }

    println!("schedules:");
    for record in ledger.schedules().iter() {
        println!(
            "  {}  {:>12}  {}  ({:?})",
            record.date,
            record.amount.to_string(),
            record.payee,
            record.kind,
        );
    }

    if ledger.is_modified() {
        println!("note: some records were skipped during load; re-save recommended");
    }

    Ok(())
}
