//! Verify command implementation.

use std::path::Path;
use tally_core::Ledger;

/// Runs the verify command: decodes every record and reports
/// per-record failures. Framing-level corruption fails the whole
/// command, matching load semantics.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let report = Ledger::scan(path)?;

    println!("{} record(s) decoded", report.loaded);
    if report.skipped.is_empty() {
        println!("OK: every record decoded cleanly");
        return Ok(());
    }

    for (index, err) in &report.skipped {
        println!("record {index}: {err}");
    }
    Err(format!("{} record(s) failed to decode", report.skipped.len()).into())
}
