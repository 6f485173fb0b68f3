//! Inspect command implementation.

use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tally_core::wire;
use tally_framing::FrameReader;

/// Ledger file inspection result.
#[derive(Debug, Default, Serialize)]
pub struct InspectResult {
    /// Ledger file path.
    pub path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Total record count.
    pub records: usize,
    /// Account records.
    pub accounts: usize,
    /// Category records.
    pub categories: usize,
    /// Security records.
    pub securities: usize,
    /// Transaction records.
    pub transactions: usize,
    /// Schedule records.
    pub schedules: usize,
    /// Records whose outer tag is not a known record type.
    pub unknown: usize,
    /// Largest record body in bytes.
    pub largest_record: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let file_size = file.metadata()?.len();

    let mut result = InspectResult {
        path: path.display().to_string(),
        file_size,
        ..InspectResult::default()
    };

    let mut reader = FrameReader::new(file);
    while let Some(frame) = reader.read_frame()? {
        result.records += 1;
        result.largest_record = result.largest_record.max(frame.len());
        match wire::record_tag(&frame) {
            Some(wire::REC_ACCOUNT) => result.accounts += 1,
            Some(wire::REC_CATEGORY) => result.categories += 1,
            Some(wire::REC_SECURITY) => result.securities += 1,
            Some(wire::REC_TRANSACTION) => result.transactions += 1,
            Some(wire::REC_SCHEDULE) => result.schedules += 1,
            _ => result.unknown += 1,
        }
    }

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Ledger: {}", result.path);
        println!("  File size:     {} bytes", result.file_size);
        println!("  Records:       {}", result.records);
        println!("  Accounts:      {}", result.accounts);
        println!("  Categories:    {}", result.categories);
        println!("  Securities:    {}", result.securities);
        println!("  Transactions:  {}", result.transactions);
        println!("  Schedules:     {}", result.schedules);
        if result.unknown > 0 {
            println!("  Unknown tags:  {}", result.unknown);
        }
        println!("  Largest record: {} bytes", result.largest_record);
    }

    Ok(())
}
