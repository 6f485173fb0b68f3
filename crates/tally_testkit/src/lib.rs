//! # Tally Testkit
//!
//! Test utilities for tally.
//!
//! This crate provides:
//! - Ledger fixtures and temp-file helpers
//! - Property-based test generators using proptest
//! - Cross-crate invariant tests: ordering, projection equivalence,
//!   codec round-trips, load/save behavior
//!
//! ## Usage
//!
//! ```rust
//! use tally_testkit::prelude::*;
//!
//! let fixture = LedgerFixture::standard();
//! assert!(!fixture.ledger.accounts().is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
