//! Validation Layer
//!
//! Post-resolution checks over the catalog.
//!
//! # Validators
//! 1. **coverage** - field coverage, top codes and per-source provenance

pub mod coverage;

pub use coverage::{CoverageReport, EvidenceSummary};
