//! # Fork Common Library
//!
//! Shared code for the album review catalog tooling:
//! - Error and result types
//! - Configuration loading and data folder resolution
//! - Atomic file writes used by every on-disk cache

pub mod atomic;
pub mod config;
pub mod error;

pub use error::{Error, Result};
