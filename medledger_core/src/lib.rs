#![forbid(unsafe_code)]

//! Core data model and operations for the medledger record store.
//!
//! This crate provides:
//! - Domain types (patients, medications)
//! - The ledger capability and its memory/file backends
//! - The record store operations and name-based dispatch
//! - Configuration and logging setup

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod ledger;
pub mod file_ledger;
pub mod store;
pub mod dispatch;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use ledger::{Ledger, MemoryLedger};
pub use file_ledger::FileLedger;
pub use store::RecordStore;
pub use dispatch::Operation;
