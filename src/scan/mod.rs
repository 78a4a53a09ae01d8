//! Scan runtime: bounded reading, parsing, and rule evaluation.
//!
//! Everything here is synchronous and stateless across calls; the only
//! shared structure is the read-only signature catalog.

pub mod builtin;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod container;
pub mod dex;
pub mod reader;

// Re-export the working surface for convenience
pub use builtin::builtin_catalog;
pub use catalog::SignatureCatalog;
pub use classifier::Classifier;
pub use config::ScanConfig;
pub use container::{ApkListing, EntryInfo};
pub use dex::{parse, ParsedDex};
pub use reader::Reader;
