//! Core data types, organized by submodule.

pub mod dex;
pub mod rule;
pub mod verdict;

// Re-exports for convenient access under crate::core::*
pub use dex::{AnomalyFlags, DexHeader, Endian, DEX_HEADER_SIZE};
pub use rule::{AnomalyKind, MatchMode, Predicate, SignatureRule};
pub use verdict::{Evidence, EvidenceKind, Protection, ScanReport, Verdict, SCHEMA_VERSION};
