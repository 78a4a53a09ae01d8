//! dexprobe: DEX header parsing and Android packer identification.
//!
//! Given the raw bytes of an Android application package, this crate parses
//! the embedded DEX executable's header into a validated structural model and
//! classifies whether, and by which known third-party protector, the package
//! has been repackaged. It is an offline library: no network, no UI, a thin
//! presentation layer consumes the [`core::ScanReport`] it produces.
//!
//! ```no_run
//! use dexprobe::scan::Classifier;
//!
//! let bytes = std::fs::read("app.apk").unwrap();
//! let classifier = Classifier::with_builtin();
//! let report = classifier.scan(&bytes);
//! println!("{:?}", report.verdict.protection);
//! ```

/// Core data types module
pub mod core;

/// Error types and the crate-wide `Result` alias
pub mod error;

/// Tracing initialization helpers
pub mod logging;

/// Scan runtime: reader, parsers, catalog, classifier
pub mod scan;

#[cfg(test)]
pub(crate) mod testutil;

pub use crate::core::{Protection, ScanReport, Verdict};
pub use crate::error::{DexProbeError, Result};
pub use crate::scan::{Classifier, ScanConfig, SignatureCatalog};
