//! Resource ceilings for scanning hostile packages.

use serde::{Deserialize, Serialize};

/// Limits applied while inspecting a package.
///
/// Pathological archives (maliciously inflated or deeply nested entries) are
/// a known denial-of-service vector for this class of tool, so every entry
/// inflation is bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Ceiling on any single entry's inflated size, in bytes.
    pub max_entry_size: u64,
    /// Ceiling on an extracted DEX payload, in bytes.
    pub max_dex_size: u64,
    /// Ceiling on a package file read from disk, in bytes.
    pub max_file_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_entry_size: 64 * 1024 * 1024,
            max_dex_size: 64 * 1024 * 1024,
            max_file_size: 256 * 1024 * 1024,
        }
    }
}
