//! Verdict and report types for packer classification.

use serde::{Deserialize, Serialize};

use crate::core::dex::DexHeader;
use crate::error::{DexProbeError, Result};

/// Output schema version for stability tracking.
pub const SCHEMA_VERSION: &str = "1.0";

/// Where a piece of evidence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    /// A catalog rule predicate matched.
    RuleMatch,
    /// A structural anomaly was recorded while parsing the DEX header.
    HeaderAnomaly,
    /// The primary DEX entry was missing from the container.
    DexMissing,
    /// The primary DEX entry was present but its header did not parse.
    DexUnparseable,
    /// The package archive itself could not be read.
    InvalidContainer,
    /// An entry's inflated size exceeded the configured ceiling.
    EntryTooLarge,
    /// The container stored two entries under the same significant name.
    DuplicateEntry,
}

/// One recorded observation feeding the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub kind: EvidenceKind,
    pub detail: String,
}

impl Evidence {
    pub fn new(kind: EvidenceKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Protection status of one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "packer_id", rename_all = "snake_case")]
pub enum Protection {
    Unprotected,
    ProtectedBy(String),
    UnknownProtectorSuspected,
}

/// Classification output: protection status plus the evidence trail.
///
/// Created fresh per classification call and never mutated afterwards. The
/// evidence order is deterministic for a given input byte sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub protection: Protection,
    pub evidence: Vec<Evidence>,
}

impl Verdict {
    pub fn is_protected(&self) -> bool {
        matches!(self.protection, Protection::ProtectedBy(_))
    }

    /// Identified packer, when one was.
    pub fn packer_id(&self) -> Option<&str> {
        match &self.protection {
            Protection::ProtectedBy(id) => Some(id),
            _ => None,
        }
    }
}

/// Full consumer-facing scan artifact.
///
/// Bundles the verdict with the decoded header (when one parsed), anomaly
/// names, the DEX entries seen, and content digests for display layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub schema_version: String,
    pub size_bytes: u64,
    pub verdict: Verdict,
    pub header: Option<DexHeader>,
    pub anomalies: Vec<String>,
    /// Names of DEX entries found in the container, in stored order.
    pub dex_entries: Vec<String>,
    pub apk_md5: String,
    /// Digest of the primary DEX payload, when present.
    pub dex_md5: Option<String>,
}

impl ScanReport {
    /// Serialize to a JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| DexProbeError::Serialization(e.to_string()))
    }

    /// Deserialize from a JSON string.
    pub fn from_json_str(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str).map_err(|e| DexProbeError::Serialization(e.to_string()))
    }

    /// Header field map for the display layer, when a header parsed.
    pub fn header_fields(&self) -> Option<Vec<(&'static str, String)>> {
        self.header.as_ref().map(|h| h.display_fields())
    }
}
