//! Packer fingerprint rule schema.
//!
//! Rules are pure data: a packer identity, an explicit priority, and a
//! predicate tree over container entries and header anomalies. Evaluation
//! lives in the scan layer; everything here serializes, so catalogs can be
//! authored as an external JSON resource.

use serde::{Deserialize, Serialize};

use crate::core::dex::AnomalyFlags;

/// How an entry-name pattern is compared against a candidate string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Exact,
    StartsWith,
    EndsWith,
    Contains,
}

impl MatchMode {
    pub fn matches(&self, candidate: &str, pattern: &str) -> bool {
        match self {
            MatchMode::Exact => candidate == pattern,
            MatchMode::StartsWith => candidate.starts_with(pattern),
            MatchMode::EndsWith => candidate.ends_with(pattern),
            MatchMode::Contains => candidate.contains(pattern),
        }
    }
}

/// One nameable header anomaly, for use inside rule predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    SizeMismatch,
    ExtentOverflow,
    TableOutOfBounds,
    NonstandardHeaderSize,
    ChecksumMismatch,
}

impl AnomalyKind {
    pub fn flag(self) -> AnomalyFlags {
        match self {
            AnomalyKind::SizeMismatch => AnomalyFlags::SIZE_MISMATCH,
            AnomalyKind::ExtentOverflow => AnomalyFlags::EXTENT_OVERFLOW,
            AnomalyKind::TableOutOfBounds => AnomalyFlags::TABLE_OUT_OF_BOUNDS,
            AnomalyKind::NonstandardHeaderSize => AnomalyFlags::NONSTANDARD_HEADER_SIZE,
            AnomalyKind::ChecksumMismatch => AnomalyFlags::CHECKSUM_MISMATCH,
        }
    }
}

/// A structured condition over one package.
///
/// `EntryName` compares against the basename of each archive entry,
/// `EntryPath` against the full stored path; both default to exact matching.
/// `EntryContent` checks for a byte substring inside the first entry with the
/// given path, and only that check ever inflates entry data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    EntryName {
        pattern: String,
        #[serde(rename = "match", default)]
        match_mode: MatchMode,
    },
    EntryPath {
        pattern: String,
        #[serde(rename = "match", default)]
        match_mode: MatchMode,
    },
    EntryContent {
        entry: String,
        needle: String,
    },
    HeaderAnomaly {
        flag: AnomalyKind,
    },
    DexAbsent,
    AllOf {
        conditions: Vec<Predicate>,
    },
    AnyOf {
        conditions: Vec<Predicate>,
    },
}

impl Predicate {
    /// Short human-readable rendering used in verdict evidence.
    pub fn describe(&self) -> String {
        match self {
            Predicate::EntryName {
                pattern,
                match_mode,
            } => format!("entry name {} '{}'", mode_word(match_mode), pattern),
            Predicate::EntryPath {
                pattern,
                match_mode,
            } => format!("entry path {} '{}'", mode_word(match_mode), pattern),
            Predicate::EntryContent { entry, needle } => {
                format!("entry '{}' contains '{}'", entry, needle)
            }
            Predicate::HeaderAnomaly { flag } => format!("header anomaly {:?}", flag),
            Predicate::DexAbsent => "primary DEX absent or unparseable".to_string(),
            Predicate::AllOf { conditions } => {
                let parts: Vec<String> = conditions.iter().map(|c| c.describe()).collect();
                format!("all of [{}]", parts.join("; "))
            }
            Predicate::AnyOf { conditions } => {
                let parts: Vec<String> = conditions.iter().map(|c| c.describe()).collect();
                format!("any of [{}]", parts.join("; "))
            }
        }
    }
}

fn mode_word(mode: &MatchMode) -> &'static str {
    match mode {
        MatchMode::Exact => "is",
        MatchMode::StartsWith => "starts with",
        MatchMode::EndsWith => "ends with",
        MatchMode::Contains => "contains",
    }
}

/// One packer's fingerprint: identity, evaluation priority, predicate.
///
/// Lower priority values are evaluated first; the catalog rejects duplicate
/// priorities at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureRule {
    pub packer_id: String,
    pub priority: u32,
    pub predicate: Predicate,
}
