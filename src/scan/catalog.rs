//! Signature catalog: loading, validation, and predicate evaluation.
//!
//! The catalog is loaded once, validated (unique priorities, one canonical
//! rule per packer), and then shared read-only across classifications.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::dex::AnomalyFlags;
use crate::core::rule::{Predicate, SignatureRule};
use crate::core::verdict::{Evidence, EvidenceKind};
use crate::error::{DexProbeError, Result};
use crate::scan::container::ApkListing;

/// On-disk catalog resource schema.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    signatures: Vec<SignatureRule>,
}

/// An immutable, priority-ordered set of packer fingerprint rules.
#[derive(Debug, Clone)]
pub struct SignatureCatalog {
    rules: Vec<SignatureRule>,
}

impl SignatureCatalog {
    /// Validate and order a rule set. Duplicate priorities and duplicate
    /// packer identities are authoring errors and fail construction.
    pub fn new(mut rules: Vec<SignatureRule>) -> Result<Self> {
        let mut by_priority: HashMap<u32, &str> = HashMap::new();
        let mut by_packer: HashMap<&str, ()> = HashMap::new();
        for rule in &rules {
            if let Some(first) = by_priority.insert(rule.priority, &rule.packer_id) {
                return Err(DexProbeError::DuplicatePriority {
                    priority: rule.priority,
                    first: first.to_string(),
                    second: rule.packer_id.clone(),
                });
            }
            if by_packer.insert(&rule.packer_id, ()).is_some() {
                return Err(DexProbeError::DuplicatePackerId(rule.packer_id.clone()));
            }
        }
        drop(by_priority);
        drop(by_packer);
        rules.sort_by_key(|r| r.priority);
        Ok(Self { rules })
    }

    /// Load a catalog from its JSON resource form.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|e| DexProbeError::Serialization(e.to_string()))?;
        Self::new(file.signatures)
    }

    /// Rules ordered by ascending priority value.
    pub fn rules_in_priority_order(&self) -> &[SignatureRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Per-classification evaluation state handed to rule predicates.
///
/// Holds the container listing, the header outcome, and a cache of inflated
/// entry contents so no entry is inflated more than once per classification.
pub struct EvalContext<'a, 'b> {
    listing: &'b mut ApkListing<'a>,
    anomalies: AnomalyFlags,
    dex_absent: bool,
    content_cache: HashMap<String, Option<Vec<u8>>>,
    /// Resource-guard rejections hit during evaluation, degraded to evidence.
    pub side_evidence: Vec<Evidence>,
}

impl<'a, 'b> EvalContext<'a, 'b> {
    pub fn new(listing: &'b mut ApkListing<'a>, anomalies: AnomalyFlags, dex_absent: bool) -> Self {
        Self {
            listing,
            anomalies,
            dex_absent,
            content_cache: HashMap::new(),
            side_evidence: Vec::new(),
        }
    }

    fn entry_content(&mut self, name: &str) -> Option<&[u8]> {
        if !self.content_cache.contains_key(name) {
            let loaded = match self.listing.read_named(name) {
                Some(Ok(bytes)) => Some(bytes),
                Some(Err(err)) => {
                    if matches!(err, DexProbeError::EntryTooLarge { .. }) {
                        self.side_evidence
                            .push(Evidence::new(EvidenceKind::EntryTooLarge, err.to_string()));
                    }
                    None
                }
                None => None,
            };
            self.content_cache.insert(name.to_string(), loaded);
        }
        self.content_cache.get(name).and_then(|v| v.as_deref())
    }
}

/// Evaluate one predicate. Pure over the package: same input bytes, same
/// catalog, same answer.
pub fn eval(predicate: &Predicate, ctx: &mut EvalContext<'_, '_>) -> bool {
    match predicate {
        Predicate::EntryName {
            pattern,
            match_mode,
        } => ctx
            .listing
            .entries()
            .iter()
            .any(|e| match_mode.matches(e.basename(), pattern)),
        Predicate::EntryPath {
            pattern,
            match_mode,
        } => ctx
            .listing
            .entries()
            .iter()
            .any(|e| match_mode.matches(&e.name, pattern)),
        Predicate::EntryContent { entry, needle } => match ctx.entry_content(entry) {
            Some(content) => memchr::memmem::find(content, needle.as_bytes()).is_some(),
            None => false,
        },
        Predicate::HeaderAnomaly { flag } => ctx.anomalies.contains(flag.flag()),
        Predicate::DexAbsent => ctx.dex_absent,
        Predicate::AllOf { conditions } => conditions.iter().all(|c| eval(c, ctx)),
        Predicate::AnyOf { conditions } => conditions.iter().any(|c| eval(c, ctx)),
    }
}

/// Walk the catalog in priority order; first match wins.
pub fn first_match<'r>(
    catalog: &'r SignatureCatalog,
    ctx: &mut EvalContext<'_, '_>,
) -> Option<&'r SignatureRule> {
    for rule in catalog.rules_in_priority_order() {
        trace!(packer_id = %rule.packer_id, priority = rule.priority, "evaluating rule");
        if eval(&rule.predicate, ctx) {
            return Some(rule);
        }
    }
    None
}
