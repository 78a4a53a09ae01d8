//! Packer classification over one package.
//!
//! `classify` is a total function: parsing failures on hostile or corrupt
//! input degrade into verdict evidence instead of propagating, so the
//! presentation layer always receives a verdict. Only catalog
//! misconfiguration (caught at `SignatureCatalog` construction) is fatal.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::core::dex::{AnomalyFlags, DexHeader};
use crate::core::verdict::{
    Evidence, EvidenceKind, Protection, ScanReport, Verdict, SCHEMA_VERSION,
};
use crate::error::{DexProbeError, Result};
use crate::scan::builtin::builtin_catalog;
use crate::scan::catalog::{first_match, EvalContext, SignatureCatalog};
use crate::scan::config::ScanConfig;
use crate::scan::container::ApkListing;
use crate::scan::dex;

/// Name of the primary executable entry.
const PRIMARY_DEX: &str = "classes.dex";

/// Stateless classification engine. Safe to share across threads; each call
/// owns its own cursor, listing, and header.
pub struct Classifier {
    catalog: SignatureCatalog,
    config: ScanConfig,
}

impl Classifier {
    pub fn new(catalog: SignatureCatalog, config: ScanConfig) -> Self {
        Self { catalog, config }
    }

    /// Engine with the built-in catalog and default resource ceilings.
    pub fn with_builtin() -> Self {
        Self::new(builtin_catalog().clone(), ScanConfig::default())
    }

    pub fn catalog(&self) -> &SignatureCatalog {
        &self.catalog
    }

    /// Classify one package. Total and deterministic: the same byte sequence
    /// always yields the same verdict and the same evidence order.
    pub fn classify(&self, bytes: &[u8]) -> Verdict {
        self.scan(bytes).verdict
    }

    /// Classify one package and return the full report, including the decoded
    /// header field map for display layers.
    pub fn scan(&self, bytes: &[u8]) -> ScanReport {
        let span = tracing::info_span!("scan", size_bytes = bytes.len());
        let _g = span.enter();

        let apk_md5 = format!("{:x}", md5::compute(bytes));
        let mut evidence: Vec<Evidence> = Vec::new();

        debug!(phase = "container", "opening package archive");
        let mut listing = match ApkListing::open(bytes, &self.config) {
            Ok(listing) => listing,
            Err(err) => {
                // Not a readable archive at all: short-circuit, nothing else
                // can be inspected.
                info!(error = %err, "package container unreadable");
                evidence.push(Evidence::new(
                    EvidenceKind::InvalidContainer,
                    format!("not a valid package container: {err}"),
                ));
                return ScanReport {
                    schema_version: SCHEMA_VERSION.to_string(),
                    size_bytes: bytes.len() as u64,
                    verdict: Verdict {
                        protection: Protection::UnknownProtectorSuspected,
                        evidence,
                    },
                    header: None,
                    anomalies: Vec::new(),
                    dex_entries: Vec::new(),
                    apk_md5,
                    dex_md5: None,
                };
            }
        };

        let duplicates = listing.duplicate_significant_entries();
        for name in &duplicates {
            evidence.push(Evidence::new(
                EvidenceKind::DuplicateEntry,
                format!("container stores '{name}' more than once"),
            ));
        }
        let dex_entries = listing.dex_entry_names();

        debug!(phase = "dex", "parsing primary DEX header");
        let mut header: Option<DexHeader> = None;
        let mut anomalies = AnomalyFlags::empty();
        let mut dex_md5: Option<String> = None;
        let mut dex_absent = true;
        match listing.read_dex_named(PRIMARY_DEX) {
            None => {
                evidence.push(Evidence::new(
                    EvidenceKind::DexMissing,
                    format!("no '{PRIMARY_DEX}' entry in container"),
                ));
            }
            Some(Err(err)) => {
                let kind = match err {
                    DexProbeError::EntryTooLarge { .. } => EvidenceKind::EntryTooLarge,
                    _ => EvidenceKind::DexUnparseable,
                };
                evidence.push(Evidence::new(kind, err.to_string()));
            }
            Some(Ok(dex_bytes)) => {
                dex_md5 = Some(format!("{:x}", md5::compute(&dex_bytes)));
                match dex::parse(&dex_bytes) {
                    Ok(parsed) => {
                        dex_absent = false;
                        anomalies = parsed.anomalies;
                        header = Some(parsed.header);
                        for warning in parsed.warnings {
                            evidence.push(Evidence::new(EvidenceKind::HeaderAnomaly, warning));
                        }
                    }
                    Err(err) => {
                        evidence.push(Evidence::new(
                            EvidenceKind::DexUnparseable,
                            err.to_string(),
                        ));
                    }
                }
            }
        }

        debug!(phase = "rules", rule_count = self.catalog.len(), "evaluating catalog");
        let mut ctx = EvalContext::new(&mut listing, anomalies, dex_absent);
        let matched = first_match(&self.catalog, &mut ctx);
        let matched = matched.cloned();
        evidence.append(&mut ctx.side_evidence);

        let protection = if let Some(rule) = matched {
            evidence.push(Evidence::new(
                EvidenceKind::RuleMatch,
                format!(
                    "rule '{}' (priority {}) matched: {}",
                    rule.packer_id,
                    rule.priority,
                    rule.predicate.describe()
                ),
            ));
            info!(packer_id = %rule.packer_id, "protector identified");
            Protection::ProtectedBy(rule.packer_id)
        } else if dex_absent || !anomalies.is_empty() || !duplicates.is_empty() {
            info!("no rule matched but structural evidence present");
            Protection::UnknownProtectorSuspected
        } else {
            info!("package classified as unprotected");
            Protection::Unprotected
        };

        ScanReport {
            schema_version: SCHEMA_VERSION.to_string(),
            size_bytes: bytes.len() as u64,
            verdict: Verdict {
                protection,
                evidence,
            },
            header,
            anomalies: anomalies.names().iter().map(|s| s.to_string()).collect(),
            dex_entries,
            apk_md5,
            dex_md5,
        }
    }

    /// Read one package from disk, bounded by the configured file ceiling,
    /// and scan it.
    pub fn scan_path(&self, path: &Path) -> Result<ScanReport> {
        let meta = fs::metadata(path)?;
        if meta.len() > self.config.max_file_size {
            return Err(DexProbeError::FileTooLarge {
                size: meta.len(),
                limit: self.config.max_file_size,
            });
        }
        let bytes = fs::read(path)?;
        Ok(self.scan(&bytes))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::with_builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{build_apk, synthetic_dex};

    #[test]
    fn clean_package_is_unprotected() {
        let dex = synthetic_dex(0x200);
        let apk = build_apk(&[("classes.dex", dex.as_slice())]);
        let classifier = Classifier::with_builtin();
        let verdict = classifier.classify(&apk);
        assert_eq!(verdict.protection, Protection::Unprotected);
        assert!(verdict.evidence.is_empty());
    }

    #[test]
    fn invalid_container_short_circuits_to_unknown() {
        let classifier = Classifier::with_builtin();
        let verdict = classifier.classify(b"garbage bytes, no archive here");
        assert_eq!(verdict.protection, Protection::UnknownProtectorSuspected);
        assert_eq!(verdict.evidence.len(), 1);
        assert_eq!(verdict.evidence[0].kind, EvidenceKind::InvalidContainer);
    }

    #[test]
    fn marker_library_identifies_protector_without_dex() {
        let apk = build_apk(&[("lib/armeabi/libsecexe.so", b"\x7fELF" as &[u8])]);
        let classifier = Classifier::with_builtin();
        let verdict = classifier.classify(&apk);
        assert_eq!(
            verdict.protection,
            Protection::ProtectedBy("bangcle".to_string())
        );
        // dex-missing evidence precedes the rule match
        assert_eq!(verdict.evidence[0].kind, EvidenceKind::DexMissing);
        assert_eq!(
            verdict.evidence.last().unwrap().kind,
            EvidenceKind::RuleMatch
        );
    }

    #[test]
    fn report_carries_header_fields_and_digests() {
        let dex = synthetic_dex(0x200);
        let apk = build_apk(&[("classes.dex", dex.as_slice())]);
        let classifier = Classifier::with_builtin();
        let report = classifier.scan(&apk);
        assert_eq!(report.schema_version, SCHEMA_VERSION);
        assert_eq!(report.dex_entries, vec!["classes.dex"]);
        assert_eq!(
            report.dex_md5.as_deref(),
            Some(format!("{:x}", md5::compute(&dex)).as_str())
        );
        let fields = report.header_fields().unwrap();
        assert_eq!(fields[0].0, "header_magic");
    }

    #[test]
    fn scan_path_enforces_file_ceiling() {
        use std::io::Write;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.apk");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(&vec![0u8; 2048]).unwrap();
        drop(f);

        let config = ScanConfig {
            max_file_size: 1024,
            ..ScanConfig::default()
        };
        let classifier = Classifier::new(builtin_catalog().clone(), config);
        match classifier.scan_path(&path) {
            Err(DexProbeError::FileTooLarge { size, limit }) => {
                assert_eq!(size, 2048);
                assert_eq!(limit, 1024);
            }
            other => panic!("expected FileTooLarge, got {other:?}"),
        }
    }
}
