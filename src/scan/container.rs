//! APK container inspection.
//!
//! Enumerates archive entries without inflating them, and hands out entry
//! bytes on demand with a hard size ceiling. Duplicate names are kept in
//! stored order rather than deduplicated; lookups by name take the first
//! occurrence, and duplicates of significant entries are surfaced to the
//! classifier as evidence.

use std::io::{Cursor, Read};

use tracing::{debug, trace};
use zip::ZipArchive;

use crate::error::{DexProbeError, Result};
use crate::scan::config::ScanConfig;

/// Metadata for one archive entry, read from the central directory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub index: usize,
    /// Stored path inside the archive.
    pub name: String,
    /// Declared uncompressed size.
    pub size: u64,
    pub compressed_size: u64,
}

impl EntryInfo {
    /// Final path component, the way fingerprint name rules match.
    pub fn basename(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// An opened package archive: ordered entry listing plus lazy content access.
pub struct ApkListing<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    entries: Vec<EntryInfo>,
    max_entry_size: u64,
    max_dex_size: u64,
}

impl<'a> ApkListing<'a> {
    /// Parse the archive's central structure and list its entries.
    ///
    /// Entry contents are not touched here; only `read_entry` inflates.
    pub fn open(bytes: &'a [u8], config: &ScanConfig) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| DexProbeError::InvalidContainer(e.to_string()))?;
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|e| DexProbeError::InvalidContainer(e.to_string()))?;
            entries.push(EntryInfo {
                index,
                name: entry.name().to_string(),
                size: entry.size(),
                compressed_size: entry.compressed_size(),
            });
        }
        debug!(entry_count = entries.len(), "package container opened");
        Ok(Self {
            archive,
            entries,
            max_entry_size: config.max_entry_size,
            max_dex_size: config.max_dex_size,
        })
    }

    /// Entries in stored order, duplicates included.
    pub fn entries(&self) -> &[EntryInfo] {
        &self.entries
    }

    /// Inflate one entry, bounded by the configured ceiling.
    ///
    /// The declared size is checked before inflation and the actual stream is
    /// capped as well, so a lying size field cannot bypass the limit.
    pub fn read_entry(&mut self, index: usize) -> Result<Vec<u8>> {
        self.read_entry_limited(index, self.max_entry_size)
    }

    fn read_entry_limited(&mut self, index: usize, limit: u64) -> Result<Vec<u8>> {
        let info = self
            .entries
            .get(index)
            .cloned()
            .ok_or_else(|| DexProbeError::InvalidContainer(format!("no entry at index {index}")))?;
        if info.size > limit {
            return Err(DexProbeError::EntryTooLarge {
                name: info.name,
                size: info.size,
                limit,
            });
        }
        let entry = self
            .archive
            .by_index(index)
            .map_err(|e| DexProbeError::InvalidContainer(e.to_string()))?;
        let mut data = Vec::with_capacity(info.size as usize);
        entry.take(limit.saturating_add(1)).read_to_end(&mut data)?;
        if data.len() as u64 > limit {
            return Err(DexProbeError::EntryTooLarge {
                name: info.name,
                size: data.len() as u64,
                limit,
            });
        }
        trace!(name = %info.name, inflated = data.len(), "entry inflated");
        Ok(data)
    }

    /// Inflate the first entry stored under `name`, if any.
    pub fn read_named(&mut self, name: &str) -> Option<Result<Vec<u8>>> {
        let index = self.entries.iter().find(|e| e.name == name)?.index;
        Some(self.read_entry(index))
    }

    /// Inflate the first DEX entry stored under `name`, bounded by the DEX
    /// payload ceiling rather than the general entry ceiling.
    pub fn read_dex_named(&mut self, name: &str) -> Option<Result<Vec<u8>>> {
        let index = self.entries.iter().find(|e| e.name == name)?.index;
        Some(self.read_entry_limited(index, self.max_dex_size))
    }

    /// Extract every DEX payload (`classes.dex`, `classes2.dex`, ...) in
    /// stored order, first occurrence per name, each bounded by the DEX
    /// payload ceiling. Per-payload failures are kept in the sequence so the
    /// classifier can degrade them into evidence.
    pub fn extract_dex(&mut self) -> Vec<(String, Result<Vec<u8>>)> {
        let mut seen = Vec::new();
        let targets: Vec<(usize, String)> = self
            .entries
            .iter()
            .filter(|e| is_dex_entry(&e.name))
            .filter(|e| {
                if seen.contains(&e.name) {
                    false
                } else {
                    seen.push(e.name.clone());
                    true
                }
            })
            .map(|e| (e.index, e.name.clone()))
            .collect();
        targets
            .into_iter()
            .map(|(index, name)| {
                let bytes = self.read_entry_limited(index, self.max_dex_size);
                (name, bytes)
            })
            .collect()
    }

    /// Names of DEX entries present, in stored order, duplicates included.
    pub fn dex_entry_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| is_dex_entry(&e.name))
            .map(|e| e.name.clone())
            .collect()
    }

    /// Significant entries stored more than once (the Master Key pattern:
    /// duplicate `classes.dex` or `AndroidManifest.xml`).
    pub fn duplicate_significant_entries(&self) -> Vec<String> {
        let mut out = Vec::new();
        for name in ["AndroidManifest.xml", "classes.dex"] {
            let count = self.entries.iter().filter(|e| e.name == name).count();
            if count > 1 {
                out.push(name.to_string());
            }
        }
        out
    }
}

/// Root-level `classes.dex` / `classesN.dex`.
pub fn is_dex_entry(name: &str) -> bool {
    if name.contains('/') {
        return false;
    }
    let Some(middle) = name
        .strip_prefix("classes")
        .and_then(|rest| rest.strip_suffix(".dex"))
    else {
        return false;
    };
    middle.is_empty() || middle.bytes().all(|b| b.is_ascii_digit())
}
