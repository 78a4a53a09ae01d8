//! DEX header parsing and structural validation.
//!
//! The magic and endian tag are hard requirements; every other internal
//! inconsistency is recorded as an anomaly flag on the returned header, since
//! protectors deliberately corrupt or repurpose header fields and those
//! corruptions are classification evidence.

use tracing::debug;

use crate::core::dex::{
    AnomalyFlags, DexHeader, Endian, DEX_HEADER_SIZE, ENDIAN_CONSTANT, REVERSE_ENDIAN_CONSTANT,
};
use crate::error::{DexProbeError, Result};
use crate::scan::reader::Reader;

/// Offset of the endian_tag field.
const ENDIAN_TAG_OFFSET: usize = 0x28;

/// Offset of the checksum field; the stored Adler-32 covers everything after
/// it, i.e. from the signature field to end of file.
const SIGNATURE_OFFSET: usize = 0x0c;

/// DEX versions this parser recognizes.
const ACCEPTED_VERSIONS: [&[u8; 3]; 7] = [b"035", b"036", b"037", b"038", b"039", b"040", b"041"];

/// A successfully parsed header plus the non-fatal findings that came with it.
#[derive(Debug, Clone)]
pub struct ParsedDex {
    pub header: DexHeader,
    pub anomalies: AnomalyFlags,
    /// Human-readable rendering of `anomalies`, in flag order.
    pub warnings: Vec<String>,
}

/// Parse and validate the fixed DEX header region.
///
/// Fails only on a buffer too short for the header, an unrecognized magic, or
/// an unrecognized endian tag. Size/offset invariant violations come back as
/// anomaly flags alongside the header.
pub fn parse(bytes: &[u8]) -> Result<ParsedDex> {
    let mut r = Reader::new(bytes);

    // Magic is always read verbatim and pattern-matched, never endian-decoded.
    let magic: [u8; 8] = r.read_bytes(8)?.try_into().unwrap();
    if &magic[..4] != b"dex\n"
        || magic[7] != 0
        || !ACCEPTED_VERSIONS.iter().any(|v| **v == magic[4..7])
    {
        return Err(DexProbeError::InvalidMagic(format!(
            "{:02x?}",
            &magic[..]
        )));
    }

    // The endian tag governs every other multi-byte field, so resolve it
    // before decoding anything else. Its raw little-endian reading equals the
    // reverse constant exactly when the file is big-endian.
    r.seek(ENDIAN_TAG_OFFSET)?;
    let raw_tag = r.read_u32(Endian::Little)?;
    let (endian, endian_tag) = match raw_tag {
        ENDIAN_CONSTANT => (Endian::Little, ENDIAN_CONSTANT),
        REVERSE_ENDIAN_CONSTANT => (Endian::Big, REVERSE_ENDIAN_CONSTANT),
        other => return Err(DexProbeError::InvalidEndianTag(other)),
    };
    debug!(version = %String::from_utf8_lossy(&magic[4..7]), ?endian, "dex magic accepted");

    r.seek(0x08)?;
    let checksum = r.read_u32(endian)?;
    let signature: [u8; 20] = r.read_bytes(20)?.try_into().unwrap();
    let file_size = r.read_u32(endian)?;
    let header_size = r.read_u32(endian)?;
    r.seek(ENDIAN_TAG_OFFSET + 4)?;
    let link_size = r.read_u32(endian)?;
    let link_off = r.read_u32(endian)?;
    let map_off = r.read_u32(endian)?;
    let string_ids_size = r.read_u32(endian)?;
    let string_ids_off = r.read_u32(endian)?;
    let type_ids_size = r.read_u32(endian)?;
    let type_ids_off = r.read_u32(endian)?;
    let proto_ids_size = r.read_u32(endian)?;
    let proto_ids_off = r.read_u32(endian)?;
    let field_ids_size = r.read_u32(endian)?;
    let field_ids_off = r.read_u32(endian)?;
    let method_ids_size = r.read_u32(endian)?;
    let method_ids_off = r.read_u32(endian)?;
    let class_defs_size = r.read_u32(endian)?;
    let class_defs_off = r.read_u32(endian)?;
    let data_size = r.read_u32(endian)?;
    let data_off = r.read_u32(endian)?;

    let header = DexHeader {
        magic,
        checksum,
        signature,
        file_size,
        header_size,
        endian_tag,
        link_size,
        link_off,
        map_off,
        string_ids_size,
        string_ids_off,
        type_ids_size,
        type_ids_off,
        proto_ids_size,
        proto_ids_off,
        field_ids_size,
        field_ids_off,
        method_ids_size,
        method_ids_off,
        class_defs_size,
        class_defs_off,
        data_size,
        data_off,
    };

    let anomalies = validate(&header, bytes);
    let warnings = warning_messages(&header, bytes, anomalies);
    if !anomalies.is_empty() {
        debug!(anomalies = ?anomalies.names(), "dex header anomalies recorded");
    }

    Ok(ParsedDex {
        header,
        anomalies,
        warnings,
    })
}

/// Per-entry byte width of each id table, used for the extent invariant.
fn table_extents(h: &DexHeader) -> [(u32, u32, u64); 6] {
    [
        (h.string_ids_size, h.string_ids_off, 4),
        (h.type_ids_size, h.type_ids_off, 4),
        (h.proto_ids_size, h.proto_ids_off, 12),
        (h.field_ids_size, h.field_ids_off, 8),
        (h.method_ids_size, h.method_ids_off, 8),
        (h.class_defs_size, h.class_defs_off, 32),
    ]
}

fn validate(h: &DexHeader, bytes: &[u8]) -> AnomalyFlags {
    let mut flags = AnomalyFlags::empty();

    if h.file_size as usize != bytes.len() {
        flags |= AnomalyFlags::SIZE_MISMATCH;
    }
    if h.header_size != DEX_HEADER_SIZE as u32 {
        flags |= AnomalyFlags::NONSTANDARD_HEADER_SIZE;
    }

    // header_size + sum of declared table extents must fit in file_size
    let mut total = h.header_size as u64 + h.link_size as u64 + h.data_size as u64;
    for (size, _, width) in table_extents(h) {
        total += size as u64 * width;
    }
    if total > h.file_size as u64 {
        flags |= AnomalyFlags::EXTENT_OVERFLOW;
    }

    // offsets for non-empty regions must lie within [header_size, file_size)
    let in_bounds = |off: u32| off >= h.header_size && off < h.file_size;
    for (size, off, _) in table_extents(h) {
        if size > 0 && !in_bounds(off) {
            flags |= AnomalyFlags::TABLE_OUT_OF_BOUNDS;
        }
    }
    if h.link_size > 0 && !in_bounds(h.link_off) {
        flags |= AnomalyFlags::TABLE_OUT_OF_BOUNDS;
    }
    if h.data_size > 0 && !in_bounds(h.data_off) {
        flags |= AnomalyFlags::TABLE_OUT_OF_BOUNDS;
    }
    if h.map_off != 0 && !in_bounds(h.map_off) {
        flags |= AnomalyFlags::TABLE_OUT_OF_BOUNDS;
    }

    if adler32(&bytes[SIGNATURE_OFFSET..]) != h.checksum {
        flags |= AnomalyFlags::CHECKSUM_MISMATCH;
    }

    flags
}

fn warning_messages(h: &DexHeader, bytes: &[u8], flags: AnomalyFlags) -> Vec<String> {
    let mut out = Vec::new();
    if flags.contains(AnomalyFlags::SIZE_MISMATCH) {
        out.push(format!(
            "declared file_size {} disagrees with actual length {}",
            h.file_size,
            bytes.len()
        ));
    }
    if flags.contains(AnomalyFlags::EXTENT_OVERFLOW) {
        out.push("declared table extents exceed file_size".to_string());
    }
    if flags.contains(AnomalyFlags::TABLE_OUT_OF_BOUNDS) {
        out.push("a non-empty table's offset lies outside the file body".to_string());
    }
    if flags.contains(AnomalyFlags::NONSTANDARD_HEADER_SIZE) {
        out.push(format!("header_size {:#x} is not the standard 0x70", h.header_size));
    }
    if flags.contains(AnomalyFlags::CHECKSUM_MISMATCH) {
        out.push("stored Adler-32 checksum does not match file contents".to_string());
    }
    out
}

/// Adler-32 as used by the DEX checksum field.
pub(crate) fn adler32(data: &[u8]) -> u32 {
    const MOD: u32 = 65_521;
    let mut a = 1u32;
    let mut b = 0u32;
    for &byte in data {
        a = (a + byte as u32) % MOD;
        b = (b + a) % MOD;
    }
    (b << 16) | a
}
