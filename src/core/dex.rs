//! DEX header data model.
//!
//! `DexHeader` mirrors the fixed 112-byte header region of a DEX file.
//! It is constructed once by the parser and immutable afterwards; structural
//! inconsistencies found during validation are carried alongside it as
//! `AnomalyFlags` rather than mutating the record.

use serde::{Deserialize, Serialize};

/// Size of the fixed DEX header region in bytes.
pub const DEX_HEADER_SIZE: usize = 0x70;

/// Standard value of the endian_tag field.
pub const ENDIAN_CONSTANT: u32 = 0x1234_5678;

/// Byte-swapped endian_tag, marking a big-endian file.
pub const REVERSE_ENDIAN_CONSTANT: u32 = 0x7856_3412;

/// Byte order of the multi-byte header fields, resolved from endian_tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endian {
    Little,
    Big,
}

/// Non-fatal structural inconsistencies recorded during header parsing,
/// as bitflags.
///
/// Several protectors deliberately corrupt or repurpose header fields to
/// defeat naive tooling, so these are classification evidence, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnomalyFlags(u32);

impl AnomalyFlags {
    /// Declared file_size disagrees with the actual buffer length.
    pub const SIZE_MISMATCH: AnomalyFlags = AnomalyFlags(1);
    /// header_size plus the declared table extents exceeds file_size.
    pub const EXTENT_OVERFLOW: AnomalyFlags = AnomalyFlags(2);
    /// A non-empty table's offset lies outside [header_size, file_size).
    pub const TABLE_OUT_OF_BOUNDS: AnomalyFlags = AnomalyFlags(4);
    /// header_size is not the standard 0x70.
    pub const NONSTANDARD_HEADER_SIZE: AnomalyFlags = AnomalyFlags(8);
    /// Stored Adler-32 checksum does not cover the bytes that follow it.
    pub const CHECKSUM_MISMATCH: AnomalyFlags = AnomalyFlags(16);

    pub const fn empty() -> Self {
        AnomalyFlags(0)
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn contains(&self, other: AnomalyFlags) -> bool {
        self.0 & other.0 == other.0
    }
    /// Names of the set flags, in declaration order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.contains(AnomalyFlags::SIZE_MISMATCH) {
            out.push("SizeMismatch");
        }
        if self.contains(AnomalyFlags::EXTENT_OVERFLOW) {
            out.push("ExtentOverflow");
        }
        if self.contains(AnomalyFlags::TABLE_OUT_OF_BOUNDS) {
            out.push("TableOutOfBounds");
        }
        if self.contains(AnomalyFlags::NONSTANDARD_HEADER_SIZE) {
            out.push("NonStandardHeaderSize");
        }
        if self.contains(AnomalyFlags::CHECKSUM_MISMATCH) {
            out.push("ChecksumMismatch");
        }
        out
    }
}

impl std::ops::BitOr for AnomalyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        AnomalyFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for AnomalyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// The fixed-layout DEX file header.
///
/// All multi-byte fields are stored decoded; `endian` records the byte order
/// declared by endian_tag so the header can be re-encoded byte-exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexHeader {
    pub magic: [u8; 8],
    pub checksum: u32,
    pub signature: [u8; 20],
    pub file_size: u32,
    pub header_size: u32,
    pub endian_tag: u32,
    pub link_size: u32,
    pub link_off: u32,
    pub map_off: u32,
    pub string_ids_size: u32,
    pub string_ids_off: u32,
    pub type_ids_size: u32,
    pub type_ids_off: u32,
    pub proto_ids_size: u32,
    pub proto_ids_off: u32,
    pub field_ids_size: u32,
    pub field_ids_off: u32,
    pub method_ids_size: u32,
    pub method_ids_off: u32,
    pub class_defs_size: u32,
    pub class_defs_off: u32,
    pub data_size: u32,
    pub data_off: u32,
}

impl DexHeader {
    /// Byte order declared by the endian_tag field.
    pub fn endian(&self) -> Endian {
        if self.endian_tag == REVERSE_ENDIAN_CONSTANT {
            Endian::Big
        } else {
            Endian::Little
        }
    }

    /// DEX version digits from the magic, e.g. "035".
    pub fn version(&self) -> String {
        String::from_utf8_lossy(&self.magic[4..7]).into_owned()
    }

    /// Re-encode the fixed header region byte-exactly.
    pub fn encode(&self) -> [u8; DEX_HEADER_SIZE] {
        let endian = self.endian();
        let mut buf = [0u8; DEX_HEADER_SIZE];
        buf[0..8].copy_from_slice(&self.magic);
        let put = |buf: &mut [u8; DEX_HEADER_SIZE], off: usize, v: u32| {
            let bytes = match endian {
                Endian::Little => v.to_le_bytes(),
                Endian::Big => v.to_be_bytes(),
            };
            buf[off..off + 4].copy_from_slice(&bytes);
        };
        put(&mut buf, 0x08, self.checksum);
        buf[0x0c..0x20].copy_from_slice(&self.signature);
        put(&mut buf, 0x20, self.file_size);
        put(&mut buf, 0x24, self.header_size);
        // endian_tag is self-describing: its stored representation always
        // reads as ENDIAN_CONSTANT when decoded with the resolved order.
        put(&mut buf, 0x28, ENDIAN_CONSTANT);
        put(&mut buf, 0x2c, self.link_size);
        put(&mut buf, 0x30, self.link_off);
        put(&mut buf, 0x34, self.map_off);
        put(&mut buf, 0x38, self.string_ids_size);
        put(&mut buf, 0x3c, self.string_ids_off);
        put(&mut buf, 0x40, self.type_ids_size);
        put(&mut buf, 0x44, self.type_ids_off);
        put(&mut buf, 0x48, self.proto_ids_size);
        put(&mut buf, 0x4c, self.proto_ids_off);
        put(&mut buf, 0x50, self.field_ids_size);
        put(&mut buf, 0x54, self.field_ids_off);
        put(&mut buf, 0x58, self.method_ids_size);
        put(&mut buf, 0x5c, self.method_ids_off);
        put(&mut buf, 0x60, self.class_defs_size);
        put(&mut buf, 0x64, self.class_defs_off);
        put(&mut buf, 0x68, self.data_size);
        put(&mut buf, 0x6c, self.data_off);
        buf
    }

    /// Ordered key/value map of every header field for display layers.
    ///
    /// Keys match the labels the consumer's locale table already indexes;
    /// values are uppercase hex without a prefix.
    pub fn display_fields(&self) -> Vec<(&'static str, String)> {
        let hex32 = |v: u32| format!("{v:X}");
        vec![
            ("header_magic", hex::encode_upper(self.magic)),
            ("header_checksum", hex32(self.checksum)),
            ("header_signature", hex::encode_upper(self.signature)),
            ("header_fileSize", hex32(self.file_size)),
            ("header_headerSize", hex32(self.header_size)),
            ("header_endianTag", hex32(self.endian_tag)),
            ("header_linkSize", hex32(self.link_size)),
            ("header_linkOff", hex32(self.link_off)),
            ("header_mapOff", hex32(self.map_off)),
            ("header_stringIdsSize", hex32(self.string_ids_size)),
            ("header_stringIdsOff", hex32(self.string_ids_off)),
            ("header_typeIdsSize", hex32(self.type_ids_size)),
            ("header_typeIdsOff", hex32(self.type_ids_off)),
            ("header_protoIdsSize", hex32(self.proto_ids_size)),
            ("header_protoIdsOff", hex32(self.proto_ids_off)),
            ("header_fieldIdsSize", hex32(self.field_ids_size)),
            ("header_fieldIdsOff", hex32(self.field_ids_off)),
            ("header_methodIdsSize", hex32(self.method_ids_size)),
            ("header_methodIdsOff", hex32(self.method_ids_off)),
            ("header_classDefsSize", hex32(self.class_defs_size)),
            ("header_classDefsOff", hex32(self.class_defs_off)),
            ("header_dataSize", hex32(self.data_size)),
            ("header_dataOff", hex32(self.data_off)),
        ]
    }
}
