//! Error types for the dexprobe engine.
//!
//! Input-derived failures (truncated buffers, unrecognized headers, broken
//! archives) are absorbed into classification evidence by the classifier;
//! only catalog misconfiguration is surfaced to the operator as a hard error.

use thiserror::Error;

/// Main error type for dexprobe operations.
#[derive(Debug, Error)]
pub enum DexProbeError {
    /// A read would cross the end of the input buffer.
    #[error("truncated input: read of {width} bytes at offset {offset:#x} past end of buffer")]
    TruncatedInput { offset: usize, width: usize },

    /// The 8-byte DEX magic matched no accepted version tag.
    #[error("invalid DEX magic: {0}")]
    InvalidMagic(String),

    /// The endian_tag field held neither the standard nor the swapped constant.
    #[error("invalid DEX endian tag: {0:#010x}")]
    InvalidEndianTag(u32),

    /// The package archive's central structure could not be located or parsed.
    #[error("invalid package container: {0}")]
    InvalidContainer(String),

    /// An archive entry's declared inflated size exceeds the configured ceiling.
    #[error("entry '{name}' too large: {size} bytes exceeds limit of {limit}")]
    EntryTooLarge { name: String, size: u64, limit: u64 },

    /// Two catalog rules were declared with the same priority.
    #[error("duplicate catalog priority {priority}: '{first}' and '{second}'")]
    DuplicatePriority {
        priority: u32,
        first: String,
        second: String,
    },

    /// Two catalog rules were declared for the same packer identity.
    #[error("duplicate catalog packer id: {0}")]
    DuplicatePackerId(String),

    /// File I/O errors (path-based scanning only).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input file exceeds the configured read ceiling.
    #[error("file too large: {size} bytes exceeds limit of {limit}")]
    FileTooLarge { size: u64, limit: u64 },

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for dexprobe operations.
pub type Result<T> = std::result::Result<T, DexProbeError>;
