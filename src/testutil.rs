//! Shared builders for unit tests: synthetic DEX payloads and in-memory APKs.

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::ZipWriter;

use crate::core::dex::{DEX_HEADER_SIZE, ENDIAN_CONSTANT};
use crate::scan::dex::adler32;

/// Minimal well-formed DEX buffer: valid magic and endian tag, coherent
/// sizes, correct checksum. `len` must be at least the header size.
pub(crate) fn synthetic_dex(len: usize) -> Vec<u8> {
    assert!(len >= DEX_HEADER_SIZE);
    let mut buf = vec![0u8; len];
    buf[..8].copy_from_slice(b"dex\n035\0");
    let put = |buf: &mut [u8], off: usize, v: u32| {
        buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
    };
    put(&mut buf, 0x20, len as u32); // file_size
    put(&mut buf, 0x24, DEX_HEADER_SIZE as u32); // header_size
    put(&mut buf, 0x28, ENDIAN_CONSTANT);
    put(&mut buf, 0x68, (len - DEX_HEADER_SIZE) as u32); // data_size
    put(&mut buf, 0x6c, DEX_HEADER_SIZE as u32); // data_off
    let sum = adler32(&buf[0x0c..]);
    put(&mut buf, 0x08, sum);
    buf
}

/// Build an in-memory zip archive with the given entries, in order.
pub(crate) fn build_apk(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    for (name, data) in entries {
        writer.start_file(name.to_string(), options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
