//! Shared fixtures for integration tests: synthetic DEX payloads and
//! in-memory APK archives.

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::ZipWriter;

/// Size of the fixed DEX header region.
pub const DEX_HEADER_SIZE: usize = 0x70;

/// Adler-32 as used by the DEX checksum field.
pub fn adler32(data: &[u8]) -> u32 {
    const MOD: u32 = 65_521;
    let mut a = 1u32;
    let mut b = 0u32;
    for &byte in data {
        a = (a + byte as u32) % MOD;
        b = (b + a) % MOD;
    }
    (b << 16) | a
}

/// Minimal well-formed little-endian DEX buffer with a correct checksum.
pub fn synthetic_dex(len: usize) -> Vec<u8> {
    assert!(len >= DEX_HEADER_SIZE);
    let mut buf = vec![0u8; len];
    buf[..8].copy_from_slice(b"dex\n035\0");
    put_u32(&mut buf, 0x20, len as u32); // file_size
    put_u32(&mut buf, 0x24, DEX_HEADER_SIZE as u32); // header_size
    put_u32(&mut buf, 0x28, 0x1234_5678); // endian_tag
    put_u32(&mut buf, 0x68, (len - DEX_HEADER_SIZE) as u32); // data_size
    put_u32(&mut buf, 0x6c, DEX_HEADER_SIZE as u32); // data_off
    let sum = adler32(&buf[0x0c..]);
    put_u32(&mut buf, 0x08, sum);
    buf
}

/// Same as `synthetic_dex` but with the declared file_size left disagreeing
/// with the actual buffer length (checksum still recomputed).
pub fn synthetic_dex_with_bad_file_size(len: usize, declared: u32) -> Vec<u8> {
    let mut buf = synthetic_dex(len);
    put_u32(&mut buf, 0x20, declared);
    let sum = adler32(&buf[0x0c..]);
    put_u32(&mut buf, 0x08, sum);
    buf
}

pub fn put_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

/// Build an in-memory zip archive with the given entries, in order.
pub fn build_apk(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    for (name, data) in entries {
        writer.start_file(name.to_string(), options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Build a stored (uncompressed) zip archive by hand. Unlike `build_apk`
/// this places no restriction on entry names, so it can produce archives
/// with duplicate names the way repackaging tools do.
pub fn build_apk_stored(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    let mut central: Vec<u8> = Vec::new();
    for (name, data) in entries {
        let offset = out.len() as u32;
        let crc = crc32(data);
        let name_bytes = name.as_bytes();
        // local file header
        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        out.extend_from_slice(&20u16.to_le_bytes()); // version needed
        out.extend_from_slice(&0u16.to_le_bytes()); // flags
        out.extend_from_slice(&0u16.to_le_bytes()); // method: stored
        out.extend_from_slice(&0u32.to_le_bytes()); // mod time/date
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // extra len
        out.extend_from_slice(name_bytes);
        out.extend_from_slice(data);
        // central directory record
        central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes()); // version made by
        central.extend_from_slice(&20u16.to_le_bytes()); // version needed
        central.extend_from_slice(&0u16.to_le_bytes()); // flags
        central.extend_from_slice(&0u16.to_le_bytes()); // method
        central.extend_from_slice(&0u32.to_le_bytes()); // mod time/date
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&(data.len() as u32).to_le_bytes());
        central.extend_from_slice(&(data.len() as u32).to_le_bytes());
        central.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes()); // extra len
        central.extend_from_slice(&0u16.to_le_bytes()); // comment len
        central.extend_from_slice(&0u16.to_le_bytes()); // disk start
        central.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        central.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name_bytes);
    }
    let cd_offset = out.len() as u32;
    let cd_size = central.len() as u32;
    out.extend_from_slice(&central);
    // end of central directory
    out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // disk number
    out.extend_from_slice(&0u16.to_le_bytes()); // cd start disk
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // comment len
    out
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xffff_ffffu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xedb8_8320 & mask);
        }
    }
    !crc
}
