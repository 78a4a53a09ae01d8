//! Container inspection against hostile and edge-case archives.

mod common;

use common::{build_apk, synthetic_dex};

use dexprobe::error::DexProbeError;
use dexprobe::scan::{ApkListing, ScanConfig};

#[test]
fn truncated_archive_is_invalid_container() {
    let apk = build_apk(&[("classes.dex", b"payload" as &[u8])]);
    // Chop off the end of central directory record
    let truncated = &apk[..apk.len() - 10];
    assert!(matches!(
        ApkListing::open(truncated, &ScanConfig::default()),
        Err(DexProbeError::InvalidContainer(_))
    ));
}

#[test]
fn empty_input_is_invalid_container() {
    assert!(matches!(
        ApkListing::open(&[], &ScanConfig::default()),
        Err(DexProbeError::InvalidContainer(_))
    ));
}

#[test]
fn listing_does_not_inflate_until_asked() {
    // A large entry must not block listing when only names are needed
    let big = vec![0u8; 1 << 20];
    let apk = build_apk(&[
        ("assets/blob.bin", big.as_slice()),
        ("classes.dex", b"tiny"),
    ]);
    let config = ScanConfig {
        max_entry_size: 16,
        ..ScanConfig::default()
    };
    let mut listing = ApkListing::open(&apk, &config).unwrap();
    assert_eq!(listing.entries().len(), 2);
    assert_eq!(listing.entries()[0].size, 1 << 20);
    // the small entry still reads fine under the same ceiling
    assert_eq!(listing.read_named("classes.dex").unwrap().unwrap(), b"tiny");
}

#[test]
fn multidex_extraction_reports_per_payload_failures() {
    let good = synthetic_dex(0x100);
    let huge = vec![0u8; 0x800];
    let apk = build_apk(&[
        ("classes.dex", good.as_slice()),
        ("classes2.dex", huge.as_slice()),
    ]);
    let config = ScanConfig {
        max_dex_size: 0x400,
        ..ScanConfig::default()
    };
    let mut listing = ApkListing::open(&apk, &config).unwrap();
    let dexes = listing.extract_dex();
    assert_eq!(dexes.len(), 2);
    assert!(dexes[0].1.is_ok());
    assert!(matches!(
        dexes[1].1,
        Err(DexProbeError::EntryTooLarge { .. })
    ));
}

#[test]
fn nested_paths_do_not_count_as_primary_dex() {
    let apk = build_apk(&[("assets/classes.dex", b"decoy" as &[u8])]);
    let mut listing = ApkListing::open(&apk, &ScanConfig::default()).unwrap();
    assert!(listing.dex_entry_names().is_empty());
    assert!(listing.read_named("classes.dex").is_none());
    assert!(listing.extract_dex().is_empty());
}
