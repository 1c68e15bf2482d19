use std::cell::Cell;
use std::fs;

use uefi_imageinfo::core::memory_tree::MemoryTree;
use uefi_imageinfo::core::tree::ParseError;
use uefi_imageinfo::explore::{ExploreConfig, FirmwareImage, ImageExplorer, ReportCache, ReportSource};
use uefi_imageinfo::formats::uefi::ModuleKind;
use uefi_imageinfo::{ImageInfoError, Report};

use crate::common::firmware::*;
use crate::common::test_utils::{cache_config, report_files};

type Parser = fn(&[u8]) -> Result<MemoryTree, ParseError>;

/// Explores `bytes` fresh, then reloads the written report from disk.
fn fresh_then_cached(bytes: Vec<u8>, parser: Parser) -> (Report, Report) {
    let (_dir, config) = cache_config();
    let image = FirmwareImage::from_bytes(bytes);
    let explorer = ImageExplorer::new(parser, config);

    let first = explorer.explore(&image).unwrap();
    assert_eq!(first.source, ReportSource::Fresh);
    assert!(first.cache_error.is_none());

    let second = explorer.explore(&image).unwrap();
    assert_eq!(second.source, ReportSource::Cache);
    (first.report, second.report)
}

#[test]
fn round_trip_v1() {
    let (fresh, cached) = fresh_then_cached(intel_image_bytes(Layout::V1), parse_intel);
    assert_eq!(cached, fresh);
}

#[test]
fn round_trip_v2() {
    let (fresh, cached) = fresh_then_cached(intel_image_bytes(Layout::V2), parse_intel);
    assert_eq!(cached, fresh);
}

#[test]
fn round_trip_capsule() {
    let (fresh, cached) = fresh_then_cached(capsule_image_bytes(Layout::V2), parse_capsule);
    assert!(cached.is_capsule());
    assert_eq!(cached, fresh);
}

#[test]
fn round_trip_uefi_without_capsule() {
    let (fresh, cached) = fresh_then_cached(vec![0xFFu8; 0x8000], parse_uefi);
    assert!(!cached.is_capsule());
    assert_eq!(cached, fresh);
}

#[test]
fn round_trip_nested_volume_drivers() {
    let (fresh, cached) = fresh_then_cached(vec![0xFFu8; 0xA000], parse_nested_volume);
    assert_eq!(cached, fresh);
    let drivers: Vec<u32> = cached
        .modules_of(ModuleKind::DxeDriver)
        .map(|m| m.base)
        .collect();
    assert_eq!(drivers, [0x9048, 0x1100]);
}

#[test]
fn cache_hit_skips_parser_and_write() {
    let (_dir, config) = cache_config();
    let image = FirmwareImage::from_bytes(intel_image_bytes(Layout::V2));
    let calls = Cell::new(0usize);
    let parser = |data: &[u8]| -> Result<MemoryTree, ParseError> {
        calls.set(calls.get() + 1);
        Ok(intel_tree(data))
    };
    let explorer = ImageExplorer::new(&parser, config.clone());

    let first = explorer.explore(&image).unwrap();
    let path = first.report_path.clone().unwrap();
    let written = fs::read(&path).unwrap();
    let modified = fs::metadata(&path).unwrap().modified().unwrap();
    assert_eq!(calls.get(), 1);

    let second = explorer.explore(&image).unwrap();
    assert_eq!(calls.get(), 1, "parser must not run on a cache hit");
    assert_eq!(second.source, ReportSource::Cache);
    assert_eq!(second.report_path.as_ref(), Some(&path));
    assert_eq!(second.report, first.report);
    assert_eq!(fs::read(&path).unwrap(), written);
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);
    assert_eq!(report_files(&config), vec![path]);
}

#[test]
fn report_file_format() {
    let (_dir, config) = cache_config();
    let image = FirmwareImage::from_bytes(capsule_image_bytes(Layout::V1));
    let outcome = ImageExplorer::new(parse_capsule, config.clone())
        .explore(&image)
        .unwrap();

    let path = outcome.report_path.unwrap();
    assert_eq!(
        path,
        config
            .cache
            .reports_dir
            .join(format!("report_{}.json", image.checksum()))
    );

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with(&format!("{{\n    \"crc\": {},\n", image.checksum())));
    let order = [
        "\"crc\"",
        "\"sizeFullFile\"",
        "\"sizeFullImage\"",
        "\"capsule\"",
        "\"intel_image\"",
        "\"pei_core\"",
        "\"pei_modules\"",
        "\"dxe_core\"",
        "\"dxe_drivers\"",
    ];
    let positions: Vec<usize> = order.iter().map(|k| text.find(k).unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{text}");
    assert!(text.contains("\"masterSection\": {"));
    assert!(!text.contains("masterSectionV2"));
    assert!(!text.contains("\"uefi_image\""));
    assert!(!text.contains("\"boot_guard\""));
    assert!(text.contains("\"guid\": \"3B6686BD-0D76-4030-B70E-B5519E2FC5A0\""));
}

#[test]
fn disabled_cache_writes_nothing() {
    let (_dir, mut config) = cache_config();
    config.cache.enabled = false;
    let image = FirmwareImage::from_bytes(intel_image_bytes(Layout::V2));
    let outcome = ImageExplorer::new(parse_intel, config.clone())
        .explore(&image)
        .unwrap();
    assert!(outcome.report_path.is_none());
    assert!(!config.cache.reports_dir.exists());
}

#[test]
fn unwritable_cache_still_returns_report() {
    let dir = tempfile::TempDir::new().unwrap();
    let blocker = dir.path().join("reports");
    fs::write(&blocker, b"not a directory").unwrap();
    let config = ExploreConfig::with_reports_dir(&blocker);

    let image = FirmwareImage::from_bytes(intel_image_bytes(Layout::V2));
    let outcome = ImageExplorer::new(parse_intel, config).explore(&image).unwrap();
    assert_eq!(outcome.source, ReportSource::Fresh);
    assert!(outcome.report_path.is_none());
    let err = outcome.cache_error.unwrap();
    assert!(!err.is_fatal());
    assert_eq!(outcome.report.modules.len(), 5);
}

#[test]
fn malformed_cached_report_is_rejected() {
    let (_dir, config) = cache_config();
    let image = FirmwareImage::from_bytes(intel_image_bytes(Layout::V2));
    fs::create_dir_all(&config.cache.reports_dir).unwrap();
    let cache = ReportCache::new(&config.cache.reports_dir);
    fs::write(
        cache.path_for(image.checksum()),
        r#"{"crc": 1, "sizeFullFile": 2}"#,
    )
    .unwrap();

    let err = ImageExplorer::new(parse_intel, config)
        .explore(&image)
        .unwrap_err();
    assert!(matches!(err, ImageInfoError::MalformedReport { .. }));
    assert!(err.is_fatal());
}

#[test]
fn cached_report_is_trusted_verbatim() {
    let (_dir, config) = cache_config();
    let image = FirmwareImage::from_bytes(intel_image_bytes(Layout::V2));
    let cache = ReportCache::new(&config.cache.reports_dir);

    // Seed the cache with a report for the same checksum but other content.
    let uefi = FirmwareImage::from_bytes(vec![0xFFu8; 0x8000]);
    let mut seeded = ImageExplorer::new(parse_uefi, ExploreConfig {
        cache: uefi_imageinfo::explore::CacheConfig {
            enabled: false,
            ..config.cache.clone()
        },
        ..config.clone()
    })
    .explore(&uefi)
    .unwrap()
    .report;
    seeded.checksum = image.checksum();
    cache.store(&seeded).unwrap();

    let outcome = ImageExplorer::new(parse_intel, config).explore(&image).unwrap();
    assert_eq!(outcome.source, ReportSource::Cache);
    assert_eq!(outcome.report, seeded);
    assert!(!outcome.report.is_intel_image());
}
