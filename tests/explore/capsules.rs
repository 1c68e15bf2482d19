use uefi_imageinfo::core::memory_tree::{MemoryNode, MemoryTree};
use uefi_imageinfo::core::tree::{NodeType, ParseError};
use uefi_imageinfo::explore::{explore, ExploreConfig, FirmwareImage};
use uefi_imageinfo::formats::uefi::*;

const BODY_SIZE: usize = 0x2000;

/// A capsule node with `header` over a UEFI image of `BODY_SIZE` bytes.
fn wrapped(data: &[u8], header_len: usize) -> Result<MemoryTree, ParseError> {
    let mut tree = MemoryTree::new();
    let capsule = tree.add_root(MemoryNode::new(NodeType::Capsule, 0).with_header(&data[..header_len]));
    tree.add_child(
        capsule,
        MemoryNode::new(NodeType::Image, IMAGE_SUBTYPE_UEFI)
            .with_body(&data[header_len..])
            .with_base(header_len as u32),
    );
    Ok(tree)
}

fn image_with_header(guid: [u8; 16], header_len: usize) -> Vec<u8> {
    let mut data = vec![0u8; header_len];
    data[..16].copy_from_slice(&guid);
    data.extend(std::iter::repeat(0xFF).take(BODY_SIZE));
    data
}

fn no_cache() -> ExploreConfig {
    let mut config = ExploreConfig::default();
    config.cache.enabled = false;
    config
}

#[test]
fn each_signature_is_named() {
    let cases = [
        (EFI_CAPSULE_GUID, 28, "UEFI capsule"),
        (EFI_FMP_CAPSULE_GUID, 28, "UEFI capsule"),
        (INTEL_CAPSULE_GUID, 28, "UEFI capsule"),
        (LENOVO_CAPSULE_GUID, 28, "UEFI capsule"),
        (LENOVO2_CAPSULE_GUID, 28, "UEFI capsule"),
        (TOSHIBA_CAPSULE_GUID, 28, "Toshiba capsule"),
        (APTIO_SIGNED_CAPSULE_GUID, 0x400, "AMI Aptio capsule (signed)"),
        (APTIO_UNSIGNED_CAPSULE_GUID, 32, "AMI Aptio capsule (unsigned)"),
    ];
    for (guid, header_len, name) in cases {
        let image = FirmwareImage::from_bytes(image_with_header(guid, header_len));
        let parser = move |data: &[u8]| wrapped(data, header_len);
        let report = explore(&image, parser, &no_cache()).unwrap().report;

        assert!(report.is_capsule(), "{name}");
        let capsule = report.capsule.as_ref().unwrap();
        assert_eq!(capsule.name, name);
        assert_eq!(capsule.base, 0);
        assert_eq!(capsule.size, header_len as u32);
        assert_eq!(
            capsule.guid,
            uefi_imageinfo::core::guid::guid_to_string(&guid)
        );
        assert_eq!(report.full_image_size, BODY_SIZE as u32);
    }
}

#[test]
fn unknown_prefix_is_not_a_capsule() {
    let image = FirmwareImage::from_bytes(image_with_header([0xA5; 16], 28));
    let report = explore(&image, |data: &[u8]| wrapped(data, 28), &no_cache())
        .unwrap()
        .report;
    assert!(!report.is_capsule());
    assert_eq!(report.uefi_image().map(|u| u.base), Some(28));
}

#[test]
fn toshiba_full_size_used_for_intel_images() {
    use crate::common::firmware::{intel_image_bytes, Layout, IMAGE_SIZE};

    let mut data = vec![0u8; 28];
    data[..16].copy_from_slice(&TOSHIBA_CAPSULE_GUID);
    data[20..24].copy_from_slice(&0x0001_8000u32.to_le_bytes());
    data.extend(intel_image_bytes(Layout::V2));

    let parser = |data: &[u8]| -> Result<MemoryTree, ParseError> {
        let mut tree = MemoryTree::new();
        let capsule =
            tree.add_root(MemoryNode::new(NodeType::Capsule, 0).with_header(&data[..28]));
        let intel = tree.add_child(
            capsule,
            MemoryNode::new(NodeType::Image, IMAGE_SUBTYPE_INTEL)
                .with_body(&data[28..])
                .with_base(28),
        );
        tree.add_child(intel, MemoryNode::new(NodeType::Region, 0).with_base(28));
        Ok(tree)
    };
    let image = FirmwareImage::from_bytes(data);
    let report = explore(&image, parser, &no_cache()).unwrap().report;
    assert_eq!(report.capsule.as_ref().unwrap().name, "Toshiba capsule");
    assert_eq!(report.full_image_size, 0x0001_8000);
    assert_eq!(report.intel_image().unwrap().size, IMAGE_SIZE as u32);
    assert_eq!(report.intel_image().unwrap().base, 28);
}
