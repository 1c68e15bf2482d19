//! Synthetic firmware images and their structural trees.
//!
//! The Intel layout is a 64 KiB image with 4 KiB granularity:
//!
//! | region     | blocks  | offset   | size     |
//! |------------|---------|----------|----------|
//! | descriptor | 0       | 0x0000   | 0x1000   |
//! | ME         | 1..=3   | 0x1000   | 0x3000   |
//! | GbE        | 4       | 0x4000   | 0x1000   |
//! | BIOS       | 5..=15  | 0x5000   | 0xB000   |
//!
//! EC is marked absent with `0xFFFF/0xFFFF` and PDR has a zero limit.

use uefi_imageinfo::core::memory_tree::{MemoryNode, MemoryTree};
use uefi_imageinfo::core::tree::{NodeId, NodeType, ParseError};
use uefi_imageinfo::formats::uefi::{
    RegionKind, EFI_CAPSULE_GUID, FLASH_DESCRIPTOR_SIGNATURE, IMAGE_SUBTYPE_INTEL,
    IMAGE_SUBTYPE_UEFI,
};

pub const IMAGE_SIZE: usize = 0x10000;
pub const DESCRIPTOR_SIZE: usize = 0x1000;
pub const CAPSULE_HEADER_SIZE: usize = 28;
pub const VOLUME_HEADER_SIZE: usize = 0x48;
pub const ADDRESS_DIFF: u64 = 0xFFFF_0000;

const COMPONENT_BASE: usize = 0x30;
const REGION_BASE: usize = 0x40;
const MASTER_BASE: usize = 0x80;

/// Which descriptor flavour to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    V1,
    V2,
    /// v2 descriptor whose BIOS region claims the whole image
    WholeImageBios,
}

/// Region base/limit pairs for a layout.
pub fn region_pairs(layout: Layout) -> Vec<(RegionKind, u16, u16)> {
    let bios = match layout {
        Layout::WholeImageBios => (RegionKind::Bios, 0x0000, 0x000F),
        _ => (RegionKind::Bios, 0x0005, 0x000F),
    };
    vec![
        (RegionKind::Descriptor, 0x0000, 0x0000),
        bios,
        (RegionKind::Me, 0x0001, 0x0003),
        (RegionKind::Gbe, 0x0004, 0x0004),
        (RegionKind::Pdr, 0x0007, 0x0000),
        (RegionKind::Ec, 0xFFFF, 0xFFFF),
    ]
}

/// A 64 KiB Intel image: descriptor followed by `0xFF` fill.
pub fn intel_image_bytes(layout: Layout) -> Vec<u8> {
    let mut image = vec![0xFFu8; IMAGE_SIZE];
    image[..DESCRIPTOR_SIZE].fill(0x00);
    image[..16].fill(0xFF);
    image[16..20].copy_from_slice(&FLASH_DESCRIPTOR_SIGNATURE.to_le_bytes());
    image[20] = (COMPONENT_BASE / 0x10) as u8;
    image[22] = (REGION_BASE / 0x10) as u8;
    image[24] = (MASTER_BASE / 0x10) as u8;

    let flcomp: u32 = match layout {
        Layout::V1 => 0,
        Layout::V2 | Layout::WholeImageBios => 0b100 << 17,
    };
    image[COMPONENT_BASE..COMPONENT_BASE + 4].copy_from_slice(&flcomp.to_le_bytes());

    for (kind, base, limit) in region_pairs(layout) {
        let at = REGION_BASE + kind.index() * 4;
        image[at..at + 2].copy_from_slice(&base.to_le_bytes());
        image[at + 2..at + 4].copy_from_slice(&limit.to_le_bytes());
    }

    match layout {
        Layout::V1 => {
            let master = [0, 0, 0x0B, 0x0A, 0, 0, 0x0D, 0x0C, 0, 0, 0x08, 0x08];
            image[MASTER_BASE..MASTER_BASE + master.len()].copy_from_slice(&master);
        }
        Layout::V2 | Layout::WholeImageBios => {
            let entry = |read: u32, write: u32| (write << 20) | (read << 8);
            let entries = [
                (0, entry(0x02F, 0x00A)),
                (4, entry(0x00D, 0x004)),
                (8, entry(0x009, 0x008)),
                (16, entry(0x120, 0x100)),
            ];
            for (offset, value) in entries {
                let at = MASTER_BASE + offset;
                image[at..at + 4].copy_from_slice(&value.to_le_bytes());
            }
        }
    }
    image
}

/// An EFI capsule header recording `image_size`.
pub fn efi_capsule_header(guid: [u8; 16], image_size: u32) -> Vec<u8> {
    let mut header = vec![0u8; CAPSULE_HEADER_SIZE];
    header[..16].copy_from_slice(&guid);
    header[16..20].copy_from_slice(&(CAPSULE_HEADER_SIZE as u32).to_le_bytes());
    header[24..28].copy_from_slice(&image_size.to_le_bytes());
    header
}

/// `intel_image_bytes` wrapped in an EFI capsule.
pub fn capsule_image_bytes(layout: Layout) -> Vec<u8> {
    let mut bytes = efi_capsule_header(EFI_CAPSULE_GUID, IMAGE_SIZE as u32);
    bytes.extend(intel_image_bytes(layout));
    bytes
}

/// FFS file header with every GUID byte set to `guid_byte`.
pub fn ffs_header(guid_byte: u8, file_type: u8) -> Vec<u8> {
    let mut header = vec![guid_byte; 24];
    header[16] = 0xC0 | file_type;
    header[17] = 0xAA;
    header[18] = file_type;
    header[19] = 0x40;
    header
}

fn ffs_file(guid_byte: u8, file_type: u8, base: u32, body_len: usize) -> MemoryNode {
    MemoryNode::new(NodeType::File, file_type)
        .with_header(ffs_header(guid_byte, file_type))
        .with_body(vec![0u8; body_len])
        .with_base(base)
}

/// Adds a BIOS volume at `base` holding, in order:
/// PEI core, PEIM, a freeform file with a nested volume carrying a DXE
/// driver, DXE core, another DXE driver, and an application (not listed).
fn add_bios_volume(tree: &mut MemoryTree, parent: NodeId, base: u32) {
    let volume = tree.add_child(
        parent,
        MemoryNode::new(NodeType::Volume, 0)
            .with_header(vec![0u8; VOLUME_HEADER_SIZE])
            .with_base(base),
    );
    let mut at = base + VOLUME_HEADER_SIZE as u32;

    let pei_core = tree.add_child(volume, ffs_file(0x01, 0x04, at, 0x1B8));
    tree.add_child(pei_core, MemoryNode::new(NodeType::Section, 0x10).with_base(at + 24));
    at += 0x200;

    let peim = tree.add_child(volume, ffs_file(0x02, 0x06, at, 0x1E8));
    // A file nested in a listed module must not be listed itself.
    tree.add_child(peim, ffs_file(0x0F, 0x07, at + 24, 0x20));
    at += 0x200;

    let freeform = tree.add_child(volume, ffs_file(0x03, 0x02, at, 0x3E8));
    let nested = tree.add_child(
        freeform,
        MemoryNode::new(NodeType::Volume, 0)
            .with_header(vec![0u8; VOLUME_HEADER_SIZE])
            .with_base(at + 24),
    );
    tree.add_child(nested, ffs_file(0x04, 0x07, at + 24 + VOLUME_HEADER_SIZE as u32, 0x100));
    at += 0x400;

    tree.add_child(volume, ffs_file(0x05, 0x05, at, 0x3E8));
    at += 0x400;
    tree.add_child(volume, ffs_file(0x06, 0x07, at, 0x1E8));
    at += 0x200;
    tree.add_child(volume, ffs_file(0x07, 0x09, at, 0x1E8));
}

/// Adds the Intel image node with its region children at `base`.
fn add_intel_image(tree: &mut MemoryTree, parent: Option<NodeId>, image: &[u8], base: u32, bios_offset: u32) {
    let node = MemoryNode::new(NodeType::Image, IMAGE_SUBTYPE_INTEL)
        .with_body(image)
        .with_base(base);
    let intel = match parent {
        Some(p) => tree.add_child(p, node),
        None => tree.add_root(node),
    };
    tree.add_child(
        intel,
        MemoryNode::new(NodeType::Region, RegionKind::Descriptor as u8)
            .with_body(&image[..DESCRIPTOR_SIZE])
            .with_base(base),
    );
    tree.add_child(
        intel,
        MemoryNode::new(NodeType::Region, RegionKind::Me as u8)
            .with_body(&image[0x1000..0x4000])
            .with_base(base + 0x1000),
    );
    let bios = tree.add_child(
        intel,
        MemoryNode::new(NodeType::Region, RegionKind::Bios as u8).with_base(base + bios_offset),
    );
    add_bios_volume(tree, bios, base + bios_offset);
}

/// Tree for a bare Intel image as produced by `intel_image_bytes`.
pub fn intel_tree(data: &[u8]) -> MemoryTree {
    let mut tree = MemoryTree::new();
    tree.set_address_diff(ADDRESS_DIFF);
    add_intel_image(&mut tree, None, data, 0, 0x5000);
    tree
}

/// Tree for `capsule_image_bytes`.
pub fn capsule_tree(data: &[u8]) -> MemoryTree {
    let mut tree = MemoryTree::new();
    tree.set_address_diff(ADDRESS_DIFF);
    let capsule = tree.add_root(
        MemoryNode::new(NodeType::Capsule, 0).with_header(&data[..CAPSULE_HEADER_SIZE]),
    );
    let base = CAPSULE_HEADER_SIZE as u32;
    add_intel_image(&mut tree, Some(capsule), &data[CAPSULE_HEADER_SIZE..], base, 0x5000);
    tree
}

/// Tree for a plain UEFI image: one BIOS volume at offset 0.
pub fn uefi_tree(data: &[u8]) -> MemoryTree {
    let mut tree = MemoryTree::new();
    tree.set_address_diff(ADDRESS_DIFF);
    let image = tree.add_root(MemoryNode::new(NodeType::Image, IMAGE_SUBTYPE_UEFI).with_body(data));
    add_bios_volume(&mut tree, image, 0);
    tree
}

/// Tree for a UEFI image whose FV-image file holds a decompressed volume
/// mapped above the files that follow it. Pre-order lists the nested DXE
/// core and driver first even though their bases are the highest.
pub fn nested_volume_tree(data: &[u8]) -> MemoryTree {
    let mut tree = MemoryTree::new();
    tree.set_address_diff(ADDRESS_DIFF);
    let image = tree.add_root(MemoryNode::new(NodeType::Image, IMAGE_SUBTYPE_UEFI).with_body(data));
    let volume = tree.add_child(
        image,
        MemoryNode::new(NodeType::Volume, 0)
            .with_header(vec![0u8; VOLUME_HEADER_SIZE])
            .with_base(0),
    );

    let fv_image = tree.add_child(volume, ffs_file(0x10, 0x0B, 0x48, 0x1000));
    let nested = tree.add_child(
        fv_image,
        MemoryNode::new(NodeType::Volume, 0)
            .with_header(vec![0u8; VOLUME_HEADER_SIZE])
            .with_base(0x9000),
    );
    tree.add_child(nested, ffs_file(0x11, 0x07, 0x9048, 0x1E8));
    tree.add_child(nested, ffs_file(0x12, 0x05, 0x9248, 0x1E8));

    tree.add_child(volume, ffs_file(0x13, 0x07, 0x1100, 0x1E8));
    tree.add_child(volume, ffs_file(0x14, 0x06, 0x1300, 0x1E8));
    tree
}

/// Parser adapters for `ImageExplorer`.
pub fn parse_intel(data: &[u8]) -> Result<MemoryTree, ParseError> {
    Ok(intel_tree(data))
}

pub fn parse_capsule(data: &[u8]) -> Result<MemoryTree, ParseError> {
    Ok(capsule_tree(data))
}

pub fn parse_uefi(data: &[u8]) -> Result<MemoryTree, ParseError> {
    Ok(uefi_tree(data))
}

pub fn parse_nested_volume(data: &[u8]) -> Result<MemoryTree, ParseError> {
    Ok(nested_volume_tree(data))
}
