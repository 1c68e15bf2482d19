//! Aggregate report for one explored firmware image.
//!
//! A [`Report`] is assembled once, either at the end of a successful explore
//! or by decoding a cached report file, and is not modified afterwards.

use bitflags::bitflags;

use crate::error::Result;
use crate::formats::uefi::types::{ModuleKind, RegionKind};

/// Capsule wrapper found in front of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsuleInfo {
    pub name: String,
    pub guid: String,
    pub base: u32,
    pub size: u32,
}

/// UEFI image without an Intel flash descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UefiImageInfo {
    pub base: u32,
    pub size: u32,
}

/// Master section of a legacy (v1) descriptor: one byte per permission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MasterSectionV1 {
    pub bios_read: u8,
    pub bios_write: u8,
    pub me_read: u8,
    pub me_write: u8,
    pub gbe_read: u8,
    pub gbe_write: u8,
}

/// Master section of a v2 descriptor: 12-bit permission fields, plus EC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MasterSectionV2 {
    pub bios_read: u16,
    pub bios_write: u16,
    pub me_read: u16,
    pub me_write: u16,
    pub gbe_read: u16,
    pub gbe_write: u16,
    pub ec_read: u16,
    pub ec_write: u16,
}

/// Master access permissions; the variant is the descriptor version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterAccess {
    V1(MasterSectionV1),
    V2(MasterSectionV2),
}

bitflags! {
    /// Region bits of a master's read/write permission mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RegionAccess: u16 {
        const DESCRIPTOR = 0x01;
        const BIOS = 0x02;
        const ME = 0x04;
        const GBE = 0x08;
        const PDR = 0x10;
        const EC = 0x20;
    }
}

/// Read/write rights of the BIOS master on one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessGrant {
    pub region: RegionKind,
    pub read: bool,
    pub write: bool,
}

impl MasterAccess {
    pub fn version(&self) -> u8 {
        match self {
            MasterAccess::V1(_) => 1,
            MasterAccess::V2(_) => 2,
        }
    }

    /// BIOS master read and write masks.
    pub fn bios_masks(&self) -> (RegionAccess, RegionAccess) {
        match self {
            MasterAccess::V1(m) => (
                RegionAccess::from_bits_truncate(m.bios_read.into()),
                RegionAccess::from_bits_truncate(m.bios_write.into()),
            ),
            MasterAccess::V2(m) => (
                RegionAccess::from_bits_truncate(m.bios_read),
                RegionAccess::from_bits_truncate(m.bios_write),
            ),
        }
    }

    /// What the BIOS master may read and write, region by region. The BIOS
    /// region itself is always accessible to its own master. EC is only
    /// listed for v2 descriptors.
    pub fn bios_access(&self) -> Vec<AccessGrant> {
        let (read, write) = self.bios_masks();
        let mut regions = vec![
            (RegionKind::Descriptor, RegionAccess::DESCRIPTOR),
            (RegionKind::Bios, RegionAccess::BIOS),
            (RegionKind::Me, RegionAccess::ME),
            (RegionKind::Gbe, RegionAccess::GBE),
            (RegionKind::Pdr, RegionAccess::PDR),
        ];
        if matches!(self, MasterAccess::V2(_)) {
            regions.push((RegionKind::Ec, RegionAccess::EC));
        }

        regions
            .into_iter()
            .map(|(region, bit)| {
                let own = region == RegionKind::Bios;
                AccessGrant {
                    region,
                    read: own || read.contains(bit),
                    write: own || write.contains(bit),
                }
            })
            .collect()
    }
}

/// Flash descriptor summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashDescriptorInfo {
    pub base: u32,
    pub size: u32,
    pub access: MasterAccess,
}

impl FlashDescriptorInfo {
    pub fn version(&self) -> u8 {
        self.access.version()
    }
}

/// One flash region. `base` is absolute within the parsed buffer, `offset`
/// is relative to the start of the Intel image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionEntry {
    pub kind: RegionKind,
    pub base: u32,
    pub offset: u32,
    pub size: u32,
}

/// Intel image: descriptor plus regions sorted by offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntelImageInfo {
    pub base: u32,
    pub size: u32,
    pub descriptor: FlashDescriptorInfo,
    pub regions: Vec<RegionEntry>,
}

impl IntelImageInfo {
    pub fn region(&self, kind: RegionKind) -> Option<&RegionEntry> {
        self.regions.iter().find(|r| r.kind == kind)
    }
}

/// Which top-level image layout was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLayout {
    Intel(IntelImageInfo),
    Uefi(UefiImageInfo),
}

/// Metadata of one boot-critical FFS file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub kind: ModuleKind,
    pub name: String,
    pub guid: String,
    pub base: u32,
    pub data_address: u64,
    pub attributes: u32,
    pub size: u32,
    pub header_checksum: String,
    pub data_checksum: String,
}

/// Everything known about one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// CRC-32 of the whole file; also the cache key.
    pub checksum: u32,
    pub full_file_size: u32,
    pub full_image_size: u32,
    pub capsule: Option<CapsuleInfo>,
    pub image: ImageLayout,
    pub boot_guard: Option<String>,
    /// Modules grouped by kind in `ModuleKind` order; pre-order traversal
    /// order within each group. This is the order a report file keeps.
    pub modules: Vec<ModuleInfo>,
}

impl Report {
    pub fn is_capsule(&self) -> bool {
        self.capsule.is_some()
    }

    pub fn is_intel_image(&self) -> bool {
        matches!(self.image, ImageLayout::Intel(_))
    }

    pub fn is_boot_guard(&self) -> bool {
        self.boot_guard.is_some()
    }

    pub fn intel_image(&self) -> Option<&IntelImageInfo> {
        match &self.image {
            ImageLayout::Intel(info) => Some(info),
            ImageLayout::Uefi(_) => None,
        }
    }

    pub fn uefi_image(&self) -> Option<&UefiImageInfo> {
        match &self.image {
            ImageLayout::Uefi(info) => Some(info),
            ImageLayout::Intel(_) => None,
        }
    }

    /// Modules of one kind, in traversal order.
    pub fn modules_of(&self, kind: ModuleKind) -> impl Iterator<Item = &ModuleInfo> + '_ {
        self.modules.iter().filter(move |m| m.kind == kind)
    }

    /// Serialize to the report file format (4-space pretty JSON).
    pub fn to_json_string(&self) -> Result<String> {
        crate::core::schema::encode(self)
    }

    /// Parse a report file. Missing or mistyped keys are rejected.
    pub fn from_json_str(json_str: &str) -> Result<Self> {
        crate::core::schema::decode(json_str)
    }
}
