//! UEFI / Intel flash layout constants and small value types

use std::fmt;

use serde::{Deserialize, Serialize};

// Capsule header GUIDs, in on-disk (mixed-endian) byte order.
pub const EFI_CAPSULE_GUID: [u8; 16] = [
    0xBD, 0x86, 0x66, 0x3B, 0x76, 0x0D, 0x30, 0x40, 0xB7, 0x0E, 0xB5, 0x51, 0x9E, 0x2F, 0xC5, 0xA0,
];
pub const EFI_FMP_CAPSULE_GUID: [u8; 16] = [
    0xED, 0xD5, 0xCB, 0x6D, 0x2D, 0xE8, 0x44, 0x4C, 0xBD, 0xA1, 0x71, 0x94, 0x19, 0x9A, 0xD9, 0x2A,
];
pub const INTEL_CAPSULE_GUID: [u8; 16] = [
    0xB9, 0x82, 0x91, 0x53, 0xB5, 0xAB, 0x91, 0x43, 0xB6, 0x9A, 0xE3, 0xA9, 0x43, 0xF7, 0x2F, 0xCC,
];
pub const LENOVO_CAPSULE_GUID: [u8; 16] = [
    0xD3, 0xAF, 0x0B, 0xE2, 0x14, 0x99, 0x4F, 0x4F, 0x95, 0x37, 0x31, 0x29, 0xE0, 0x90, 0xEB, 0x3C,
];
pub const LENOVO2_CAPSULE_GUID: [u8; 16] = [
    0x76, 0xFE, 0xB5, 0x25, 0x43, 0x82, 0x5C, 0x4A, 0xA9, 0xBD, 0x7E, 0xE3, 0x24, 0x61, 0x98, 0xB5,
];
pub const TOSHIBA_CAPSULE_GUID: [u8; 16] = [
    0x62, 0x70, 0xE0, 0x3B, 0x51, 0x1D, 0xD2, 0x45, 0x83, 0x2B, 0xF0, 0x93, 0x25, 0x7E, 0xD4, 0x61,
];
pub const APTIO_SIGNED_CAPSULE_GUID: [u8; 16] = [
    0x8B, 0xA6, 0x3C, 0x4A, 0x23, 0x77, 0xFB, 0x48, 0x80, 0x3D, 0x57, 0x8C, 0xC1, 0xFE, 0xC4, 0x4D,
];
pub const APTIO_UNSIGNED_CAPSULE_GUID: [u8; 16] = [
    0x90, 0xBB, 0xEE, 0x14, 0x0A, 0x89, 0xDB, 0x43, 0xAE, 0xD1, 0x5D, 0x3C, 0x45, 0x88, 0xA4, 0x18,
];

// Capsule header layouts
pub const EFI_CAPSULE_HEADER_SIZE: usize = 28;
pub const EFI_CAPSULE_IMAGE_SIZE_OFFSET: usize = 24;
pub const TOSHIBA_CAPSULE_HEADER_SIZE: usize = 28;
pub const TOSHIBA_CAPSULE_FULL_SIZE_OFFSET: usize = 20;
pub const APTIO_CAPSULE_HEADER_SIZE: usize = 32;

// Flash descriptor
pub const FLASH_DESCRIPTOR_SIZE: u32 = 0x1000;
pub const FLASH_DESCRIPTOR_SIGNATURE: u32 = 0x0FF0_A55A;
pub const FLASH_DESCRIPTOR_SIGNATURE_OFFSET: usize = 16;
/// FLMAP0/FLMAP1 byte positions inside the descriptor
pub const FLMAP_COMPONENT_BASE_OFFSET: usize = 20;
pub const FLMAP_REGION_BASE_OFFSET: usize = 22;
pub const FLMAP_MASTER_BASE_OFFSET: usize = 24;
/// Section pointers in the map are in 16-byte units
pub const FLMAP_BASE_UNIT: usize = 0x10;
/// `ReadClockFrequency` value hardcoded in legacy (v1) descriptors
pub const FLASH_FREQUENCY_20MHZ: u8 = 0b000;
pub const FLASH_REGION_GRANULARITY: u32 = 0x1000;
pub const REGION_SECTION_ENTRIES: usize = 16;
pub const REGION_ABSENT_MARKER: u16 = 0xFFFF;
pub const MASTER_SECTION_V1_SIZE: usize = 12;
pub const MASTER_SECTION_V2_SIZE: usize = 20;

// FFS
pub const FFS_FILE_HEADER_SIZE: usize = 24;
pub const FFS_FILETYPE_PEI_CORE: u8 = 0x04;
pub const FFS_FILETYPE_DXE_CORE: u8 = 0x05;
pub const FFS_FILETYPE_PEIM: u8 = 0x06;
pub const FFS_FILETYPE_DRIVER: u8 = 0x07;

// Image node subtypes as produced by the structural parser
pub const IMAGE_SUBTYPE_INTEL: u8 = 90;
pub const IMAGE_SUBTYPE_UEFI: u8 = 91;

/// Flash region kinds, indexed the same way as the descriptor's region
/// section base/limit pairs.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum RegionKind {
    Descriptor = 0,
    Bios = 1,
    Me = 2,
    Gbe = 3,
    Pdr = 4,
    DevExp1 = 5,
    Bios2 = 6,
    Microcode = 7,
    Ec = 8,
    DevExp2 = 9,
    Ie = 10,
    Tgbe1 = 11,
    Tgbe2 = 12,
    Reserved1 = 13,
    Reserved2 = 14,
    Ptt = 15,
}

impl RegionKind {
    pub const ALL: [RegionKind; REGION_SECTION_ENTRIES] = [
        RegionKind::Descriptor,
        RegionKind::Bios,
        RegionKind::Me,
        RegionKind::Gbe,
        RegionKind::Pdr,
        RegionKind::DevExp1,
        RegionKind::Bios2,
        RegionKind::Microcode,
        RegionKind::Ec,
        RegionKind::DevExp2,
        RegionKind::Ie,
        RegionKind::Tgbe1,
        RegionKind::Tgbe2,
        RegionKind::Reserved1,
        RegionKind::Reserved2,
        RegionKind::Ptt,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Display name used in region listings
    pub fn name(self) -> &'static str {
        match self {
            RegionKind::Descriptor => "Descriptor",
            RegionKind::Bios => "BIOS",
            RegionKind::Me => "ME",
            RegionKind::Gbe => "GbE",
            RegionKind::Pdr => "PDR",
            RegionKind::DevExp1 => "DevExp1",
            RegionKind::Bios2 => "BIOS2",
            RegionKind::Microcode => "Microcode",
            RegionKind::Ec => "EC",
            RegionKind::DevExp2 => "DevExp2",
            RegionKind::Ie => "IE",
            RegionKind::Tgbe1 => "10GbE1",
            RegionKind::Tgbe2 => "10GbE2",
            RegionKind::Reserved1 => "Reserved1",
            RegionKind::Reserved2 => "Reserved2",
            RegionKind::Ptt => "PTT",
        }
    }
}

impl From<RegionKind> for u8 {
    fn from(kind: RegionKind) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for RegionKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        RegionKind::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| format!("unknown region type {value}"))
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Boot-critical FFS file kinds tracked in reports. Declaration order is the
/// order module groups appear in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    PeiCore,
    Peim,
    DxeCore,
    DxeDriver,
}

impl ModuleKind {
    /// Maps an FFS file type to a tracked module kind.
    pub fn from_file_type(file_type: u8) -> Option<Self> {
        match file_type {
            FFS_FILETYPE_PEI_CORE => Some(ModuleKind::PeiCore),
            FFS_FILETYPE_DXE_CORE => Some(ModuleKind::DxeCore),
            FFS_FILETYPE_PEIM => Some(ModuleKind::Peim),
            FFS_FILETYPE_DRIVER => Some(ModuleKind::DxeDriver),
            _ => None,
        }
    }
}
