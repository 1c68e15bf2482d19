//! Intel flash descriptor decoding
//!
//! The descriptor occupies the first 4 KiB of an Intel image. Its map at
//! offset 20 points (in 16-byte units) at the component, region and master
//! sections; everything here is read relative to the descriptor start.

use tracing::{debug, warn};

use crate::core::report::{FlashDescriptorInfo, MasterAccess, MasterSectionV1, MasterSectionV2};
use crate::error::Result;

use super::types::*;
use super::utils::{require_slice, ReadExt};

/// Byte offsets of the v1 master section's permission fields
mod v1_offsets {
    pub const BIOS_READ: usize = 2;
    pub const BIOS_WRITE: usize = 3;
    pub const ME_READ: usize = 6;
    pub const ME_WRITE: usize = 7;
    pub const GBE_READ: usize = 10;
    pub const GBE_WRITE: usize = 11;
}

/// Dword offsets of the v2 master section's per-master entries
mod v2_offsets {
    pub const BIOS: usize = 0;
    pub const ME: usize = 4;
    pub const GBE: usize = 8;
    pub const EC: usize = 16;
}

/// Borrowed view over a flash descriptor.
#[derive(Debug, Clone, Copy)]
pub struct FlashDescriptor<'data> {
    data: &'data [u8],
    component_base: usize,
    region_base: usize,
    master_base: usize,
}

impl<'data> FlashDescriptor<'data> {
    /// Reads the descriptor map from the start of `image`.
    pub fn parse(image: &'data [u8]) -> Result<Self> {
        let map = require_slice(image, 0, FLMAP_MASTER_BASE_OFFSET + 1, "descriptor map")?;
        if map.read_u32_le_at(FLASH_DESCRIPTOR_SIGNATURE_OFFSET) != Some(FLASH_DESCRIPTOR_SIGNATURE)
        {
            warn!("flash descriptor signature missing");
        }

        let section = |offset: usize| -> usize {
            map.read_u8_at(offset).map_or(0, usize::from) * FLMAP_BASE_UNIT
        };
        let descriptor = Self {
            data: image,
            component_base: section(FLMAP_COMPONENT_BASE_OFFSET),
            region_base: section(FLMAP_REGION_BASE_OFFSET),
            master_base: section(FLMAP_MASTER_BASE_OFFSET),
        };
        debug!(
            component_base = descriptor.component_base,
            region_base = descriptor.region_base,
            master_base = descriptor.master_base,
            "descriptor map"
        );
        Ok(descriptor)
    }

    /// Layout version. Legacy descriptors hardcode a 20 MHz read clock in
    /// the component section; anything else is a v2 layout.
    pub fn version(&self) -> Result<u8> {
        let flcomp = require_slice(self.data, self.component_base, 4, "component section")?;
        let read_clock = flcomp
            .read_u32_le_at(0)
            .map_or(0, |dword| ((dword >> 17) & 0b111) as u8);
        Ok(if read_clock == FLASH_FREQUENCY_20MHZ { 1 } else { 2 })
    }

    /// Base/limit pairs, one `u32` per region kind.
    pub fn region_section(&self) -> Result<&'data [u8]> {
        require_slice(
            self.data,
            self.region_base,
            REGION_SECTION_ENTRIES * 4,
            "region section",
        )
    }

    /// Master access permissions for the given layout version.
    pub fn master_access(&self, version: u8) -> Result<MasterAccess> {
        if version == 1 {
            let m = require_slice(
                self.data,
                self.master_base,
                MASTER_SECTION_V1_SIZE,
                "master section",
            )?;
            let byte = |offset| m.read_u8_at(offset).unwrap_or(0);
            Ok(MasterAccess::V1(MasterSectionV1 {
                bios_read: byte(v1_offsets::BIOS_READ),
                bios_write: byte(v1_offsets::BIOS_WRITE),
                me_read: byte(v1_offsets::ME_READ),
                me_write: byte(v1_offsets::ME_WRITE),
                gbe_read: byte(v1_offsets::GBE_READ),
                gbe_write: byte(v1_offsets::GBE_WRITE),
            }))
        } else {
            let m = require_slice(
                self.data,
                self.master_base,
                MASTER_SECTION_V2_SIZE,
                "master section",
            )?;
            let entry = |offset| decode_v2_entry(m.read_u32_le_at(offset).unwrap_or(0));
            let (bios_read, bios_write) = entry(v2_offsets::BIOS);
            let (me_read, me_write) = entry(v2_offsets::ME);
            let (gbe_read, gbe_write) = entry(v2_offsets::GBE);
            let (ec_read, ec_write) = entry(v2_offsets::EC);
            Ok(MasterAccess::V2(MasterSectionV2 {
                bios_read,
                bios_write,
                me_read,
                me_write,
                gbe_read,
                gbe_write,
                ec_read,
                ec_write,
            }))
        }
    }
}

/// Splits a v2 master entry into its 12-bit read (bits 8..20) and write
/// (bits 20..32) fields.
pub fn decode_v2_entry(entry: u32) -> (u16, u16) {
    (((entry >> 8) & 0xFFF) as u16, ((entry >> 20) & 0xFFF) as u16)
}

/// Decodes version and master permissions of a parsed descriptor.
/// `descriptor_base` is the descriptor's offset in the parsed buffer.
pub fn analyze_descriptor(
    descriptor: &FlashDescriptor<'_>,
    descriptor_base: u32,
) -> Result<FlashDescriptorInfo> {
    let version = descriptor.version()?;
    let access = descriptor.master_access(version)?;
    debug!(version, base = descriptor_base, "flash descriptor decoded");
    Ok(FlashDescriptorInfo {
        base: descriptor_base,
        size: FLASH_DESCRIPTOR_SIZE,
        access,
    })
}
