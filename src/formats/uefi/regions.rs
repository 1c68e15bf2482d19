//! Flash region table construction.

use tracing::{debug, warn};

use crate::core::report::RegionEntry;

use super::types::*;
use super::utils::ReadExt;

/// Raw base/limit pair from the descriptor's region section, both in
/// granularity units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionLimits {
    pub base: u16,
    pub limit: u16,
}

impl RegionLimits {
    /// Reads the pair for `kind`; missing bytes read as an absent region.
    pub fn read(region_section: &[u8], kind: RegionKind) -> Self {
        let offset = kind.index() * 4;
        Self {
            base: region_section.read_u16_le_at(offset).unwrap_or(0),
            limit: region_section.read_u16_le_at(offset + 2).unwrap_or(0),
        }
    }

    pub fn offset(self, granularity: u32) -> u32 {
        u32::from(self.base).saturating_mul(granularity)
    }

    /// `(limit + 1 - base)` units; zero when the limit lies below the base.
    pub fn size(self, granularity: u32) -> u32 {
        (u32::from(self.limit) + 1)
            .saturating_sub(u32::from(self.base))
            .saturating_mul(granularity)
    }

    fn is_unused(self) -> bool {
        self.limit == 0 || (self.base == REGION_ABSENT_MARKER && self.limit == REGION_ABSENT_MARKER)
    }
}

/// Where the Intel image sits in the parsed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBounds {
    pub base: u32,
    pub size: u32,
}

/// Builds the region list of an Intel image, sorted by offset.
///
/// ME and BIOS are taken whenever their limit is set. Some boards ship a
/// descriptor whose BIOS region spans the whole image; there the BIOS region
/// is moved to start right after ME. Legacy descriptors only define regions
/// up to PDR/DevExp1/BIOS2, so later entries are ignored for version 1.
pub fn build_region_table(
    region_section: &[u8],
    version: u8,
    image: ImageBounds,
    granularity: u32,
) -> Vec<RegionEntry> {
    let entry = |kind: RegionKind, offset: u32, size: u32| RegionEntry {
        kind,
        base: image.base.saturating_add(offset),
        offset,
        size,
    };
    let mut regions = Vec::new();

    let me_limits = RegionLimits::read(region_section, RegionKind::Me);
    let me = (me_limits.limit != 0)
        .then(|| entry(RegionKind::Me, me_limits.offset(granularity), me_limits.size(granularity)));
    regions.extend(me);

    let bios_limits = RegionLimits::read(region_section, RegionKind::Bios);
    if bios_limits.limit != 0 {
        let mut offset = bios_limits.offset(granularity);
        let mut size = bios_limits.size(granularity);
        if size == image.size {
            offset = me.map_or(0, |me| me.offset.saturating_add(me.size));
            size = image.size.saturating_sub(offset);
            warn!(offset, size, "BIOS region spans the whole image, placing it after ME");
        }
        regions.push(entry(RegionKind::Bios, offset, size));
    }

    for kind in RegionKind::ALL.into_iter().skip(RegionKind::Gbe.index()) {
        if version == 1 && kind == RegionKind::Microcode {
            break;
        }
        let limits = RegionLimits::read(region_section, kind);
        if limits.is_unused() {
            continue;
        }
        let size = limits.size(granularity);
        if size != 0 {
            regions.push(entry(kind, limits.offset(granularity), size));
        }
    }

    regions.sort_by_key(|r| r.offset);
    debug!(count = regions.len(), version, "region table built");
    regions
}
