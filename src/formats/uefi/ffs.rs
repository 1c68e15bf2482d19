//! FFS file header fields used in module listings

use crate::core::guid::guid_to_string;
use crate::error::Result;

use super::types::FFS_FILE_HEADER_SIZE;
use super::utils::{require_slice, ReadExt};

const NAME_OFFSET: usize = 0;
const HEADER_CHECKSUM_OFFSET: usize = 16;
const FILE_CHECKSUM_OFFSET: usize = 17;
const TYPE_OFFSET: usize = 18;
const ATTRIBUTES_OFFSET: usize = 19;

/// Fixed part of an `EFI_FFS_FILE_HEADER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfsFileHeader {
    pub name: [u8; 16],
    pub header_checksum: u8,
    pub file_checksum: u8,
    pub file_type: u8,
    pub attributes: u8,
}

impl FfsFileHeader {
    pub fn parse(file: &[u8]) -> Result<Self> {
        let h = require_slice(file, 0, FFS_FILE_HEADER_SIZE, "FFS file header")?;
        Ok(Self {
            name: h.read_guid_at(NAME_OFFSET).unwrap_or_default(),
            header_checksum: h.read_u8_at(HEADER_CHECKSUM_OFFSET).unwrap_or(0),
            file_checksum: h.read_u8_at(FILE_CHECKSUM_OFFSET).unwrap_or(0),
            file_type: h.read_u8_at(TYPE_OFFSET).unwrap_or(0),
            attributes: h.read_u8_at(ATTRIBUTES_OFFSET).unwrap_or(0),
        })
    }

    pub fn guid(&self) -> String {
        guid_to_string(&self.name)
    }
}

/// Checksum byte as shown in reports, e.g. `"A1h"`.
pub fn format_checksum(byte: u8) -> String {
    format!("{byte:02X}h")
}
