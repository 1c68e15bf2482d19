//! A firmware image loaded into memory together with its checksum.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use crate::error::Result;
use crate::hashing::crc32_checksum;
use crate::io::{IOLimits, SafeReader};

/// Raw image bytes plus the CRC-32 that keys its report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareImage {
    data: Bytes,
    checksum: u32,
    path: Option<PathBuf>,
}

impl FirmwareImage {
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let checksum = crc32_checksum(&data);
        Self {
            data,
            checksum,
            path: None,
        }
    }

    /// Reads a whole image file within `limits`. Empty files are rejected.
    pub fn open<P: AsRef<Path>>(path: P, limits: &IOLimits) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = SafeReader::open(path, limits.clone())?;
        let data = reader.read_all()?;
        let mut image = Self::from_bytes(data);
        debug!(path = %path.display(), size = image.len(), crc = image.checksum, "image loaded");
        image.path = Some(path.to_path_buf());
        Ok(image)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size as recorded in reports.
    pub fn file_size(&self) -> u32 {
        u32::try_from(self.data.len()).unwrap_or(u32::MAX)
    }
}
