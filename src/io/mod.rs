//! Bounded and safe I/O for firmware image files.
//!
//! `SafeReader` memory-maps an image and enforces size and read limits so a
//! mislabelled multi-gigabyte file cannot be pulled into memory by accident.
//! Flash images are small (SPI parts top out at 64 MiB) so the defaults are
//! sized to read a whole image plus a capsule wrapper in one go.

pub mod error;

use crate::io::error::{IoError, Result};
use bytes::Bytes;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Defines the resource limits for I/O operations.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IOLimits {
    /// The absolute maximum file size that can be opened.
    pub max_file_size: u64,
    /// The maximum total number of bytes that can be read from the file across all operations.
    pub max_read_bytes: u64,
}

impl Default for IOLimits {
    fn default() -> Self {
        Self {
            max_file_size: 256 * 1024 * 1024,  // 256MB
            max_read_bytes: 256 * 1024 * 1024, // 256MB
        }
    }
}

/// A safe, bounded file reader that uses memory-mapping for efficient access.
pub struct SafeReader {
    path: PathBuf,
    // None when the file size is zero; memmap cannot map empty files.
    mmap: Option<Mmap>,
    limits: IOLimits,
    bytes_read: u64,
    file_size: u64,
}

impl SafeReader {
    /// Opens a file, memory-maps it, and wraps it in a `SafeReader`.
    ///
    /// This function will fail if the file size exceeds `limits.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, limits: IOLimits) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            size = file_size,
            limits.max_file_size = limits.max_file_size,
            "Opening firmware image"
        );

        if file_size > limits.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = limits.max_file_size,
                "Firmware image is too large"
            );
            return Err(IoError::FileTooLarge {
                limit: limits.max_file_size,
                found: file_size,
            });
        }

        let mmap = if file_size == 0 {
            None
        } else {
            // Safety: read-only map of a regular file we just opened.
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            limits,
            bytes_read: 0,
            file_size,
        })
    }

    /// Returns the total size of the underlying file in bytes.
    pub fn size(&self) -> u64 {
        self.file_size
    }

    /// Returns the total number of bytes read so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Returns the `IOLimits` enforced by this reader.
    pub fn limits(&self) -> &IOLimits {
        &self.limits
    }

    /// Reads a slice of the file at a given offset.
    ///
    /// Reads past EOF are truncated; a read starting at or beyond EOF returns
    /// an empty buffer.
    ///
    /// # Errors
    ///
    /// Returns `IoError::ReadLimitExceeded` if the requested read would cause the
    /// total number of bytes read to exceed `limits.max_read_bytes`.
    pub fn read_at(&mut self, offset: u64, len: u64) -> Result<Bytes> {
        if self.bytes_read.saturating_add(len) > self.limits.max_read_bytes {
            warn!(
                path = %self.path.display(),
                current_read = self.bytes_read,
                requested = len,
                limit = self.limits.max_read_bytes,
                "Read limit exceeded"
            );
            return Err(IoError::ReadLimitExceeded {
                limit: self.limits.max_read_bytes,
                current: self.bytes_read,
            });
        }

        let map = match &self.mmap {
            Some(m) => m,
            None => return Ok(Bytes::new()),
        };

        let offset = offset as usize;
        if offset >= map.len() {
            return Ok(Bytes::new());
        }
        let end = offset.saturating_add(len as usize).min(map.len());
        let out = Bytes::copy_from_slice(&map[offset..end]);
        self.bytes_read += (end - offset) as u64;

        trace!(
            path = %self.path.display(),
            offset = offset,
            len = end - offset,
            total_read = self.bytes_read,
            "Performed read"
        );

        Ok(out)
    }

    /// Reads the whole image. Empty files are rejected since there is
    /// nothing to explore.
    pub fn read_all(&mut self) -> Result<Bytes> {
        if self.file_size == 0 {
            return Err(IoError::EmptyFile {
                path: self.path.display().to_string(),
            });
        }
        self.read_at(0, self.file_size)
    }
}
