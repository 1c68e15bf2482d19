//! Byte-level comparison of two images.

use std::fmt;

use tracing::debug;

use super::image::FirmwareImage;

/// Outcome of [`compare_images`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonSummary {
    pub crc_differs: bool,
    pub size_differs: bool,
    /// 1-based position of the first differing byte; only set when the
    /// checksums or sizes differ. When the shorter image is a prefix of the
    /// longer one this is one past the shorter length.
    pub first_difference: Option<u64>,
}

impl ComparisonSummary {
    pub fn is_equal(&self) -> bool {
        !self.crc_differs && !self.size_differs
    }
}

impl fmt::Display for ComparisonSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = |differs| if differs { "different" } else { "equal" };
        write!(
            f,
            "crc {}, size {}",
            state(self.crc_differs),
            state(self.size_differs)
        )?;
        if let Some(pos) = self.first_difference {
            write!(f, ", differences start at {pos:#X} ({pos})")?;
        }
        Ok(())
    }
}

/// Index of the first mismatch within the shared prefix, or the prefix
/// length when there is none.
fn first_mismatch(a: &[u8], b: &[u8]) -> usize {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .unwrap_or_else(|| a.len().min(b.len()))
}

/// Compares checksums and sizes; the bytes are only scanned when either
/// differs.
pub fn compare_images(a: &FirmwareImage, b: &FirmwareImage) -> ComparisonSummary {
    let crc_differs = a.checksum() != b.checksum();
    let size_differs = a.len() != b.len();
    let first_difference = (crc_differs || size_differs)
        .then(|| first_mismatch(a.data(), b.data()) as u64 + 1);

    let summary = ComparisonSummary {
        crc_differs,
        size_differs,
        first_difference,
    };
    debug!(%summary, "images compared");
    summary
}
