//! Capsule wrapper recognition.
//!
//! Capsules are identified by the GUID at the very start of the header.
//! Signatures are tried in table order and the first match wins.

use tracing::{debug, warn};

use crate::core::guid::guid_to_string;
use crate::core::report::CapsuleInfo;
use crate::core::tree::{NodeId, StructuralTree};

use super::types::*;
use super::utils::ReadExt;

/// Header layout families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapsuleFamily {
    /// `EFI_CAPSULE_HEADER` and vendor capsules that reuse it.
    Efi,
    Toshiba,
    AptioSigned,
    AptioUnsigned,
}

impl CapsuleFamily {
    pub fn name(self) -> &'static str {
        match self {
            CapsuleFamily::Efi => "UEFI capsule",
            CapsuleFamily::Toshiba => "Toshiba capsule",
            CapsuleFamily::AptioSigned => "AMI Aptio capsule (signed)",
            CapsuleFamily::AptioUnsigned => "AMI Aptio capsule (unsigned)",
        }
    }

    /// Fixed header length the family's fields live in.
    pub fn header_size(self) -> usize {
        match self {
            CapsuleFamily::Efi => EFI_CAPSULE_HEADER_SIZE,
            CapsuleFamily::Toshiba => TOSHIBA_CAPSULE_HEADER_SIZE,
            CapsuleFamily::AptioSigned | CapsuleFamily::AptioUnsigned => {
                APTIO_CAPSULE_HEADER_SIZE
            }
        }
    }

    pub fn is_aptio(self) -> bool {
        matches!(self, CapsuleFamily::AptioSigned | CapsuleFamily::AptioUnsigned)
    }

    /// Offset of the field holding the full logical image size.
    fn image_size_offset(self) -> Option<usize> {
        match self {
            CapsuleFamily::Efi => Some(EFI_CAPSULE_IMAGE_SIZE_OFFSET),
            CapsuleFamily::Toshiba => Some(TOSHIBA_CAPSULE_FULL_SIZE_OFFSET),
            CapsuleFamily::AptioSigned | CapsuleFamily::AptioUnsigned => None,
        }
    }
}

/// Known capsule GUIDs, in match order.
pub const CAPSULE_SIGNATURES: [([u8; 16], CapsuleFamily); 8] = [
    (EFI_CAPSULE_GUID, CapsuleFamily::Efi),
    (EFI_FMP_CAPSULE_GUID, CapsuleFamily::Efi),
    (INTEL_CAPSULE_GUID, CapsuleFamily::Efi),
    (LENOVO_CAPSULE_GUID, CapsuleFamily::Efi),
    (LENOVO2_CAPSULE_GUID, CapsuleFamily::Efi),
    (TOSHIBA_CAPSULE_GUID, CapsuleFamily::Toshiba),
    (APTIO_SIGNED_CAPSULE_GUID, CapsuleFamily::AptioSigned),
    (APTIO_UNSIGNED_CAPSULE_GUID, CapsuleFamily::AptioUnsigned),
];

/// A recognised capsule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsuleMatch {
    pub family: CapsuleFamily,
    pub info: CapsuleInfo,
    /// Logical size of the wrapped image, when the header records one.
    pub full_image_size: Option<u32>,
}

/// Classifies a capsule header located at `base`.
///
/// Returns `None` for unknown prefixes and for headers shorter than their
/// family's layout.
pub fn classify_capsule_header(header: &[u8], base: u32) -> Option<CapsuleMatch> {
    let prefix = header.read_guid_at(0)?;
    let family = CAPSULE_SIGNATURES
        .iter()
        .find(|(guid, _)| *guid == prefix)
        .map(|(_, family)| *family)?;

    if header.len() < family.header_size() {
        warn!(
            family = family.name(),
            len = header.len(),
            expected = family.header_size(),
            "capsule header too short, ignoring signature"
        );
        return None;
    }

    let full_image_size = family
        .image_size_offset()
        .and_then(|offset| header.read_u32_le_at(offset));
    let info = CapsuleInfo {
        name: family.name().to_string(),
        guid: guid_to_string(&prefix),
        base,
        size: u32::try_from(header.len()).unwrap_or(u32::MAX),
    };
    debug!(name = %info.name, guid = %info.guid, size = info.size, "capsule recognised");

    Some(CapsuleMatch {
        family,
        info,
        full_image_size,
    })
}

/// Classifies the header of a capsule node.
pub fn classify_capsule<T: StructuralTree + ?Sized>(tree: &T, node: NodeId) -> Option<CapsuleMatch> {
    classify_capsule_header(tree.header(node), tree.base(node))
}
