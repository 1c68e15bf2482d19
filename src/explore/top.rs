//! Top-level layout: capsule wrappers and the image they contain.

use tracing::{debug, warn};

use crate::core::report::{CapsuleInfo, ImageLayout, IntelImageInfo, UefiImageInfo};
use crate::core::tree::{NodeId, NodeType, StructuralTree};
use crate::error::{ImageInfoError, Result};
use crate::formats::uefi::{
    analyze_descriptor, build_region_table, classify_capsule, FlashDescriptor, ImageBounds,
    IMAGE_SUBTYPE_INTEL, IMAGE_SUBTYPE_UEFI,
};

use super::config::RegionConfig;

/// What the top of the tree holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevel {
    pub capsule: Option<CapsuleInfo>,
    pub image: ImageLayout,
    pub full_image_size: u32,
}

fn node_size<T: StructuralTree + ?Sized>(tree: &T, node: NodeId) -> u32 {
    u32::try_from(tree.full_size(node)).unwrap_or(u32::MAX)
}

/// Walks capsule wrappers down to the image node and decodes it.
///
/// The full image size comes from the capsule header when it records one,
/// is replaced by the UEFI image size for UEFI images, and otherwise falls
/// back to the Intel image size.
pub fn explore_top_level<T: StructuralTree + ?Sized>(
    tree: &T,
    regions: &RegionConfig,
) -> Result<TopLevel> {
    let mut capsule = None;
    let mut capsule_size = None;
    let mut node = tree.root();

    while tree.is_valid(node) && tree.node_type(node) == NodeType::Capsule {
        if let Some(found) = classify_capsule(tree, node) {
            if !found.family.is_aptio() {
                capsule_size = found.full_image_size;
            }
            capsule = Some(found.info);
        }
        node = tree.child(node, 0);
    }

    let image = if tree.is_valid(node) && tree.node_type(node) == NodeType::Image {
        match tree.node_subtype(node) {
            IMAGE_SUBTYPE_INTEL => Some(ImageLayout::Intel(parse_intel_image(tree, node, regions)?)),
            IMAGE_SUBTYPE_UEFI => Some(ImageLayout::Uefi(UefiImageInfo {
                base: tree.base(node),
                size: node_size(tree, node),
            })),
            _ => None,
        }
    } else {
        None
    };
    let image = image.unwrap_or_else(|| {
        warn!("no Intel or UEFI image at the top of the tree");
        ImageLayout::Uefi(UefiImageInfo::default())
    });

    let full_image_size = match (&image, capsule_size) {
        (ImageLayout::Uefi(uefi), _) if uefi.size != 0 => uefi.size,
        (_, Some(size)) => size,
        (ImageLayout::Intel(intel), None) => intel.size,
        (ImageLayout::Uefi(_), None) => 0,
    };
    debug!(
        capsule = capsule.is_some(),
        intel = matches!(image, ImageLayout::Intel(_)),
        full_image_size,
        "top-level layout"
    );

    Ok(TopLevel {
        capsule,
        image,
        full_image_size,
    })
}

/// Decodes the descriptor and region table of an Intel image node.
pub fn parse_intel_image<T: StructuralTree + ?Sized>(
    tree: &T,
    node: NodeId,
    regions: &RegionConfig,
) -> Result<IntelImageInfo> {
    let bytes = tree.full_bytes(node);
    let base = tree.base(node);
    let size = node_size(tree, node);

    let descriptor_node = tree.child(node, 0);
    if !tree.is_valid(descriptor_node) {
        return Err(ImageInfoError::InvalidNode {
            context: "locating the flash descriptor".to_string(),
        });
    }

    let map = FlashDescriptor::parse(&bytes)?;
    let descriptor = analyze_descriptor(&map, tree.base(descriptor_node))?;
    let region_section = map.region_section()?;
    let regions = build_region_table(
        region_section,
        descriptor.version(),
        ImageBounds { base, size },
        regions.granularity,
    );

    Ok(IntelImageInfo {
        base,
        size,
        descriptor,
        regions,
    })
}
