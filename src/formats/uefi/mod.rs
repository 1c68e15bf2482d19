//! UEFI capsule, Intel flash descriptor and FFS decoding

pub mod capsule;
pub mod descriptor;
pub mod ffs;
pub mod regions;
pub mod types;
pub mod utils;

pub use capsule::{classify_capsule, classify_capsule_header, CapsuleFamily, CapsuleMatch};
pub use descriptor::{analyze_descriptor, FlashDescriptor};
pub use ffs::{format_checksum, FfsFileHeader};
pub use regions::{build_region_table, ImageBounds, RegionLimits};
pub use types::*;
