//! Summary reports for UEFI firmware images.
//!
//! Given a structurally parsed image, the explorer classifies capsule
//! wrappers, decodes the Intel flash descriptor and region table, lists the
//! boot-critical FFS modules and caches the result as JSON keyed by the
//! image CRC-32.

/// Core data types module
pub mod core;
/// Error types
pub mod error;
/// Report assembly, caching and comparison
pub mod explore;
/// Binary layout decoders
pub mod formats;
/// Image checksums
pub mod hashing;
/// Bounded image file I/O
pub mod io;
/// Logging and tracing
pub mod logging;

pub use crate::core::report::Report;
pub use crate::error::{ImageInfoError, Result};
pub use crate::explore::{
    compare_images, explore, explore_path, ExploreConfig, ExploreOutcome, FirmwareImage,
    ImageExplorer,
};
