//! Image exploration: report assembly, caching and comparison.

pub mod api;
pub mod cache;
pub mod compare;
pub mod config;
pub mod image;
pub mod modules;
pub mod top;

pub use api::{
    build_report, explore, explore_path, format_boot_guard, ExploreOutcome, ImageExplorer,
    ReportSource,
};
pub use cache::ReportCache;
pub use compare::{compare_images, ComparisonSummary};
pub use config::{CacheConfig, ExploreConfig, RegionConfig};
pub use image::FirmwareImage;
pub use modules::{collect_modules, ModuleCollector, TraversalContext};
pub use top::{explore_top_level, TopLevel};
