//! Explore entry points.
//!
//! An explore first looks for a cached report under the image checksum. On a
//! hit the report is returned as stored and the structural parser is never
//! run. On a miss the image is parsed, the top-level layout and module list
//! are extracted, and the assembled report is written back to the cache.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::guid::{GuidDatabase, NoGuidNames};
use crate::core::report::Report;
use crate::core::tree::{StructuralParser, StructuralTree};
use crate::error::{ImageInfoError, Result};
use crate::{log_error, span_trace};

use super::cache::ReportCache;
use super::config::ExploreConfig;
use super::image::FirmwareImage;
use super::modules::collect_modules;
use super::top::explore_top_level;

/// Where a returned report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSource {
    Cache,
    Fresh,
}

/// Result of a successful explore.
#[derive(Debug)]
pub struct ExploreOutcome {
    pub report: Report,
    pub source: ReportSource,
    /// File the report was loaded from or written to.
    pub report_path: Option<PathBuf>,
    /// Cache failure that did not stop the explore.
    pub cache_error: Option<ImageInfoError>,
}

/// Indents every line of the parser's Boot Guard summary by two spaces.
pub fn format_boot_guard(info: &str) -> String {
    format!("  {}", info.replace('\n', "\n  "))
}

/// Builds a report from an already parsed tree. No cache access.
pub fn build_report<T, G>(
    tree: &T,
    image: &FirmwareImage,
    names: &G,
    config: &ExploreConfig,
) -> Result<Report>
where
    T: StructuralTree + ?Sized,
    G: GuidDatabase + ?Sized,
{
    let boot_guard = tree.boot_guard_info().map(|info| format_boot_guard(&info));
    let top = explore_top_level(tree, &config.regions)?;
    let mut modules = collect_modules(tree, names)?;
    modules.sort_by_key(|m| m.kind);

    Ok(Report {
        checksum: image.checksum(),
        full_file_size: image.file_size(),
        full_image_size: top.full_image_size,
        capsule: top.capsule,
        image: top.image,
        boot_guard,
        modules,
    })
}

/// Explores images with one parser, name database and configuration.
pub struct ImageExplorer<P, G = NoGuidNames> {
    parser: P,
    names: G,
    config: ExploreConfig,
}

impl<P: StructuralParser> ImageExplorer<P, NoGuidNames> {
    pub fn new(parser: P, config: ExploreConfig) -> Self {
        Self {
            parser,
            names: NoGuidNames,
            config,
        }
    }
}

impl<P: StructuralParser, G: GuidDatabase> ImageExplorer<P, G> {
    /// Replaces the GUID name database used for module names.
    pub fn with_names<H: GuidDatabase>(self, names: H) -> ImageExplorer<P, H> {
        ImageExplorer {
            parser: self.parser,
            names,
            config: self.config,
        }
    }

    pub fn config(&self) -> &ExploreConfig {
        &self.config
    }

    fn cache(&self) -> Option<ReportCache> {
        self.config
            .cache
            .enabled
            .then(|| ReportCache::new(&self.config.cache.reports_dir))
    }

    pub fn explore(&self, image: &FirmwareImage) -> Result<ExploreOutcome> {
        let crc = image.checksum();
        let span = span_trace!("explore", crc, size_bytes = image.len());
        let _guard = span.enter();
        info!("start");

        let cache = self.cache();
        let mut cache_error = None;

        if let Some(cache) = &cache {
            match cache.load(crc) {
                Ok(Some(report)) => {
                    return Ok(ExploreOutcome {
                        report,
                        source: ReportSource::Cache,
                        report_path: Some(cache.path_for(crc)),
                        cache_error: None,
                    });
                }
                Ok(None) => {}
                Err(e) if !e.is_fatal() => {
                    warn!(error = %e, "report cache unreadable, exploring anyway");
                    cache_error = Some(e);
                }
                Err(e) => return Err(log_error!(e, "cached report rejected")),
            }
        }

        debug!(phase = "parse", "structural parse");
        let tree = self
            .parser
            .parse(image.data())
            .map_err(|e| log_error!(ImageInfoError::from(e), "structural parse failed"))?;

        debug!(phase = "report", "top-level layout and modules");
        let report = build_report(&tree, image, &self.names, &self.config)
            .map_err(|e| log_error!(e, "explore aborted"))?;

        let mut report_path = None;
        if let Some(cache) = &cache {
            match cache.store(&report) {
                Ok(path) => report_path = Some(path),
                Err(e) => {
                    warn!(error = %e, "report not cached");
                    cache_error.get_or_insert(e);
                }
            }
        }

        info!(
            modules = report.modules.len(),
            capsule = report.is_capsule(),
            intel = report.is_intel_image(),
            "explore finished"
        );
        Ok(ExploreOutcome {
            report,
            source: ReportSource::Fresh,
            report_path,
            cache_error,
        })
    }

    /// Loads an image file within the configured I/O limits and explores it.
    pub fn explore_path<Q: AsRef<Path>>(&self, path: Q) -> Result<ExploreOutcome> {
        let image = FirmwareImage::open(path, &self.config.io)?;
        self.explore(&image)
    }
}

/// One-shot explore with default names.
pub fn explore<P: StructuralParser>(
    image: &FirmwareImage,
    parser: P,
    config: &ExploreConfig,
) -> Result<ExploreOutcome> {
    ImageExplorer::new(parser, config.clone()).explore(image)
}

/// One-shot explore of an image file.
pub fn explore_path<P: StructuralParser, Q: AsRef<Path>>(
    path: Q,
    parser: P,
    config: &ExploreConfig,
) -> Result<ExploreOutcome> {
    ImageExplorer::new(parser, config.clone()).explore_path(path)
}
