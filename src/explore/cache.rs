//! CRC-keyed report cache.
//!
//! Reports live in `<reports_dir>/report_<crc>.json`. A cached file is
//! trusted as-is and is never overwritten.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::report::Report;
use crate::core::schema;
use crate::error::{ImageInfoError, Result};

fn cache_io(path: &Path) -> impl FnOnce(std::io::Error) -> ImageInfoError {
    let path = path.to_path_buf();
    move |source| ImageInfoError::CacheIo { path, source }
}

/// Report files under one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportCache {
    reports_dir: PathBuf,
}

impl ReportCache {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    pub fn path_for(&self, crc: u32) -> PathBuf {
        self.reports_dir.join(format!("report_{crc}.json"))
    }

    pub fn contains(&self, crc: u32) -> bool {
        self.path_for(crc).is_file()
    }

    /// Loads the cached report for `crc`, if there is one.
    pub fn load(&self, crc: u32) -> Result<Option<Report>> {
        let path = self.path_for(crc);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(crc, path = %path.display(), "no cached report");
                return Ok(None);
            }
            Err(source) => return Err(ImageInfoError::CacheIo { path, source }),
        };

        let report = schema::decode_document(&text)
            .map_err(|message| ImageInfoError::MalformedReport {
                path: path.clone(),
                message,
            })?;
        info!(crc, path = %path.display(), "loaded cached report");
        Ok(Some(report))
    }

    /// Writes a report under its checksum. Fails with `ReportExists` when a
    /// file is already there, and with `CacheIo` when the directory cannot
    /// be created or the file cannot be written.
    ///
    /// The report is staged in a temporary file in the same directory and
    /// linked into place only once fully written, so an interrupted write
    /// never leaves a partial `report_<crc>.json`.
    pub fn store(&self, report: &Report) -> Result<PathBuf> {
        self.ensure_dir()?;

        let path = self.path_for(report.checksum);
        let json = report.to_json_string()?;
        let mut staged = tempfile::Builder::new()
            .prefix(".report_")
            .suffix(".tmp")
            .tempfile_in(&self.reports_dir)
            .map_err(cache_io(&self.reports_dir))?;
        staged
            .write_all(json.as_bytes())
            .and_then(|()| staged.flush())
            .map_err(cache_io(&path))?;

        match staged.persist_noclobber(&path) {
            Ok(_) => {}
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                warn!(path = %path.display(), "report already exists, not overwriting");
                return Err(ImageInfoError::ReportExists { path });
            }
            Err(e) => return Err(ImageInfoError::CacheIo { path, source: e.error }),
        }

        info!(crc = report.checksum, path = %path.display(), "report stored");
        Ok(path)
    }

    fn ensure_dir(&self) -> Result<()> {
        if self.reports_dir.is_dir() {
            return Ok(());
        }
        fs::create_dir(&self.reports_dir).map_err(|source| {
            warn!(path = %self.reports_dir.display(), error = %source, "cannot create reports directory");
            ImageInfoError::CacheIo {
                path: self.reports_dir.clone(),
                source,
            }
        })
    }
}
