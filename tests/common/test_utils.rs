//! Shared test utilities for temporary files and report directories.

use std::io::Write;
use std::path::PathBuf;

use tempfile::{NamedTempFile, TempDir};
use uefi_imageinfo::explore::ExploreConfig;

/// Creates a temporary file with the given content.
///
/// # Panics
///
/// Panics if the temporary file cannot be created or written
pub fn create_temp_file(content: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content).unwrap();
    temp_file
}

/// A fresh temporary directory plus a config whose report cache lives in a
/// `reports` subdirectory that does not exist yet.
pub fn cache_config() -> (TempDir, ExploreConfig) {
    let dir = TempDir::new().unwrap();
    let config = ExploreConfig::with_reports_dir(dir.path().join("reports"));
    (dir, config)
}

/// Every file currently in the reports directory of `config`.
pub fn report_files(config: &ExploreConfig) -> Vec<PathBuf> {
    match std::fs::read_dir(&config.cache.reports_dir) {
        Ok(entries) => {
            let mut files: Vec<PathBuf> = entries.map(|e| e.unwrap().path()).collect();
            files.sort();
            files
        }
        Err(_) => Vec::new(),
    }
}
