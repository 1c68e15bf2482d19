//! Configuration for image exploration.
//!
//! All settings have working defaults; a JSON file can override any subset
//! of them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ImageInfoError, Result};
use crate::formats::uefi::types::FLASH_REGION_GRANULARITY;
use crate::io::IOLimits;

/// Master configuration for an explore run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreConfig {
    /// Report cache settings.
    pub cache: CacheConfig,
    /// Limits applied when reading image files.
    pub io: IOLimits,
    /// Region table settings.
    pub regions: RegionConfig,
}

/// Report cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Look up and persist reports. When disabled every explore runs the
    /// full pipeline and nothing is written.
    pub enabled: bool,
    /// Directory holding `report_<crc>.json` files.
    pub reports_dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reports_dir: PathBuf::from("reports"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Unit of descriptor region base/limit fields, in bytes.
    pub granularity: u32,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            granularity: FLASH_REGION_GRANULARITY,
        }
    }
}

impl ExploreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config with the cache rooted at `reports_dir`.
    pub fn with_reports_dir(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache: CacheConfig {
                enabled: true,
                reports_dir: reports_dir.into(),
            },
            ..Self::default()
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ImageInfoError::Serialization(e.to_string()))
    }

    pub fn from_json_str(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str).map_err(|e| ImageInfoError::Serialization(e.to_string()))
    }
}
