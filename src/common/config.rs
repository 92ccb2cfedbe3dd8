use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{DalError, Result};
use super::types::NUM_RESERVED_PAGES;

/// Default size of a page in bytes (4 KB)
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default number of addressable pages in a file
pub const DEFAULT_MAX_PAGES: usize = 100;

/// Construction-time settings for a data access layer.
///
/// Every `Dal` carries its own copy, so differently sized instances can live
/// side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DalConfig {
    /// Bytes per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Total addressable pages, reserved pages included.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_pages() -> usize {
    DEFAULT_MAX_PAGES
}

impl Default for DalConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl DalConfig {
    pub fn new(page_size: usize, max_pages: usize) -> Self {
        Self {
            page_size,
            max_pages,
        }
    }

    /// Parses a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DalError::Config(e.to_string()))
    }

    /// Loads a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Checks that the page size and capacity describe a usable file.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(DalError::InvalidPageSize(self.page_size));
        }
        validate_capacity(self.max_pages)?;
        // Every page offset must be addressable
        if self.file_size_limit().is_none() {
            return Err(DalError::InvalidPageSize(self.page_size));
        }
        Ok(())
    }

    /// Size in bytes of a file holding every addressable page, or None if
    /// that does not fit in a `u64`.
    pub fn file_size_limit(&self) -> Option<u64> {
        (self.page_size as u64).checked_mul(self.max_pages as u64)
    }
}

/// Capacity must leave at least one page past the reserved pair, and every
/// page index must fit in a `PageId`.
pub(crate) fn validate_capacity(capacity: usize) -> Result<()> {
    if capacity <= NUM_RESERVED_PAGES || capacity > i32::MAX as usize {
        return Err(DalError::InvalidCapacity(capacity));
    }
    Ok(())
}
