//! Purpose: Resolve where the provider library lives and bridge-level defaults.
//! Exports: `BridgeConfig` plus the environment variable names it reads.
//! Role: Single source of load-time settings for the Rust API and the C ABI.
//! Invariants: Default library name is the platform file name of `spdfcore_ffi`.
//! Invariants: Explicit paths are tried alone; bare names try search dirs first.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const LIBRARY_ENV: &str = "SPDFBRIDGE_LIBRARY";
pub const LIBRARY_PATH_ENV: &str = "SPDFBRIDGE_LIBRARY_PATH";
pub const PROVIDER_STEM: &str = "spdfcore_ffi";
pub const DEFAULT_FALLBACK_VERSION: &str = "1.0.0";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BridgeConfig {
    library: OsString,
    search_dirs: Vec<PathBuf>,
    fallback_version: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            library: libloading::library_filename(PROVIDER_STEM),
            search_dirs: Vec::new(),
            fallback_version: DEFAULT_FALLBACK_VERSION.to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let mut config = Self::default();
        if let Some(library) = lookup(LIBRARY_ENV).filter(|value| !value.is_empty()) {
            config.library = library;
        }
        if let Some(dirs) = lookup(LIBRARY_PATH_ENV) {
            config.search_dirs = std::env::split_paths(&dirs)
                .filter(|dir| !dir.as_os_str().is_empty())
                .collect();
        }
        config
    }

    pub fn with_library(mut self, library: impl Into<OsString>) -> Self {
        self.library = library.into();
        self
    }

    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    pub fn with_fallback_version(mut self, version: impl Into<String>) -> Self {
        self.fallback_version = version.into();
        self
    }

    pub fn library(&self) -> &OsString {
        &self.library
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    pub fn fallback_version(&self) -> &str {
        &self.fallback_version
    }

    /// Names handed to the opener, in order.
    pub fn candidates(&self) -> Vec<OsString> {
        let library = Path::new(&self.library);
        if library.components().count() > 1 {
            return vec![self.library.clone()];
        }
        self.search_dirs
            .iter()
            .map(|dir| dir.join(library).into_os_string())
            .chain(std::iter::once(self.library.clone()))
            .collect()
    }
}
