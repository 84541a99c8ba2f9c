//! Purpose: Serializable result records returned by composite facade operations.
//! Exports: `DocumentInfo`, `CapabilityReport`, `SplitOutputs`, `to_json_string`.
//! Role: Shared shapes for Rust callers and the JSON-returning C ABI exports.
//! Invariants: JSON keys are camelCase and additive-only.
//! Invariants: Split output names are the prefix plus `_part1` / `_part2`.
#![allow(clippy::result_large_err)]

use crate::core::capability::Capability;
use crate::core::error::{Error, ErrorKind};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const PART1_SUFFIX: &str = "_part1";
pub const PART2_SUFFIX: &str = "_part2";

/// Page count, size and validity of one document; unknown fields are `None`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub file_path: String,
    pub page_count: Option<u32>,
    pub file_size: Option<u64>,
    pub is_valid: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityReport {
    pub library: String,
    pub version: String,
    pub available: Vec<&'static str>,
    pub missing: Vec<&'static str>,
}

impl CapabilityReport {
    pub fn new(
        library: String,
        version: String,
        available: &[Capability],
        missing: &[Capability],
    ) -> Self {
        Self {
            library,
            version,
            available: available.iter().map(|cap| cap.symbol()).collect(),
            missing: missing.iter().map(|cap| cap.symbol()).collect(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SplitOutputs {
    pub first: PathBuf,
    pub second: PathBuf,
}

impl SplitOutputs {
    pub fn for_prefix(prefix: &Path) -> Self {
        Self {
            first: with_suffix(prefix, PART1_SUFFIX),
            second: with_suffix(prefix, PART2_SUFFIX),
        }
    }
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

pub fn to_json_string<T: Serialize>(value: &T) -> Result<String, Error> {
    serde_json::to_string(value).map_err(|err| {
        Error::new(ErrorKind::Contract)
            .with_message("failed to serialize report")
            .with_source(err)
    })
}
