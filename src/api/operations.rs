//! Purpose: Typed facade over the provider's document operations.
//! Exports: document operations as inherent methods on `Bridge`.
//! Role: check capability, marshal, invoke, interpret, release, return.
//! Invariants: Absent capabilities fail with UnsupportedFeature before any call.
//! Invariants: Caller input is rejected locally before marshaling when the ABI leaves it undefined.
//! Invariants: Output values are only returned when the call succeeded.
#![allow(clippy::result_large_err)]

use super::bridge::{ApiResult, Bridge};
use super::report::{CapabilityReport, DocumentInfo, SplitOutputs};
use crate::core::capability::Capability;
use crate::core::channel::exchange;
use crate::core::error::{Error, ErrorCode, ErrorKind};
use crate::core::loader::Provider;
use crate::core::marshal::{self, CPageArray, CPathArray, OutSlot};
use crate::core::symbols::Entry;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{Level, debug, enabled, error, info, warn};

pub const UNKNOWN_VERSION: &str = "unknown";

impl Bridge {
    /// Asks the provider whether `path` is a valid document.
    ///
    /// `Ok(false)` means the provider ran successfully and judged the file
    /// invalid. A file that cannot be opened fails before the provider is called.
    pub fn validate(&self, path: impl AsRef<Path>) -> ApiResult<bool> {
        let path = path.as_ref();
        let provider = self.ensure_loaded()?;
        let call = provider.symbols().validate();
        check_readable(path)?;
        let c_path = marshal::c_path(path)?;
        let mut is_valid = OutSlot::new(false);
        exchange(provider.symbols().free_string(), Capability::Validate, |code, message| unsafe {
            call(c_path.as_ptr(), is_valid.as_mut_ptr(), code, message)
        })
        .into_result()
        .map_err(|err| err.with_path(path))?;
        debug!(path = %path.display(), is_valid = is_valid.get(), "validated document");
        Ok(is_valid.get())
    }

    /// True only when the call succeeded and the provider reported the file valid.
    pub fn is_valid(&self, path: impl AsRef<Path>) -> bool {
        self.validate(path).unwrap_or(false)
    }

    pub fn page_count(&self, path: impl AsRef<Path>) -> ApiResult<u32> {
        let provider = self.ensure_loaded()?;
        page_count_with(provider, path.as_ref())
    }

    pub fn file_size(&self, path: impl AsRef<Path>) -> ApiResult<u64> {
        let provider = self.ensure_loaded()?;
        file_size_with(provider, path.as_ref())
    }

    /// Merges `inputs` into `output`; input order defines output page order.
    pub fn merge<P: AsRef<Path>>(&self, inputs: &[P], output: impl AsRef<Path>) -> ApiResult<()> {
        let output = output.as_ref();
        let provider = self.ensure_loaded()?;
        let call = provider.symbols().merge();
        let c_inputs = CPathArray::new(inputs)?;
        let c_output = marshal::c_path(output)?;
        let input_total = if enabled!(Level::DEBUG) {
            probe_input_sizes(provider, inputs)
        } else {
            None
        };

        debug!(inputs = c_inputs.len(), output = %output.display(), "merging documents");
        exchange(provider.symbols().free_string(), Capability::Merge, |code, message| unsafe {
            call(c_inputs.as_ptr(), c_inputs.len(), c_output.as_ptr(), code, message)
        })
        .into_result()
        .map_err(|err| err.with_path(output))?;

        if let Some(input_total) = input_total {
            verify_output_size(provider, output, input_total);
        }
        Ok(())
    }

    /// Writes the single 1-based `page` of `path` to `output`.
    pub fn extract_page(
        &self,
        path: impl AsRef<Path>,
        page: u32,
        output: impl AsRef<Path>,
    ) -> ApiResult<()> {
        let (path, output) = (path.as_ref(), output.as_ref());
        let provider = self.ensure_loaded()?;
        let call = require(provider.symbols().extract_page(), Capability::ExtractPage, path)?;
        let page = marshal::page_index(page, "page")?;
        let c_path = marshal::c_path(path)?;
        let c_output = marshal::c_path(output)?;
        exchange(provider.symbols().free_string(), Capability::ExtractPage, |code, message| unsafe {
            call(c_path.as_ptr(), page, c_output.as_ptr(), code, message)
        })
        .into_result()
        .map_err(|err| err.with_path(path))
    }

    /// Splits `path` into pages `1..split_page` and `split_page..`.
    ///
    /// Requires `1 <= split_page < page_count`; the two parts are written to
    /// `{output_prefix}_part1` and `{output_prefix}_part2`.
    pub fn split_at_page(
        &self,
        path: impl AsRef<Path>,
        split_page: u32,
        output_prefix: impl AsRef<Path>,
    ) -> ApiResult<SplitOutputs> {
        let (path, output_prefix) = (path.as_ref(), output_prefix.as_ref());
        let provider = self.ensure_loaded()?;
        let call = require(provider.symbols().split_at_page(), Capability::SplitAtPage, path)?;
        let split = marshal::page_index(split_page, "split page")?;
        let pages = page_count_with(provider, path)?;
        if split_page >= pages {
            return Err(Error::new(ErrorKind::Usage)
                .with_capability(Capability::SplitAtPage)
                .with_message(format!(
                    "split page {split_page} must be less than the page count {pages}"
                ))
                .with_path(path));
        }
        let c_path = marshal::c_path(path)?;
        let c_prefix = marshal::c_path(output_prefix)?;
        exchange(provider.symbols().free_string(), Capability::SplitAtPage, |code, message| unsafe {
            call(c_path.as_ptr(), split, c_prefix.as_ptr(), code, message)
        })
        .into_result()
        .map_err(|err| err.with_path(path))?;
        Ok(SplitOutputs::for_prefix(output_prefix))
    }

    /// Writes the listed 1-based `pages` of `path`, in the given order, to `output`.
    pub fn split_by_pages(
        &self,
        path: impl AsRef<Path>,
        pages: &[u32],
        output: impl AsRef<Path>,
    ) -> ApiResult<()> {
        let (path, output) = (path.as_ref(), output.as_ref());
        let provider = self.ensure_loaded()?;
        let call = require(provider.symbols().split_by_pages(), Capability::SplitByPages, path)?;
        let c_pages = CPageArray::new(pages)?;
        let c_path = marshal::c_path(path)?;
        let c_output = marshal::c_path(output)?;
        let release = provider.symbols().free_string();
        exchange(release, Capability::SplitByPages, |code, message| unsafe {
            call(
                c_path.as_ptr(),
                c_pages.as_ptr(),
                c_pages.len(),
                c_output.as_ptr(),
                code,
                message,
            )
        })
        .into_result()
        .map_err(|err| err.with_path(path))
    }

    /// Provider version, the configured fallback when the provider does not
    /// export one, or `"unknown"` when the bridge is unavailable.
    pub fn version(&self) -> String {
        let provider = match self.ensure_loaded() {
            Ok(provider) => provider,
            Err(err) => {
                error!(error = %err, "failed to initialize provider library");
                return UNKNOWN_VERSION.to_string();
            }
        };
        version_with(provider, self.config().fallback_version())
    }

    /// Page count, file size and validity in one record.
    ///
    /// Each field degrades independently: a failed or unsupported query leaves
    /// that field `None` (or `false` for validity).
    pub fn document_info(&self, path: impl AsRef<Path>) -> DocumentInfo {
        let path = path.as_ref();
        let page_count = self.page_count(path).ok();
        let file_size = self.file_size(path).ok();
        let is_valid = self.is_valid(path);
        info!(path = %path.display(), ?page_count, ?file_size, is_valid, "document info");
        DocumentInfo {
            file_path: path.display().to_string(),
            page_count,
            file_size,
            is_valid,
        }
    }

    /// Which capabilities the loaded provider exports.
    pub fn capabilities(&self) -> ApiResult<CapabilityReport> {
        let provider = self.ensure_loaded()?;
        let symbols = provider.symbols();
        Ok(CapabilityReport::new(
            provider.origin().to_string_lossy().into_owned(),
            version_with(provider, self.config().fallback_version()),
            &symbols.available(),
            &symbols.missing(),
        ))
    }
}

fn require<F: Copy>(entry: Entry<F>, capability: Capability, path: &Path) -> ApiResult<F> {
    entry.require(capability).map_err(|err| {
        debug!(symbol = capability.symbol(), "capability not available");
        err.with_path(path)
    })
}

fn check_readable(path: &Path) -> ApiResult<()> {
    File::open(path).map(drop).map_err(|err| {
        let code = match err.kind() {
            io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(ErrorKind::Usage)
            .with_code(code)
            .with_message("file does not exist or cannot be opened")
            .with_path(path)
            .with_source(err)
    })
}

fn page_count_with(provider: &Provider, path: &Path) -> ApiResult<u32> {
    let call = provider.symbols().page_count();
    let c_path = marshal::c_path(path)?;
    let mut count = OutSlot::new(0i32);
    exchange(provider.symbols().free_string(), Capability::PageCount, |code, message| unsafe {
        call(c_path.as_ptr(), count.as_mut_ptr(), code, message)
    })
    .into_result()
    .map_err(|err| err.with_path(path))?;
    let count = count.get();
    u32::try_from(count).map_err(|_| {
        warn!(path = %path.display(), count, "provider reported a negative page count");
        Error::new(ErrorKind::Contract)
            .with_capability(Capability::PageCount)
            .with_message(format!("provider reported page count {count}"))
            .with_path(path)
    })
}

fn file_size_with(provider: &Provider, path: &Path) -> ApiResult<u64> {
    let call = require(provider.symbols().file_size(), Capability::FileSize, path)?;
    let c_path = marshal::c_path(path)?;
    let mut size = OutSlot::new(0u64);
    exchange(provider.symbols().free_string(), Capability::FileSize, |code, message| unsafe {
        call(c_path.as_ptr(), size.as_mut_ptr(), code, message)
    })
    .into_result()
    .map_err(|err| err.with_path(path))?;
    Ok(size.get())
}

fn version_with(provider: &Provider, fallback: &str) -> String {
    let call = match provider.symbols().version() {
        Entry::Present(call) => call,
        Entry::Absent => {
            info!("spdfcore_version not available, using fallback version");
            return fallback.to_string();
        }
    };
    // The returned string is static in the provider and is not released.
    match unsafe { marshal::borrowed_str(call()) } {
        Some(version) => version.to_string_lossy().into_owned(),
        None => {
            error!("spdfcore_version returned null");
            UNKNOWN_VERSION.to_string()
        }
    }
}

// Size diagnostics around merge; they never change the merge outcome.
fn probe_input_sizes<P: AsRef<Path>>(provider: &Provider, inputs: &[P]) -> Option<u64> {
    if !provider.symbols().is_available(Capability::FileSize) {
        debug!("file size check not available");
        return None;
    }
    let mut total = 0u64;
    for (index, input) in inputs.iter().enumerate() {
        let input = input.as_ref();
        match file_size_with(provider, input) {
            Ok(size) => {
                debug!(index = index + 1, path = %input.display(), size, "merge input");
                total = total.saturating_add(size);
            }
            Err(err) => debug!(
                index = index + 1,
                path = %input.display(),
                error = %err,
                "merge input size check failed"
            ),
        }
    }
    Some(total)
}

fn verify_output_size(provider: &Provider, output: &Path, input_total: u64) {
    match file_size_with(provider, output) {
        Ok(size) if size <= input_total => {
            debug!(output_size = size, input_total, "merged output is not larger than its inputs")
        }
        Ok(size) => debug!(output_size = size, input_total, "merged output size"),
        Err(err) => debug!(error = %err, "failed to get merged output file size"),
    }
}
