//! Purpose: C ABI surface for managed runtimes (JNI shims, Dart FFI, N-API, ...).
//! Exports: `spdfbridge_*` functions plus string/error free helpers.
//! Role: Flattens `Bridge` results into bool / sentinel returns and typed error records.
//! Invariants: One process-wide `Bridge`, configured from the environment on first use.
//! Invariants: Strings handed out here are freed with `spdfbridge_string_free` only.
//! Invariants: `out_err` is optional everywhere; a null pointer only drops the details.
#![allow(non_camel_case_types)]
#![allow(clippy::not_unsafe_ptr_arg_deref)]
#![allow(clippy::result_large_err)]

use crate::api::{ApiResult, Bridge, BridgeConfig, Error, ErrorKind, to_json_string, to_wire_code};
use libc::c_char;
use std::ffi::{CStr, CString};
use std::path::PathBuf;
use std::ptr;
use std::sync::OnceLock;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "SPDFBRIDGE_LOG";

static BRIDGE: OnceLock<Bridge> = OnceLock::new();

#[repr(C)]
pub struct spdfbridge_error {
    pub code: i32,
    pub kind: i32,
    pub message: *mut c_char,
}

fn bridge() -> &'static Bridge {
    BRIDGE.get_or_init(|| Bridge::new(BridgeConfig::from_env()))
}

#[unsafe(no_mangle)]
pub extern "C" fn spdfbridge_init() -> bool {
    init_tracing();
    let loaded = bridge().initialize();
    debug!(loaded, "spdfbridge_init");
    loaded
}

/// Returns an owned version string; free it with `spdfbridge_string_free`.
#[unsafe(no_mangle)]
pub extern "C" fn spdfbridge_version() -> *mut c_char {
    to_c_string(&bridge().version())
}

#[unsafe(no_mangle)]
pub extern "C" fn spdfbridge_validate(
    path: *const c_char,
    out_err: *mut *mut spdfbridge_error,
) -> bool {
    let result = parse_path(path, "path").and_then(|path| bridge().validate(path));
    finish(out_err, result).unwrap_or(false)
}

/// Page count, or -1 on any failure.
#[unsafe(no_mangle)]
pub extern "C" fn spdfbridge_page_count(
    path: *const c_char,
    out_err: *mut *mut spdfbridge_error,
) -> i32 {
    let result = parse_path(path, "path").and_then(|path| bridge().page_count(path));
    finish(out_err, result)
        .map(|count| i32::try_from(count).unwrap_or(i32::MAX))
        .unwrap_or(-1)
}

/// File size in bytes, or -1 on any failure.
#[unsafe(no_mangle)]
pub extern "C" fn spdfbridge_file_size(
    path: *const c_char,
    out_err: *mut *mut spdfbridge_error,
) -> i64 {
    let result = parse_path(path, "path").and_then(|path| bridge().file_size(path));
    finish(out_err, result)
        .map(|size| i64::try_from(size).unwrap_or(i64::MAX))
        .unwrap_or(-1)
}

#[unsafe(no_mangle)]
pub extern "C" fn spdfbridge_merge(
    input_paths: *const *const c_char,
    path_count: usize,
    output_path: *const c_char,
    out_err: *mut *mut spdfbridge_error,
) -> bool {
    let result = parse_path_array(input_paths, path_count).and_then(|inputs| {
        let output = parse_path(output_path, "output_path")?;
        bridge().merge(&inputs, output)
    });
    finish(out_err, result).is_some()
}

#[unsafe(no_mangle)]
pub extern "C" fn spdfbridge_extract_page(
    input_path: *const c_char,
    page_number: u32,
    output_path: *const c_char,
    out_err: *mut *mut spdfbridge_error,
) -> bool {
    let result = parse_path(input_path, "input_path").and_then(|input| {
        let output = parse_path(output_path, "output_path")?;
        bridge().extract_page(input, page_number, output)
    });
    finish(out_err, result).is_some()
}

/// Writes `{output_prefix}_part1` and `{output_prefix}_part2`.
#[unsafe(no_mangle)]
pub extern "C" fn spdfbridge_split_at_page(
    input_path: *const c_char,
    split_page: u32,
    output_prefix: *const c_char,
    out_err: *mut *mut spdfbridge_error,
) -> bool {
    let result = parse_path(input_path, "input_path").and_then(|input| {
        let prefix = parse_path(output_prefix, "output_prefix")?;
        bridge().split_at_page(input, split_page, prefix)
    });
    finish(out_err, result).is_some()
}

#[unsafe(no_mangle)]
pub extern "C" fn spdfbridge_split_by_pages(
    input_path: *const c_char,
    pages: *const u32,
    page_count: usize,
    output_path: *const c_char,
    out_err: *mut *mut spdfbridge_error,
) -> bool {
    let result = parse_path(input_path, "input_path").and_then(|input| {
        let pages = parse_pages(pages, page_count)?;
        let output = parse_path(output_path, "output_path")?;
        bridge().split_by_pages(input, &pages, output)
    });
    finish(out_err, result).is_some()
}

/// Writes an owned JSON document-info object to `out_json`.
#[unsafe(no_mangle)]
pub extern "C" fn spdfbridge_document_info_json(
    path: *const c_char,
    out_json: *mut *mut c_char,
    out_err: *mut *mut spdfbridge_error,
) -> bool {
    let result = parse_path(path, "path")
        .and_then(|path| to_json_string(&bridge().document_info(path)))
        .and_then(|json| write_string(out_json, &json));
    finish(out_err, result).is_some()
}

/// Writes an owned JSON capability report to `out_json`.
#[unsafe(no_mangle)]
pub extern "C" fn spdfbridge_capabilities_json(
    out_json: *mut *mut c_char,
    out_err: *mut *mut spdfbridge_error,
) -> bool {
    let result = bridge()
        .capabilities()
        .and_then(|report| to_json_string(&report))
        .and_then(|json| write_string(out_json, &json));
    finish(out_err, result).is_some()
}

#[unsafe(no_mangle)]
pub extern "C" fn spdfbridge_string_free(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(s));
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn spdfbridge_error_free(err: *mut spdfbridge_error) {
    if err.is_null() {
        return;
    }
    unsafe {
        let err = Box::from_raw(err);
        if !err.message.is_null() {
            drop(CString::from_raw(err.message));
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

fn finish<T>(out_err: *mut *mut spdfbridge_error, result: ApiResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            report(out_err, err);
            None
        }
    }
}

fn report(out_err: *mut *mut spdfbridge_error, err: Error) {
    match err.kind() {
        ErrorKind::Unavailable | ErrorKind::Contract => error!(error = %err, "bridge call failed"),
        _ => debug!(error = %err, "bridge call failed"),
    }
    if out_err.is_null() {
        return;
    }
    let record = Box::new(spdfbridge_error {
        code: err.code() as i32,
        kind: to_wire_code(err.kind()),
        message: err.message().map(to_c_string).unwrap_or(ptr::null_mut()),
    });
    unsafe {
        *out_err = Box::into_raw(record);
    }
}

fn parse_path(input: *const c_char, what: &str) -> ApiResult<PathBuf> {
    if input.is_null() {
        return Err(Error::new(ErrorKind::Usage).with_message(format!("{what} is null")));
    }
    let raw = unsafe { CStr::from_ptr(input) }
        .to_str()
        .map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("{what} is not valid UTF-8"))
                .with_source(err)
        })?;
    Ok(PathBuf::from(raw))
}

fn parse_path_array(paths: *const *const c_char, len: usize) -> ApiResult<Vec<PathBuf>> {
    if len == 0 {
        return Err(Error::new(ErrorKind::Usage).with_message("path_count must be at least 1"));
    }
    if paths.is_null() {
        return Err(Error::new(ErrorKind::Usage).with_message("input_paths is null"));
    }
    let slice = unsafe { std::slice::from_raw_parts(paths, len) };
    slice
        .iter()
        .map(|item| parse_path(*item, "input path"))
        .collect()
}

fn parse_pages(pages: *const u32, len: usize) -> ApiResult<Vec<u32>> {
    if len == 0 {
        return Err(Error::new(ErrorKind::Usage).with_message("page_count must be at least 1"));
    }
    if pages.is_null() {
        return Err(Error::new(ErrorKind::Usage).with_message("pages is null"));
    }
    Ok(unsafe { std::slice::from_raw_parts(pages, len) }.to_vec())
}

fn write_string(out: *mut *mut c_char, value: &str) -> ApiResult<()> {
    if out.is_null() {
        return Err(Error::new(ErrorKind::Usage).with_message("out_json is null"));
    }
    unsafe {
        *out = to_c_string(value);
    }
    Ok(())
}

fn to_c_string(input: &str) -> *mut c_char {
    CString::new(input)
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}
