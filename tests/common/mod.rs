// Fake spdfcore provider built from Rust `extern "C"` functions.
// Documents are text files: a header line followed by one line per page label.
#![allow(dead_code)]

use libc::{c_char, c_int, c_void};
use spdfbridge::api::{
    Bridge, BridgeConfig, Error, ErrorCode, ErrorKind, ModuleOpener, ProviderModule,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::{CStr, CString, OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const HEADER: &str = "%FAKEPDF";
pub const FAKE_VERSION: &str = "9.9.9-fake";

thread_local! {
    static ALLOCATED: Cell<usize> = const { Cell::new(0) };
    static RELEASED: Cell<usize> = const { Cell::new(0) };
    static CALLS: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

pub fn reset() {
    ALLOCATED.with(|count| count.set(0));
    RELEASED.with(|count| count.set(0));
    CALLS.with(|calls| calls.borrow_mut().clear());
}

pub fn allocated() -> usize {
    ALLOCATED.with(Cell::get)
}

pub fn released() -> usize {
    RELEASED.with(Cell::get)
}

pub fn calls() -> Vec<&'static str> {
    CALLS.with(|calls| calls.borrow().clone())
}

pub fn write_doc(dir: &Path, name: &str, pages: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut text = String::from(HEADER);
    for page in pages {
        text.push('\n');
        text.push_str(page);
    }
    fs::write(&path, text).expect("write fake document");
    path
}

pub fn read_pages(path: &Path) -> Vec<String> {
    load_pages(path).expect("readable fake document")
}

type FakeResult<T> = Result<T, (ErrorCode, String)>;

fn record(symbol: &'static str) {
    CALLS.with(|calls| calls.borrow_mut().push(symbol));
}

fn load_pages(path: &Path) -> FakeResult<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|err| {
        let code = if err.kind() == io::ErrorKind::NotFound {
            ErrorCode::FileNotFound
        } else {
            ErrorCode::IoError
        };
        (code, format!("cannot read {}: {err}", path.display()))
    })?;
    let mut lines = text.lines();
    if lines.next() != Some(HEADER) {
        return Err((ErrorCode::InvalidPdf, format!("{} is not a document", path.display())));
    }
    Ok(lines.map(str::to_string).collect())
}

fn store_pages(path: &Path, pages: &[String]) -> FakeResult<()> {
    let mut text = String::from(HEADER);
    for page in pages {
        text.push('\n');
        text.push_str(page);
    }
    fs::write(path, text)
        .map_err(|err| (ErrorCode::IoError, format!("cannot write {}: {err}", path.display())))
}

unsafe fn path_arg(ptr: *const c_char) -> PathBuf {
    let text = unsafe { CStr::from_ptr(ptr) }.to_str().expect("utf-8 path");
    PathBuf::from(text)
}

fn provider_message(text: &str) -> *mut c_char {
    ALLOCATED.with(|count| count.set(count.get() + 1));
    CString::new(text).expect("message").into_raw()
}

unsafe fn respond(
    code_out: *mut c_int,
    message_out: *mut *mut c_char,
    result: FakeResult<()>,
) -> bool {
    match result {
        Ok(()) => true,
        Err((code, text)) => {
            unsafe {
                *code_out = code as c_int;
                *message_out = provider_message(&text);
            }
            false
        }
    }
}

pub unsafe extern "C" fn fake_merge(
    input_paths: *const *const c_char,
    path_count: usize,
    output_path: *const c_char,
    code: *mut c_int,
    message: *mut *mut c_char,
) -> bool {
    record("pdf_merge_files");
    let inputs = unsafe { std::slice::from_raw_parts(input_paths, path_count) };
    let result = (|| {
        let mut pages = Vec::new();
        for input in inputs {
            pages.extend(load_pages(&unsafe { path_arg(*input) })?);
        }
        store_pages(&unsafe { path_arg(output_path) }, &pages)
    })();
    unsafe { respond(code, message, result) }
}

pub unsafe extern "C" fn fake_validate(
    path: *const c_char,
    is_valid: *mut bool,
    code: *mut c_int,
    message: *mut *mut c_char,
) -> bool {
    record("pdf_validate");
    let path = unsafe { path_arg(path) };
    match fs::read_to_string(&path) {
        Ok(text) => {
            unsafe { *is_valid = text.lines().next() == Some(HEADER) };
            true
        }
        Err(err) => unsafe {
            respond(code, message, Err((ErrorCode::IoError, err.to_string())))
        },
    }
}

pub unsafe extern "C" fn fake_page_count(
    path: *const c_char,
    page_count: *mut i32,
    code: *mut c_int,
    message: *mut *mut c_char,
) -> bool {
    record("pdf_get_page_count");
    let result = load_pages(&unsafe { path_arg(path) }).map(|pages| unsafe {
        *page_count = pages.len() as i32;
    });
    unsafe { respond(code, message, result) }
}

pub unsafe extern "C" fn fake_file_size(
    path: *const c_char,
    file_size: *mut u64,
    code: *mut c_int,
    message: *mut *mut c_char,
) -> bool {
    record("pdf_get_file_size");
    let path = unsafe { path_arg(path) };
    let result = fs::metadata(&path)
        .map(|meta| unsafe { *file_size = meta.len() })
        .map_err(|err| (ErrorCode::FileNotFound, format!("{}: {err}", path.display())));
    unsafe { respond(code, message, result) }
}

pub unsafe extern "C" fn fake_split_by_pages(
    input_path: *const c_char,
    pages: *const i32,
    page_count: usize,
    output_path: *const c_char,
    code: *mut c_int,
    message: *mut *mut c_char,
) -> bool {
    record("pdf_split_by_pages");
    let wanted = unsafe { std::slice::from_raw_parts(pages, page_count) };
    let result = (|| {
        let source = load_pages(&unsafe { path_arg(input_path) })?;
        let mut selected = Vec::with_capacity(wanted.len());
        for page in wanted {
            let index = usize::try_from(*page - 1).ok().filter(|index| *index < source.len());
            match index {
                Some(index) => selected.push(source[index].clone()),
                None => {
                    return Err((ErrorCode::InvalidParameter, format!("page {page} out of range")));
                }
            }
        }
        store_pages(&unsafe { path_arg(output_path) }, &selected)
    })();
    unsafe { respond(code, message, result) }
}

pub unsafe extern "C" fn fake_extract_page(
    input_path: *const c_char,
    page_number: i32,
    output_path: *const c_char,
    code: *mut c_int,
    message: *mut *mut c_char,
) -> bool {
    record("pdf_extract_page");
    let result = (|| {
        let source = load_pages(&unsafe { path_arg(input_path) })?;
        if page_number < 1 || page_number as usize > source.len() {
            return Err((
                ErrorCode::InvalidParameter,
                format!("page {page_number} out of range 1..={}", source.len()),
            ));
        }
        let page = source[page_number as usize - 1].clone();
        store_pages(&unsafe { path_arg(output_path) }, &[page])
    })();
    unsafe { respond(code, message, result) }
}

pub unsafe extern "C" fn fake_split_at_page(
    input_path: *const c_char,
    split_page: i32,
    output_prefix: *const c_char,
    code: *mut c_int,
    message: *mut *mut c_char,
) -> bool {
    record("pdf_split_at_page");
    let result = (|| {
        let source = load_pages(&unsafe { path_arg(input_path) })?;
        if split_page < 1 || split_page as usize >= source.len() {
            let message = format!("split page {split_page} out of range");
            return Err((ErrorCode::InvalidParameter, message));
        }
        let prefix = unsafe { path_arg(output_prefix) };
        let (first, second) = source.split_at(split_page as usize);
        store_pages(&suffixed(&prefix, "_part1"), first)?;
        store_pages(&suffixed(&prefix, "_part2"), second)
    })();
    unsafe { respond(code, message, result) }
}

fn suffixed(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

pub unsafe extern "C" fn fake_version() -> *const c_char {
    record("spdfcore_version");
    c"9.9.9-fake".as_ptr()
}

pub unsafe extern "C" fn fake_version_null() -> *const c_char {
    record("spdfcore_version");
    std::ptr::null()
}

pub unsafe extern "C" fn fake_free_string(s: *mut c_char) {
    RELEASED.with(|count| count.set(count.get() + 1));
    drop(unsafe { CString::from_raw(s) });
}

/// Reports success alongside a non-success code and a message.
pub unsafe extern "C" fn fake_page_count_inconsistent(
    _path: *const c_char,
    page_count: *mut i32,
    code: *mut c_int,
    message: *mut *mut c_char,
) -> bool {
    record("pdf_get_page_count");
    unsafe {
        *page_count = 4;
        *code = ErrorCode::InvalidPdf as c_int;
        *message = provider_message("inconsistent");
    }
    true
}

pub unsafe extern "C" fn fake_page_count_negative(
    _path: *const c_char,
    page_count: *mut i32,
    _code: *mut c_int,
    _message: *mut *mut c_char,
) -> bool {
    record("pdf_get_page_count");
    unsafe { *page_count = -5 };
    true
}

/// Sets the validity flag but reports the call itself as failed.
pub unsafe extern "C" fn fake_validate_failed_but_flagged(
    _path: *const c_char,
    is_valid: *mut bool,
    code: *mut c_int,
    message: *mut *mut c_char,
) -> bool {
    record("pdf_validate");
    unsafe {
        *is_valid = true;
        *code = ErrorCode::ParseError as c_int;
        *message = provider_message("trailer damaged");
    }
    false
}

/// Succeeds and still hands back a diagnostic message.
pub unsafe extern "C" fn fake_validate_with_note(
    _path: *const c_char,
    is_valid: *mut bool,
    _code: *mut c_int,
    message: *mut *mut c_char,
) -> bool {
    record("pdf_validate");
    unsafe {
        *is_valid = true;
        *message = provider_message("checked with warnings");
    }
    true
}

#[derive(Clone, Debug)]
pub struct FakeModule {
    symbols: HashMap<&'static str, usize>,
}

impl FakeModule {
    pub fn mandatory_only() -> Self {
        let mut symbols = HashMap::new();
        symbols.insert("pdf_merge_files", fake_merge as usize);
        symbols.insert("pdf_validate", fake_validate as usize);
        symbols.insert("pdf_get_page_count", fake_page_count as usize);
        symbols.insert("free_c_string", fake_free_string as usize);
        Self { symbols }
    }

    pub fn full() -> Self {
        Self::mandatory_only()
            .with("pdf_get_file_size", fake_file_size as usize)
            .with("pdf_split_by_pages", fake_split_by_pages as usize)
            .with("pdf_extract_page", fake_extract_page as usize)
            .with("pdf_split_at_page", fake_split_at_page as usize)
            .with("spdfcore_version", fake_version as usize)
    }

    pub fn with(mut self, name: &'static str, addr: usize) -> Self {
        self.symbols.insert(name, addr);
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.symbols.remove(name);
        self
    }
}

unsafe impl ProviderModule for FakeModule {
    fn symbol(&self, name: &str) -> Option<NonNull<c_void>> {
        self.symbols
            .get(name)
            .and_then(|addr| NonNull::new(*addr as *mut c_void))
    }
}

/// Opener that counts attempts and successful opens.
pub struct FakeOpener {
    module: Mutex<FakeModule>,
    failures_left: AtomicUsize,
    attempts: AtomicUsize,
    opens: AtomicUsize,
    delay: Duration,
    candidates: Mutex<Vec<OsString>>,
}

impl FakeOpener {
    pub fn new(module: FakeModule) -> Self {
        Self {
            module: Mutex::new(module),
            failures_left: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
            opens: AtomicUsize::new(0),
            delay: Duration::ZERO,
            candidates: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_first(self, failures: usize) -> Self {
        self.failures_left.store(failures, Ordering::SeqCst);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_module(&self, module: FakeModule) {
        *self.module.lock().expect("module lock") = module;
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn candidates(&self) -> Vec<OsString> {
        self.candidates.lock().expect("candidates lock").clone()
    }
}

impl ModuleOpener for FakeOpener {
    fn open(&self, candidate: &OsStr) -> Result<Box<dyn ProviderModule>, Error> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.candidates
            .lock()
            .expect("candidates lock")
            .push(candidate.to_os_string());
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::new(ErrorKind::Unavailable)
                .with_message("fake open failure")
                .with_path(candidate));
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        let module = self.module.lock().expect("module lock").clone();
        Ok(Box::new(module))
    }
}

pub fn bridge_with(module: FakeModule) -> (Bridge, Arc<FakeOpener>) {
    let opener = Arc::new(FakeOpener::new(module));
    let bridge = Bridge::with_opener(BridgeConfig::default(), opener.clone());
    (bridge, opener)
}
