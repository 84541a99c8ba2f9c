//! Purpose: Typed provider ABI signatures and the resolved symbol table.
//! Exports: `SymbolTable`, `Entry`, and the `*Fn` pointer types.
//! Role: Registry every facade call consults before invoking the provider.
//! Invariants: A table only exists when all mandatory capabilities resolved.
//! Invariants: Tables are immutable after construction; absent entries are never called.
//! Notes: Error codes travel as raw `c_int` so out-of-range values stay well defined.
use crate::core::capability::Capability;
use crate::core::error::{Error, ErrorKind};
use crate::core::loader::ProviderModule;
use libc::{c_char, c_int, c_void};
use std::fmt;
use std::mem;
use std::ptr::NonNull;
use tracing::{debug, info};

pub type MergeFilesFn = unsafe extern "C" fn(
    input_paths: *const *const c_char,
    path_count: usize,
    output_path: *const c_char,
    error_code: *mut c_int,
    error_message: *mut *mut c_char,
) -> bool;

pub type ValidateFn = unsafe extern "C" fn(
    file_path: *const c_char,
    is_valid: *mut bool,
    error_code: *mut c_int,
    error_message: *mut *mut c_char,
) -> bool;

pub type PageCountFn = unsafe extern "C" fn(
    file_path: *const c_char,
    page_count: *mut i32,
    error_code: *mut c_int,
    error_message: *mut *mut c_char,
) -> bool;

pub type FileSizeFn = unsafe extern "C" fn(
    file_path: *const c_char,
    file_size: *mut u64,
    error_code: *mut c_int,
    error_message: *mut *mut c_char,
) -> bool;

pub type SplitByPagesFn = unsafe extern "C" fn(
    input_path: *const c_char,
    pages: *const i32,
    page_count: usize,
    output_path: *const c_char,
    error_code: *mut c_int,
    error_message: *mut *mut c_char,
) -> bool;

pub type ExtractPageFn = unsafe extern "C" fn(
    input_path: *const c_char,
    page_number: i32,
    output_path: *const c_char,
    error_code: *mut c_int,
    error_message: *mut *mut c_char,
) -> bool;

pub type SplitAtPageFn = unsafe extern "C" fn(
    input_path: *const c_char,
    split_page: i32,
    output_prefix: *const c_char,
    error_code: *mut c_int,
    error_message: *mut *mut c_char,
) -> bool;

pub type VersionFn = unsafe extern "C" fn() -> *const c_char;

pub type FreeStringFn = unsafe extern "C" fn(s: *mut c_char);

/// Availability of an optional capability in the loaded provider build.
#[derive(Clone, Copy)]
pub enum Entry<F> {
    Present(F),
    Absent,
}

impl<F: Copy> Entry<F> {
    pub fn is_present(&self) -> bool {
        matches!(self, Entry::Present(_))
    }

    /// Returns the entry point, or an unsupported-feature error naming `capability`.
    pub fn require(self, capability: Capability) -> Result<F, Error> {
        match self {
            Entry::Present(call) => Ok(call),
            Entry::Absent => Err(Error::unsupported(capability)),
        }
    }
}

impl<F> fmt::Debug for Entry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Present(_) => f.write_str("Present"),
            Entry::Absent => f.write_str("Absent"),
        }
    }
}

pub struct SymbolTable {
    merge: MergeFilesFn,
    validate: ValidateFn,
    page_count: PageCountFn,
    free_string: FreeStringFn,
    file_size: Entry<FileSizeFn>,
    split_by_pages: Entry<SplitByPagesFn>,
    extract_page: Entry<ExtractPageFn>,
    split_at_page: Entry<SplitAtPageFn>,
    version: Entry<VersionFn>,
}

impl SymbolTable {
    /// Resolves every capability against `module`.
    ///
    /// Fails with `ErrorKind::Unavailable` on the first missing mandatory
    /// capability. Missing optional capabilities are logged and recorded as
    /// `Entry::Absent`.
    pub fn resolve(module: &dyn ProviderModule) -> Result<Self, Error> {
        // SAFETY (all casts below): `ProviderModule` is an unsafe trait whose
        // implementors guarantee each symbol matches its declared signature.
        unsafe {
            Ok(Self {
                merge: mandatory(module, Capability::Merge)?,
                validate: mandatory(module, Capability::Validate)?,
                page_count: mandatory(module, Capability::PageCount)?,
                free_string: mandatory(module, Capability::FreeString)?,
                file_size: optional(module, Capability::FileSize),
                split_by_pages: optional(module, Capability::SplitByPages),
                extract_page: optional(module, Capability::ExtractPage),
                split_at_page: optional(module, Capability::SplitAtPage),
                version: optional(module, Capability::Version),
            })
        }
    }

    pub fn is_available(&self, capability: Capability) -> bool {
        match capability {
            Capability::Merge
            | Capability::Validate
            | Capability::PageCount
            | Capability::FreeString => true,
            Capability::FileSize => self.file_size.is_present(),
            Capability::SplitByPages => self.split_by_pages.is_present(),
            Capability::ExtractPage => self.extract_page.is_present(),
            Capability::SplitAtPage => self.split_at_page.is_present(),
            Capability::Version => self.version.is_present(),
        }
    }

    pub fn available(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|cap| self.is_available(*cap))
            .collect()
    }

    pub fn missing(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|cap| !self.is_available(*cap))
            .collect()
    }

    pub fn merge(&self) -> MergeFilesFn {
        self.merge
    }

    pub fn validate(&self) -> ValidateFn {
        self.validate
    }

    pub fn page_count(&self) -> PageCountFn {
        self.page_count
    }

    pub fn free_string(&self) -> FreeStringFn {
        self.free_string
    }

    pub fn file_size(&self) -> Entry<FileSizeFn> {
        self.file_size
    }

    pub fn split_by_pages(&self) -> Entry<SplitByPagesFn> {
        self.split_by_pages
    }

    pub fn extract_page(&self) -> Entry<ExtractPageFn> {
        self.extract_page
    }

    pub fn split_at_page(&self) -> Entry<SplitAtPageFn> {
        self.split_at_page
    }

    pub fn version(&self) -> Entry<VersionFn> {
        self.version
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.available().into_iter().map(Capability::symbol).collect();
        f.debug_struct("SymbolTable").field("available", &names).finish()
    }
}

unsafe fn mandatory<F: Copy>(
    module: &dyn ProviderModule,
    capability: Capability,
) -> Result<F, Error> {
    match module.symbol(capability.symbol()) {
        Some(addr) => {
            debug!(symbol = capability.symbol(), "resolved mandatory capability");
            Ok(unsafe { cast(addr) })
        }
        None => Err(Error::new(ErrorKind::Unavailable)
            .with_capability(capability)
            .with_message(format!("cannot load {}", capability.symbol()))),
    }
}

unsafe fn optional<F: Copy>(module: &dyn ProviderModule, capability: Capability) -> Entry<F> {
    match module.symbol(capability.symbol()) {
        Some(addr) => Entry::Present(unsafe { cast(addr) }),
        None => {
            info!("{} not available in this version", capability.symbol());
            Entry::Absent
        }
    }
}

unsafe fn cast<F: Copy>(addr: NonNull<c_void>) -> F {
    debug_assert_eq!(mem::size_of::<F>(), mem::size_of::<*mut c_void>());
    let raw = addr.as_ptr();
    unsafe { mem::transmute_copy::<*mut c_void, F>(&raw) }
}
