//! Purpose: Open the provider module and bind its capabilities.
//! Exports: `ProviderModule`, `ModuleOpener`, `SystemOpener`, `Provider`.
//! Role: One-shot load sequence behind `Bridge::ensure_loaded`.
//! Invariants: A `Provider` owns its module for as long as its symbols are reachable.
//! Invariants: A failed bind drops the module; nothing partial survives.
use crate::config::BridgeConfig;
use crate::core::error::{Error, ErrorKind};
use crate::core::symbols::SymbolTable;
use libc::c_void;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;
use tracing::{debug, error, info};

/// A loaded module that can hand out exported symbol addresses.
///
/// # Safety
///
/// Every address returned for a capability symbol must point at a function
/// with the signature declared for it in `core::symbols`, and must stay valid
/// for as long as the module value is alive.
pub unsafe trait ProviderModule: Send + Sync {
    fn symbol(&self, name: &str) -> Option<NonNull<c_void>>;
}

/// Opens provider modules by file name or path.
pub trait ModuleOpener: Send + Sync {
    fn open(&self, candidate: &OsStr) -> Result<Box<dyn ProviderModule>, Error>;
}

impl<T: ModuleOpener + ?Sized> ModuleOpener for Arc<T> {
    fn open(&self, candidate: &OsStr) -> Result<Box<dyn ProviderModule>, Error> {
        (**self).open(candidate)
    }
}

/// Opens modules through the platform dynamic loader (`dlopen`/`LoadLibrary`).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemOpener;

struct SystemModule {
    library: libloading::Library,
}

unsafe impl ProviderModule for SystemModule {
    fn symbol(&self, name: &str) -> Option<NonNull<c_void>> {
        let mut bytes = Vec::with_capacity(name.len() + 1);
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(0);
        let symbol = unsafe { self.library.get::<*mut c_void>(&bytes) }.ok()?;
        NonNull::new(*symbol)
    }
}

impl ModuleOpener for SystemOpener {
    fn open(&self, candidate: &OsStr) -> Result<Box<dyn ProviderModule>, Error> {
        // Provider initialisers run here; the provider ABI contract covers them.
        let library = unsafe { libloading::Library::new(candidate) }.map_err(|err| {
            Error::new(ErrorKind::Unavailable)
                .with_message("cannot load provider library")
                .with_path(candidate)
                .with_source(err)
        })?;
        Ok(Box::new(SystemModule { library }))
    }
}

pub struct Provider {
    symbols: SymbolTable,
    origin: OsString,
    // Keeps every address in `symbols` valid; never closed while loaded.
    _module: Box<dyn ProviderModule>,
}

impl Provider {
    /// Tries each configured candidate until one opens, then binds it.
    ///
    /// A module that opens but lacks a mandatory capability ends the attempt;
    /// later candidates are not tried.
    pub fn load(opener: &dyn ModuleOpener, config: &BridgeConfig) -> Result<Self, Error> {
        let mut last_err = None;
        for candidate in config.candidates() {
            match opener.open(&candidate) {
                Ok(module) => return Self::bind(module, candidate),
                Err(err) => {
                    debug!(
                        candidate = %candidate.to_string_lossy(),
                        error = %err,
                        "provider candidate failed"
                    );
                    last_err = Some(err);
                }
            }
        }
        let err = last_err.unwrap_or_else(|| {
            Error::new(ErrorKind::Unavailable).with_message("no provider library candidates")
        });
        error!(error = %err, "cannot load provider library");
        Err(err)
    }

    pub fn bind(module: Box<dyn ProviderModule>, origin: OsString) -> Result<Self, Error> {
        let symbols = match SymbolTable::resolve(module.as_ref()) {
            Ok(symbols) => symbols,
            Err(err) => {
                error!(
                    library = %origin.to_string_lossy(),
                    error = %err,
                    "provider is missing a mandatory capability"
                );
                drop(module);
                return Err(err);
            }
        };
        info!(
            library = %origin.to_string_lossy(),
            available = symbols.available().len(),
            "loaded provider library"
        );
        Ok(Self {
            symbols,
            origin,
            _module: module,
        })
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The candidate name or path the module was opened from.
    pub fn origin(&self) -> &OsStr {
        &self.origin
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("origin", &self.origin)
            .field("symbols", &self.symbols)
            .finish()
    }
}
