//! Purpose: Explicit bridge context that owns the provider load state.
//! Exports: `Bridge`, `ApiResult`.
//! Role: Entry object for every facade operation; replaces hidden process globals.
//! Invariants: At most one successful load per `Bridge`; later calls reuse it.
//! Invariants: Failed loads leave no state behind so the next call retries from scratch.
//! Invariants: Concurrent first calls serialise on `load_lock`; reads after load take no lock.
#![allow(clippy::result_large_err)]

use crate::config::BridgeConfig;
use crate::core::error::Error;
use crate::core::loader::{ModuleOpener, Provider, SystemOpener};
use std::fmt;
use std::sync::{Mutex, OnceLock};
use tracing::debug;

pub type ApiResult<T> = Result<T, Error>;

pub struct Bridge {
    config: BridgeConfig,
    opener: Box<dyn ModuleOpener>,
    provider: OnceLock<Provider>,
    load_lock: Mutex<()>,
}

impl Bridge {
    /// Bridge that loads the provider through the platform dynamic loader.
    pub fn new(config: BridgeConfig) -> Self {
        Self::with_opener(config, SystemOpener)
    }

    pub fn with_opener(config: BridgeConfig, opener: impl ModuleOpener + 'static) -> Self {
        Self {
            config,
            opener: Box::new(opener),
            provider: OnceLock::new(),
            load_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Loads the provider on first use and returns it.
    pub fn ensure_loaded(&self) -> ApiResult<&Provider> {
        if let Some(provider) = self.provider.get() {
            return Ok(provider);
        }
        let _guard = self
            .load_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(provider) = self.provider.get() {
            debug!("provider loaded by a concurrent caller");
            return Ok(provider);
        }
        let provider = Provider::load(self.opener.as_ref(), &self.config)?;
        Ok(self.provider.get_or_init(|| provider))
    }

    /// Boolean form of `ensure_loaded` for boundary callers.
    pub fn initialize(&self) -> bool {
        self.ensure_loaded().is_ok()
    }

    pub fn is_loaded(&self) -> bool {
        self.provider.get().is_some()
    }

    pub fn provider(&self) -> Option<&Provider> {
        self.provider.get()
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("provider", &self.provider.get())
            .finish()
    }
}
