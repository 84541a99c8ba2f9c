//! Purpose: Error-channel protocol shared by every provider call.
//! Exports: `ProviderString`, `ErrorSlot`, `ErrorEnvelope`, `exchange`.
//! Role: Interprets (returned bool, code, message) triples and owns message release.
//! Invariants: Success means returned == true AND code == Success; anything else fails.
//! Invariants: A provider message is released exactly once, through the provider, never read after.
//! Invariants: Messages are surfaced verbatim; none are synthesised from codes.
use crate::core::capability::Capability;
use crate::core::error::{Error, ErrorCode, ErrorKind};
use crate::core::symbols::FreeStringFn;
use libc::{c_char, c_int};
use std::ffi::CStr;
use std::fmt;
use std::ptr::{self, NonNull};
use tracing::{debug, warn};

/// A string allocated by the provider.
///
/// The only ways to consume it are `into_string` or drop; both hand the
/// buffer back to the provider's release function.
pub struct ProviderString {
    ptr: NonNull<c_char>,
    release: FreeStringFn,
}

impl ProviderString {
    /// Takes ownership of a provider-allocated string.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a NUL-terminated buffer allocated by the provider
    /// that `release` frees, and no one else may release it.
    pub unsafe fn from_raw(ptr: *mut c_char, release: FreeStringFn) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr, release })
    }

    pub fn to_string_lossy(&self) -> String {
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    /// Copies the text out, then releases the provider buffer.
    pub fn into_string(self) -> String {
        self.to_string_lossy()
    }
}

impl Drop for ProviderString {
    fn drop(&mut self) {
        unsafe { (self.release)(self.ptr.as_ptr()) };
    }
}

impl fmt::Debug for ProviderString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProviderString")
            .field(&self.to_string_lossy())
            .finish()
    }
}

/// The `error_code` / `error_message` out-parameters of one provider call.
pub struct ErrorSlot {
    code: c_int,
    message: *mut c_char,
    release: FreeStringFn,
    capability: Capability,
}

impl ErrorSlot {
    pub fn new(release: FreeStringFn, capability: Capability) -> Self {
        Self {
            code: ErrorCode::Success as c_int,
            message: ptr::null_mut(),
            release,
            capability,
        }
    }

    pub fn code_ptr(&mut self) -> *mut c_int {
        &mut self.code
    }

    pub fn message_ptr(&mut self) -> *mut *mut c_char {
        &mut self.message
    }

    /// Reads both outputs and releases the message, if any.
    pub fn finish(mut self, returned: bool) -> ErrorEnvelope {
        let raw = std::mem::replace(&mut self.message, ptr::null_mut());
        let message = unsafe { ProviderString::from_raw(raw, self.release) }
            .map(ProviderString::into_string);
        ErrorEnvelope {
            capability: self.capability,
            outcome: returned,
            raw_code: self.code,
            code: ErrorCode::from_raw(self.code),
            message,
        }
    }
}

impl Drop for ErrorSlot {
    fn drop(&mut self) {
        let raw = std::mem::replace(&mut self.message, ptr::null_mut());
        drop(unsafe { ProviderString::from_raw(raw, self.release) });
    }
}

/// Outcome, typed code and optional diagnostic of one provider call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ErrorEnvelope {
    pub capability: Capability,
    pub outcome: bool,
    pub raw_code: i32,
    pub code: ErrorCode,
    pub message: Option<String>,
}

impl ErrorEnvelope {
    pub fn succeeded(&self) -> bool {
        self.outcome && self.code.is_success()
    }

    pub fn into_result(self) -> Result<(), Error> {
        let symbol = self.capability.symbol();
        match (self.outcome, self.code.is_success()) {
            (true, true) => {
                if let Some(message) = &self.message {
                    debug!(symbol, message = %message, "provider returned a message on success");
                }
                Ok(())
            }
            (true, false) => {
                warn!(
                    symbol,
                    code = self.raw_code,
                    "provider reported success with a failure code"
                );
                Err(self.to_error(ErrorKind::Contract, self.code))
            }
            (false, true) => {
                warn!(symbol, "provider reported failure without a failure code");
                Err(self.to_error(ErrorKind::Contract, ErrorCode::UnknownError))
            }
            (false, false) => {
                debug!(
                    symbol,
                    code = self.raw_code,
                    message = ?self.message,
                    "provider call failed"
                );
                Err(self.to_error(ErrorKind::Provider, self.code))
            }
        }
    }

    fn to_error(&self, kind: ErrorKind, code: ErrorCode) -> Error {
        let err = Error::new(kind)
            .with_code(code)
            .with_capability(self.capability);
        match &self.message {
            Some(message) => err.with_message(message.clone()),
            None => err,
        }
    }
}

/// Runs one provider call with a fresh error slot and interprets the result.
pub fn exchange(
    release: FreeStringFn,
    capability: Capability,
    call: impl FnOnce(*mut c_int, *mut *mut c_char) -> bool,
) -> ErrorEnvelope {
    let mut slot = ErrorSlot::new(release, capability);
    let returned = call(slot.code_ptr(), slot.message_ptr());
    slot.finish(returned)
}
