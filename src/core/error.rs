//! Purpose: Error model shared by the loader, the error channel, and the facade.
//! Exports: `ErrorCode` (provider wire taxonomy), `ErrorKind`, `Error`, `to_wire_code`.
//! Role: Single error type surfaced to Rust callers and flattened by the C ABI.
//! Invariants: `ErrorCode` values match the provider header and never change.
//! Invariants: Unknown raw provider codes collapse to `ErrorCode::UnknownError`.
use crate::core::capability::Capability;
use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

/// Typed error codes reported by the provider through its `PdfErrorCode*` out-parameter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,
    FileNotFound = 1,
    InvalidPdf = 2,
    EncryptedPdf = 3,
    PermissionDenied = 4,
    OutOfMemory = 5,
    InvalidParameter = 6,
    UnsupportedFeature = 7,
    IoError = 8,
    ParseError = 9,
    EncryptionError = 10,
    UnknownError = 99,
}

impl ErrorCode {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => ErrorCode::Success,
            1 => ErrorCode::FileNotFound,
            2 => ErrorCode::InvalidPdf,
            3 => ErrorCode::EncryptedPdf,
            4 => ErrorCode::PermissionDenied,
            5 => ErrorCode::OutOfMemory,
            6 => ErrorCode::InvalidParameter,
            7 => ErrorCode::UnsupportedFeature,
            8 => ErrorCode::IoError,
            9 => ErrorCode::ParseError,
            10 => ErrorCode::EncryptionError,
            _ => ErrorCode::UnknownError,
        }
    }

    pub fn is_success(self) -> bool {
        self == ErrorCode::Success
    }

    pub fn label(self) -> &'static str {
        match self {
            ErrorCode::Success => "success",
            ErrorCode::FileNotFound => "file not found",
            ErrorCode::InvalidPdf => "invalid pdf",
            ErrorCode::EncryptedPdf => "encrypted pdf",
            ErrorCode::PermissionDenied => "permission denied",
            ErrorCode::OutOfMemory => "out of memory",
            ErrorCode::InvalidParameter => "invalid parameter",
            ErrorCode::UnsupportedFeature => "unsupported feature",
            ErrorCode::IoError => "io error",
            ErrorCode::ParseError => "parse error",
            ErrorCode::EncryptionError => "encryption error",
            ErrorCode::UnknownError => "unknown error",
        }
    }
}

/// Which side of the boundary a failure came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Provider module could not be opened or lacks a mandatory capability.
    Unavailable,
    /// Optional capability is absent in the loaded provider build.
    Unsupported,
    /// Caller input rejected before any provider call.
    Usage,
    /// Provider ran and reported a typed failure.
    Provider,
    /// Provider returned an internally inconsistent result.
    Contract,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    code: ErrorCode,
    message: Option<String>,
    path: Option<PathBuf>,
    capability: Option<Capability>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    /// Creates an error with the code that naturally belongs to `kind`.
    pub fn new(kind: ErrorKind) -> Self {
        let code = match kind {
            ErrorKind::Unsupported => ErrorCode::UnsupportedFeature,
            ErrorKind::Usage => ErrorCode::InvalidParameter,
            ErrorKind::Unavailable | ErrorKind::Provider | ErrorKind::Contract => {
                ErrorCode::UnknownError
            }
        };
        Self {
            kind,
            code,
            message: None,
            path: None,
            capability: None,
            source: None,
        }
    }

    pub fn unsupported(capability: Capability) -> Self {
        Self::new(ErrorKind::Unsupported)
            .with_capability(capability)
            .with_message(format!("{} not available in this provider version", capability.symbol()))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    pub fn capability(&self) -> Option<Capability> {
        self.capability
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = Some(capability);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self.kind, self.code.label())?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(capability) = self.capability {
            write!(f, " (capability: {})", capability.symbol())?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_wire_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Unavailable => 1,
        ErrorKind::Unsupported => 2,
        ErrorKind::Usage => 3,
        ErrorKind::Provider => 4,
        ErrorKind::Contract => 5,
    }
}
