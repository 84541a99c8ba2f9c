//! Purpose: Define the public Rust API boundary of the bridge.
//! Exports: `Bridge`, report types, and the error/capability types callers match on.
//! Role: Surface used by Rust callers and by the C ABI layer.
//! Invariants: Raw provider pointers never appear in this surface.
//! Invariants: Every operation returns `ApiResult`, except the infallible version and info queries.

mod bridge;
mod operations;
mod report;

pub use crate::config::BridgeConfig;
pub use crate::core::capability::{Capability, Requirement};
pub use crate::core::error::{Error, ErrorCode, ErrorKind};
#[doc(hidden)]
pub use crate::core::error::to_wire_code;
pub use crate::core::loader::{ModuleOpener, Provider, ProviderModule, SystemOpener};
pub use bridge::{ApiResult, Bridge};
pub use operations::UNKNOWN_VERSION;
pub use report::{
    CapabilityReport, DocumentInfo, PART1_SUFFIX, PART2_SUFFIX, SplitOutputs, to_json_string,
};
