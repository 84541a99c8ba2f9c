// Bridge core: provider loading, symbol binding, marshaling, and the error channel.
pub mod capability;
pub mod channel;
pub mod error;
pub mod loader;
pub mod marshal;
pub mod symbols;
