//! Purpose: Runtime bridge to the externally versioned `spdfcore_ffi` document provider.
//! Exports: `api` (Rust facade), `abi` (C surface for managed runtimes), `config`, `core`.
//! Role: Locate and bind the provider at runtime, marshal calls, and own the error channel.
//! Invariants: Document semantics live in the provider; this crate never interprets documents.
//! Invariants: Provider-allocated strings are only ever released through the provider.
pub mod abi;
pub mod api;
pub mod config;
pub mod core;
