//! rpc-serve-core: Shared server-side primitives for opnum-routed RPC services.
//!
//! This crate provides the building blocks used by `rpc-dispatch`: the NDR codec
//! that turns request and response stubs into typed values, interface identities,
//! the per-call context carrying cancellation and deadlines, the connection-oriented
//! PDU headers used to correlate replies with requests, and the error type handlers
//! report infrastructure failures with.
//!
#![deny(missing_docs, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod ndr;
pub mod pdu;
pub mod syntax;

pub use context::CallContext;
pub use error::HandlerError;
pub use syntax::{SyntaxId, Version};
