//! Operation-number dispatch for RPC interfaces
//!
//! This crate routes inbound calls, identified by an operation number (opnum) and an
//! NDR-encoded request stub, to the application's implementation of an interface, and
//! turns whatever the implementation returns back into a response stub.
//!
//! # Features
//!
//! - Declarative interfaces via [`interface!`]: one async method per opnum, a fallback
//!   implementation rejecting every call as not implemented, and the operation table
//! - O(1) opnum lookup in an immutable, shareable [`OperationTable`]
//! - Cancellation and deadlines propagated through [`CallContext`]
//! - Strict separation of routing faults, decode failures and handler infrastructure
//!   failures from logical failures, which stay inside the response
//! - A multi-interface [`Server`] with per-connection presentation context binding
//!
//! # Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use rpc_dispatch::{interface, record, CallContext, Dispatcher, HandlerError, SyntaxId, Version};
//! use rpc_dispatch::uuid::Uuid;
//!
//! record! {
//!     /// Request of the `add` operation.
//!     #[derive(Debug)]
//!     pub struct AddRequest { pub a: u32, pub b: u32 }
//! }
//! record! {
//!     /// Response of the `add` operation.
//!     #[derive(Debug, PartialEq)]
//!     pub struct AddResponse { pub sum: u32, pub status: u32 }
//! }
//!
//! interface! {
//!     /// A calculator.
//!     pub trait Calculator {
//!         name = "calculator";
//!         syntax = SyntaxId::new(Uuid::from_u128(0x6bffd098_a112_3610_9833_46c3f87e345a), Version::new(1, 0));
//!         fallback = UnimplementedCalculator;
//!         operations {
//!             0 => fn add(AddRequest) -> AddResponse;
//!         }
//!     }
//! }
//!
//! struct Adder;
//!
//! #[rpc_dispatch::async_trait]
//! impl Calculator for Adder {
//!     async fn add(&self, _ctx: &CallContext, req: AddRequest) -> Result<AddResponse, HandlerError> {
//!         Ok(AddResponse { sum: req.a + req.b, status: 0 })
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build()?.block_on(async {
//! let dispatcher = Dispatcher::<dyn Calculator>::for_interface(Arc::new(Adder))?;
//! let stub = rpc_dispatch::ndr::to_vec(&AddRequest { a: 2, b: 3 })?;
//! let out = dispatcher.dispatch(&CallContext::new(), 0, &stub).await?;
//! let resp: AddResponse = rpc_dispatch::ndr::from_slice(&out)?;
//! assert_eq!(resp, AddResponse { sum: 5, status: 0 });
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dispatcher;
pub mod error;
mod interface;
pub mod server;
pub mod table;

pub use config::ServerOptions;
pub use dispatcher::Dispatcher;
pub use error::{BuildError, Error, ErrorKind, Result};
pub use interface::Interface;
pub use server::{Association, FaultReply, Reply, Server, ServerBuilder, ServerHandle};
pub use table::OperationTable;

pub use rpc_serve_core::{ndr, pdu, record, CallContext, HandlerError, SyntaxId, Version};

pub use async_trait::async_trait;

/// Re-export of the `uuid` crate used for interface identities.
pub mod uuid {
    pub use rpc_serve_core::syntax::Uuid;
}

/// The version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
