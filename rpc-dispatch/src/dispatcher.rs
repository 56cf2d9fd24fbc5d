//! Routing of individual calls to the handler of one interface.

use std::sync::Arc;
use std::time::Instant;

use rpc_serve_core::ndr::Reader;
use rpc_serve_core::pdu::RequestHeader;
use rpc_serve_core::{CallContext, HandlerError, SyntaxId};
use tracing::{debug, warn, Instrument};

use crate::server::{FaultReply, Reply};
use crate::table::Slot;
use crate::{BuildError, Error, Interface, OperationTable, Result, ServerOptions};

/// Routes calls of one interface to a handler.
///
/// The dispatcher owns nothing mutable: the handler is shared behind an [`Arc`] and the
/// operation table is immutable, so a single dispatcher can serve any number of concurrent
/// calls, and cloning it is cheap.
pub struct Dispatcher<S: ?Sized> {
    server: Arc<S>,
    table: Arc<OperationTable<S>>,
    syntax: SyntaxId,
    options: ServerOptions,
}

impl<S: ?Sized> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            server: Arc::clone(&self.server),
            table: Arc::clone(&self.table),
            syntax: self.syntax,
            options: self.options.clone(),
        }
    }
}

impl<S: ?Sized> std::fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("interface", &self.table.interface())
            .field("syntax", &self.syntax)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<S: Interface + ?Sized> Dispatcher<S> {
    /// Serve the interface `S` with `server`, binding its operation table under `syntax`.
    pub fn new(server: Arc<S>, syntax: SyntaxId) -> std::result::Result<Self, BuildError> {
        Ok(Self::from_table(server, S::operations()?, syntax))
    }

    /// Like [`new()`](Self::new), using the syntax the interface declares.
    pub fn for_interface(server: Arc<S>) -> std::result::Result<Self, BuildError> {
        Self::new(server, S::SYNTAX)
    }
}

impl<S: ?Sized + Send + Sync + 'static> Dispatcher<S> {
    /// Serve `table` with `server`, binding it under `syntax`.
    pub fn from_table(server: Arc<S>, table: OperationTable<S>, syntax: SyntaxId) -> Self {
        Self {
            server,
            table: Arc::new(table),
            syntax,
            options: ServerOptions::default(),
        }
    }

    /// Replace the options after validating them.
    pub fn with_options(mut self, options: ServerOptions) -> std::result::Result<Self, BuildError> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    /// The syntax this dispatcher is bound under.
    pub fn syntax(&self) -> SyntaxId {
        self.syntax
    }

    /// The operation table calls are routed through.
    pub fn table(&self) -> &OperationTable<S> {
        &self.table
    }

    /// The options in effect.
    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    /// The handler calls are routed to.
    pub fn server(&self) -> &Arc<S> {
        &self.server
    }

    /// Decode `stub` as the request of `opnum`, invoke the handler and return the encoded response.
    ///
    /// The handler is invoked at most once, and only after the request decoded successfully.
    /// Logical failures a handler reports through its response come back as `Ok`; errors are
    /// reserved for calls that couldn't be routed, decoded, completed or encoded.
    ///
    /// The call is abandoned with [`HandlerError::Cancelled`] or [`HandlerError::DeadlineExceeded`]
    /// as soon as `ctx` is cancelled or its deadline passes. If `ctx` has no deadline, the
    /// configured call timeout applies.
    pub async fn dispatch(&self, ctx: &CallContext, opnum: u16, stub: &[u8]) -> Result<Vec<u8>> {
        let span = tracing::debug_span!(
            "dispatch",
            interface = self.table.interface(),
            opnum,
            operation = tracing::field::Empty
        );
        async {
            let result = self.route_and_invoke(ctx, opnum, stub).await;
            match &result {
                Ok(response) => debug!(response_len = response.len(), "call completed"),
                Err(err) if err.kind().is_pre_invocation() => warn!(error = %err, "call rejected"),
                Err(err) => debug!(error = %err, "call failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Like [`dispatch()`](Self::dispatch), but correlate the outcome with `header`.
    ///
    /// The returned reply or fault carries the call id and presentation context of the request.
    pub async fn call(
        &self,
        ctx: &CallContext,
        header: &RequestHeader,
        stub: &[u8],
    ) -> std::result::Result<Reply, FaultReply> {
        match self.dispatch(ctx, header.opnum, stub).await {
            Ok(response) => Ok(Reply::new(header, response)),
            Err(err) => Err(FaultReply::new(header, err)),
        }
    }

    async fn route_and_invoke(&self, ctx: &CallContext, opnum: u16, stub: &[u8]) -> Result<Vec<u8>> {
        let interface = self.table.interface();
        let entry = self
            .table
            .get(opnum)
            .ok_or(Error::UnknownOperation { interface, opnum })?;
        let operation = entry.name();
        tracing::Span::current().record("operation", operation);
        let route = match entry.slot {
            Slot::Bound(route) => route,
            Slot::Reserved => {
                return Err(Error::ReservedOperation {
                    interface,
                    opnum,
                    name: operation,
                })
            }
        };

        if stub.len() > self.options.max_stub_size {
            return Err(Error::StubTooLarge {
                operation,
                len: stub.len(),
                limit: self.options.max_stub_size,
            });
        }

        let ctx = match (ctx.deadline(), self.options.call_timeout) {
            (None, Some(timeout)) => ctx.with_timeout(timeout),
            _ => ctx.clone(),
        };

        let mut reader = Reader::new(stub);
        let invocation =
            route(Arc::clone(&self.server), ctx.clone(), &mut reader).map_err(|source| Error::Decode { operation, source })?;
        if self.options.reject_trailing_bytes {
            // Dropping the invocation unpolled leaves the handler untouched.
            reader.finish().map_err(|source| Error::Decode { operation, source })?;
        }

        let abandoned = |source| Error::Handler { operation, source };
        tokio::select! {
            biased;
            () = ctx.cancelled() => Err(abandoned(HandlerError::Cancelled)),
            () = expired(ctx.deadline()) => Err(abandoned(HandlerError::DeadlineExceeded)),
            result = invocation => result,
        }
    }
}

async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}
