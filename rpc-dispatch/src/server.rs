//! Serving several interfaces and binding them to presentation contexts per connection.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rpc_serve_core::ndr::{self, Writer};
use rpc_serve_core::pdu::{Fault, RequestHeader, ResponseHeader};
use rpc_serve_core::syntax::Uuid;
use rpc_serve_core::{CallContext, HandlerError, SyntaxId};
use tracing::debug;

use crate::{BuildError, Dispatcher, Error, Interface, Result, ServerOptions};

/// A successful reply: the response header followed by the encoded response stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Correlates the reply with its request.
    pub header: ResponseHeader,
    /// The encoded response.
    pub stub: Vec<u8>,
}

impl Reply {
    /// Answer the request described by `request` with `stub`.
    pub fn new(request: &RequestHeader, stub: Vec<u8>) -> Self {
        Self {
            header: ResponseHeader::reply_to(request, stub.len()),
            stub,
        }
    }

    /// Serialize header and stub.
    pub fn encode(&self) -> std::result::Result<Vec<u8>, ndr::Error> {
        let mut w = Writer::with_capacity(16 + self.stub.len());
        w.write(&self.header)?;
        w.write_bytes(&self.stub);
        Ok(w.into_inner())
    }
}

/// A failed call: the fault header sent to the peer and the error that caused it.
#[derive(Debug)]
pub struct FaultReply {
    /// Correlates the fault with its request and carries the status.
    pub header: Fault,
    /// Why the call failed.
    pub error: Error,
}

impl FaultReply {
    /// Answer the request described by `request` with the fault status of `error`.
    pub fn new(request: &RequestHeader, error: Error) -> Self {
        let mut header = Fault::reply_to(request, error.fault_status());
        if matches!(error.handler_error(), Some(HandlerError::Cancelled)) {
            header.cancel_count = 1;
        }
        Self { header, error }
    }

    /// Serialize the fault header.
    pub fn encode(&self) -> std::result::Result<Vec<u8>, ndr::Error> {
        ndr::to_vec(&self.header)
    }
}

impl std::fmt::Display for FaultReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "call {} faulted with {:#x}", self.header.call_id, self.header.status)
    }
}

impl std::error::Error for FaultReply {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// A type-erased dispatcher, as stored by a [`Server`].
#[async_trait]
pub trait ServerHandle: Send + Sync {
    /// Name of the served interface.
    fn interface(&self) -> &'static str;

    /// Syntax the interface is bound under.
    fn syntax(&self) -> SyntaxId;

    /// See [`Dispatcher::dispatch()`].
    async fn dispatch(&self, ctx: &CallContext, opnum: u16, stub: &[u8]) -> Result<Vec<u8>>;
}

#[async_trait]
impl<S: ?Sized + Send + Sync + 'static> ServerHandle for Dispatcher<S> {
    fn interface(&self) -> &'static str {
        self.table().interface()
    }

    fn syntax(&self) -> SyntaxId {
        Dispatcher::syntax(self)
    }

    async fn dispatch(&self, ctx: &CallContext, opnum: u16, stub: &[u8]) -> Result<Vec<u8>> {
        Dispatcher::dispatch(self, ctx, opnum, stub).await
    }
}

/// Collects the interfaces of a [`Server`].
#[derive(Default)]
pub struct ServerBuilder {
    options: ServerOptions,
    handles: Vec<Arc<dyn ServerHandle>>,
    served: bool,
}

impl ServerBuilder {
    /// Options used by dispatchers created through [`serve()`](Self::serve).
    ///
    /// Options must be set before the first `serve()`, which captures them. Setting them later is
    /// rejected. Dispatchers added through [`register()`](Self::register) keep their own options.
    pub fn options(mut self, options: ServerOptions) -> std::result::Result<Self, BuildError> {
        if self.served {
            return Err(BuildError::InvalidOptions("options must be set before serving interfaces"));
        }
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    /// Serve the interface `S` with `server`.
    pub fn serve<S: Interface + ?Sized>(mut self, server: Arc<S>) -> std::result::Result<Self, BuildError> {
        let dispatcher = Dispatcher::for_interface(server)?.with_options(self.options.clone())?;
        self.served = true;
        Ok(self.register(dispatcher))
    }

    /// Add an already configured dispatcher.
    pub fn register(mut self, handle: impl ServerHandle + 'static) -> Self {
        self.handles.push(Arc::new(handle));
        self
    }

    /// Build the server, rejecting interfaces registered under the same syntax twice.
    pub fn build(self) -> std::result::Result<Server, BuildError> {
        let mut interfaces: HashMap<Uuid, Vec<Arc<dyn ServerHandle>>> = HashMap::new();
        for handle in self.handles {
            let syntax = handle.syntax();
            let versions = interfaces.entry(syntax.uuid).or_default();
            if versions.iter().any(|existing| existing.syntax() == syntax) {
                return Err(BuildError::DuplicateInterface(syntax));
            }
            versions.push(handle);
        }
        for versions in interfaces.values_mut() {
            versions.sort_by(|a, b| b.syntax().version.cmp(&a.syntax().version));
        }
        Ok(Server { interfaces })
    }
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("options", &self.options)
            .field("interfaces", &self.handles.iter().map(|h| h.syntax()).collect::<Vec<_>>())
            .finish()
    }
}

/// All interfaces a process serves, keyed by interface UUID.
///
/// A server is immutable once built and meant to be shared between connections, each of
/// which creates its own [`Association`].
pub struct Server {
    interfaces: HashMap<Uuid, Vec<Arc<dyn ServerHandle>>>,
}

impl Server {
    /// Start collecting interfaces.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Find the interface able to serve a client asking for `syntax`.
    ///
    /// Majors must match exactly; among the registered minors that are new enough, the newest wins.
    pub fn resolve(&self, syntax: &SyntaxId) -> Option<&Arc<dyn ServerHandle>> {
        self.interfaces
            .get(&syntax.uuid)?
            .iter()
            .find(|handle| handle.syntax().version.serves(syntax.version))
    }

    /// The syntaxes of all served interfaces.
    pub fn syntaxes(&self) -> impl Iterator<Item = SyntaxId> + '_ {
        self.interfaces.values().flatten().map(|handle| handle.syntax())
    }

    /// Start a new association, typically one per connection.
    pub fn associate(self: &Arc<Self>) -> Association {
        Association {
            server: Arc::clone(self),
            contexts: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("interfaces", &self.syntaxes().collect::<Vec<_>>())
            .finish()
    }
}

/// The presentation contexts bound on one connection.
pub struct Association {
    server: Arc<Server>,
    contexts: HashMap<u16, Arc<dyn ServerHandle>>,
}

impl Association {
    /// Bind `context_id` to the interface serving `syntax`, replacing any previous binding.
    ///
    /// Returns the syntax of the interface that was bound.
    pub fn bind(&mut self, context_id: u16, syntax: SyntaxId) -> Result<SyntaxId> {
        let handle = self
            .server
            .resolve(&syntax)
            .ok_or(Error::UnknownInterface(syntax))?;
        let bound = handle.syntax();
        debug!(context_id, interface = handle.interface(), %bound, "bound presentation context");
        self.contexts.insert(context_id, Arc::clone(handle));
        Ok(bound)
    }

    /// Return `true` if `context_id` is bound.
    pub fn is_bound(&self, context_id: u16) -> bool {
        self.contexts.contains_key(&context_id)
    }

    /// Route a request to the interface bound to its presentation context.
    pub async fn call(
        &self,
        ctx: &CallContext,
        header: &RequestHeader,
        stub: &[u8],
    ) -> std::result::Result<Reply, FaultReply> {
        let Some(handle) = self.contexts.get(&header.context_id) else {
            return Err(FaultReply::new(header, Error::UnknownContext(header.context_id)));
        };
        match handle.dispatch(ctx, header.opnum, stub).await {
            Ok(response) => Ok(Reply::new(header, response)),
            Err(err) => Err(FaultReply::new(header, err)),
        }
    }
}

impl std::fmt::Debug for Association {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut contexts: Vec<_> = self.contexts.iter().map(|(id, handle)| (*id, handle.syntax())).collect();
        contexts.sort_by_key(|(id, _)| *id);
        f.debug_struct("Association").field("contexts", &contexts).finish()
    }
}
