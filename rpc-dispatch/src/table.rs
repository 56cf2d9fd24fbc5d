//! The operation table: an immutable array of routes indexed by opnum.
//!
//! Each bound entry holds a route function that decodes the request stub and, only if
//! decoding succeeded, returns the not-yet-started invocation of the handler method
//! together with the encoding of its response. Reserved entries occupy an opnum
//! without ever routing to a handler.

use std::future::Future;
use std::sync::Arc;

use futures_lite::future::{Boxed, FutureExt};
use rpc_serve_core::ndr::{self, Marshal, Reader};
use rpc_serve_core::{CallContext, HandlerError};

use crate::{BuildError, Error};

/// A decoded call waiting to run: resolves to the encoded response stub.
///
/// Nothing happens until it is polled, so dropping it never invokes the handler.
pub type Invocation = Boxed<Result<Vec<u8>, Error>>;

/// Decode a request stub for one operation and bind it to the handler.
pub type Route<S> = fn(Arc<S>, CallContext, &mut Reader<'_>) -> Result<Invocation, ndr::Error>;

/// Turn the future of a handler method into an [`Invocation`] that encodes its response.
pub fn respond<R, F>(operation: &'static str, call: F) -> Invocation
where
    F: Future<Output = Result<R, HandlerError>> + Send + 'static,
    R: Marshal,
{
    async move {
        let response = call.await.map_err(|source| Error::Handler { operation, source })?;
        ndr::to_vec(&response).map_err(|source| Error::Encode { operation, source })
    }
    .boxed()
}

pub(crate) enum Slot<S: ?Sized> {
    Reserved,
    Bound(Route<S>),
}

/// One opnum of an interface.
pub struct Entry<S: ?Sized> {
    opnum: u16,
    name: &'static str,
    pub(crate) slot: Slot<S>,
}

impl<S: ?Sized> Entry<S> {
    /// The operation number.
    pub fn opnum(&self) -> u16 {
        self.opnum
    }

    /// The operation name, or the placeholder name of a reserved slot.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Return `true` if the slot is never used on the wire.
    pub fn is_reserved(&self) -> bool {
        matches!(self.slot, Slot::Reserved)
    }
}

impl<S: ?Sized> std::fmt::Debug for Entry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("opnum", &self.opnum)
            .field("name", &self.name)
            .field("reserved", &self.is_reserved())
            .finish()
    }
}

/// All operations of one interface, indexed by opnum.
///
/// Built once and never mutated afterwards, so it can be shared between any number of
/// concurrently dispatching tasks.
pub struct OperationTable<S: ?Sized> {
    interface: &'static str,
    entries: Vec<Option<Entry<S>>>,
}

impl<S: ?Sized> OperationTable<S> {
    /// Start building the table of `interface`.
    pub fn builder(interface: &'static str) -> Builder<S> {
        Builder {
            interface,
            entries: Vec::new(),
        }
    }

    /// The name of the interface this table belongs to.
    pub fn interface(&self) -> &'static str {
        self.interface
    }

    /// Look up `opnum`.
    pub fn get(&self, opnum: u16) -> Option<&Entry<S>> {
        self.entries.get(usize::from(opnum)).and_then(Option::as_ref)
    }

    /// Iterate over all entries, bound and reserved, in opnum order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry<S>> + '_ {
        self.entries.iter().flatten()
    }

    /// The opnums that route to a handler, in ascending order.
    pub fn opnums(&self) -> impl Iterator<Item = u16> + '_ {
        self.iter().filter(|e| !e.is_reserved()).map(Entry::opnum)
    }

    /// Number of entries, including reserved slots.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Return `true` if the interface has no operations.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: ?Sized> std::fmt::Debug for OperationTable<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationTable")
            .field("interface", &self.interface)
            .field("entries", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects the entries of an [`OperationTable`].
pub struct Builder<S: ?Sized> {
    interface: &'static str,
    entries: Vec<Entry<S>>,
}

impl<S: ?Sized> Builder<S> {
    /// Bind `opnum` to `route`.
    pub fn operation(mut self, opnum: u16, name: &'static str, route: Route<S>) -> Self {
        self.entries.push(Entry {
            opnum,
            name,
            slot: Slot::Bound(route),
        });
        self
    }

    /// Reserve `opnum` as a slot that is never used on the wire.
    pub fn reserved(mut self, opnum: u16, name: &'static str) -> Self {
        self.entries.push(Entry {
            opnum,
            name,
            slot: Slot::Reserved,
        });
        self
    }

    /// Build the table, rejecting duplicate opnums.
    pub fn build(self) -> Result<OperationTable<S>, BuildError> {
        let len = self.entries.iter().map(|e| usize::from(e.opnum) + 1).max().unwrap_or(0);
        let mut entries: Vec<Option<Entry<S>>> = std::iter::repeat_with(|| None).take(len).collect();
        for entry in self.entries {
            let slot = &mut entries[usize::from(entry.opnum)];
            if let Some(first) = slot {
                return Err(BuildError::DuplicateOperation {
                    interface: self.interface,
                    opnum: entry.opnum,
                    first: first.name,
                    second: entry.name,
                });
            }
            *slot = Some(entry);
        }
        Ok(OperationTable {
            interface: self.interface,
            entries,
        })
    }
}
