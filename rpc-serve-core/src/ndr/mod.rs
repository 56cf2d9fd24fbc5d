//! A compact NDR-style codec for request and response stubs.
//!
//! The representation is little-endian with natural alignment: every primitive is
//! aligned to its own size relative to the start of the stub. Composite types borrow
//! the NDR shapes the dispatcher needs:
//!
//! - strings are conformant varying, NUL-terminated UTF-16 (`[string] wchar_t*`),
//! - `Vec<T>` is a conformant array prefixed by its element count,
//! - `Option<T>` is a unique pointer: a referent id, zero meaning null, followed by
//!   the pointee when present.
//!
//! Unlike DCE NDR, embedded pointees and conformance counts are written inline where
//! they occur rather than deferred to the end of the enclosing structure, so stubs
//! produced here only interoperate with peers using the same layout.
//!
//! Types opt into the codec through [`Marshal`] and [`Unmarshal`]; the [`record!`](crate::record)
//! macro derives both for plain structs whose fields are laid out in declaration order.

mod impls;
mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

/// Errors produced while encoding or decoding a stub.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The stub ended before a value could be read completely.
    #[error("unexpected end of stub at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Offset at which the read started.
        offset: usize,
        /// Number of bytes the read required.
        needed: usize,
        /// Number of bytes that were left.
        remaining: usize,
    },
    /// A conformance count announced more elements than the stub could possibly hold.
    #[error("count of {count} elements at offset {offset} exceeds the {remaining} bytes remaining")]
    CountOutOfRange {
        /// Offset of the count field.
        offset: usize,
        /// The announced count.
        count: u32,
        /// Number of bytes that were left.
        remaining: usize,
    },
    /// The actual count of a varying value is larger than its maximum count.
    #[error("actual count {actual} exceeds maximum count {max}")]
    InconsistentCount {
        /// The maximum (conformance) count.
        max: u32,
        /// The actual (variance) count.
        actual: u32,
    },
    /// A varying value used a non-zero offset, which is not supported.
    #[error("varying offset {0} is not supported")]
    UnsupportedOffset(u32),
    /// A string did not end with a NUL character.
    #[error("string is not NUL-terminated")]
    MissingTerminator,
    /// A string could not be decoded as UTF-16.
    #[error("string is not valid UTF-16")]
    InvalidUtf16,
    /// A value was outside of the range its type allows.
    #[error("invalid value {value:#x} for {what}")]
    InvalidValue {
        /// The type or field being decoded.
        what: &'static str,
        /// The offending value.
        value: u64,
    },
    /// A value is too large to be described on the wire.
    #[error("value with {len} elements is too large to encode")]
    TooLarge {
        /// The length of the value.
        len: usize,
    },
    /// Bytes were left over after a complete value was decoded.
    #[error("{0} bytes left over after decoding")]
    TrailingBytes(usize),
}

/// Encode a value into the NDR representation.
pub trait Marshal {
    /// Append the representation of `self` to `w`.
    fn marshal(&self, w: &mut Writer) -> Result<(), Error>;
}

/// Decode a value from the NDR representation.
pub trait Unmarshal: Sized {
    /// Read a complete value from `r`, advancing it past the value.
    fn unmarshal(r: &mut Reader<'_>) -> Result<Self, Error>;
}

/// Encode `value` into a freshly allocated stub.
pub fn to_vec<T: Marshal + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    let mut w = Writer::new();
    value.marshal(&mut w)?;
    Ok(w.into_inner())
}

/// Decode a `T` from `stub`, rejecting any bytes left over afterwards.
pub fn from_slice<T: Unmarshal>(stub: &[u8]) -> Result<T, Error> {
    let mut r = Reader::new(stub);
    let value = T::unmarshal(&mut r)?;
    r.finish()?;
    Ok(value)
}

/// Declare a plain struct together with its [`Marshal`] and [`Unmarshal`] implementations.
///
/// Fields are encoded in declaration order, each aligned according to its own type.
///
/// ```
/// rpc_serve_core::record! {
///     /// Input of an echo call.
///     #[derive(Debug, Clone, PartialEq, Eq)]
///     pub struct EchoRequest {
///         pub message: String,
///         pub repeat: u32,
///     }
/// }
///
/// let req = EchoRequest { message: "hi".into(), repeat: 2 };
/// let stub = rpc_serve_core::ndr::to_vec(&req).unwrap();
/// let back: EchoRequest = rpc_serve_core::ndr::from_slice(&stub).unwrap();
/// assert_eq!(back, req);
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::ndr::Marshal for $name {
            #[allow(unused_variables)]
            fn marshal(&self, w: &mut $crate::ndr::Writer) -> ::std::result::Result<(), $crate::ndr::Error> {
                $( $crate::ndr::Marshal::marshal(&self.$field, w)?; )*
                Ok(())
            }
        }

        impl $crate::ndr::Unmarshal for $name {
            #[allow(unused_variables)]
            fn unmarshal(r: &mut $crate::ndr::Reader<'_>) -> ::std::result::Result<Self, $crate::ndr::Error> {
                Ok(Self {
                    $( $field: <$ty as $crate::ndr::Unmarshal>::unmarshal(r)?, )*
                })
            }
        }
    };
}
