use crate::{BuildError, OperationTable, SyntaxId};

/// A served RPC interface: its identity and the table routing each opnum to a method.
///
/// Usually implemented by [`interface!`](crate::interface) for the trait object of the
/// declared handler trait, so that one table serves every implementation.
pub trait Interface: Send + Sync + 'static {
    /// Human readable name used in errors and traces.
    const NAME: &'static str;
    /// The abstract syntax clients bind to.
    const SYNTAX: SyntaxId;

    /// Build the operation table of this interface.
    fn operations() -> Result<OperationTable<Self>, BuildError>;
}

/// Declare an interface: its handler trait, a fallback implementation and its operation table.
///
/// Every operation becomes an async method of the trait taking the [`CallContext`](crate::CallContext)
/// and the decoded request. Each method has a default body failing with
/// [`HandlerError::NotImplemented`](crate::HandlerError::NotImplemented), so an implementation
/// overrides only the operations it supports and the generated `fallback` type, which
/// overrides none, rejects all of them.
///
/// Entries in `reserved` occupy their opnum without ever reaching a handler; calls to them are
/// rejected as routing faults.
///
/// The [`Interface`] implementation goes to `dyn Trait`, so dispatchers are typed as
/// `Dispatcher<dyn Trait>` and accept any `Arc` of an implementation.
#[macro_export]
macro_rules! interface {
    (
        $(#[$meta:meta])*
        $vis:vis trait $iface:ident {
            name = $name:literal;
            syntax = $syntax:expr;
            fallback = $fallback:ident;
            operations {
                $(
                    $(#[$op_meta:meta])*
                    $opnum:literal => fn $method:ident($req:ty) -> $resp:ty;
                )*
            }
            $(
                reserved {
                    $( $ropnum:literal => $rname:ident; )*
                }
            )?
        }
    ) => {
        $(#[$meta])*
        #[$crate::async_trait]
        $vis trait $iface: ::std::marker::Send + ::std::marker::Sync + 'static {
            $(
                $(#[$op_meta])*
                async fn $method(
                    &self,
                    _ctx: &$crate::CallContext,
                    _request: $req,
                ) -> ::std::result::Result<$resp, $crate::HandlerError> {
                    ::std::result::Result::Err($crate::HandlerError::NotImplemented)
                }
            )*
        }

        #[doc = ::std::concat!("Rejects every operation of [`", ::std::stringify!($iface), "`] as not implemented.")]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        $vis struct $fallback;

        impl $iface for $fallback {}

        impl $crate::Interface for dyn $iface {
            const NAME: &'static str = $name;
            const SYNTAX: $crate::SyntaxId = $syntax;

            fn operations() -> ::std::result::Result<$crate::OperationTable<Self>, $crate::BuildError> {
                $crate::OperationTable::<Self>::builder($name)
                    $(
                        .operation($opnum, ::std::stringify!($method), |server, ctx, r| {
                            let request = <$req as $crate::ndr::Unmarshal>::unmarshal(r)?;
                            ::std::result::Result::Ok($crate::table::respond(
                                ::std::stringify!($method),
                                async move { server.$method(&ctx, request).await },
                            ))
                        })
                    )*
                    $($(
                        .reserved($ropnum, ::std::stringify!($rname))
                    )*)?
                    .build()
            }
        }
    };
}
