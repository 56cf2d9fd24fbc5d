//! Stubs flowing through the dispatcher keep their exact representation.

mod support;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rpc_dispatch::{ndr, CallContext, Dispatcher, HandlerError};
use support::*;

/// Answers lookups with the length of every name, honouring the limit.
struct Lengths;

#[rpc_dispatch::async_trait]
impl Directory for Lengths {
    async fn echo(&self, _ctx: &CallContext, request: EchoRequest) -> Result<EchoResponse, HandlerError> {
        Ok(EchoResponse {
            tag: request.tag,
            message: request.message,
            status: STATUS_OK,
        })
    }

    async fn lookup(&self, _ctx: &CallContext, request: LookupRequest) -> Result<LookupResponse, HandlerError> {
        let limit = request.limit.map_or(request.names.len(), |limit| limit as usize);
        Ok(LookupResponse {
            ids: request
                .names
                .iter()
                .take(limit)
                .map(|name| name.encode_utf16().count() as u32)
                .collect(),
            status: STATUS_OK,
        })
    }
}

#[test]
fn echo_request_has_the_conformant_varying_string_layout() -> anyhow::Result<()> {
    #[rustfmt::skip]
    let wire: &[u8] = &[
        0x2a, 0, 0, 0,              // tag
        3, 0, 0, 0,                 // max count
        0, 0, 0, 0,                 // offset
        3, 0, 0, 0,                 // actual count
        b'h', 0, b'i', 0, 0, 0,     // "hi\0"
    ];
    let request: EchoRequest = ndr::from_slice(wire)?;
    assert_eq!(
        request,
        EchoRequest {
            tag: 42,
            message: "hi".into()
        }
    );
    assert_eq!(ndr::to_vec(&request)?, wire);
    Ok(())
}

#[tokio::test]
async fn requests_and_responses_survive_decode_then_encode() -> anyhow::Result<()> {
    let dispatcher = Dispatcher::<dyn Directory>::for_interface(Arc::new(Lengths))?;
    let ctx = CallContext::new();

    let lookups = [
        LookupRequest {
            names: Vec::new(),
            limit: None,
        },
        LookupRequest {
            names: vec!["a".into(), "bb".into(), "ccc".into()],
            limit: Some(2),
        },
        LookupRequest {
            names: vec!["grüße".into(), "𝄞 clef".into(), String::new()],
            limit: None,
        },
    ];

    for lookup in &lookups {
        let request_bytes = ndr::to_vec(lookup)?;
        let decoded: LookupRequest = ndr::from_slice(&request_bytes)?;
        assert_eq!(&decoded, lookup);
        assert_eq!(ndr::to_vec(&decoded)?, request_bytes, "request re-encodes identically");

        let response_bytes = dispatcher.dispatch(&ctx, 2, &request_bytes).await?;
        let response: LookupResponse = ndr::from_slice(&response_bytes)?;
        assert_eq!(ndr::to_vec(&response)?, response_bytes, "response re-encodes identically");
        assert_eq!(response.status, STATUS_OK);
    }

    let echo = EchoRequest {
        tag: u32::MAX,
        message: "end to end".into(),
    };
    let response_bytes = dispatcher.dispatch(&ctx, 0, &ndr::to_vec(&echo)?).await?;
    assert_eq!(
        ndr::from_slice::<EchoResponse>(&response_bytes)?,
        EchoResponse {
            tag: echo.tag,
            message: echo.message,
            status: STATUS_OK,
        }
    );
    Ok(())
}
