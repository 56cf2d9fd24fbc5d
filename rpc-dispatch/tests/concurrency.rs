//! Concurrent dispatch through one shared dispatcher, and cancellation of in-flight calls.

mod support;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rpc_dispatch::pdu::status;
use rpc_dispatch::{ndr, CallContext, Dispatcher, Error, ErrorKind, HandlerError, ServerOptions};
use support::*;
use tokio::sync::Notify;

/// Echoes in upper case after yielding, and waits as long as asked to.
#[derive(Default)]
struct Worker {
    started: Notify,
    invocations: AtomicUsize,
    finished: AtomicBool,
}

#[rpc_dispatch::async_trait]
impl Directory for Worker {
    async fn echo(&self, _ctx: &CallContext, request: EchoRequest) -> Result<EchoResponse, HandlerError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(EchoResponse {
            tag: request.tag,
            message: request.message.to_uppercase(),
            status: STATUS_OK,
        })
    }

    async fn wait(&self, _ctx: &CallContext, request: WaitRequest) -> Result<WaitResponse, HandlerError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        tokio::time::sleep(Duration::from_millis(request.millis.into())).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(WaitResponse { status: STATUS_OK })
    }
}

fn wait_stub(millis: u32) -> Vec<u8> {
    ndr::to_vec(&WaitRequest { millis }).expect("encodes")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_are_correlated_with_their_requests() -> anyhow::Result<()> {
    let worker = Arc::new(Worker::default());
    let dispatcher = Dispatcher::<dyn Directory>::for_interface(worker.clone())?;

    let calls: Vec<_> = (0..100u32)
        .map(|tag| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let request = EchoRequest {
                    tag,
                    message: format!("call number {tag}"),
                };
                let out = dispatcher
                    .dispatch(&CallContext::new(), 0, &ndr::to_vec(&request)?)
                    .await?;
                anyhow::Ok((request, ndr::from_slice::<EchoResponse>(&out)?))
            })
        })
        .collect();

    for call in calls {
        let (request, response) = call.await??;
        assert_eq!(
            response,
            EchoResponse {
                tag: request.tag,
                message: request.message.to_uppercase(),
                status: STATUS_OK,
            }
        );
    }
    assert_eq!(worker.invocations.load(Ordering::SeqCst), 100);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_calls_to_distinct_operations_share_one_dispatcher() -> anyhow::Result<()> {
    let worker = Arc::new(Worker::default());
    let dispatcher = Dispatcher::<dyn Directory>::for_interface(worker.clone())?;

    let mut calls = Vec::new();
    for tag in 0..50u32 {
        let dispatcher = dispatcher.clone();
        calls.push(tokio::spawn(async move {
            let (opnum, stub) = if tag % 2 == 0 {
                (0, ndr::to_vec(&EchoRequest { tag, message: "x".into() })?)
            } else {
                (3, wait_stub(1))
            };
            dispatcher.dispatch(&CallContext::new(), opnum, &stub).await?;
            anyhow::Ok(())
        }));
    }
    for call in calls {
        call.await??;
    }
    assert_eq!(worker.invocations.load(Ordering::SeqCst), 50);
    Ok(())
}

#[tokio::test]
async fn cancelling_an_in_flight_call_yields_an_infrastructure_failure() -> anyhow::Result<()> {
    let worker = Arc::new(Worker::default());
    let dispatcher = Dispatcher::<dyn Directory>::for_interface(worker.clone())?;
    let ctx = CallContext::new();

    let call = tokio::spawn({
        let ctx = ctx.clone();
        async move { dispatcher.dispatch(&ctx, 3, &wait_stub(60_000)).await }
    });
    worker.started.notified().await;
    ctx.cancel();

    let err = tokio::time::timeout(Duration::from_secs(10), call)
        .await?
        .expect("dispatch task did not panic")
        .expect_err("a cancelled call never succeeds");
    assert!(
        matches!(
            err,
            Error::Handler {
                operation: "wait",
                source: HandlerError::Cancelled
            }
        ),
        "{err:?}"
    );
    assert_eq!(err.kind(), ErrorKind::Infrastructure);
    assert_eq!(err.fault_status(), status::NCA_S_FAULT_CANCEL);
    assert!(!worker.finished.load(Ordering::SeqCst), "the handler was abandoned");
    Ok(())
}

#[tokio::test]
async fn calls_on_a_cancelled_context_never_start() -> anyhow::Result<()> {
    let worker = Arc::new(Worker::default());
    let dispatcher = Dispatcher::<dyn Directory>::for_interface(worker.clone())?;
    let ctx = CallContext::new();
    ctx.cancel();

    let err = dispatcher
        .dispatch(&ctx, 3, &wait_stub(0))
        .await
        .expect_err("context is cancelled");
    assert!(matches!(err.handler_error(), Some(HandlerError::Cancelled)), "{err:?}");
    assert_eq!(worker.invocations.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn deadlines_abandon_slow_handlers() -> anyhow::Result<()> {
    let worker = Arc::new(Worker::default());
    let dispatcher = Dispatcher::<dyn Directory>::for_interface(worker.clone())?;
    let ctx = CallContext::new().with_timeout(Duration::from_millis(50));

    let err = dispatcher
        .dispatch(&ctx, 3, &wait_stub(60_000))
        .await
        .expect_err("deadline passes first");
    assert!(matches!(err.handler_error(), Some(HandlerError::DeadlineExceeded)), "{err:?}");
    assert_eq!(err.fault_status(), status::NCA_S_FAULT_CANCEL);
    assert!(!worker.finished.load(Ordering::SeqCst));
    Ok(())
}

#[tokio::test]
async fn configured_call_timeout_applies_without_a_context_deadline() -> anyhow::Result<()> {
    let worker = Arc::new(Worker::default());
    let dispatcher = Dispatcher::<dyn Directory>::for_interface(worker.clone())?
        .with_options(ServerOptions::new().with_call_timeout(Duration::from_millis(50)))?;

    let err = dispatcher
        .dispatch(&CallContext::new(), 3, &wait_stub(60_000))
        .await
        .expect_err("call timeout passes first");
    assert!(matches!(err.handler_error(), Some(HandlerError::DeadlineExceeded)), "{err:?}");

    let out = dispatcher.dispatch(&CallContext::new(), 3, &wait_stub(1)).await?;
    assert_eq!(ndr::from_slice::<WaitResponse>(&out)?, WaitResponse { status: STATUS_OK });
    Ok(())
}

#[tokio::test]
async fn handlers_observe_cancellation_through_their_context() -> anyhow::Result<()> {
    /// Polls its context between units of work.
    struct Cooperative {
        units_done: AtomicUsize,
    }

    #[rpc_dispatch::async_trait]
    impl Directory for Cooperative {
        async fn wait(&self, ctx: &CallContext, request: WaitRequest) -> Result<WaitResponse, HandlerError> {
            for _ in 0..request.millis {
                ctx.check()?;
                self.units_done.fetch_add(1, Ordering::SeqCst);
                if self.units_done.load(Ordering::SeqCst) == 3 {
                    ctx.cancel();
                }
            }
            Ok(WaitResponse { status: STATUS_OK })
        }
    }

    let handler = Arc::new(Cooperative {
        units_done: AtomicUsize::new(0),
    });
    let dispatcher = Dispatcher::<dyn Directory>::for_interface(handler.clone())?;

    let err = dispatcher
        .dispatch(&CallContext::new(), 3, &wait_stub(10))
        .await
        .expect_err("the handler stopped at its cancellation point");
    assert!(matches!(err.handler_error(), Some(HandlerError::Cancelled)), "{err:?}");
    assert_eq!(handler.units_done.load(Ordering::SeqCst), 3);
    Ok(())
}
