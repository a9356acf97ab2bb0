//! Slot handlers and the guard seam that gates them.
//!
//! ```text
//! async fn deploy(req: Request) -> Response { … }   ← embedder writes this
//!        ↓ Handlers::builder().deploy_handler(deploy)
//! SlotFn(deploy)                                    ← stored as BoxedHandler
//!        ↓ guarded(slot, BasicAuth { … })           ← protected slots only
//! Guarded { inner: slot, guard }                    ← still a BoxedHandler
//! ```
//!
//! A [`Guard`] looks at the request before the slot runs and either lets it
//! through or answers in its place. The slot never sees a refused request.

use std::future::{self, Future};
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Object-safe form of a slot. Public only because [`Handler`] names it.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// What the registry and the route table hold for every slot.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Anything that can fill a [`Handlers`](crate::Handlers) slot: a function or
/// closure taking a [`Request`] and returning a future of something that
/// converts into a [`Response`].
///
/// Sealed; the blanket impl over such closures is the only one.
pub trait Handler: sealed::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod sealed {
    pub trait Sealed {}
}

impl<F, Fut> sealed::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(SlotFn(self))
    }
}

struct SlotFn<F>(F);

impl<F, Fut> ErasedHandler for SlotFn<F>
where
    F: Fn(Request) -> Fut,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn call(&self, req: Request) -> BoxFuture {
        let pending = (self.0)(req);
        Box::pin(async move { pending.await.into_response() })
    }
}

// ── Guards ────────────────────────────────────────────────────────────────────

/// A synchronous admission check placed in front of a slot.
pub(crate) trait Guard: Send + Sync + 'static {
    /// `Err` carries the response sent instead of running the slot.
    fn admit(&self, req: &Request) -> Result<(), Response>;
}

/// Puts `guard` in front of `inner`.
pub(crate) fn guarded(inner: BoxedHandler, guard: impl Guard) -> BoxedHandler {
    Arc::new(Guarded { inner, guard })
}

struct Guarded<G> {
    inner: BoxedHandler,
    guard: G,
}

impl<G: Guard> ErasedHandler for Guarded<G> {
    fn call(&self, req: Request) -> BoxFuture {
        match self.guard.admit(&req) {
            Ok(()) => self.inner.call(req),
            Err(refusal) => Box::pin(future::ready(refusal)),
        }
    }
}
