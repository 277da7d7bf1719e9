//! Fallible handlers and type erasure.
//!
//! # How handlers are stored
//!
//! Middleware and the server need to hold handlers of *different* types behind
//! one uniform value, so every handler is erased into a [`BoxedHandler`]:
//!
//! ```text
//! async fn get_user(req: Request) -> Result<Response, Error> { … }   ← user writes this
//!        ↓ get_user.into_handler()                                   ← Handler blanket impl
//! BoxedHandler(Arc::new(FnHandler(get_user)))                        ← heap-allocated wrapper
//!        ↓
//! handler.call(req)  at request time                                 ← one vtable dispatch
//!        ↓
//! Box::pin(async { get_user(req).await.map(into_response).map_err(into) })
//! ```
//!
//! The failure channel is [`BoxError`]. Handlers can fail with a typed
//! [`Error`](crate::Error) or with anything else; the translator sorts them out.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::translate::translate;

/// The failure channel shared by handlers, middleware and validators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A heap-allocated, type-erased future that resolves to a handler outcome.
///
/// `Send + 'static` lets tokio move the future across threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Result<Response, BoxError>> + Send + 'static>>;

// ── Erased dispatch ───────────────────────────────────────────────────────────

/// Dispatch interface behind [`BoxedHandler`].
///
/// Implement it directly when a handler or middleware layer needs its own
/// state; closures get it for free through [`Handler`].
pub trait ErasedHandler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
///
/// Cloning is one atomic reference-count increment. The wrapped handler is
/// never mutated, so a composed chain can serve any number of tasks at once.
#[derive(Clone)]
pub struct BoxedHandler(Arc<dyn ErasedHandler>);

impl BoxedHandler {
    pub fn new(handler: impl ErasedHandler) -> Self {
        Self(Arc::new(handler))
    }

    /// Runs the handler and hands back its outcome untouched.
    pub fn call(&self, req: Request) -> BoxFuture {
        self.0.call(req)
    }

    /// Runs the handler and turns a failure into its error response.
    ///
    /// This is the adapter the transport calls: success responses pass
    /// through, failures go through [`translate`] exactly once.
    pub async fn respond(&self, req: Request) -> Response {
        match self.call(req).await {
            Ok(response) => response,
            Err(err) => translate(err),
        }
    }
}

impl fmt::Debug for BoxedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BoxedHandler")
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every value that can serve as a fallible handler.
///
/// You never implement this yourself. It is satisfied by any `async fn` or
/// closure with the shape
///
/// ```text
/// async fn name(req: Request) -> Result<impl IntoResponse, impl Into<BoxError>>
/// ```
///
/// and by [`BoxedHandler`] itself, so composed chains can be composed again.
/// The trait is sealed: only the impls in this module can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    fn into_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R, E> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoResponse + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
}

impl<F, Fut, R, E> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoResponse + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    fn into_handler(self) -> BoxedHandler {
        BoxedHandler::new(FnHandler(self))
    }
}

impl private::Sealed for BoxedHandler {}

impl Handler for BoxedHandler {
    fn into_handler(self) -> BoxedHandler {
        self
    }
}

// ── Concrete wrappers ─────────────────────────────────────────────────────────

struct FnHandler<F>(F);

impl<F, Fut, R, E> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoResponse + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move {
            fut.await
                .map(IntoResponse::into_response)
                .map_err(Into::<BoxError>::into)
        })
    }
}

/// Lifts a handler with no failure channel into one that always succeeds.
///
/// This is how third-party handlers that already produce a complete
/// response join a fallible chain.
///
/// ```rust
/// use httpbox::{Request, handler};
///
/// let health = handler::lift(|_req: Request| async { "ok" });
/// ```
pub fn lift<F, Fut, R>(handler: F) -> BoxedHandler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    BoxedHandler::new(Lifted(handler))
}

struct Lifted<F>(F);

impl<F, Fut, R> ErasedHandler for Lifted<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { Ok::<_, BoxError>(fut.await.into_response()) })
    }
}
