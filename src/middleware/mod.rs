//! Middleware layer.
//!
//! A middleware turns one handler into another. It is the right place for
//! cross-cutting concerns: access logging, panic recovery, authentication.
//!
//! A [`Stack`] lists middleware outermost first and is applied once, at
//! startup, to produce a plain [`BoxedHandler`]:
//!
//! ```text
//! Stack::new().with(m1).with(m2).compose(h)   ==   m1(m2(h))
//!
//! request  ──► m1 ──► m2 ──► h
//! response ◄── m1 ◄── m2 ◄── h
//! ```
//!
//! Each layer only sees the next handler in the chain.
//!
//! ```rust
//! use httpbox::{BoxedHandler, Error, Request, Response};
//! use httpbox::middleware::{self, AccessLog, Recover, Stack};
//! use http::StatusCode;
//!
//! let require_token = middleware::from_fn(|req: Request, next: BoxedHandler| async move {
//!     if req.header("authorization").is_none() {
//!         return Err(Error::new(StatusCode::UNAUTHORIZED, "missing token").into());
//!     }
//!     next.call(req).await
//! });
//!
//! let app = Stack::new()
//!     .with(AccessLog)
//!     .with(Recover)
//!     .with(require_token)
//!     .compose(|_req: Request| async { Ok::<_, Error>(Response::text("hello")) });
//! ```

mod access_log;
mod recover;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxError, BoxFuture, BoxedHandler, ErasedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

pub use access_log::AccessLog;
pub use recover::{Panicked, Recover};

/// A decorator from one handler to another.
///
/// Implemented for closures `Fn(BoxedHandler) -> BoxedHandler`, for
/// [`from_fn`] adapters, and for the built-in middleware.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

impl<F> Middleware for F
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        self(next)
    }
}

// ── Stack ─────────────────────────────────────────────────────────────────────

/// An ordered list of middleware, outermost first.
#[derive(Clone, Default)]
pub struct Stack {
    layers: Vec<Arc<dyn Middleware>>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `middleware` inside every layer added so far.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Arc::new(middleware));
        self
    }

    /// Wraps `handler`: the last layer added wraps it first, the first layer
    /// added ends up outermost.
    pub fn compose(&self, handler: impl Handler) -> BoxedHandler {
        self.layers
            .iter()
            .rev()
            .fold(handler.into_handler(), |next, layer| layer.wrap(next))
    }
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack").field("layers", &self.layers.len()).finish()
    }
}

/// `compose(h, &stack)` is `stack.compose(h)`.
pub fn compose(handler: impl Handler, stack: &Stack) -> BoxedHandler {
    stack.compose(handler)
}

// ── from_fn ───────────────────────────────────────────────────────────────────

/// Builds a middleware from an async function of the request and the next
/// handler. Code before `next.call(req)` runs on the way in, code after it on
/// the way out.
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Request, BoxedHandler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
{
    FromFn { f: Arc::new(f) }
}

/// Middleware returned by [`from_fn`].
pub struct FromFn<F> {
    f: Arc<F>,
}

impl<F> fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FromFn")
    }
}

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, BoxedHandler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        BoxedHandler::new(FromFnHandler { f: Arc::clone(&self.f), next })
    }
}

struct FromFnHandler<F> {
    f: Arc<F>,
    next: BoxedHandler,
}

impl<F, Fut> ErasedHandler for FromFnHandler<F>
where
    F: Fn(Request, BoxedHandler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        Box::pin((self.f)(req, self.next.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::{Method, StatusCode};

    use super::*;
    use crate::Error;

    type Trace = Arc<Mutex<Vec<String>>>;

    fn tracing_layer(name: &'static str, trace: &Trace) -> impl Middleware {
        let trace = Arc::clone(trace);
        from_fn(move |req: Request, next: BoxedHandler| {
            let trace = Arc::clone(&trace);
            async move {
                trace.lock().unwrap().push(format!("{name} in"));
                let outcome = next.call(req).await;
                trace.lock().unwrap().push(format!("{name} out"));
                outcome
            }
        })
    }

    fn handler(trace: &Trace) -> BoxedHandler {
        let trace = Arc::clone(trace);
        (move |_req: Request| {
            let trace = Arc::clone(&trace);
            async move {
                trace.lock().unwrap().push("handler".to_owned());
                Ok::<_, Error>(Response::text("done"))
            }
        })
        .into_handler()
    }

    fn get() -> Request {
        Request::new(Method::GET, "/".parse().unwrap())
    }

    #[tokio::test]
    async fn declared_order_is_outer_to_inner() {
        let trace = Trace::default();
        let app = Stack::new()
            .with(tracing_layer("m1", &trace))
            .with(tracing_layer("m2", &trace))
            .compose(handler(&trace));

        app.call(get()).await.unwrap();

        assert_eq!(
            *trace.lock().unwrap(),
            ["m1 in", "m2 in", "handler", "m2 out", "m1 out"],
        );
    }

    #[tokio::test]
    async fn empty_stack_is_identity() {
        let trace = Trace::default();
        let app = compose(handler(&trace), &Stack::new());

        let response = app.call(get()).await.unwrap();

        assert_eq!(response.body(), b"done");
        assert_eq!(*trace.lock().unwrap(), ["handler"]);
    }

    #[tokio::test]
    async fn closure_middleware_can_short_circuit() {
        let deny = |_next: BoxedHandler| {
            crate::handler::lift(|_req: Request| async { StatusCode::FORBIDDEN })
        };
        let trace = Trace::default();
        let app = Stack::new().with(deny).compose(handler(&trace));

        let response = app.call(get()).await.unwrap();

        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
        assert!(trace.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn outer_layer_sees_inner_failure() {
        let seen = Arc::new(Mutex::new(None));
        let observer = {
            let seen = Arc::clone(&seen);
            from_fn(move |req: Request, next: BoxedHandler| {
                let seen = Arc::clone(&seen);
                async move {
                    let outcome = next.call(req).await;
                    *seen.lock().unwrap() = outcome.as_ref().err().map(ToString::to_string);
                    outcome
                }
            })
        };
        let failing = |_req: Request| async { Err::<Response, _>(Error::new(StatusCode::NOT_FOUND, "not found")) };

        let response = Stack::new().with(observer).compose(failing).respond(get()).await;

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(seen.lock().unwrap().as_deref(), Some("not found"));
    }

    #[tokio::test]
    async fn composed_chain_is_shared_across_tasks() {
        let trace = Trace::default();
        let app = Stack::new().with(tracing_layer("m", &trace)).compose(handler(&trace));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let app = app.clone();
                tokio::spawn(async move { app.respond(get()).await.status_code() })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap(), StatusCode::OK);
        }

        assert_eq!(trace.lock().unwrap().len(), 8 * 3);
    }
}
