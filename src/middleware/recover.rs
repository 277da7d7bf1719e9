//! Panic recovery.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::error::Error;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;

/// Turns a panic anywhere inside the chain into the sanitized `500`.
///
/// The panic message travels as the error's internal cause, so it is logged
/// by the translator and never sent to the client.
#[derive(Clone, Copy, Debug, Default)]
pub struct Recover;

impl super::Middleware for Recover {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        BoxedHandler::new(Recovering { next })
    }
}

struct Recovering {
    next: BoxedHandler,
}

impl ErasedHandler for Recovering {
    fn call(&self, req: Request) -> BoxFuture {
        let next = self.next.clone();
        // The inner call happens inside the future so a panic while building
        // the handler's future is caught as well.
        let fut = AssertUnwindSafe(async move { next.call(req).await }).catch_unwind();

        Box::pin(async move {
            match fut.await {
                Ok(outcome) => outcome,
                Err(payload) => Err(Error::unexpected(Panicked::from_payload(payload.as_ref())).into()),
            }
        })
    }
}

/// A handler panicked. Carries the panic message when it was a string.
#[derive(Debug)]
pub struct Panicked(String);

impl Panicked {
    fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        Self(message)
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Panicked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler panicked: {}", self.0)
    }
}

impl std::error::Error for Panicked {}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};

    use super::*;
    use crate::Response;
    use crate::middleware::Stack;
    use crate::test_support::capture_logs;

    fn get() -> Request {
        Request::new(Method::GET, "/".parse().unwrap())
    }

    async fn explode(_req: Request) -> Result<Response, Error> {
        panic!("index out of bounds");
    }

    #[tokio::test]
    async fn panic_becomes_sanitized_500() {
        let (logs, _guard) = capture_logs();
        let app = Stack::new().with(Recover).compose(explode);

        let response = app.respond(get()).await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body(), br#"{"code":500,"message":"Unexpected error occurred"}"#);
        assert!(logs.contents().contains("index out of bounds"), "{}", logs.contents());
    }

    #[tokio::test]
    async fn panic_while_building_the_future_is_caught() {
        let app = Stack::new().with(Recover).compose(|_req: Request| -> std::future::Ready<Result<Response, Error>> {
            panic!("eager");
        });

        let err = app.call(get()).await.unwrap_err();
        let err = err.downcast::<Error>().unwrap();

        let cause = err.cause().unwrap().downcast_ref::<Panicked>().unwrap();
        assert_eq!(cause.message(), "eager");
    }

    #[tokio::test]
    async fn success_passes_through() {
        let app = Stack::new()
            .with(Recover)
            .compose(|_req: Request| async { Ok::<_, Error>(Response::text("fine")) });

        let response = app.call(get()).await.unwrap();

        assert_eq!(response.body(), b"fine");
    }
}
