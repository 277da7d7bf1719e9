//! One structured log line per request.

use std::time::Instant;

use http::StatusCode;
use tracing::info;

use crate::handler::{BoxError, BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::Response;
use crate::translate::status_of;

/// Logs method, target, remote address, status, body size and latency once
/// the inner chain has finished, whether it succeeded or failed.
///
/// The outcome is passed up untouched. For a failure nothing has been written
/// yet, so the line carries the status the translator will assign and zero bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct AccessLog;

impl super::Middleware for AccessLog {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        BoxedHandler::new(Logged { next })
    }
}

struct Logged {
    next: BoxedHandler,
}

impl ErasedHandler for Logged {
    fn call(&self, req: Request) -> BoxFuture {
        let method = req.method().clone();
        let target = req.uri().to_string();
        let remote_addr = req.remote_addr().map_or_else(|| "-".to_owned(), |addr| addr.to_string());
        let next = self.next.clone();

        Box::pin(async move {
            let started = Instant::now();
            let outcome = next.call(req).await;
            let observed = Observed::of(&outcome);

            info!(
                method = %method,
                target = %target,
                remote_addr = %remote_addr,
                status = observed.status.as_u16(),
                bytes = observed.bytes,
                failed = outcome.is_err(),
                elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                "request"
            );

            outcome
        })
    }
}

/// What the access log saw of a request's outcome.
struct Observed {
    status: StatusCode,
    bytes: usize,
}

impl Observed {
    fn of(outcome: &Result<Response, BoxError>) -> Self {
        match outcome {
            Ok(response) => Self { status: response.status_code(), bytes: response.body().len() },
            Err(err) => Self { status: status_of(err), bytes: 0 },
        }
    }
}
