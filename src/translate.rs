//! The one place a failure becomes an HTTP response.
//!
//! Handlers and middleware never write error responses themselves. They
//! return a [`BoxError`] and the transport adapter hands it to [`translate`],
//! which:
//!
//! 1. narrows it to a typed [`Error`], replacing anything else with the
//!    sanitized `500` from [`Error::unexpected`];
//! 2. writes `{"code":…,"message":…,"details":…}` as JSON with `code` as the status;
//! 3. falls back to [`DETAILS_SENTINEL`] when the details refuse to serialize;
//! 4. logs every server error, and a client error only when it was marked
//!    with [`Error::with_log`].
//!
//! Internal causes stop here: they reach the log, never the body.

use http::StatusCode;
use tracing::{error, warn};

use crate::error::Error;
use crate::handler::BoxError;
use crate::response::Response;

/// Details written in place of details that could not be serialized.
pub const DETAILS_SENTINEL: &str = "failed to serialize error details";

/// Converts any handler failure into exactly one response.
pub fn translate(err: BoxError) -> Response {
    let mut err = narrow(err);

    let body = match serde_json::to_vec(&err) {
        Ok(body) => {
            if err.should_log() || err.code().is_server_error() {
                log(&err);
            }
            body
        }
        Err(ser_err) => {
            let cause = err.cause().map(ToString::to_string);
            error!(
                code = err.code().as_u16(),
                reason = err.message(),
                details = ?err.details(),
                cause = cause.as_deref(),
                error = %ser_err,
                "failed to serialize error details"
            );
            err.replace_details(DETAILS_SENTINEL);
            sentinel_body(&err)
        }
    };

    Response::builder().status(err.code()).json(body)
}

/// Status the translator will give `err`, without consuming it.
pub fn status_of(err: &BoxError) -> StatusCode {
    err.downcast_ref::<Error>()
        .map_or(StatusCode::INTERNAL_SERVER_ERROR, Error::code)
}

fn narrow(err: BoxError) -> Error {
    match err.downcast::<Error>() {
        Ok(err) => *err,
        Err(other) => Error::unexpected(other),
    }
}

/// Built from a JSON value so the write cannot fail a second time.
fn sentinel_body(err: &Error) -> Vec<u8> {
    serde_json::json!({
        "code": err.code().as_u16(),
        "message": err.message(),
        "details": DETAILS_SENTINEL,
    })
    .to_string()
    .into_bytes()
}

fn log(err: &Error) {
    let cause = err.cause().map(ToString::to_string);
    if err.code().is_server_error() {
        error!(
            code = err.code().as_u16(),
            reason = err.message(),
            details = ?err.details(),
            cause = cause.as_deref(),
            "request failed"
        );
    } else {
        warn!(
            code = err.code().as_u16(),
            reason = err.message(),
            details = ?err.details(),
            cause = cause.as_deref(),
            "request failed"
        );
    }
}
