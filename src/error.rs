//! The typed, client-safe error handlers fail with.
//!
//! An [`Error`] carries two kinds of information:
//!
//! | Visible to the client | Visible to logs only |
//! |---|---|
//! | `code`, `message`, `details` | `cause`, the logging flag |
//!
//! Build one with [`Error::new`] and chain modifiers:
//!
//! ```rust
//! use httpbox::Error;
//! use http::StatusCode;
//!
//! # let io_err = std::io::Error::other("connection reset");
//! let err = Error::new(StatusCode::BAD_GATEWAY, "upstream unavailable")
//!     .with_details(["inventory"])
//!     .with_internal(io_err)
//!     .with_log();
//! ```

use std::fmt;

use http::StatusCode;
use serde::ser::{self, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::handler::BoxError;

/// Message of the catch-all error synthesized for failures that are not an [`Error`].
pub const UNEXPECTED_MESSAGE: &str = "Unexpected error occurred";

// ── Details ───────────────────────────────────────────────────────────────────

/// Public, structured context attached to an [`Error`].
///
/// Implemented for every `Serialize + Debug` value. Serialization is deferred
/// until the error is written, so a value that refuses to serialize is only
/// discovered by the translator.
pub trait Details: fmt::Debug + Send + Sync + 'static {
    /// Renders the details as a JSON value.
    fn to_value(&self) -> serde_json::Result<serde_json::Value>;
}

impl<T> Details for T
where
    T: Serialize + fmt::Debug + Send + Sync + 'static,
{
    fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

// ── Error ─────────────────────────────────────────────────────────────────────

/// A failure that is safe to show to the client.
///
/// Only `code`, `message` and `details` are ever serialized. The internal cause
/// reaches logs and [`std::error::Error::source`], never the response body.
#[derive(Debug)]
pub struct Error {
    code: StatusCode,
    message: String,
    details: Option<Box<dyn Details>>,
    cause: Option<BoxError>,
    log: bool,
}

impl Error {
    /// Creates an error with a status code and a public message.
    ///
    /// The message may be empty. No details, no cause, not marked for logging.
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            cause: None,
            log: false,
        }
    }

    /// The sanitized `500` that stands in for any failure that is not an `Error`.
    pub fn unexpected(cause: impl Into<BoxError>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED_MESSAGE)
            .with_internal(cause)
            .with_log()
    }

    /// Attaches public details. Applying it again replaces the previous value.
    #[must_use]
    pub fn with_details(mut self, details: impl Details) -> Self {
        self.details = Some(Box::new(details));
        self
    }

    /// Attaches a private cause. It is logged, never sent.
    #[must_use]
    pub fn with_internal(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Marks the error for logging regardless of its status code.
    #[must_use]
    pub fn with_log(mut self) -> Self {
        self.log = true;
        self
    }

    pub fn code(&self) -> StatusCode { self.code }
    pub fn message(&self) -> &str { &self.message }
    pub fn details(&self) -> Option<&dyn Details> { self.details.as_deref() }
    pub fn should_log(&self) -> bool { self.log }

    /// The private cause, if any.
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Swaps the details for `details`. Only the translator does this, when the
    /// original details cannot be serialized.
    pub(crate) fn replace_details(&mut self, details: impl Details) {
        self.details = Some(Box::new(details));
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_deref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// The wire form: `{"code":…,"message":…,"details":…}` with `details` omitted
/// when absent. Fails when the details fail to serialize.
impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.details.is_some() { 3 } else { 2 };
        let mut state = serializer.serialize_struct("Error", len)?;
        state.serialize_field("code", &self.code.as_u16())?;
        state.serialize_field("message", &self.message)?;
        match &self.details {
            Some(details) => {
                let value = details.to_value().map_err(ser::Error::custom)?;
                state.serialize_field("details", &value)?;
            }
            None => state.skip_field("details")?,
        }
        state.end()
    }
}
