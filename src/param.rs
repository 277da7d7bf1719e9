//! Named path and query parameters with typed accessors.
//!
//! Every failed conversion is a `400` [`Error`] whose message names the
//! parameter and where it came from:
//!
//! ```text
//! parameter "limit" from URL query string must be an integer
//! ```

use std::fmt;

use http::StatusCode;
use jiff::SignedDuration;
use jiff::civil::DateTime;

use crate::error::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Source {
    Path,
    Query,
}

impl Source {
    fn as_str(self) -> &'static str {
        match self {
            Self::Path  => "URL path",
            Self::Query => "URL query string",
        }
    }
}

/// A raw parameter value plus enough context to report a bad one.
///
/// Absent parameters hold an empty value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Param {
    source: Source,
    name: String,
    value: String,
}

impl Param {
    pub(crate) fn path(name: &str, value: impl Into<String>) -> Self {
        Self { source: Source::Path, name: name.to_owned(), value: value.into() }
    }

    pub(crate) fn query(name: &str, value: impl Into<String>) -> Self {
        Self { source: Source::Query, name: name.to_owned(), value: value.into() }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn as_str(&self) -> &str { &self.value }
    pub fn is_empty(&self) -> bool { self.value.is_empty() }

    pub(crate) fn error(&self, reason: &str) -> Error {
        Error::new(
            StatusCode::BAD_REQUEST,
            format!("parameter {:?} from {} {reason}", self.name, self.source.as_str()),
        )
    }

    pub fn int(&self) -> Result<i64, Error> {
        self.value.parse().map_err(|_| self.error("must be an integer"))
    }

    pub fn float(&self) -> Result<f64, Error> {
        self.value
            .parse()
            .map_err(|_| self.error("must be a float. Example value: 3.14"))
    }

    /// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
    pub fn bool(&self) -> Result<bool, Error> {
        match self.value.as_str() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(self.error("must be a boolean. Example values: true, false, 1, 0")),
        }
    }

    /// Friendly durations: `300ms`, `-1.5h`, `2h45m`.
    pub fn duration(&self) -> Result<SignedDuration, Error> {
        self.value
            .parse()
            .map_err(|_| self.error("must be a time duration. Example values: 300ms, -1.5h, 2h45m"))
    }

    /// Parses with a strftime-style `format`, e.g. `%Y-%m-%d %H:%M:%S`.
    ///
    /// The error message shows the current time rendered in `format`.
    pub fn time(&self, format: &str) -> Result<DateTime, Error> {
        DateTime::strptime(format, &self.value).map_err(|_| {
            let example = jiff::fmt::strtime::format(format, jiff::Zoned::now().datetime())
                .unwrap_or_default();
            self.error(&format!("must be a time. Example value: {example}"))
        })
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
