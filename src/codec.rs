//! Request body decoding with an optional validation hook, and the matching
//! response encoders.
//!
//! Every decode follows the same pipeline:
//!
//! ```text
//! read the whole stream ──► deserialize (JSON | XML | form) ──► validate
//!        │                          │                                 │
//!    400 "unable to read body"  400 "invalid JSON body"          validator's own error,
//!                               details = parse diagnostic       returned as-is
//! ```
//!
//! Validation is a closed capability of the decoded type: [`decode`] always
//! calls [`Validate::validate`], and a type that keeps the default no-op
//! comes back unchanged.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use http::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::handler::BoxError;
use crate::response::{ContentType, Response};

/// Structured-text formats understood by the codec.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    Json,
    Xml,
    /// `application/x-www-form-urlencoded`
    Form,
}

impl Format {
    /// Name used in client-facing error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Xml  => "XML",
            Self::Form => "form",
        }
    }

    pub fn content_type(self) -> ContentType {
        match self {
            Self::Json => ContentType::Json,
            Self::Xml  => ContentType::Xml,
            Self::Form => ContentType::FormData,
        }
    }
}

/// Post-decode check run by [`decode`] on every decoded value.
///
/// `validate` may fix the value up in place (clamp a field, trim a string)
/// before accepting it. Whatever it returns on failure reaches the caller
/// unchanged, so return a typed [`Error`] to control the status code.
///
/// Payload types without rules opt in with an empty impl:
///
/// ```rust
/// # #[derive(serde::Deserialize)] struct Ping { seq: u64 }
/// impl httpbox::codec::Validate for Ping {}
/// ```
///
/// ```rust
/// use httpbox::{BoxError, Error, codec::Validate};
/// use http::StatusCode;
///
/// struct Page { size: u32 }
///
/// impl Validate for Page {
///     fn validate(&mut self) -> Result<(), BoxError> {
///         if self.size == 0 {
///             return Err(Error::new(StatusCode::UNPROCESSABLE_ENTITY, "size must be positive").into());
///         }
///         self.size = self.size.min(100);
///         Ok(())
///     }
/// }
/// ```
pub trait Validate {
    fn validate(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl Validate for () {}
impl Validate for String {}
impl Validate for serde_json::Value {}
impl<K, V, S> Validate for HashMap<K, V, S> {}
impl<K, V> Validate for BTreeMap<K, V> {}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&mut self) -> Result<(), BoxError> {
        self.iter_mut().try_for_each(Validate::validate)
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&mut self) -> Result<(), BoxError> {
        self.as_mut().map_or(Ok(()), Validate::validate)
    }
}

/// Reads the whole stream.
pub fn read_bytes(mut reader: impl Read) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).map_err(unreadable)?;
    Ok(buf)
}

/// The `400` for a body that could not be read off the wire.
pub(crate) fn unreadable(err: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::new(StatusCode::BAD_REQUEST, "unable to read body")
        .with_details(err.to_string())
        .with_internal(err)
}

/// Reads the whole stream, deserializes it as `format` and validates it.
///
/// The returned value is the one the validator left behind, including any
/// in-place adjustments it made. Read and parse failures are `400` [`Error`]s;
/// a validator failure is returned as-is.
pub fn decode<T>(reader: impl Read, format: Format) -> Result<T, BoxError>
where
    T: DeserializeOwned + Validate,
{
    let bytes = read_bytes(reader)?;
    let mut value: T = parse(&bytes, format).map_err(|err| {
        Error::new(StatusCode::BAD_REQUEST, format!("invalid {} body", format.name()))
            .with_details(err.to_string())
            .with_internal(err)
    })?;
    value.validate()?;
    Ok(value)
}

fn parse<T: DeserializeOwned>(bytes: &[u8], format: Format) -> Result<T, BoxError> {
    let value = match format {
        Format::Json => serde_json::from_slice(bytes)?,
        Format::Xml  => quick_xml::de::from_reader(bytes)?,
        Format::Form => serde_urlencoded::from_bytes(bytes)?,
    };
    Ok(value)
}

/// Serializes `value` as a response body in `format`.
///
/// A value that cannot be serialized is a server bug: it becomes a logged `500`.
pub fn encode<T>(status: StatusCode, format: Format, value: &T) -> Result<Response, Error>
where
    T: Serialize + ?Sized,
{
    let body = match format {
        Format::Json => serde_json::to_vec(value).map_err(encode_failed)?,
        Format::Xml  => quick_xml::se::to_string(value).map_err(encode_failed)?.into_bytes(),
        Format::Form => serde_urlencoded::to_string(value).map_err(encode_failed)?.into_bytes(),
    };
    Ok(Response::builder().status(status).bytes(format.content_type(), body))
}

fn encode_failed(err: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::new(StatusCode::INTERNAL_SERVER_ERROR, "failed to encode response")
        .with_internal(err)
        .with_log()
}
