//! # httpbox
//!
//! Fallible HTTP handlers for Rust services. Nothing more. Nothing less.
//!
//! ## The contract
//!
//! A handler either returns a response or fails. It never writes an error
//! response itself. Failures travel up through the middleware chain and are
//! turned into a response in exactly one place, the translator, which decides
//! what the client may see:
//!
//! - a typed [`Error`] keeps its status code, message and details;
//! - anything else becomes `500 Unexpected error occurred`;
//! - internal causes go to the log, never over the wire.
//!
//! What httpbox intentionally leaves to others:
//!
//! - **Routing**: bring your own dispatcher, attach path parameters with [`Request::with_param`]
//! - **TLS, rate limiting, retries**: the proxy in front of you
//! - **Log output**: install any `tracing` subscriber
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use httpbox::codec::{Format, Validate};
//! use httpbox::middleware::{AccessLog, Recover, Stack};
//! use httpbox::{BoxError, Error, Request, Response, Server};
//! use http::StatusCode;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct NewUser { name: String }
//!
//! impl Validate for NewUser {
//!     fn validate(&mut self) -> Result<(), BoxError> {
//!         if self.name.trim().is_empty() {
//!             return Err(Error::new(StatusCode::UNPROCESSABLE_ENTITY, "name is required").into());
//!         }
//!         Ok(())
//!     }
//! }
//!
//! async fn create_user(req: Request) -> Result<Response, BoxError> {
//!     let user: NewUser = req.decode(Format::Json)?;
//!     Ok(Response::builder()
//!         .status(StatusCode::CREATED)
//!         .text(format!("created {}", user.name)))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), httpbox::ServeError> {
//!     let app = Stack::new().with(AccessLog).with(Recover).compose(create_user);
//!     Server::bind("0.0.0.0:3000").await?.serve(app).await
//! }
//! ```

mod error;
mod param;
mod request;
mod response;
mod server;

pub mod codec;
pub mod handler;
pub mod middleware;
pub mod translate;

#[cfg(test)]
mod test_support;

pub use error::{Details, Error, UNEXPECTED_MESSAGE};
pub use handler::{BoxError, BoxedHandler, Handler};
pub use param::Param;
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use server::{ServeError, Server};
