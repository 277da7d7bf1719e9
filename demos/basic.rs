//! Minimal httpbox example: JSON endpoints, typed errors and middleware.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Set `HTTPBOX_ADDR` to listen somewhere other than `0.0.0.0:3000`.
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl http://localhost:3000/users/abc
//!   curl 'http://localhost:3000/search?limit=5'
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice","age":-1}'
//!   curl http://localhost:3000/panic

use http::{Method, StatusCode};
use httpbox::codec::{self, Format, Validate};
use httpbox::middleware::{AccessLog, Recover, Stack};
use httpbox::{BoxError, Error, Request, Response, Server};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
struct User {
    name: String,
    #[serde(default)]
    age: u8,
}

#[derive(Debug, Deserialize)]
struct NewUser {
    name: String,
    #[serde(default)]
    age: i32,
}

impl Validate for NewUser {
    fn validate(&mut self) -> Result<(), BoxError> {
        if self.name.trim().is_empty() {
            return Err(Error::new(StatusCode::UNPROCESSABLE_ENTITY, "name is required").into());
        }
        self.age = self.age.clamp(0, 150);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), httpbox::ServeError> {
    tracing_subscriber::fmt::init();

    let addr = std::env::var("HTTPBOX_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());

    let app = Stack::new().with(AccessLog).with(Recover).compose(route);

    Server::bind(addr).await?.serve(app).await
}

// A hand-written dispatcher. Anything that picks a handler per request works.
async fn route(req: Request) -> Result<Response, BoxError> {
    let method = req.method().clone();
    let path = req.path().to_owned();
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match (method, segments.as_slice()) {
        (Method::GET, ["users", id]) => get_user(req.with_param("id", *id)).await,
        (Method::POST, ["users"]) => create_user(req).await,
        (Method::GET, ["search"]) => search(req).await,
        (Method::GET, ["panic"]) => panic!("handler bug"),
        _ => Err(Error::new(StatusCode::NOT_FOUND, "not found").into()),
    }
}

// GET /users/:id
async fn get_user(req: Request) -> Result<Response, BoxError> {
    let id = req.path_param("id").int()?;
    if id != 42 {
        return Err(Error::new(StatusCode::NOT_FOUND, "user not found")
            .with_details(serde_json::json!({ "id": id }))
            .into());
    }
    let user = User { name: "alice".to_owned(), age: 30 };
    Ok(codec::encode(StatusCode::OK, Format::Json, &user)?)
}

// POST /users
async fn create_user(req: Request) -> Result<Response, BoxError> {
    let input: NewUser = req.decode(Format::Json)?;
    let user = User { name: input.name, age: u8::try_from(input.age)? };
    Ok(codec::encode(StatusCode::CREATED, Format::Json, &user)?)
}

// GET /search?q=...&limit=...
async fn search(req: Request) -> Result<Response, BoxError> {
    let q = req.required_query_param("q")?;
    let limit = req.query_param_or("limit", "10").int()?;
    Ok(Response::text(format!("searching {q:?}, limit {limit}")))
}
