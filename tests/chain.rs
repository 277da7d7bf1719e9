//! End-to-end behavior of a composed chain, without the network.

use std::sync::{Arc, Mutex};

use http::{Method, StatusCode};
use httpbox::codec::{Format, Validate};
use httpbox::middleware::{self, AccessLog, Recover, Stack};
use httpbox::{BoxError, BoxedHandler, Error, Request, Response};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Person {
    name: String,
    #[serde(default)]
    age: i32,
}

impl Validate for Person {
    fn validate(&mut self) -> Result<(), BoxError> {
        if self.name.is_empty() {
            return Err(Error::new(StatusCode::UNPROCESSABLE_ENTITY, "name is required").into());
        }
        self.age = self.age.max(0);
        Ok(())
    }
}

async fn create_person(req: Request) -> Result<Response, BoxError> {
    let person: Person = req.decode(Format::Json)?;
    Ok(Response::text(format!("{} ({})", person.name, person.age)))
}

async fn search(req: Request) -> Result<Response, Error> {
    let q = req.required_query_param("q")?;
    let limit = req.query_param_or("limit", "10").int()?;
    Ok(Response::text(format!("{q}:{limit}")))
}

fn post(uri: &str, body: &'static str) -> Request {
    Request::new(Method::POST, uri.parse().unwrap()).with_body(body)
}

fn get(uri: &str) -> Request {
    Request::new(Method::GET, uri.parse().unwrap())
}

fn json(response: &Response) -> serde_json::Value {
    serde_json::from_slice(response.body()).unwrap()
}

fn stack() -> Stack {
    Stack::new().with(AccessLog).with(Recover)
}

#[tokio::test]
async fn valid_body_is_clamped_by_validator() {
    let app = stack().compose(create_person);

    let response = app.respond(post("/people", r#"{"name":"Ada","age":-5}"#)).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.body(), b"Ada (0)");
}

#[tokio::test]
async fn validation_failure_reaches_the_client() {
    let app = stack().compose(create_person);

    let response = app.respond(post("/people", r#"{"name":"","age":-5}"#)).await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json(&response), serde_json::json!({"code": 422, "message": "name is required"}));
}

#[tokio::test]
async fn malformed_body_is_400_with_diagnostic() {
    let app = stack().compose(create_person);

    let response = app.respond(post("/people", r#"{"name":"#)).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = json(&response);
    assert_eq!(body["message"], "invalid JSON body");
    assert!(body["details"].as_str().is_some_and(|d| !d.is_empty()));
}

#[tokio::test]
async fn missing_required_query_param() {
    let app = stack().compose(search);

    let response = app.respond(get("/search?limit=5")).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let message = json(&response)["message"].as_str().unwrap().to_owned();
    assert!(message.contains("\"q\""), "{message}");
    assert!(message.contains("is required"), "{message}");
}

#[tokio::test]
async fn bad_param_type_and_default() {
    let app = stack().compose(search);

    let ok = app.respond(get("/search?q=rust")).await;
    assert_eq!(ok.body(), b"rust:10");

    let bad = app.respond(get("/search?q=rust&limit=ten")).await;
    assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json(&bad)["message"],
        r#"parameter "limit" from URL query string must be an integer"#,
    );
}

#[tokio::test]
async fn internal_errors_are_redacted() {
    let app = stack().compose(|_req: Request| async {
        Err::<Response, _>(std::io::Error::other("password authentication failed for user app"))
    });

    let response = app.respond(get("/")).await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body(), br#"{"code":500,"message":"Unexpected error occurred"}"#);
}

#[tokio::test]
async fn auth_middleware_short_circuits_inside_access_log() {
    let reached = Arc::new(Mutex::new(false));
    let require_token = middleware::from_fn(|req: Request, next: BoxedHandler| async move {
        if req.header("authorization").is_none() {
            return Err(Error::new(StatusCode::UNAUTHORIZED, "missing token").into());
        }
        next.call(req).await
    });
    let handler = {
        let reached = Arc::clone(&reached);
        move |_req: Request| {
            let reached = Arc::clone(&reached);
            async move {
                *reached.lock().unwrap() = true;
                Ok::<_, Error>(StatusCode::NO_CONTENT)
            }
        }
    };
    let app = stack().with(require_token).compose(handler);

    let response = app.respond(get("/admin")).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert!(!*reached.lock().unwrap());

    let authorized = get("/admin").with_header(
        http::header::AUTHORIZATION,
        http::HeaderValue::from_static("Bearer t0k3n"),
    );
    let response = app.respond(authorized).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    assert!(*reached.lock().unwrap());
}

#[tokio::test]
async fn composed_chain_can_be_composed_again() {
    let inner = stack().compose(search);
    let outer = Stack::new().with(AccessLog).compose(inner);

    let response = outer.respond(get("/search?q=again")).await;

    assert_eq!(response.body(), b"again:10");
}
