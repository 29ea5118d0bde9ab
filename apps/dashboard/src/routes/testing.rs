//! Helpers for driving the full router against a [`FakeApi`].

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, header::HeaderName, request, Request, StatusCode},
    response::Response,
    Router,
};
use tower::ServiceExt;
use uuid::Uuid;

use crate::api::fake::FakeApi;
use crate::config::Config;
use crate::routes::build_router;
use crate::shell::session::{Session, SESSION_COOKIE};
use crate::state::AppState;

pub const BOUNDARY: &str = "dashboard-test-boundary";

/// Session every helper request carries unless a test picks another.
pub const TEST_SESSION: Uuid = Uuid::from_u128(0x5e55_1011);

pub fn test_state(api: Arc<FakeApi>) -> AppState {
    let mut config = Config::from_vars(|_: &str| None).unwrap();
    config.upload_refresh_delay = Duration::ZERO;
    AppState::new(api, config).unwrap()
}

/// The store behind [`TEST_SESSION`].
pub async fn session(state: &AppState) -> Session {
    state.sessions.resolve(Some(TEST_SESSION)).await
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookie: Option<String>,
    pub body: String,
}

fn header_value(response: &Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let location = header_value(&response, header::LOCATION);
    let set_cookie = header_value(&response, header::SET_COOKIE);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse {
        status,
        location,
        set_cookie,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

fn with_session(builder: request::Builder, session: Option<Uuid>) -> request::Builder {
    match session {
        Some(id) => builder.header(header::COOKIE, format!("{SESSION_COOKIE}={id}")),
        None => builder,
    }
}

pub async fn get(state: &AppState, uri: &str) -> TestResponse {
    get_as(state, Some(TEST_SESSION), uri).await
}

/// GET as a given browser; `None` is a first visit without a cookie.
pub async fn get_as(state: &AppState, session: Option<Uuid>, uri: &str) -> TestResponse {
    let request = with_session(Request::builder().uri(uri), session)
        .body(Body::empty())
        .unwrap();
    send(build_router(state.clone()), request).await
}

pub async fn post_form(state: &AppState, uri: &str, form: &str) -> TestResponse {
    let request = with_session(Request::builder(), Some(TEST_SESSION))
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    send(build_router(state.clone()), request).await
}

/// Multipart body with one `files` part per `(filename, content)`.
pub fn multipart_body(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (filename, content) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_files(state: &AppState, uri: &str, files: &[(&str, Vec<u8>)]) -> TestResponse {
    let request = with_session(Request::builder(), Some(TEST_SESSION))
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(files)))
        .unwrap();
    send(build_router(state.clone()), request).await
}
