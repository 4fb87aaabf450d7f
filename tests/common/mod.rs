#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use student_records::{build_app, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "----student-records-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub uploads: TempDir,
}

pub fn app(default_active: bool) -> TestApp {
    let uploads = TempDir::new().unwrap();
    let state = AppState::in_memory(uploads.path(), default_active);
    TestApp {
        router: build_app(state.clone()),
        state,
        uploads,
    }
}

pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub body: Vec<u8>,
}

pub fn multipart_body(fields: &[(&str, &str)], files: &[FilePart<'_>]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in fields {
        out.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for f in files {
        out.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                f.field, f.file_name, f.content_type
            )
            .as_bytes(),
        );
        out.extend_from_slice(&f.body);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    out
}

/// Valid registration fields for `phone`, with an optional email.
pub fn student_fields<'a>(phone: &'a str, email: Option<&'a str>) -> Vec<(&'a str, &'a str)> {
    let mut fields = vec![
        ("firstName", "Omar"),
        ("middleName", "Ali"),
        ("lastName", "Hassan"),
        ("phone", phone),
        ("fatherPhone", "01198765432"),
        ("gender", "ذكر"),
        ("government", "Cairo"),
        ("grade", "3"),
        ("password", "Secret123"),
        ("confirmPassword", "Secret123"),
    ];
    if let Some(email) = email {
        fields.push(("email", email));
    }
    fields
}

pub fn register_request(fields: &[(&str, &str)], files: &[FilePart<'_>]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/register")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields, files)))
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn send_raw(router: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(router, req).await;
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Registers a valid student and returns its id.
pub async fn register(router: &Router, phone: &str, email: Option<&str>) -> String {
    let (status, body) = send(router, register_request(&student_fields(phone, email), &[])).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

pub async fn activate(router: &Router, id: &str) {
    let (status, body) = send(
        router,
        empty_request(Method::PUT, &format!("/api/students/{id}/activate")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

pub fn count_files(dir: &std::path::Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|e| {
            let p = e.path();
            if p.is_dir() {
                count_files(&p)
            } else {
                1
            }
        })
        .sum()
}
