mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::json;

const UNKNOWN_ID: &str = "6f1c3a52-0000-4000-8000-000000000000";

#[tokio::test]
async fn list_is_newest_first_and_never_exposes_hashes() {
    let t = app(false);
    let first = register(&t.router, "01000000001", None).await;
    let second = register(&t.router, "01000000002", Some("b@example.com")).await;

    let (status, raw) = send_raw(&t.router, empty_request(Method::GET, "/api/students")).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(raw).unwrap();
    assert!(!text.contains("passwordHash"));
    assert!(!text.contains("$argon2"));

    let body: serde_json::Value = serde_json::from_str(&text).unwrap();
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![second.as_str(), first.as_str()]);
    assert_eq!(body["data"][0]["isActive"], false);
    assert_eq!(body["data"][0]["email"], "b@example.com");
    assert_eq!(body["data"][0]["gender"], "ذكر");
}

#[tokio::test]
async fn update_applies_allow_listed_fields() {
    let t = app(false);
    let id = register(&t.router, "01000000001", None).await;

    let (status, body) = send(
        &t.router,
        json_request(
            Method::PUT,
            &format!("/api/students/{id}"),
            json!({"grade": "4", "email": "New@Example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["grade"], "4");
    assert_eq!(body["data"]["email"], "new@example.com");
    assert_eq!(body["data"]["firstName"], "Omar");
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn update_rejects_fields_outside_the_allow_list() {
    let t = app(false);
    let id = register(&t.router, "01000000001", None).await;

    for patch in [
        json!({"passwordHash": "x"}),
        json!({"isActive": true}),
        json!({"id": UNKNOWN_ID}),
    ] {
        let (status, body) = send(
            &t.router,
            json_request(Method::PUT, &format!("/api/students/{id}"), patch),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
    }

    let (_, list) = send(&t.router, empty_request(Method::GET, "/api/students")).await;
    assert_eq!(list["data"][0]["isActive"], false);
}

#[tokio::test]
async fn update_runs_field_validation() {
    let t = app(false);
    let id = register(&t.router, "01000000001", None).await;
    let (status, _) = send(
        &t.router,
        json_request(
            Method::PUT,
            &format!("/api/students/{id}"),
            json!({"phone": "12345"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_onto_taken_phone_conflicts() {
    let t = app(false);
    register(&t.router, "01000000001", None).await;
    let id = register(&t.router, "01000000002", None).await;
    let (status, _) = send(
        &t.router,
        json_request(
            Method::PUT,
            &format!("/api/students/{id}"),
            json!({"phone": "01000000001"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_or_malformed_ids_are_not_found() {
    let t = app(false);
    let cases = [
        json_request(Method::PUT, &format!("/api/students/{UNKNOWN_ID}"), json!({"grade": "1"})),
        empty_request(Method::DELETE, &format!("/api/students/{UNKNOWN_ID}")),
        empty_request(Method::PUT, &format!("/api/students/{UNKNOWN_ID}/activate")),
        empty_request(Method::DELETE, "/api/students/not-a-uuid"),
    ];
    for req in cases {
        let (status, body) = send(&t.router, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["msg"], "الطالب غير موجود");
    }
}

#[tokio::test]
async fn delete_removes_record_and_attachments() {
    let t = app(false);
    let logo = FilePart {
        field: "userLogo",
        file_name: "logo.jpg",
        content_type: "image/jpeg",
        body: vec![3u8; 256],
    };
    let (status, body) = send(
        &t.router,
        register_request(&student_fields("01000000001", None), &[logo]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(count_files(t.uploads.path()), 1);

    let (status, body) = send(
        &t.router,
        empty_request(Method::DELETE, &format!("/api/students/{id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "msg": "تم حذف الطالب بنجاح"}));
    assert_eq!(count_files(t.uploads.path()), 0);

    let (status, _) = send(
        &t.router,
        empty_request(Method::DELETE, &format!("/api/students/{id}")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn activation_is_idempotent() {
    let t = app(false);
    let id = register(&t.router, "01000000001", None).await;
    activate(&t.router, &id).await;
    activate(&t.router, &id).await;
    let (_, list) = send(&t.router, empty_request(Method::GET, "/api/students")).await;
    assert_eq!(list["data"][0]["isActive"], true);
}

#[tokio::test]
async fn liveness_routes_answer() {
    let t = app(false);
    let (status, body) = send_raw(&t.router, empty_request(Method::GET, "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
    let (status, _) = send_raw(&t.router, empty_request(Method::GET, "/")).await;
    assert_eq!(status, StatusCode::OK);
}
