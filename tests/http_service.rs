//! HTTP contract of the notification service client, verified against a
//! wiremock server.

use std::sync::Arc;

use jobboard::errors::{ErrorKind, NotifyError};
use jobboard::models::notification::JobRef;
use jobboard::service::http::{HttpNotificationService, HttpOptions};
use jobboard::service::NotificationService;
use jobboard::session::StaticSession;
use jobboard::store::{MarkOutcome, NotificationStore, RefreshOutcome};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpNotificationService {
    let options = HttpOptions {
        max_retries: 0,
        ..HttpOptions::default()
    };
    HttpNotificationService::new(&format!("{}/api", server.uri()), options).unwrap()
}

fn sample_body() -> serde_json::Value {
    json!({
        "notifications": [
            {
                "_id": "n2",
                "type": "application_status",
                "title": "Application Rejected",
                "message": "Thanks for applying",
                "createdAt": "2026-10-17T10:00:00Z",
                "read": false,
                "relatedJob": { "_id": "job-7", "title": "Backend Engineer" }
            },
            {
                "_id": "n1",
                "type": "job_alert",
                "title": "New job posted",
                "message": "A new Rust role",
                "createdAt": "2026-10-16T10:00:00Z",
                "read": true
            }
        ]
    })
}

// ── list ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_sends_bearer_token_and_parses_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .and(header("authorization", "Bearer tok_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
        .expect(1)
        .mount(&server)
        .await;

    let list = client(&server).list("tok_abc").await.unwrap();

    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, "n2");
    assert_eq!(list[0].title, "Application Rejected");
    assert_eq!(
        list[0].related_job,
        Some(JobRef::Populated {
            id: "job-7".into(),
            title: Some("Backend Engineer".into()),
        })
    );
    assert!(list[1].read);
}

#[tokio::test]
async fn test_list_non_2xx_is_service_rejected_with_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Token is not valid" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).list("expired").await.unwrap_err();
    assert_eq!(
        err,
        NotifyError::ServiceRejected {
            status: 401,
            message: Some("Token is not valid".into()),
        }
    );
}

#[tokio::test]
async fn test_list_malformed_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server).list("tok").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn test_unreachable_service_is_network_failure() {
    // Nothing listens on port 1.
    let options = HttpOptions {
        max_retries: 0,
        ..HttpOptions::default()
    };
    let svc = HttpNotificationService::new("http://127.0.0.1:1/api", options).unwrap();

    let err = svc.list("tok").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
}

// ── mark_read ────────────────────────────────────────────────

#[tokio::test]
async fn test_mark_read_puts_to_read_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/notifications/n2/read"))
        .and(header("authorization", "Bearer tok_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).mark_read("tok_abc", "n2").await.unwrap();
}

#[tokio::test]
async fn test_mark_read_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/notifications/missing/read"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "not found" })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).mark_read("tok", "missing").await.unwrap_err();
    assert_eq!(
        err,
        NotifyError::ServiceRejected {
            status: 404,
            message: Some("not found".into()),
        }
    );
}

// ── store over HTTP ──────────────────────────────────────────

#[tokio::test]
async fn test_store_end_to_end_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/notifications/n2/read"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = NotificationStore::new(
        Arc::new(client(&server)),
        Arc::new(StaticSession::new("tok")),
    );

    assert_eq!(
        store.refresh().await.unwrap(),
        RefreshOutcome::Applied { count: 2, unread: 1 }
    );
    assert_eq!(store.mark_as_read("n2").await.unwrap(), MarkOutcome::Marked);
    assert_eq!(store.unread_count(), 0);
}

#[tokio::test]
async fn test_store_without_session_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
        .expect(0)
        .mount(&server)
        .await;

    let store = NotificationStore::new(
        Arc::new(client(&server)),
        Arc::new(StaticSession::anonymous()),
    );

    assert_eq!(store.refresh().await.unwrap(), RefreshOutcome::NoSession);
}
