//! Router-level tests for admission and status queries
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use postrider::{
    AppState, AuditLog, DeliveryError, DispatchJob, Dispatcher, RetryPolicy, StatusRegistry,
    Transport, WorkerPool,
    config::{Credential, SenderConfig},
    server::router,
};
use serde_json::Value;
use tower::util::ServiceExt;
use uuid::Uuid;

/// Transport that always succeeds immediately.
struct OkTransport;

#[async_trait]
impl Transport for OkTransport {
    async fn deliver(&self, _job: &DispatchJob) -> Result<(), DeliveryError> {
        Ok(())
    }
}

struct TestService {
    state: AppState,
    _audit_dir: tempfile::TempDir,
}

async fn test_service(with_credentials: bool) -> TestService {
    let audit_dir = tempfile::tempdir().unwrap();
    let audit_log = Arc::new(
        AuditLog::open(audit_dir.path().join("audit.csv"))
            .await
            .unwrap(),
    );

    let registry = StatusRegistry::new();
    let dispatcher = Dispatcher::new(
        Arc::new(OkTransport),
        registry.clone(),
        audit_log,
        RetryPolicy::default(),
    );
    let pool = WorkerPool::start(2, 8, dispatcher);

    let sender = with_credentials.then(|| {
        Arc::new(SenderConfig {
            email: "robot@example.com".to_string(),
            display_name: "Robot".to_string(),
            credential: Credential::new("hunter2"),
        })
    });

    TestService {
        state: AppState {
            registry,
            pool,
            sender,
        },
        _audit_dir: audit_dir,
    }
}

fn send_email_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/send-email")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_admission_returns_request_id() {
    let service = test_service(true).await;

    let response = router(service.state.clone())
        .oneshot(send_email_request(
            r#"{"subject":"Hi","recipient":"user@example.com","body":"Hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["message"], "Email request processed");

    let id = json["request_id"].as_str().unwrap();
    assert!(id.parse::<Uuid>().is_ok());
}

#[tokio::test]
async fn test_status_query_immediately_after_admission_never_misses() {
    let service = test_service(true).await;

    let response = router(service.state.clone())
        .oneshot(send_email_request(
            r#"{"subject":"Hi","recipient":"user@example.com","body":"Hello"}"#,
        ))
        .await
        .unwrap();
    let json = response_json(response).await;
    let id = json["request_id"].as_str().unwrap().to_string();

    let response = router(service.state.clone())
        .oneshot(
            Request::builder()
                .uri(format!("/email-status/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["request_id"], id.as_str());
    // Pending or already terminal - but never unknown.
    assert_ne!(json["status"], "Request ID not found");
}

#[tokio::test]
async fn test_missing_field_rejected_and_nothing_registered() {
    let service = test_service(true).await;

    let response = router(service.state.clone())
        .oneshot(send_email_request(
            r#"{"recipient":"user@example.com","body":"Hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["error"], "Missing required fields");
    assert!(service.state.registry.is_empty());
}

#[tokio::test]
async fn test_invalid_address_rejected() {
    let service = test_service(true).await;

    let response = router(service.state.clone())
        .oneshot(send_email_request(
            r#"{"subject":"Hi","recipient":"not-an-address","body":"Hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["error"], "Invalid email format");
}

#[tokio::test]
async fn test_over_length_subject_rejected_boundary_accepted() {
    let service = test_service(true).await;

    let over = "s".repeat(256);
    let response = router(service.state.clone())
        .oneshot(send_email_request(&format!(
            r#"{{"subject":"{over}","recipient":"user@example.com","body":"Hello"}}"#
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["error"], "Subject or body exceeds character limits");

    let boundary = "s".repeat(255);
    let response = router(service.state.clone())
        .oneshot(send_email_request(&format!(
            r#"{{"subject":"{boundary}","recipient":"user@example.com","body":"Hello"}}"#
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_credentials_rejected() {
    let service = test_service(false).await;

    let response = router(service.state.clone())
        .oneshot(send_email_request(
            r#"{"subject":"Hi","recipient":"user@example.com","body":"Hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["error"], "Missing user credentials");
    assert!(service.state.registry.is_empty());
}

#[tokio::test]
async fn test_unknown_identifier_reports_not_found() {
    let service = test_service(true).await;

    for unknown in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        let response = router(service.state.clone())
            .oneshot(
                Request::builder()
                    .uri(format!("/email-status/{unknown}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["request_id"], unknown.as_str());
        assert_eq!(json["status"], "Request ID not found");
    }
}

#[tokio::test]
async fn test_health_probes_answer_ok() {
    let service = test_service(true).await;

    for path in ["/health/live", "/health/ready"] {
        let response = router(service.state.clone())
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_queue_stats_reflect_admissions() {
    let service = test_service(true).await;

    let response = router(service.state.clone())
        .oneshot(send_email_request(
            r#"{"subject":"Hi","recipient":"user@example.com","body":"Hello"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router(service.state.clone())
        .oneshot(
            Request::builder()
                .uri("/queue/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["total"], 1);
    let pending = json["pending"].as_u64().unwrap();
    let sent = json["sent"].as_u64().unwrap();
    assert_eq!(pending + sent, 1);
}
