//! Validation gate in front of the upload endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use serde_json::json;
use triage_client::{ApiClient, ClientConfig, MemoryTokenStore, NoopSessionHandler, UploadFile};
use triage_core::import::{ImportStatus, ImportType};
use triage_core::import::ImportStage;
use triage_importer::{
    AutoConfirm, PollEvent, PollOutcome, PollerConfig, UploadError, UploadOutcome,
    UploadWorkflow, WarningConfirmation,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Confirmer with a fixed answer that records how often it was asked.
struct FixedAnswer {
    answer: bool,
    asked: AtomicUsize,
}

impl FixedAnswer {
    fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }

    fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WarningConfirmation for FixedAnswer {
    async fn confirm(&self, _warnings: &[String]) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

fn workflow(server: &MockServer) -> UploadWorkflow {
    let config = ClientConfig::default().with_base_url(&server.uri());
    let client = ApiClient::new(
        &config,
        Arc::new(MemoryTokenStore::with_token("tok")),
        Arc::new(NoopSessionHandler),
    )
    .expect("client should build");

    UploadWorkflow::new(
        client,
        PollerConfig {
            interval: Duration::from_millis(20),
            grace_period: Duration::from_millis(10),
        },
    )
}

fn tickets_csv() -> UploadFile {
    UploadFile::new("tickets.csv", b"key,summary\nOPS-1,disk full\n".to_vec())
}

async fn mount_validation(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/import/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_upload(server: &MockServer, status: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/import/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "fileName": "tickets.csv",
            "importType": "JIRA_TICKETS",
            "status": status
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Test: invalid files are never uploaded
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_file_is_rejected_without_upload() {
    let server = MockServer::start().await;
    mount_validation(
        &server,
        json!({ "isValid": false, "errors": ["missing column: key"], "warnings": [] }),
    )
    .await;
    mount_upload(&server, "IN_PROGRESS", 0).await;

    let outcome = workflow(&server)
        .submit(&tickets_csv(), ImportType::JiraTickets, &AutoConfirm)
        .await
        .unwrap();

    assert_matches!(outcome, UploadOutcome::Rejected(ref v) if v.errors == vec!["missing column: key".to_string()]);
}

// ---------------------------------------------------------------------------
// Test: warnings require confirmation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn declined_warnings_skip_upload() {
    let server = MockServer::start().await;
    mount_validation(
        &server,
        json!({ "isValid": true, "errors": [], "warnings": ["3 rows have no priority"] }),
    )
    .await;
    mount_upload(&server, "IN_PROGRESS", 0).await;

    let confirmer = FixedAnswer::new(false);
    let outcome = workflow(&server)
        .submit(&tickets_csv(), ImportType::JiraTickets, &confirmer)
        .await
        .unwrap();

    assert_matches!(outcome, UploadOutcome::Declined(_));
    assert_eq!(confirmer.asked(), 1);
}

#[tokio::test]
async fn confirmed_warnings_upload_and_poll_to_completion() {
    let server = MockServer::start().await;
    mount_validation(
        &server,
        json!({ "isValid": true, "errors": [], "warnings": ["3 rows have no priority"] }),
    )
    .await;
    mount_upload(&server, "IN_PROGRESS", 1).await;
    Mock::given(method("GET"))
        .and(path("/import/progress/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "currentProgress": 100,
            "totalRecords": 1,
            "processedRecords": 1,
            "currentStage": "COMPLETED"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/import/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "id": 42, "status": "SUCCESS" }],
            "totalElements": 1,
            "totalPages": 1,
            "size": 20,
            "number": 0,
            "first": true,
            "last": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let confirmer = FixedAnswer::new(true);
    let outcome = workflow(&server)
        .submit(&tickets_csv(), ImportType::JiraTickets, &confirmer)
        .await
        .unwrap();

    assert_eq!(confirmer.asked(), 1);
    match outcome {
        UploadOutcome::Accepted { log, poll } => {
            assert_eq!(log.id, 42);
            assert_eq!(log.status, ImportStatus::InProgress);
            let handle = poll.expect("running import should be polled");
            assert_eq!(handle.import_id(), 42);
            assert_eq!(handle.finished().await, PollOutcome::Completed);
        }
        other => panic!("expected Accepted, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Test: clean files go straight through
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clean_file_uploads_without_asking() {
    let server = MockServer::start().await;
    mount_validation(&server, json!({ "isValid": true })).await;
    mount_upload(&server, "SUCCESS", 1).await;

    let confirmer = FixedAnswer::new(false);
    let outcome = workflow(&server)
        .submit(&tickets_csv(), ImportType::JiraTickets, &confirmer)
        .await
        .unwrap();

    assert_eq!(confirmer.asked(), 0);
    assert_matches!(outcome, UploadOutcome::Accepted { poll: None, .. });
}

// ---------------------------------------------------------------------------
// Test: tickets.csv from validation through to the final log refresh
// ---------------------------------------------------------------------------

async fn mount_progress_step(server: &MockServer, stage: &str, pct: u32) {
    Mock::given(method("GET"))
        .and(path("/import/progress/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "currentProgress": pct,
            "totalRecords": 200,
            "processedRecords": pct * 2,
            "currentStage": stage
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn tickets_csv_is_validated_uploaded_and_followed_to_completion() {
    let server = MockServer::start().await;
    mount_validation(
        &server,
        json!({ "isValid": true, "errors": [], "warnings": [] }),
    )
    .await;
    mount_upload(&server, "IN_PROGRESS", 1).await;
    mount_progress_step(&server, "PARSING", 10).await;
    mount_progress_step(&server, "IMPORTING", 60).await;
    mount_progress_step(&server, "COMPLETED", 100).await;
    Mock::given(method("GET"))
        .and(path("/import/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "id": 42, "fileName": "tickets.csv", "status": "SUCCESS" }],
            "totalElements": 1,
            "totalPages": 1,
            "size": 20,
            "number": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let confirmer = FixedAnswer::new(false);
    let outcome = workflow(&server)
        .submit(&tickets_csv(), ImportType::JiraTickets, &confirmer)
        .await
        .unwrap();
    assert_eq!(confirmer.asked(), 0);

    let mut handle = match outcome {
        UploadOutcome::Accepted { log, poll } => {
            assert_eq!(log.id, 42);
            poll.expect("running import should be polled")
        }
        other => panic!("expected Accepted, got {other:?}"),
    };

    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        events.push(event);
    }
    assert_eq!(handle.finished().await, PollOutcome::Completed);

    let stages: Vec<(ImportStage, f64)> = events
        .iter()
        .filter_map(|e| match e {
            PollEvent::Progress(p) => Some((p.current_stage, p.current_progress)),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![
            (ImportStage::Parsing, 10.0),
            (ImportStage::Importing, 60.0),
            (ImportStage::Completed, 100.0),
        ]
    );
    assert_matches!(events.last(), Some(PollEvent::LogsRefreshed(page)) if page.content[0].id == 42);

    let progress_requests = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/import/progress/42")
        .count();
    assert_eq!(progress_requests, 3);
}

// ---------------------------------------------------------------------------
// Test: backend failures are attributed to the right step
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validation_failure_is_reported_as_validation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/import/validate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("parser crashed"))
        .mount(&server)
        .await;
    mount_upload(&server, "IN_PROGRESS", 0).await;

    let err = workflow(&server)
        .submit(&tickets_csv(), ImportType::JiraTickets, &AutoConfirm)
        .await
        .unwrap_err();

    assert_matches!(err, UploadError::Validation(_));
    assert_eq!(err.client_error().status(), Some(500));
}
