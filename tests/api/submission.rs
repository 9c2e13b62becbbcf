use std::time::Duration;

use chrono::{DateTime, Utc};
use claims::assert_matches;
use wiremock::{
    matchers::{any, header, method, path},
    Mock, ResponseTemplate,
};

use portfolio_contact::domain::ContactForm;
use portfolio_contact::pipeline::{
    PipelineState, SubmissionStatus, SubmitError, SubmitOutcome, FALLBACK_MESSAGE,
};

use crate::helpers::{Form, DISMISS_AFTER};

fn ada() -> ContactForm {
    ContactForm::new("Ada", "ada@example.com", "Hi", "Hello")
}

fn displayed_error(form: &Form) -> Option<String> {
    match form.pipeline.state().status {
        SubmissionStatus::Error { message } => Some(message),
        _ => None,
    }
}

#[tokio::test]
async fn submitted_message_reaches_the_store_and_the_form_resets() {
    let form = Form::new().await;
    let mut receiver = form.pipeline.subscribe();

    Mock::given(path("/rest/v1/contact_messages"))
        .and(method("POST"))
        .and(header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&form.store_server)
        .await;

    let before = Utc::now();
    let outcome = form.pipeline.submit(ada()).await;
    let after = Utc::now();

    assert_matches!(outcome, SubmitOutcome::Submitted);
    assert_eq!(form.pipeline.state().status, SubmissionStatus::Success);

    let request = &form.store_server.received_requests().await.unwrap()[0];
    let rows: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["name"], "Ada");
    assert_eq!(rows[0]["email"], "ada@example.com");
    assert_eq!(rows[0]["subject"], "Hi");
    assert_eq!(rows[0]["message"], "Hello");
    let created_at = DateTime::parse_from_rfc3339(rows[0]["created_at"].as_str().unwrap())
        .unwrap()
        .with_timezone(&Utc);
    assert!(before - chrono::Duration::milliseconds(1) <= created_at && created_at <= after);

    tokio::time::timeout(
        DISMISS_AFTER * 10,
        receiver.wait_for(|state| state.status == SubmissionStatus::Idle),
    )
    .await
    .expect("Success banner was never dismissed")
    .unwrap();
    assert_eq!(form.pipeline.state(), PipelineState::default());
}

#[tokio::test]
async fn placeholder_store_url_fails_without_any_network_call() {
    let form = Form::with_store_url(|uri| format!("{}/placeholder", uri)).await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&form.store_server)
        .await;

    let outcome = form.pipeline.submit(ada()).await;

    assert_matches!(
        outcome,
        SubmitOutcome::Failed(SubmitError::ConfigurationError(_))
    );
    assert_eq!(displayed_error(&form).as_deref(), Some(FALLBACK_MESSAGE));
}

#[tokio::test]
async fn store_rejection_message_is_displayed_exactly() {
    let form = Form::new().await;

    Mock::given(any())
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(serde_json::json!({ "message": "network unreachable" })),
        )
        .expect(1)
        .mount(&form.store_server)
        .await;

    let outcome = form.pipeline.submit(ada()).await;

    assert_matches!(outcome, SubmitOutcome::Failed(SubmitError::RemoteError(_)));
    assert_eq!(displayed_error(&form).as_deref(), Some("network unreachable"));
    assert_eq!(form.pipeline.state().form, ada());
}

#[tokio::test]
async fn store_rejection_without_message_displays_the_fallback() {
    let form = Form::new().await;
    let mut receiver = form.pipeline.subscribe();

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&form.store_server)
        .await;

    form.pipeline.submit(ada()).await;

    assert_eq!(displayed_error(&form).as_deref(), Some(FALLBACK_MESSAGE));

    tokio::time::timeout(
        DISMISS_AFTER * 10,
        receiver.wait_for(|state| state.status == SubmissionStatus::Idle),
    )
    .await
    .expect("Error banner was never dismissed")
    .unwrap();
}

#[tokio::test]
async fn submissions_while_pending_do_not_reach_the_store() {
    let form = Form::new().await;
    let mut receiver = form.pipeline.subscribe();

    Mock::given(any())
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&form.store_server)
        .await;

    let first = tokio::spawn({
        let pipeline = form.pipeline.clone();
        async move { pipeline.submit(ada()).await }
    });
    receiver.wait_for(PipelineState::is_pending).await.unwrap();

    for _ in 0..3 {
        assert_matches!(
            form.pipeline.submit(ada()).await,
            SubmitOutcome::AlreadyPending
        );
    }

    assert_matches!(first.await.unwrap(), SubmitOutcome::Submitted);
    assert_eq!(form.store_server.received_requests().await.unwrap().len(), 1);
}
