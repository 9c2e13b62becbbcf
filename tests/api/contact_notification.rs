use reqwest::StatusCode;
use wiremock::{
    matchers::{any, header, method, path},
    Mock, ResponseTemplate,
};

use crate::helpers::{App, RECIPIENT};

fn contact_message() -> serde_json::Value {
    serde_json::json!({
        "name": "Ada",
        "email": "ada@example.com",
        "subject": "Hi",
        "message": "Hello",
        "created_at": "2024-05-01T10:00:00.000Z",
    })
}

#[tokio::test]
async fn notification_is_sent_to_the_configured_recipient() {
    let app = App::new().await;

    Mock::given(path("/emails"))
        .and(method("POST"))
        .and(header("Authorization", "Bearer re_test_key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "4ef9a417" })),
        )
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.post_notification(&contact_message()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "success": true, "data": { "id": "4ef9a417" } })
    );

    let email_request = &app.email_server.received_requests().await.unwrap()[0];
    let email: serde_json::Value = serde_json::from_slice(&email_request.body).unwrap();
    assert_eq!(email["to"], serde_json::json!([RECIPIENT]));
    assert_eq!(email["from"], "Portfolio Contact Form <onboarding@resend.dev>");
    assert_eq!(email["subject"], "New Contact Form Message: Hi");
    assert!(email["html"].as_str().unwrap().contains("mailto:ada@example.com"));
    assert!(email["text"]
        .as_str()
        .unwrap()
        .contains("Date: 2024-05-01 10:00:00 UTC"));
}

#[tokio::test]
async fn missing_mail_credentials_answer_500_without_sending() {
    let app = App::without_mail_credentials().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = app.post_notification(&contact_message()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "error": "Missing environment variables" })
    );
}

#[tokio::test]
async fn provider_failure_answers_500_with_its_message() {
    let app = App::new().await;

    Mock::given(path("/emails"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "statusCode": 403,
            "name": "validation_error",
            "message": "You can only send testing emails to your own email address",
        })))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.post_notification(&contact_message()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "You can only send testing emails to your own email address"
    );
}

#[tokio::test]
async fn malformed_body_answers_500() {
    let app = App::new().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let test_cases = [
        "not json at all",
        r#"{"name": "Ada", "email": "ada@example.com"}"#,
    ];

    for body in test_cases {
        let response = app.post_raw_notification(body).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    }
}
