use std::fmt::Debug;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::configuration::ConfigurationError;
use crate::domain::{NotificationRequest, RecipientEmail};
use crate::email_client::{EmailClient, EmailError};
use crate::error::error_chain_fmt;

/// Where notifications go, resolved once at startup.
#[derive(Clone)]
pub enum Mailer {
    Configured {
        email_client: EmailClient,
        recipient: RecipientEmail,
    },
    Unconfigured(ConfigurationError),
}

#[tracing::instrument(
    name = "Notifying the owner about a contact message",
    skip(mailer, body),
    fields(
        contact_email = tracing::field::Empty,
        contact_subject = tracing::field::Empty
    )
)]
pub async fn send_contact_notification(
    State(mailer): State<Mailer>,
    body: Bytes,
) -> Result<impl IntoResponse, NotifyError> {
    // the body is parsed by hand so that malformed input answers 500 like any other failure
    let request: NotificationRequest =
        serde_json::from_slice(&body).map_err(NotifyError::InvalidPayload)?;
    tracing::Span::current()
        .record("contact_email", &tracing::field::display(&request.email))
        .record("contact_subject", &tracing::field::display(&request.subject));

    let (email_client, recipient) = match &mailer {
        Mailer::Configured {
            email_client,
            recipient,
        } => (email_client, recipient),
        Mailer::Unconfigured(error) => {
            return Err(NotifyError::MissingConfiguration(error.clone()))
        }
    };

    let data = email_client
        .send_email(
            recipient,
            &request.email_subject(),
            &request.html_body(),
            &request.text_body(),
        )
        .await
        .map_err(NotifyError::DeliveryError)?;

    Ok(Json(json!({ "success": true, "data": data })))
}

#[derive(thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid request body: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    #[error("Missing environment variables")]
    MissingConfiguration(#[source] ConfigurationError),
    #[error(transparent)]
    DeliveryError(EmailError),
}

impl Debug for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl IntoResponse for NotifyError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:?}", self);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
