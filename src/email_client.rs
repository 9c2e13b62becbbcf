use std::fmt::Debug;
use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::domain::RecipientEmail;
use crate::error::error_chain_fmt;

#[derive(Clone)]
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: String,
    authorization_token: Secret<String>,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ProviderError {
    message: Option<String>,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: String,
        authorization_token: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            base_url,
            sender,
            authorization_token,
        })
    }

    /// Sends one email and returns whatever the provider answered with.
    #[tracing::instrument(
        name = "Sending an email through the delivery provider",
        skip(self, html_content, text_content)
    )]
    pub async fn send_email(
        &self,
        recipient: &RecipientEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<serde_json::Value, EmailError> {
        let url = format!("{}/emails", self.base_url.trim_end_matches('/'));
        let body = SendEmailRequest {
            from: &self.sender,
            to: [recipient.as_ref()],
            subject,
            html: html_content,
            text: text_content,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.authorization_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(EmailError::Transport)?;

        let status = response.status();
        let payload = response.bytes().await.map_err(EmailError::Transport)?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ProviderError>(&payload)
                .ok()
                .and_then(|e| e.message);
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&payload).unwrap_or(serde_json::Value::Null))
    }
}

#[derive(thiserror::Error)]
pub enum EmailError {
    #[error("{}", describe_rejection(.status, .message))]
    Rejected { status: u16, message: Option<String> },
    #[error(transparent)]
    Transport(reqwest::Error),
}

fn describe_rejection(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("Email provider responded with {}", status),
    }
}

impl Debug for EmailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
