use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use crate::configuration::{ConfigurationError, StoreConfig, StoreCredentials};
use crate::domain::ContactSubmission;
use crate::error::error_chain_fmt;

/// Durable storage for contact submissions.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert(&self, submission: &ContactSubmission) -> Result<(), StoreError>;
}

/// The store as seen by a pipeline: either reachable, or known to be missing
/// its credentials.
#[derive(Clone)]
pub enum RemoteStore {
    Connected(Arc<dyn ContactStore>),
    Unconfigured(ConfigurationError),
}

impl RemoteStore {
    pub fn from_config(config: StoreConfig) -> Result<Self, reqwest::Error> {
        let store = match config {
            StoreConfig::Configured(credentials) => {
                Self::Connected(Arc::new(RestStoreClient::new(credentials)?))
            }
            StoreConfig::Unconfigured(error) => {
                tracing::warn!(%error, "Contact store is not configured");
                Self::Unconfigured(error)
            }
        };

        Ok(store)
    }
}

/// Inserts rows through the hosted database's REST interface.
#[derive(Clone)]
pub struct RestStoreClient {
    http_client: Client,
    endpoint: String,
    anon_key: Secret<String>,
}

impl RestStoreClient {
    pub fn new(credentials: StoreCredentials) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(credentials.timeout).build()?;
        let endpoint = format!(
            "{}/rest/v1/{}",
            credentials.base_url.as_str().trim_end_matches('/'),
            credentials.table,
        );

        Ok(Self {
            http_client,
            endpoint,
            anon_key: credentials.anon_key,
        })
    }
}

#[derive(Deserialize)]
struct RejectionBody {
    message: Option<String>,
}

#[async_trait]
impl ContactStore for RestStoreClient {
    #[tracing::instrument(name = "Saving a contact message in the store", skip(self, submission))]
    async fn insert(&self, submission: &ContactSubmission) -> Result<(), StoreError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(self.anon_key.expose_secret())
            .header("Prefer", "return=minimal")
            .json(&[submission])
            .send()
            .await
            .map_err(StoreError::Transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response
            .json::<RejectionBody>()
            .await
            .ok()
            .and_then(|body| body.message);

        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("{}", describe_rejection(.status, .message))]
    Rejected { status: u16, message: Option<String> },
    #[error(transparent)]
    Transport(reqwest::Error),
}

impl StoreError {
    /// The store's own explanation, if it gave one.
    pub fn message(&self) -> Option<String> {
        let message = match self {
            StoreError::Rejected { message, .. } => message.clone(),
            StoreError::Transport(e) => Some(e.to_string()),
        };

        message.filter(|m| !m.trim().is_empty())
    }
}

fn describe_rejection(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => format!("Store rejected the insert with {}: {}", status, message),
        None => format!("Store rejected the insert with {}", status),
    }
}

impl Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
