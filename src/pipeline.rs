use std::fmt::Debug;
use std::time::Duration;

use tokio::sync::watch;

use crate::auto_dismiss::AutoDismiss;
use crate::configuration::{ConfigurationError, Settings};
use crate::domain::{ContactField, ContactForm, ContactSubmission};
use crate::error::error_chain_fmt;
use crate::store_client::{RemoteStore, StoreError};

/// Shown when a failure carries no message of its own.
pub const FALLBACK_MESSAGE: &str = "Failed to send message. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Idle,
    Pending,
    Success,
    Error { message: String },
}

/// Everything the contact form renders from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineState {
    pub form: ContactForm,
    pub status: SubmissionStatus,
}

impl PipelineState {
    pub fn is_pending(&self) -> bool {
        self.status == SubmissionStatus::Pending
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            form: ContactForm::default(),
            status: SubmissionStatus::Idle,
        }
    }
}

/// How long the success and error banners stay up.
#[derive(Debug, Clone, Copy)]
pub struct DismissTimings {
    pub success: Duration,
    pub error: Duration,
}

impl Default for DismissTimings {
    fn default() -> Self {
        Self {
            success: Duration::from_secs(5),
            error: Duration::from_secs(4),
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Submitted,
    AlreadyPending,
    Failed(SubmitError),
}

/// Drives the submissions of one contact form.
///
/// Each form mount owns its own pipeline; clones share the same state.
#[derive(Clone)]
pub struct SubmissionPipeline {
    store: RemoteStore,
    state: AutoDismiss<PipelineState>,
    timings: DismissTimings,
}

impl SubmissionPipeline {
    pub fn new(store: RemoteStore, timings: DismissTimings) -> Self {
        Self {
            store,
            state: AutoDismiss::new(PipelineState::default()),
            timings,
        }
    }

    /// Resolves the store credentials and banner timings from `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, reqwest::Error> {
        let store = RemoteStore::from_config(settings.store.load())?;

        Ok(Self::new(store, settings.dismiss.timings()))
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    /// Updates one form field. Edits are ignored while a submission is in flight.
    pub fn edit(&self, field: ContactField, value: impl Into<String>) -> bool {
        let value = value.into();
        self.state.modify(|state| {
            if state.is_pending() {
                return false;
            }
            state.form.set(field, value);
            true
        })
    }

    #[tracing::instrument(
        name = "Submitting a contact message",
        skip(self, payload),
        fields(
            contact_email = %payload.email,
            contact_name = %payload.name
        )
    )]
    pub async fn submit(&self, payload: ContactForm) -> SubmitOutcome {
        let accepted = self.state.transition_if(|state| {
            if state.is_pending() {
                return false;
            }
            state.form = payload.clone();
            state.status = SubmissionStatus::Pending;
            true
        });
        if !accepted {
            tracing::warn!("A submission is already in flight, ignoring this one");
            return SubmitOutcome::AlreadyPending;
        }

        let pending = PendingGuard::new(self);
        let result = self.send(payload).await;
        pending.disarm();

        match result {
            Ok(()) => {
                tracing::info!("Contact message has been stored");
                self.state.transition_for(
                    |state| {
                        state.form = ContactForm::default();
                        state.status = SubmissionStatus::Success;
                    },
                    self.timings.success,
                    dismiss,
                );
                SubmitOutcome::Submitted
            }
            Err(error) => {
                tracing::error!(error.cause_chain = ?error, "Failed to submit a contact message");
                let message = error.user_message();
                self.state.transition_for(
                    |state| state.status = SubmissionStatus::Error { message },
                    self.timings.error,
                    dismiss,
                );
                SubmitOutcome::Failed(error)
            }
        }
    }

    async fn send(&self, payload: ContactForm) -> Result<(), SubmitError> {
        let submission = ContactSubmission::stamp(payload).map_err(SubmitError::ValidationError)?;

        let store = match &self.store {
            RemoteStore::Connected(store) => store,
            RemoteStore::Unconfigured(error) => {
                return Err(SubmitError::ConfigurationError(error.clone()))
            }
        };

        store
            .insert(&submission)
            .await
            .map_err(SubmitError::RemoteError)
    }
}

fn dismiss(state: &mut PipelineState) {
    state.status = SubmissionStatus::Idle;
}

/// Leaves `Pending` if a submission is dropped before the store answers.
struct PendingGuard {
    state: AutoDismiss<PipelineState>,
    error_after: Duration,
    armed: bool,
}

impl PendingGuard {
    fn new(pipeline: &SubmissionPipeline) -> Self {
        Self {
            state: pipeline.state.clone(),
            error_after: pipeline.timings.error,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        tracing::warn!("Contact submission was cancelled before the store answered");
        let fail = |state: &mut PipelineState| {
            state.status = SubmissionStatus::Error {
                message: FALLBACK_MESSAGE.to_string(),
            }
        };
        // The dismiss timer needs a runtime to run on.
        if tokio::runtime::Handle::try_current().is_ok() {
            self.state.transition_for(fail, self.error_after, dismiss);
        } else {
            self.state.transition(dismiss);
        }
    }
}

#[derive(thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    ValidationError(String),
    #[error("The contact store is not configured")]
    ConfigurationError(#[source] ConfigurationError),
    #[error("The contact store rejected the message")]
    RemoteError(#[source] StoreError),
}

impl SubmitError {
    /// The text shown to the visitor for this failure.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::ValidationError(message) => message.clone(),
            SubmitError::ConfigurationError(_) => FALLBACK_MESSAGE.to_string(),
            SubmitError::RemoteError(error) => error
                .message()
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        }
    }
}

impl Debug for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
