use std::fmt::Debug;
use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::watch;

use crate::auto_dismiss::AutoDismiss;
use crate::configuration::DismissSettings;
use crate::error::error_chain_fmt;

pub const COPIED_MESSAGE: &str = "Copied to clipboard!";
pub const COPY_FAILED_MESSAGE: &str = "Failed to copy";

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Writes to the system clipboard by piping text into a helper program such
/// as `wl-copy`, `xclip -selection clipboard` or `pbcopy`.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;

        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl Clipboard for CommandClipboard {
    #[tracing::instrument(name = "Writing to the clipboard", skip(self, text))]
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(ClipboardError::Io)?;

        if let Some(mut stdin) = child.stdin.take() {
            // A program that quits without reading is judged by its exit status.
            match stdin.write_all(text.as_bytes()).await {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(ClipboardError::Io(e)),
                _ => {}
            }
        }

        let status = child.wait().await.map_err(ClipboardError::Io)?;
        if !status.success() {
            return Err(ClipboardError::CommandFailed(status));
        }

        Ok(())
    }
}

#[derive(thiserror::Error)]
pub enum ClipboardError {
    #[error("No clipboard is available")]
    Unavailable,
    #[error("Failed to talk to the clipboard program")]
    Io(#[source] std::io::Error),
    #[error("Clipboard program exited with {0}")]
    CommandFailed(ExitStatus),
}

impl Debug for ClipboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// A short-lived toast message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            message: message.into(),
        }
    }
}

#[derive(Clone)]
pub struct ClipboardCopyUtility {
    clipboard: Option<Arc<dyn Clipboard>>,
    notice: AutoDismiss<Option<Notice>>,
    dismiss_after: Duration,
}

impl ClipboardCopyUtility {
    pub fn new(clipboard: Option<Arc<dyn Clipboard>>, dismiss_after: Duration) -> Self {
        Self {
            clipboard,
            notice: AutoDismiss::new(None),
            dismiss_after,
        }
    }

    /// Uses the configured clipboard program, if any.
    pub fn from_settings(settings: &DismissSettings) -> Self {
        let clipboard = CommandClipboard::from_command(&settings.clipboard_command)
            .map(|clipboard| Arc::new(clipboard) as Arc<dyn Clipboard>);
        if clipboard.is_none() {
            tracing::warn!("No clipboard program is configured, copies will fail");
        }

        Self::new(clipboard, settings.clipboard())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notice>> {
        self.notice.subscribe()
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice.borrow().clone()
    }

    /// Copies `text` and flashes a notice with the result. Failures are
    /// logged and shown, never returned.
    #[tracing::instrument(name = "Copying to the clipboard", skip(self, text))]
    pub async fn copy(&self, text: &str) {
        let result = match &self.clipboard {
            Some(clipboard) => clipboard.write_text(text).await,
            None => Err(ClipboardError::Unavailable),
        };

        let notice = match result {
            Ok(()) => Notice::success(COPIED_MESSAGE),
            Err(error) => {
                tracing::error!(error.cause_chain = ?error, "Failed to copy to the clipboard");
                Notice::failure(COPY_FAILED_MESSAGE)
            }
        };

        self.notice
            .transition_for(|current| *current = Some(notice), self.dismiss_after, |current| {
                *current = None
            });
    }
}
