//! Ambient one-time-code retrieval.
//!
//! The platform capability is an injectable trait rather than a runtime
//! probe: hosts with an SMS bridge implement [`OtpProvider`], hosts without
//! one pass [`NullAutofill`]. Either way the widget's manual entry path is
//! untouched — autofill is strictly additive and every failure is swallowed
//! here.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{OtpError, Result};

/// A source of SMS-delivered one-time codes.
#[async_trait]
pub trait OtpProvider: Send + Sync {
    /// Wait for a one-time code to arrive. Implementations return the raw
    /// payload; the widget strips non-numerals when distributing it.
    async fn retrieve(&self) -> Result<String>;
}

/// The capability-absent provider: every request reports
/// [`OtpError::AutofillUnavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAutofill;

#[async_trait]
impl OtpProvider for NullAutofill {
    async fn retrieve(&self) -> Result<String> {
        Err(OtpError::AutofillUnavailable)
    }
}

/// One in-flight code request, bounded by a cancellation token.
///
/// Start a session when the field becomes active (and again whenever it is
/// re-enabled); a retrieved code arrives on the `codes` channel for the host
/// to pass to `OtpField::handle_autofill`. Dropping or replacing the session
/// cancels the request, so a stale response can never reach a field that has
/// been torn down or reconfigured in the meantime.
pub struct AutofillSession {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl AutofillSession {
    pub fn start(provider: Arc<dyn OtpProvider>, codes: UnboundedSender<String>) -> Self {
        let token = CancellationToken::new();
        let cancel = token.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("one-time-code request canceled");
                }
                outcome = provider.retrieve() => match outcome {
                    Ok(code) if code.chars().any(|c| c.is_ascii_digit()) => {
                        // Receiver gone means the host shut down first; fine.
                        let _ = codes.send(code);
                    }
                    Ok(_) => {
                        tracing::debug!("one-time-code payload held no numerals, dropped");
                    }
                    Err(OtpError::AutofillUnavailable | OtpError::AutofillCanceled) => {
                        tracing::debug!("no ambient one-time code available");
                    }
                    Err(err) => {
                        tracing::warn!("one-time-code retrieval failed: {err}");
                    }
                },
            }
        });
        Self { token, task }
    }

    /// Cancel the in-flight request. Idempotent; also invoked on drop.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AutofillSession {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
