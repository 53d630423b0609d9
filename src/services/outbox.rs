//! Best-effort notification queue.
//!
//! Handlers enqueue without waiting; a background worker delivers with
//! retries. A full queue or exhausted retries is logged and dropped, never
//! reported to the client whose submission already succeeded.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::config::EmailConfig;
use crate::observability::metrics;
use crate::resilience::Backoff;
use crate::services::{EmailMessage, Notifier};

/// Sending half of the notification queue. Cheap to clone.
#[derive(Clone)]
pub struct Outbox {
    tx: Option<mpsc::Sender<EmailMessage>>,
}

impl Outbox {
    /// Create a queue delivering through `notifier`, and its worker.
    pub fn new(notifier: Arc<dyn Notifier>, config: &EmailConfig) -> (Self, OutboxWorker) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let worker = OutboxWorker {
            rx,
            notifier,
            max_attempts: config.max_attempts.max(1),
            backoff: Backoff::from_config(config),
        };
        (Self { tx: Some(tx) }, worker)
    }

    /// An outbox that discards everything. Used when email is off.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Queue `message` for delivery. Returns whether it was accepted.
    pub fn enqueue(&self, message: EmailMessage) -> bool {
        let Some(tx) = &self.tx else {
            tracing::debug!(subject = %message.subject, "Email disabled, notification skipped");
            metrics::record_notification("skipped");
            return false;
        };

        match tx.try_send(message) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(message)) => {
                tracing::warn!(subject = %message.subject, "Notification queue full, dropping email");
                metrics::record_notification("dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(message)) => {
                tracing::warn!(subject = %message.subject, "Notification worker stopped, dropping email");
                metrics::record_notification("dropped");
                false
            }
        }
    }
}

/// Background task draining the [`Outbox`].
pub struct OutboxWorker {
    rx: mpsc::Receiver<EmailMessage>,
    notifier: Arc<dyn Notifier>,
    max_attempts: u32,
    backoff: Backoff,
}

impl OutboxWorker {
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(max_attempts = self.max_attempts, "Notification worker starting");

        loop {
            tokio::select! {
                message = self.rx.recv() => match message {
                    Some(message) => {
                        self.deliver(&message).await;
                    }
                    None => break,
                },
                _ = shutdown.recv() => {
                    self.rx.close();
                    while let Some(message) = self.rx.recv().await {
                        self.deliver(&message).await;
                    }
                    tracing::info!("Notification worker received shutdown signal, queue drained");
                    break;
                }
            }
        }
    }

    /// Try to send `message`, backing off between attempts.
    pub async fn deliver(&self, message: &EmailMessage) -> bool {
        for attempt in 1..=self.max_attempts {
            match self.notifier.send(message).await {
                Ok(()) => {
                    tracing::info!(subject = %message.subject, attempt, "Notification sent");
                    metrics::record_notification("sent");
                    return true;
                }
                Err(e) => {
                    tracing::warn!(
                        subject = %message.subject,
                        attempt,
                        error = %e,
                        "Notification attempt failed"
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff.delay(attempt)).await;
                    }
                }
            }
        }

        tracing::error!(subject = %message.subject, "Notification abandoned after retries");
        metrics::record_notification("failed");
        false
    }
}
