//! Agency notifications derived from bus events.
//!
//! The [`NotificationDispatcher`] listens on the bus and hands a
//! [`Notification`] to a [`Notifier`] for events the agency cares about:
//! a client confirming a proposal or leaving a comment. Delivery is
//! fire-and-forget: failures are logged and never reach the request that
//! published the event.
//!
//! The recipient comes from the event payload (`notification_email`), which
//! the publisher fills from the organization settings. Events without a
//! recipient are skipped.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::{PlatformEvent, EVENT_COMMENT_CREATED, EVENT_PROPOSAL_CONFIRMED};

/// A message for the agency's notification address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Build the notification for an event, if it warrants one.
    pub fn from_event(event: &PlatformEvent) -> Option<Self> {
        let recipient = event
            .payload
            .get("notification_email")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())?
            .to_string();
        let title = payload_str(event, "title").unwrap_or("a proposal");

        match event.event_type.as_str() {
            EVENT_PROPOSAL_CONFIRMED => {
                let name = payload_str(event, "confirmed_by_name").unwrap_or("The client");
                Some(Self {
                    recipient,
                    subject: format!("Proposal confirmed: {title}"),
                    body: format!("{name} confirmed \"{title}\"."),
                })
            }
            EVENT_COMMENT_CREATED => {
                let author = payload_str(event, "author_name").unwrap_or("The client");
                let content = payload_str(event, "content").unwrap_or_default();
                Some(Self {
                    recipient,
                    subject: format!("New comment on {title}"),
                    body: format!("{author} wrote: {content}"),
                })
            }
            _ => None,
        }
    }
}

fn payload_str<'a>(event: &'a PlatformEvent, key: &str) -> Option<&'a str> {
    event.payload.get(key).and_then(|v| v.as_str())
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// A delivery channel for notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            "Notification"
        );
        Ok(())
    }
}

/// Background task forwarding bus events to a [`Notifier`].
pub struct NotificationDispatcher<N: Notifier> {
    notifier: N,
}

impl<N: Notifier> NotificationDispatcher<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    /// Run until `cancel` fires or the bus is dropped.
    pub async fn run(
        &self,
        mut receiver: broadcast::Receiver<PlatformEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notification dispatcher cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => self.handle(&event).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Notification dispatcher lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, notification dispatcher shutting down");
                        break;
                    }
                },
            }
        }
    }

    async fn handle(&self, event: &PlatformEvent) {
        let Some(notification) = Notification::from_event(event) else {
            return;
        };
        if let Err(e) = self.notifier.send(&notification).await {
            tracing::warn!(
                error = %e,
                event_type = %event.event_type,
                source_entity_id = ?event.source_entity_id,
                "Failed to deliver notification"
            );
        }
    }
}
