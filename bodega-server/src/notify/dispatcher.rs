//! Notification dispatch
//!
//! Loads the attachment (tolerating a writer still holding the file),
//! then walks the channel list in priority order until one accepts the
//! message. Runs strictly after the triggering transition committed, so
//! every failure here is logged and swallowed.

use std::path::PathBuf;
use std::sync::Arc;

use super::channel::{MailAttachment, MailChannel, OutgoingMail};
use super::retry_read::{read_all_with, RetryPolicy};

/// A message handed to the dispatcher by the worker
#[derive(Debug, Clone)]
pub struct DispatchMessage {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    /// Attachment as (file name, on-disk path); bytes are loaded here
    pub attachment: Option<(String, PathBuf)>,
}

/// Sends composed messages through the configured channels
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn MailChannel>>,
    retry_policy: RetryPolicy,
}

impl NotificationDispatcher {
    /// Channels in priority order; the first that accepts wins
    pub fn new(channels: Vec<Arc<dyn MailChannel>>) -> Self {
        Self {
            channels,
            retry_policy: RetryPolicy::default(),
        }
    }

    #[cfg(test)]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Send a message, returning whether any channel delivered it
    ///
    /// An unreadable attachment downgrades the message to attachment-less
    /// rather than dropping it.
    pub async fn send(&self, message: DispatchMessage) -> bool {
        let attachment = match &message.attachment {
            Some((filename, path)) => match read_all_with(path, self.retry_policy).await {
                Ok(bytes) => Some(MailAttachment {
                    filename: filename.clone(),
                    content_type: "application/pdf".to_string(),
                    bytes,
                }),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Attachment unreadable, sending without it"
                    );
                    None
                }
            },
            None => None,
        };

        let mail = OutgoingMail {
            to: message.recipient,
            subject: message.subject,
            html_body: message.html_body,
            attachment,
        };

        for channel in &self.channels {
            match channel.send(&mail).await {
                Ok(()) => {
                    tracing::info!(
                        channel = channel.name(),
                        to = %mail.to,
                        subject = %mail.subject,
                        "Notification delivered"
                    );
                    return true;
                }
                Err(e) => {
                    tracing::warn!(
                        channel = channel.name(),
                        to = %mail.to,
                        error = %e,
                        "Channel failed, trying next"
                    );
                }
            }
        }

        tracing::error!(to = %mail.to, subject = %mail.subject, "All delivery channels failed");
        false
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingChannel;
    use super::*;

    fn message(attachment: Option<(String, PathBuf)>) -> DispatchMessage {
        DispatchMessage {
            recipient: "ana@example.com".to_string(),
            subject: "Pedido confirmado".to_string(),
            html_body: "<p>Gracias</p>".to_string(),
            attachment,
        }
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let primary = RecordingChannel::accepting();
        let fallback = RecordingChannel::accepting();
        let dispatcher = NotificationDispatcher::new(vec![
            primary.clone() as Arc<dyn MailChannel>,
            fallback.clone() as Arc<dyn MailChannel>,
        ]);

        assert!(dispatcher.send(message(None)).await);
        assert_eq!(primary.sent_count(), 1);
        assert_eq!(fallback.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_fallback_on_primary_failure() {
        let primary = RecordingChannel::failing();
        let fallback = RecordingChannel::accepting();
        let dispatcher = NotificationDispatcher::new(vec![
            primary as Arc<dyn MailChannel>,
            fallback.clone() as Arc<dyn MailChannel>,
        ]);

        assert!(dispatcher.send(message(None)).await);
        assert_eq!(fallback.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_all_channels_failing_returns_false() {
        let dispatcher = NotificationDispatcher::new(vec![
            RecordingChannel::failing() as Arc<dyn MailChannel>,
            RecordingChannel::failing() as Arc<dyn MailChannel>,
        ]);
        assert!(!dispatcher.send(message(None)).await);
    }

    #[tokio::test]
    async fn test_attachment_bytes_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.pdf");
        tokio::fs::write(&path, b"%PDF-1.4").await.unwrap();

        let channel = RecordingChannel::accepting();
        let dispatcher =
            NotificationDispatcher::new(vec![channel.clone() as Arc<dyn MailChannel>]);

        assert!(
            dispatcher
                .send(message(Some(("receipt-WEB1.pdf".to_string(), path))))
                .await
        );
        let sent = channel.sent.lock().unwrap();
        let attachment = sent[0].attachment.as_ref().unwrap();
        assert_eq!(attachment.filename, "receipt-WEB1.pdf");
        assert_eq!(attachment.bytes, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_unreadable_attachment_downgrades_message() {
        let channel = RecordingChannel::accepting();
        let dispatcher =
            NotificationDispatcher::new(vec![channel.clone() as Arc<dyn MailChannel>])
                .with_retry_policy(RetryPolicy {
                max_attempts: 1,
                ..RetryPolicy::default()
            });

        let missing = PathBuf::from("/nonexistent/receipt.pdf");
        assert!(
            dispatcher
                .send(message(Some(("receipt.pdf".to_string(), missing))))
                .await
        );
        let sent = channel.sent.lock().unwrap();
        assert!(sent[0].attachment.is_none());
    }
}
