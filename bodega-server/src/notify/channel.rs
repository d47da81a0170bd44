//! Mail delivery channels
//!
//! Two transports behind one trait: SMTP (primary) and an HTTP mail API
//! (fallback). The dispatcher tries them in order and treats the message
//! as delivered on the first success.

use async_trait::async_trait;
use base64::Engine;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;
use thiserror::Error;

use crate::core::MailConfig;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Channel not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail API rejected the message: status {0}")]
    ApiRejected(u16),
}

/// A PDF (or other binary) attached to an outgoing message
#[derive(Debug, Clone)]
pub struct MailAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A fully composed message, transport-agnostic
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachment: Option<MailAttachment>,
}

/// One way of getting a message out the door
#[async_trait]
pub trait MailChannel: Send + Sync {
    /// Channel name for logs
    fn name(&self) -> &'static str;

    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError>;
}

/// Primary channel: authenticated STARTTLS SMTP
pub struct SmtpChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpChannel {
    /// Build from mail config; `None` when SMTP is not configured
    pub fn from_config(config: &MailConfig) -> Result<Option<Self>, DeliveryError> {
        let Some(host) = config.smtp_host.as_deref() else {
            return Ok(None);
        };

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Some(Self {
            transport: builder.build(),
            from_address: config.from_address.clone(),
        }))
    }

    fn compose(&self, mail: &OutgoingMail) -> Result<Message, DeliveryError> {
        let builder = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e| DeliveryError::InvalidMessage(format!("from address: {e}")))?,
            )
            .to(mail
                .to
                .parse()
                .map_err(|e| DeliveryError::InvalidMessage(format!("to address: {e}")))?)
            .subject(&mail.subject);

        let html = SinglePart::html(mail.html_body.clone());

        let message = match &mail.attachment {
            Some(att) => {
                let content_type = ContentType::parse(&att.content_type)
                    .map_err(|e| DeliveryError::InvalidMessage(format!("content type: {e}")))?;
                let part = Attachment::new(att.filename.clone())
                    .body(att.bytes.clone(), content_type);
                builder.multipart(MultiPart::mixed().singlepart(html).singlepart(part))
            }
            None => builder.singlepart(html),
        };

        message.map_err(|e| DeliveryError::InvalidMessage(e.to_string()))
    }
}

#[async_trait]
impl MailChannel for SmtpChannel {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        let message = self.compose(mail)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct ApiAttachment<'a> {
    filename: &'a str,
    content_type: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ApiMailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment: Option<ApiAttachment<'a>>,
}

/// Fallback channel: JSON POST to an HTTP mail provider
///
/// Attachments go inline as base64; providers with this shape accept the
/// message with a 2xx and queue delivery themselves.
pub struct HttpApiChannel {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_address: String,
}

impl HttpApiChannel {
    /// Build from mail config; `None` when no API endpoint is configured
    pub fn from_config(config: &MailConfig) -> Option<Self> {
        let api_url = config.api_url.clone()?;
        let api_key = config.api_key.clone()?;
        Some(Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl MailChannel for HttpApiChannel {
    fn name(&self) -> &'static str {
        "http_api"
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        let attachment = mail.attachment.as_ref().map(|att| ApiAttachment {
            filename: &att.filename,
            content_type: &att.content_type,
            content: base64::engine::general_purpose::STANDARD.encode(&att.bytes),
        });

        let request = ApiMailRequest {
            from: &self.from_address,
            to: &mail.to,
            subject: &mail.subject,
            html: &mail.html_body,
            attachment,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DeliveryError::ApiRejected(response.status().as_u16()));
        }
        Ok(())
    }
}
