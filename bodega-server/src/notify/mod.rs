//! Notification pipeline
//!
//! Runs strictly after a lifecycle transition has committed:
//! render receipt → load attachment (with retry) → send email
//! (primary SMTP, HTTP API fallback) → schedule temp file cleanup.
//! Failures here are logged, never surfaced to the original caller.

pub mod channel;
pub mod dispatcher;
pub mod job;
pub mod retry_read;
pub mod template;
pub mod worker;

pub use channel::{DeliveryError, HttpApiChannel, MailAttachment, MailChannel, OutgoingMail, SmtpChannel};
pub use dispatcher::{DispatchMessage, NotificationDispatcher};
pub use job::{NotificationJob, NotificationKind};
pub use retry_read::{read_all, RetryPolicy};
pub use worker::{queue, NotificationWorker};
