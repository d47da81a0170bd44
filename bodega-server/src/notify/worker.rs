//! Notification worker
//!
//! Single consumer of the bounded job queue. Each job is processed under
//! a deadline covering render, attachment read and delivery, so one
//! stuck SMTP handshake cannot pin the pipeline. On startup the outbox
//! is replayed: rows left by a crash between commit and send get a
//! second delivery attempt before live jobs are consumed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use shared::models::{Order, StoreInfo};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::db::OrderStore;
use crate::documents::{DocumentKind, ReceiptRenderer};
use crate::services::CleanupScheduler;

use super::dispatcher::{DispatchMessage, NotificationDispatcher};
use super::job::NotificationJob;
use super::template;

/// Create the bounded job queue
pub fn queue(capacity: usize) -> (mpsc::Sender<NotificationJob>, mpsc::Receiver<NotificationJob>) {
    mpsc::channel(capacity)
}

/// Consumes notification jobs and runs the full pipeline for each
pub struct NotificationWorker {
    rx: mpsc::Receiver<NotificationJob>,
    dispatcher: NotificationDispatcher,
    renderer: ReceiptRenderer,
    cleanup: CleanupScheduler,
    store: Arc<OrderStore>,
    store_info: StoreInfo,
    job_deadline: Duration,
    last_receipt: Option<(String, DateTime<Utc>, PathBuf)>,
}

impl NotificationWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rx: mpsc::Receiver<NotificationJob>,
        dispatcher: NotificationDispatcher,
        renderer: ReceiptRenderer,
        cleanup: CleanupScheduler,
        store: Arc<OrderStore>,
        store_info: StoreInfo,
        job_deadline: Duration,
    ) -> Self {
        Self {
            rx,
            dispatcher,
            renderer,
            cleanup,
            store,
            store_info,
            job_deadline,
            last_receipt: None,
        }
    }

    /// Run until the queue closes or shutdown is requested
    pub async fn run(mut self, cancel_token: CancellationToken) {
        tracing::info!("Notification worker started");

        self.replay_outbox().await;

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    tracing::info!("Notification worker shutting down");
                    break;
                }
                job = self.rx.recv() => {
                    match job {
                        Some(job) => self.process(job).await,
                        None => {
                            tracing::info!("Notification queue closed, worker exiting");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Re-run jobs left in the outbox by a previous process
    async fn replay_outbox(&mut self) {
        let pending = match self.store.pending_jobs() {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read outbox for replay");
                return;
            }
        };
        if pending.is_empty() {
            return;
        }

        tracing::info!(count = pending.len(), "Replaying outbox jobs from previous run");
        for job in pending {
            self.process(job).await;
        }
    }

    /// Run one job under the configured deadline, then retire its outbox
    /// row
    ///
    /// The row is deleted whether delivery succeeded or not: delivery
    /// failures are logged and not retried, so keeping the row would only
    /// produce a duplicate send on the next restart.
    async fn process(&mut self, job: NotificationJob) {
        let job_id = job.id.clone();
        let order_id = job.order.id.clone();
        let deadline = self.job_deadline;

        match tokio::time::timeout(deadline, self.handle(&job)).await {
            Ok(delivered) => {
                if !delivered {
                    tracing::error!(
                        job_id = %job_id,
                        order_id = %order_id,
                        "Notification could not be delivered"
                    );
                }
            }
            Err(_) => {
                tracing::error!(
                    job_id = %job_id,
                    order_id = %order_id,
                    deadline_secs = deadline.as_secs(),
                    "Notification job exceeded its deadline"
                );
            }
        }

        if let Err(e) = self.store.delete_job(&job_id) {
            tracing::warn!(job_id = %job_id, error = %e, "Failed to retire outbox row");
        }
    }

    /// Render (when applicable), compose and dispatch one notification
    async fn handle(&mut self, job: &NotificationJob) -> bool {
        let attachment = match &job.attachment_name {
            Some(filename) => self
                .receipt_for(&job.order)
                .await
                .map(|path| (filename.clone(), path)),
            None => None,
        };

        let message = DispatchMessage {
            recipient: job.recipient.clone(),
            subject: template::subject(job, &self.store_info.name),
            html_body: template::html_body(job, &self.store_info.name),
            attachment,
        };

        self.dispatcher.send(message).await
    }

    /// Render the order receipt, reusing the previous render when
    /// consecutive jobs carry the same order snapshot
    ///
    /// An approve that also verifies payment queues two jobs for one
    /// transition; both attach the same PDF. The cached path is only
    /// reused while the file still exists, so a cleanup that already
    /// fired forces a fresh render.
    async fn receipt_for(&mut self, order: &Order) -> Option<PathBuf> {
        if let Some((id, updated_at, path)) = &self.last_receipt
            && *id == order.id
            && *updated_at == order.updated_at
            && path.exists()
        {
            return Some(path.clone());
        }

        match self
            .renderer
            .render(DocumentKind::OrderReceipt, order, &self.store_info)
            .await
        {
            Ok(path) => {
                self.cleanup.schedule_delete(path.clone());
                self.last_receipt = Some((order.id.clone(), order.updated_at, path.clone()));
                Some(path)
            }
            Err(e) => {
                tracing::warn!(
                    order_id = %order.id,
                    error = %e,
                    "Receipt rendering failed, sending without attachment"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TemplateFlags;
    use crate::documents::AssetResolver;
    use crate::notify::dispatcher::test_support::RecordingChannel;
    use crate::notify::NotificationKind;
    use chrono::Utc;
    use shared::models::{Order, OrderItem, OrderStatus, ShippingMethod};

    fn sample_order() -> Order {
        let now = Utc::now();
        Order {
            id: "o1".to_string(),
            order_number: "WEB202501010001".to_string(),
            customer_name: "Ana".to_string(),
            customer_email: "ana@example.com".to_string(),
            customer_phone: None,
            shipping_method: ShippingMethod::Pickup,
            shipping_address: None,
            shipping_district: None,
            site_id: None,
            payment_method: "cash".to_string(),
            requires_payment_proof: false,
            payment_proof_url: None,
            items: vec![OrderItem {
                product_id: "p1".to_string(),
                product_name: "Arroz 5kg".to_string(),
                quantity: 1,
                unit_price: 25.5,
                subtotal: 25.5,
            }],
            subtotal: 25.5,
            shipping_cost: 0.0,
            total: 25.5,
            status: OrderStatus::Confirmed,
            tracking_url: None,
            estimated_delivery: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn worker_with_channel(
        temp_dir: &std::path::Path,
        channel: Arc<RecordingChannel>,
        rx: mpsc::Receiver<NotificationJob>,
        store: Arc<OrderStore>,
    ) -> NotificationWorker {
        NotificationWorker::new(
            rx,
            NotificationDispatcher::new(vec![channel as Arc<dyn crate::notify::MailChannel>]),
            ReceiptRenderer::new(
                temp_dir,
                TemplateFlags::default(),
                AssetResolver::new(temp_dir),
            ),
            CleanupScheduler::new(Duration::from_secs(300)),
            store,
            StoreInfo {
                name: "Bodega Central".to_string(),
                ruc: "20123456789".to_string(),
                address: "Av. Los Olivos 456".to_string(),
                ..StoreInfo::default()
            },
            Duration::from_secs(120),
        )
    }

    #[tokio::test]
    async fn test_approval_job_sends_mail_with_receipt() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(OrderStore::open_in_memory().unwrap());
        let channel = RecordingChannel::accepting();
        let (tx, rx) = queue(8);
        let worker = worker_with_channel(dir.path(), channel.clone(), rx, store);

        let job = NotificationJob::new(NotificationKind::Approval, &sample_order(), None);
        tx.send(job).await.unwrap();
        drop(tx);

        worker.run(CancellationToken::new()).await;

        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let attachment = sent[0].attachment.as_ref().unwrap();
        assert_eq!(attachment.filename, "receipt-WEB202501010001.pdf");
        assert!(attachment.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_confirmation_job_has_no_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(OrderStore::open_in_memory().unwrap());
        let channel = RecordingChannel::accepting();
        let (tx, rx) = queue(8);
        let worker = worker_with_channel(dir.path(), channel.clone(), rx, store);

        let job = NotificationJob::new(NotificationKind::Confirmation, &sample_order(), None);
        tx.send(job).await.unwrap();
        drop(tx);

        worker.run(CancellationToken::new()).await;

        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].attachment.is_none());
    }

    #[tokio::test]
    async fn test_payment_verified_reuses_the_approval_receipt() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(OrderStore::open_in_memory().unwrap());
        let channel = RecordingChannel::accepting();
        let (tx, rx) = queue(8);
        let worker = worker_with_channel(dir.path(), channel.clone(), rx, store);

        let order = sample_order();
        tx.send(NotificationJob::new(NotificationKind::Approval, &order, None))
            .await
            .unwrap();
        tx.send(NotificationJob::new(
            NotificationKind::PaymentVerified,
            &order,
            None,
        ))
        .await
        .unwrap();
        drop(tx);

        worker.run(CancellationToken::new()).await;

        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        for mail in sent.iter() {
            let attachment = mail.attachment.as_ref().unwrap();
            assert!(attachment.bytes.starts_with(b"%PDF"));
        }

        // One transition, one rendered file on disk
        let pdfs = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "pdf"))
            .count();
        assert_eq!(pdfs, 1);
    }

    #[tokio::test]
    async fn test_outbox_rows_are_replayed_then_retired() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(OrderStore::open_in_memory().unwrap());
        let channel = RecordingChannel::accepting();

        // Simulate a crash after commit: the row is durable, nothing was
        // sent.
        let job = NotificationJob::new(NotificationKind::Approval, &sample_order(), None);
        let txn = store.begin_write().unwrap();
        store.put_job(&txn, &job).unwrap();
        txn.commit().unwrap();

        let (tx, rx) = queue(8);
        drop(tx);
        let worker = worker_with_channel(dir.path(), channel.clone(), rx, store.clone());
        worker.run(CancellationToken::new()).await;

        assert_eq!(channel.sent_count(), 1);
        assert!(store.pending_jobs().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delivery_still_retires_outbox_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(OrderStore::open_in_memory().unwrap());
        let channel = RecordingChannel::failing();

        let job = NotificationJob::new(NotificationKind::StatusUpdate, &sample_order(), None);
        let txn = store.begin_write().unwrap();
        store.put_job(&txn, &job).unwrap();
        txn.commit().unwrap();

        let (tx, rx) = queue(8);
        drop(tx);
        let worker = worker_with_channel(dir.path(), channel, rx, store.clone());
        worker.run(CancellationToken::new()).await;

        assert!(store.pending_jobs().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_stops_worker() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(OrderStore::open_in_memory().unwrap());
        let channel = RecordingChannel::accepting();
        let (_tx, rx) = queue(8);
        let worker = worker_with_channel(dir.path(), channel, rx, store);

        let token = CancellationToken::new();
        token.cancel();
        // Returns promptly even though the sender is still alive
        worker.run(token).await;
    }
}
