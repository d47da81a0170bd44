//! Notification job - the unit of work flowing through the pipeline
//!
//! Created per lifecycle transition, written to the outbox in the same
//! transaction as the state mutation, consumed once by the worker and
//! then discarded. Never shared across transitions.

use serde::{Deserialize, Serialize};
use shared::models::Order;

/// Which email template the job renders
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Order received (sent on creation)
    Confirmation,
    /// Order approved by the store
    Approval,
    /// Order rejected, carries the reason
    Rejection,
    /// Payment proof verified
    PaymentVerified,
    /// Generic status change
    StatusUpdate,
}

impl NotificationKind {
    /// Whether this notification carries the receipt PDF
    pub fn wants_receipt(&self) -> bool {
        matches!(
            self,
            Self::Approval | Self::Rejection | Self::PaymentVerified
        )
    }
}

/// A single notification to be produced and sent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationJob {
    /// Job id (outbox key)
    pub id: String,
    /// Template to use
    pub kind: NotificationKind,
    /// Order snapshot taken at transition time
    pub order: Order,
    /// Target address
    pub recipient: String,
    /// Attachment file name, when the kind carries a receipt
    pub attachment_name: Option<String>,
    /// Rejection reason (Rejection kind only)
    pub reason: Option<String>,
}

impl NotificationJob {
    /// Build a job for an order transition
    ///
    /// The recipient and attachment name are derived from the order; the
    /// snapshot is cloned so the job stays valid even if the order row
    /// mutates again before the worker gets to it.
    pub fn new(kind: NotificationKind, order: &Order, reason: Option<String>) -> Self {
        let attachment_name = kind
            .wants_receipt()
            .then(|| format!("receipt-{}.pdf", order.order_number));
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            recipient: order.customer_email.clone(),
            order: order.clone(),
            attachment_name,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::models::{OrderStatus, ShippingMethod};

    fn order() -> Order {
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
            items: vec![],
            subtotal: 0.0,
            shipping_cost: 0.0,
            total: 0.0,
            status: OrderStatus::Pending,
            tracking_url: None,
            estimated_delivery: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_attachment_only_for_receipt_kinds() {
        let order = order();

        let confirm = NotificationJob::new(NotificationKind::Confirmation, &order, None);
        assert!(confirm.attachment_name.is_none());

        let approval = NotificationJob::new(NotificationKind::Approval, &order, None);
        assert_eq!(
            approval.attachment_name.as_deref(),
            Some("receipt-WEB202501010001.pdf")
        );

        let update = NotificationJob::new(NotificationKind::StatusUpdate, &order, None);
        assert!(update.attachment_name.is_none());
    }

    #[test]
    fn test_unique_job_ids() {
        let order = order();
        let a = NotificationJob::new(NotificationKind::Approval, &order, None);
        let b = NotificationJob::new(NotificationKind::Approval, &order, None);
        assert_ne!(a.id, b.id);
    }
}
