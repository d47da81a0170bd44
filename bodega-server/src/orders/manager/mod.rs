//! OrderLifecycleManager - web order state machine
//!
//! Owns every status transition. Each operation follows the same shape:
//!
//! ```text
//! operation(args)
//!     ├─ 1. Validate input (before any mutation)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Re-read the order inside the transaction
//!     ├─ 4. Check the state-machine precondition
//!     ├─ 5. Mutate and persist the order
//!     ├─ 6. Write the notification job to the outbox (same transaction)
//!     ├─ 7. Commit
//!     └─ 8. Enqueue the job and return the updated order
//! ```
//!
//! Step 3 is the lost-update guard: two concurrent transitions both
//! commit against persisted state, so the second one fails its
//! precondition instead of silently overwriting the first. Everything
//! past step 7 is best-effort; the caller has its success by then.

mod error;
pub use error::*;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use redb::WriteTransaction;
use shared::models::{Order, OrderFeedback, OrderItem, OrderStatus, ShippingMethod};
use tokio::sync::mpsc;

use crate::db::OrderStore;
use crate::notify::{NotificationJob, NotificationKind};
use crate::utils::validation;

/// Tolerance for monetary comparisons on f64 fields
const MONEY_EPSILON: f64 = 0.005;

/// Statuses the generic status-update operation may move an order into
const STATUS_UPDATE_TARGETS: &[OrderStatus] = &[
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::ReadyForPickup,
    OrderStatus::Cancelled,
];

/// One line item in a create request
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OrderItemInput {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// Input for order creation
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_method: ShippingMethod,
    pub shipping_address: Option<String>,
    pub shipping_district: Option<String>,
    pub site_id: Option<String>,
    pub payment_method: String,
    #[serde(default)]
    pub requires_payment_proof: bool,
    pub payment_proof_url: Option<String>,
    pub items: Vec<OrderItemInput>,
    pub subtotal: f64,
    pub shipping_cost: f64,
    pub total: f64,
}

/// Input for the generic status-update operation
#[derive(Debug, Clone, serde::Deserialize)]
pub struct StatusUpdate {
    pub status: String,
    pub tracking_url: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Input for mark-as-picked-up
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PickupFeedback {
    pub rating: u8,
    pub comment: Option<String>,
    #[serde(default)]
    pub recommend: bool,
}

/// Web order state machine and side-effect scheduler
pub struct OrderLifecycleManager {
    store: Arc<OrderStore>,
    notify_tx: mpsc::Sender<NotificationJob>,
    delivery_lead_days: i64,
    pickup_lead_days: i64,
}

impl std::fmt::Debug for OrderLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderLifecycleManager")
            .field("delivery_lead_days", &self.delivery_lead_days)
            .field("pickup_lead_days", &self.pickup_lead_days)
            .finish_non_exhaustive()
    }
}

impl OrderLifecycleManager {
    pub fn new(
        store: Arc<OrderStore>,
        notify_tx: mpsc::Sender<NotificationJob>,
        delivery_lead_days: i64,
        pickup_lead_days: i64,
    ) -> Self {
        Self {
            store,
            notify_tx,
            delivery_lead_days,
            pickup_lead_days,
        }
    }

    // ========== Queries ==========

    pub fn get_order(&self, order_id: &str) -> LifecycleResult<Order> {
        self.store
            .get_order(order_id)?
            .ok_or_else(|| LifecycleError::OrderNotFound(order_id.to_string()))
    }

    pub fn find_by_number(&self, order_number: &str) -> LifecycleResult<Option<Order>> {
        Ok(self.store.find_by_number(order_number)?)
    }

    pub fn get_feedback(&self, order_id: &str) -> LifecycleResult<Option<OrderFeedback>> {
        Ok(self.store.get_feedback(order_id)?)
    }

    // ========== Create ==========

    /// Create a new web order in `pending` state
    ///
    /// Estimates the delivery/pickup date from the configured lead times
    /// and schedules the confirmation email.
    pub fn create_order(&self, request: CreateOrderRequest) -> LifecycleResult<Order> {
        validate_create(&request)?;

        let now = Utc::now();
        let lead_days = match request.shipping_method {
            ShippingMethod::Delivery => self.delivery_lead_days,
            ShippingMethod::Pickup => self.pickup_lead_days,
        };

        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            order_number: self.next_order_number(now)?,
            customer_name: request.customer_name,
            customer_email: request.customer_email,
            customer_phone: request.customer_phone,
            shipping_method: request.shipping_method,
            shipping_address: request.shipping_address,
            shipping_district: request.shipping_district,
            site_id: request.site_id,
            payment_method: request.payment_method,
            requires_payment_proof: request.requires_payment_proof,
            payment_proof_url: request.payment_proof_url,
            items: request
                .items
                .into_iter()
                .map(|i| OrderItem {
                    product_id: i.product_id,
                    product_name: i.product_name,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    subtotal: i.subtotal,
                })
                .collect(),
            subtotal: request.subtotal,
            shipping_cost: request.shipping_cost,
            total: request.total,
            status: OrderStatus::Pending,
            tracking_url: None,
            estimated_delivery: Some(now + Duration::days(lead_days)),
            created_at: now,
            updated_at: now,
        };

        let job = NotificationJob::new(NotificationKind::Confirmation, &order, None);
        let txn = self.store.begin_write()?;
        self.store.put_order(&txn, &order)?;
        self.store.put_order_number(&txn, &order)?;
        self.store.put_job(&txn, &job)?;
        txn.commit().map_err(crate::db::StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = order.total,
            "Web order created"
        );
        self.enqueue(job);
        Ok(order)
    }

    /// Generate the next human-readable order number (crash-safe counter)
    ///
    /// A counter failure aborts the create: falling back to a guessed
    /// count could reissue a number already bound in the index.
    fn next_order_number(&self, now: DateTime<Utc>) -> LifecycleResult<String> {
        let count = self.store.next_order_count()?;
        Ok(format!("WEB{}{:04}", now.format("%Y%m%d"), count))
    }

    // ========== Approve / reject ==========

    /// Approve a pending order, moving it to `confirmed`
    ///
    /// Schedules the approval email with the receipt attached. When
    /// `send_payment_verified` is set and the order both requires and has
    /// a payment proof on file, a payment-verified email is scheduled as
    /// well.
    pub fn approve(&self, order_id: &str, send_payment_verified: bool) -> LifecycleResult<Order> {
        let txn = self.store.begin_write()?;
        let mut order = self.require_order(&txn, order_id)?;

        if order.status != OrderStatus::Pending {
            return Err(LifecycleError::InvalidState {
                current: order.status,
                action: "approve",
            });
        }

        order.status = OrderStatus::Confirmed;
        order.touch();
        self.store.put_order(&txn, &order)?;

        let mut jobs = vec![NotificationJob::new(NotificationKind::Approval, &order, None)];
        if send_payment_verified
            && order.requires_payment_proof
            && order.payment_proof_url.is_some()
        {
            jobs.push(NotificationJob::new(
                NotificationKind::PaymentVerified,
                &order,
                None,
            ));
        }
        for job in &jobs {
            self.store.put_job(&txn, job)?;
        }
        txn.commit().map_err(crate::db::StorageError::from)?;

        tracing::info!(order_id = %order.id, order_number = %order.order_number, "Order approved");
        for job in jobs {
            self.enqueue(job);
        }
        Ok(order)
    }

    /// Reject a pending order, moving it to `cancelled`
    ///
    /// The reason is mandatory and ends up in the rejection email.
    pub fn reject(&self, order_id: &str, reason: &str) -> LifecycleResult<Order> {
        let reason = reason.trim();
        text_check(validation::validate_required_text(
            reason,
            "rejection reason",
            validation::MAX_NOTE_LEN,
        ))?;

        let txn = self.store.begin_write()?;
        let mut order = self.require_order(&txn, order_id)?;

        if order.status != OrderStatus::Pending {
            return Err(LifecycleError::InvalidState {
                current: order.status,
                action: "reject",
            });
        }

        order.status = OrderStatus::Cancelled;
        order.touch();
        self.store.put_order(&txn, &order)?;

        let job = NotificationJob::new(
            NotificationKind::Rejection,
            &order,
            Some(reason.to_string()),
        );
        self.store.put_job(&txn, &job)?;
        txn.commit().map_err(crate::db::StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            reason = %reason,
            "Order rejected"
        );
        self.enqueue(job);
        Ok(order)
    }

    // ========== Generic status update ==========

    /// Move a non-terminal order to one of the allow-listed statuses
    pub fn update_status(&self, order_id: &str, update: StatusUpdate) -> LifecycleResult<Order> {
        let new_status: OrderStatus = update
            .status
            .parse()
            .map_err(|_| LifecycleError::InvalidStatus(update.status.clone()))?;
        if !STATUS_UPDATE_TARGETS.contains(&new_status) {
            return Err(LifecycleError::InvalidStatus(update.status.clone()));
        }
        text_check(validation::validate_optional_text(
            &update.tracking_url,
            "tracking URL",
            validation::MAX_URL_LEN,
        ))?;

        let txn = self.store.begin_write()?;
        let mut order = self.require_order(&txn, order_id)?;

        if order.status.is_terminal() {
            return Err(LifecycleError::AlreadyClosed(order.id));
        }

        order.status = new_status;
        if let Some(url) = update.tracking_url {
            order.tracking_url = Some(url);
        }
        if let Some(eta) = update.estimated_delivery {
            order.estimated_delivery = Some(eta);
        }
        order.touch();
        self.store.put_order(&txn, &order)?;

        let job = NotificationJob::new(NotificationKind::StatusUpdate, &order, None);
        self.store.put_job(&txn, &job)?;
        txn.commit().map_err(crate::db::StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            status = %order.status,
            "Order status updated"
        );
        self.enqueue(job);
        Ok(order)
    }

    // ========== Pickup ==========

    /// Complete a pickup order and record its feedback
    ///
    /// Only valid for pickup orders in `ready_for_pickup`, and only once.
    /// No notification side effect.
    pub fn mark_picked_up(
        &self,
        order_id: &str,
        feedback: PickupFeedback,
    ) -> LifecycleResult<Order> {
        if !(1..=5).contains(&feedback.rating) {
            return Err(LifecycleError::Validation(format!(
                "rating must be between 1 and 5, got {}",
                feedback.rating
            )));
        }
        text_check(validation::validate_optional_text(
            &feedback.comment,
            "feedback comment",
            validation::MAX_NOTE_LEN,
        ))?;

        let txn = self.store.begin_write()?;
        let mut order = self.require_order(&txn, order_id)?;

        if order.shipping_method != ShippingMethod::Pickup {
            return Err(LifecycleError::PickupOrderRequired);
        }
        if order.status != OrderStatus::ReadyForPickup {
            return Err(LifecycleError::InvalidState {
                current: order.status,
                action: "mark as picked up",
            });
        }
        if self.store.has_feedback_txn(&txn, order_id)? {
            return Err(LifecycleError::FeedbackAlreadyRecorded(order.id));
        }

        order.status = OrderStatus::PickedUp;
        order.touch();
        self.store.put_order(&txn, &order)?;
        self.store.put_feedback(
            &txn,
            &OrderFeedback {
                order_id: order.id.clone(),
                rating: feedback.rating,
                comment: feedback.comment,
                recommend: feedback.recommend,
                created_at: Utc::now(),
            },
        )?;
        txn.commit().map_err(crate::db::StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            rating = feedback.rating,
            "Order picked up, feedback recorded"
        );
        Ok(order)
    }

    // ========== Internals ==========

    fn require_order(&self, txn: &WriteTransaction, order_id: &str) -> LifecycleResult<Order> {
        self.store
            .get_order_txn(txn, order_id)?
            .ok_or_else(|| LifecycleError::OrderNotFound(order_id.to_string()))
    }

    /// Hand a committed job to the worker queue
    ///
    /// A full or closed queue is logged, not an error: the outbox row is
    /// already durable and will be replayed on the next startup.
    fn enqueue(&self, job: NotificationJob) {
        if let Err(e) = self.notify_tx.try_send(job) {
            tracing::warn!(error = %e, "Notification queue unavailable, job left in outbox");
        }
    }
}

/// Carry a field-level length/presence failure into the lifecycle error
fn text_check(result: Result<(), shared::error::AppError>) -> LifecycleResult<()> {
    result.map_err(|e| LifecycleError::Validation(e.message))
}

fn validate_create(request: &CreateOrderRequest) -> LifecycleResult<()> {
    text_check(validation::validate_required_text(
        &request.customer_name,
        "customer name",
        validation::MAX_NAME_LEN,
    ))?;
    if !validation::is_valid_email(&request.customer_email) {
        return Err(LifecycleError::Validation(format!(
            "'{}' is not a valid email address",
            request.customer_email
        )));
    }
    if request.items.is_empty() {
        return Err(LifecycleError::EmptyOrder);
    }
    if request.shipping_method == ShippingMethod::Delivery
        && request
            .shipping_address
            .as_deref()
            .is_none_or(|a| a.trim().is_empty())
    {
        return Err(LifecycleError::Validation(
            "delivery orders require a shipping address".to_string(),
        ));
    }
    text_check(validation::validate_optional_text(
        &request.shipping_address,
        "shipping address",
        validation::MAX_ADDRESS_LEN,
    ))?;
    text_check(validation::validate_optional_text(
        &request.payment_proof_url,
        "payment proof URL",
        validation::MAX_URL_LEN,
    ))?;

    let mut items_total = 0.0;
    for item in &request.items {
        if item.quantity == 0 {
            return Err(LifecycleError::Validation(format!(
                "item '{}' has zero quantity",
                item.product_name
            )));
        }
        if item.unit_price < 0.0 {
            return Err(LifecycleError::Validation(format!(
                "item '{}' has a negative unit price",
                item.product_name
            )));
        }
        let expected = f64::from(item.quantity) * item.unit_price;
        if (item.subtotal - expected).abs() > MONEY_EPSILON {
            return Err(LifecycleError::TotalMismatch(format!(
                "item '{}' subtotal {} does not equal {} x {}",
                item.product_name, item.subtotal, item.quantity, item.unit_price
            )));
        }
        items_total += item.subtotal;
    }

    if request.shipping_cost < 0.0 {
        return Err(LifecycleError::Validation(
            "shipping cost must not be negative".to_string(),
        ));
    }
    if (request.subtotal - items_total).abs() > MONEY_EPSILON {
        return Err(LifecycleError::TotalMismatch(format!(
            "subtotal {} does not equal the sum of item subtotals {}",
            request.subtotal, items_total
        )));
    }
    let expected_total = request.subtotal + request.shipping_cost;
    if (request.total - expected_total).abs() > MONEY_EPSILON {
        return Err(LifecycleError::TotalMismatch(format!(
            "total {} does not equal subtotal + shipping {}",
            request.total, expected_total
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests;
