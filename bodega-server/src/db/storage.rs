//! redb-based order store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Current order state |
//! | `order_numbers` | `order_number` | `order_id` | Number lookup index |
//! | `feedback` | `order_id` | `OrderFeedback` | Pickup feedback |
//! | `sequence_counter` | `()` | `u64` | Order number counter |
//! | `outbox` | `job_id` | `NotificationJob` | Durable notification queue |
//!
//! # Transactions
//!
//! Lifecycle transitions re-read the order inside the write transaction
//! that mutates it, so a stale in-memory copy can never overwrite a
//! concurrent transition (lost-update safety). The outbox row for the
//! transition's notification is written in the same transaction, making
//! the side-effect record exactly as durable as the state change itself.

use crate::notify::NotificationJob;
use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use shared::models::{Order, OrderFeedback};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Order number index: key = order_number, value = order_id
const ORDER_NUMBERS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("order_numbers");

/// Feedback: key = order_id, value = JSON-serialized OrderFeedback
const FEEDBACK_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("feedback");

/// Counters: key = "order_count", value = u64
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

/// Notification outbox: key = job_id, value = JSON-serialized NotificationJob
const OUTBOX_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("outbox");

const ORDER_COUNT_KEY: &str = "order_count";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order store backed by redb
#[derive(Clone)]
pub struct OrderStore {
    db: Arc<Database>,
}

impl OrderStore {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: once a
    /// transition's `commit()` returns, the new status and its outbox row
    /// survive power loss.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_NUMBERS_TABLE)?;
            let _ = write_txn.open_table(FEEDBACK_TABLE)?;
            let _ = write_txn.open_table(OUTBOX_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(ORDER_COUNT_KEY)?.is_none() {
                seq_table.insert(ORDER_COUNT_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Order Counter (for order numbers) ==========

    /// Get and increment the order count atomically
    ///
    /// Returns the NEW count after increment.
    pub fn next_order_count(&self) -> StorageResult<u64> {
        let txn = self.db.begin_write()?;
        let next = {
            let mut table = txn.open_table(SEQUENCE_TABLE)?;
            let current = table
                .get(ORDER_COUNT_KEY)?
                .map(|g| g.value())
                .unwrap_or(0);
            let next = current + 1;
            table.insert(ORDER_COUNT_KEY, next)?;
            next
        };
        txn.commit()?;
        Ok(next)
    }

    // ========== Orders ==========

    /// Store an order (insert or overwrite) within a transaction
    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let bytes = serde_json::to_vec(order)?;
        let mut table = txn.open_table(ORDERS_TABLE)?;
        table.insert(order.id.as_str(), bytes.as_slice())?;
        Ok(())
    }

    /// Register the order number index entry within a transaction
    pub fn put_order_number(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_NUMBERS_TABLE)?;
        table.insert(order.order_number.as_str(), order.id.as_str())?;
        Ok(())
    }

    /// Read an order inside a write transaction
    ///
    /// This is the read lifecycle transitions must use: it sees the
    /// persisted state as of this transaction, not a stale copy.
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Read an order (read-only transaction)
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Look up an order id by its human-readable number
    pub fn find_by_number(&self, order_number: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let numbers = read_txn.open_table(ORDER_NUMBERS_TABLE)?;
        let Some(id_guard) = numbers.get(order_number)? else {
            return Ok(None);
        };
        let orders = read_txn.open_table(ORDERS_TABLE)?;
        match orders.get(id_guard.value())? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    // ========== Feedback ==========

    /// Store pickup feedback within a transaction
    pub fn put_feedback(
        &self,
        txn: &WriteTransaction,
        feedback: &OrderFeedback,
    ) -> StorageResult<()> {
        let bytes = serde_json::to_vec(feedback)?;
        let mut table = txn.open_table(FEEDBACK_TABLE)?;
        table.insert(feedback.order_id.as_str(), bytes.as_slice())?;
        Ok(())
    }

    /// Check for existing feedback inside a write transaction
    pub fn has_feedback_txn(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<bool> {
        let table = txn.open_table(FEEDBACK_TABLE)?;
        Ok(table.get(order_id)?.is_some())
    }

    /// Read feedback for an order
    pub fn get_feedback(&self, order_id: &str) -> StorageResult<Option<OrderFeedback>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FEEDBACK_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    // ========== Notification outbox ==========

    /// Store a notification job within a transaction
    ///
    /// Written in the same transaction as the state mutation it belongs
    /// to, so a crash between commit and send leaves a replayable row.
    pub fn put_job(&self, txn: &WriteTransaction, job: &NotificationJob) -> StorageResult<()> {
        let bytes = serde_json::to_vec(job)?;
        let mut table = txn.open_table(OUTBOX_TABLE)?;
        table.insert(job.id.as_str(), bytes.as_slice())?;
        Ok(())
    }

    /// Remove a processed job from the outbox
    pub fn delete_job(&self, job_id: &str) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(OUTBOX_TABLE)?;
            table.remove(job_id)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// All jobs left in the outbox (crash replay at worker startup)
    pub fn pending_jobs(&self) -> StorageResult<Vec<NotificationJob>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OUTBOX_TABLE)?;
        let mut jobs = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            jobs.push(serde_json::from_slice(value.value())?);
        }
        Ok(jobs)
    }
}

impl std::fmt::Debug for OrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NotificationJob, NotificationKind};
    use chrono::Utc;
    use shared::models::{OrderItem, OrderStatus, ShippingMethod};

    fn sample_order(id: &str, number: &str) -> Order {
        let now = Utc::now();
        Order {
            id: id.to_string(),
            order_number: number.to_string(),
            customer_name: "Maria Quispe".to_string(),
            customer_email: "maria@example.com".to_string(),
            customer_phone: None,
            shipping_method: ShippingMethod::Delivery,
            shipping_address: Some("Av. Los Pinos 123".to_string()),
            shipping_district: Some("Miraflores".to_string()),
            site_id: None,
            payment_method: "transfer".to_string(),
            requires_payment_proof: true,
            payment_proof_url: None,
            items: vec![OrderItem {
                product_id: "p1".to_string(),
                product_name: "Arroz 1kg".to_string(),
                quantity: 2,
                unit_price: 4.5,
                subtotal: 9.0,
            }],
            subtotal: 9.0,
            shipping_cost: 5.0,
            total: 14.0,
            status: OrderStatus::Pending,
            tracking_url: None,
            estimated_delivery: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_order_roundtrip() {
        let store = OrderStore::open_in_memory().unwrap();
        let order = sample_order("o1", "WEB202501010001");

        let txn = store.begin_write().unwrap();
        store.put_order(&txn, &order).unwrap();
        store.put_order_number(&txn, &order).unwrap();
        txn.commit().unwrap();

        let loaded = store.get_order("o1").unwrap().unwrap();
        assert_eq!(loaded, order);

        let by_number = store.find_by_number("WEB202501010001").unwrap().unwrap();
        assert_eq!(by_number.id, "o1");

        assert!(store.get_order("missing").unwrap().is_none());
    }

    #[test]
    fn test_order_count_increments() {
        let store = OrderStore::open_in_memory().unwrap();
        assert_eq!(store.next_order_count().unwrap(), 1);
        assert_eq!(store.next_order_count().unwrap(), 2);
        assert_eq!(store.next_order_count().unwrap(), 3);
    }

    #[test]
    fn test_feedback_roundtrip() {
        let store = OrderStore::open_in_memory().unwrap();
        let feedback = OrderFeedback {
            order_id: "o1".to_string(),
            rating: 4,
            comment: Some("Rápido".to_string()),
            recommend: true,
            created_at: Utc::now(),
        };

        let txn = store.begin_write().unwrap();
        assert!(!store.has_feedback_txn(&txn, "o1").unwrap());
        store.put_feedback(&txn, &feedback).unwrap();
        assert!(store.has_feedback_txn(&txn, "o1").unwrap());
        txn.commit().unwrap();

        let loaded = store.get_feedback("o1").unwrap().unwrap();
        assert_eq!(loaded, feedback);
    }

    #[test]
    fn test_outbox_roundtrip() {
        let store = OrderStore::open_in_memory().unwrap();
        let order = sample_order("o1", "WEB202501010001");
        let job = NotificationJob::new(NotificationKind::Confirmation, &order, None);

        let txn = store.begin_write().unwrap();
        store.put_job(&txn, &job).unwrap();
        txn.commit().unwrap();

        let pending = store.pending_jobs().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, job.id);

        store.delete_job(&job.id).unwrap();
        assert!(store.pending_jobs().unwrap().is_empty());
    }
}
