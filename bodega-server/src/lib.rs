//! Bodega Server - minimarket web-order backend
//!
//! # Architecture
//!
//! The server owns the web-order lifecycle state machine and the
//! asynchronous notification pipeline that runs after each transition:
//!
//! - **Lifecycle** (`orders`): validated status transitions, committed
//!   before any side effect is scheduled
//! - **Documents** (`documents`): branded PDF receipt rendering into
//!   uniquely named temporary files
//! - **Notifications** (`notify`): HTML email with optional receipt
//!   attachment, SMTP primary with an HTTP API fallback, fed by a bounded
//!   job queue with a durable outbox
//! - **Cleanup** (`services`): delayed deletion of temporary artifacts
//!
//! # Module Structure
//!
//! ```text
//! bodega-server/src/
//! ├── core/          # Config, server state, background tasks
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # redb order store (orders, feedback, outbox)
//! ├── orders/        # Lifecycle manager (state machine)
//! ├── documents/     # Receipt renderer + asset resolution
//! ├── notify/        # Dispatcher, mail channels, retrying reader, worker
//! ├── services/      # Cleanup scheduler
//! └── utils/         # Logging, validation
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod documents;
pub mod notify;
pub mod orders;
pub mod services;
pub mod utils;

// Re-export public types
pub use crate::core::{BackgroundTasks, Config, ServerState, TaskKind};
pub use crate::db::OrderStore;
pub use crate::documents::{DocumentKind, ReceiptRenderer};
pub use crate::notify::{
    NotificationDispatcher, NotificationJob, NotificationKind, NotificationWorker,
};
pub use crate::orders::{LifecycleError, OrderLifecycleManager};
pub use crate::services::CleanupScheduler;
pub use crate::utils::{init_logger, AppError, AppResult};
