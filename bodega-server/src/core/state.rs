//! Shared server state for HTTP handlers

use crate::core::Config;
use crate::orders::OrderLifecycleManager;
use std::sync::Arc;

/// State handed to every axum handler
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Order lifecycle manager (single owner of status transitions)
    pub lifecycle: Arc<OrderLifecycleManager>,
}

impl ServerState {
    pub fn new(config: Arc<Config>, lifecycle: Arc<OrderLifecycleManager>) -> Self {
        Self { config, lifecycle }
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config.environment)
            .field("lifecycle", &"<OrderLifecycleManager>")
            .finish()
    }
}
