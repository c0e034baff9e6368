//! Notification adapter.
//!
//! Deployments can swap in mail or push delivery; the default just writes
//! a structured log line.

use async_trait::async_trait;
use interlude_domain::UserId;

use crate::infrastructure::ports::NotifierPort;

pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotifierPort for LogNotifier {
    async fn notify(&self, user_id: UserId, message: String) {
        tracing::info!(user_id = %user_id, message = %message, "Player notification");
    }
}
