use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Push message. `notification` absent means a silent data-only sync; the
/// receiving device refreshes without an alert.
#[derive(Clone, Debug, Default)]
pub struct Message {
    pub data: HashMap<String, String>,
    pub notification: Option<NotificationBody>,
    /// Platform collapse/grouping key; repeated updates to the same group
    /// replace each other instead of stacking.
    pub collapse_key: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NotificationBody {
    pub title: String,
    pub body: String,
}

impl Message {
    pub fn data_only(data: HashMap<String, String>) -> Self {
        Message { data, notification: None, collapse_key: None }
    }
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum SendError {
    /// Token is no longer registered; safe to clear from the user record.
    #[error("token not registered")]
    Unregistered,
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Per-token results of a multicast send.
#[derive(Debug, Default)]
pub struct MulticastOutcome {
    pub success_count: usize,
    pub failures: Vec<(String, SendError)>,
}

impl MulticastOutcome {
    /// Tokens that hard-failed with a registration error.
    pub fn stale_tokens(&self) -> Vec<&str> {
        self.failures
            .iter()
            .filter(|(_, e)| *e == SendError::Unregistered)
            .map(|(token, _)| token.as_str())
            .collect()
    }
}

/// Push delivery transport. Delivery is best-effort everywhere: a failed
/// send never fails the triggering event.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, token: &str, message: Message) -> Result<(), SendError>;
    async fn send_multicast(&self, tokens: &[String], message: Message) -> MulticastOutcome;
}

pub mod in_memory;
