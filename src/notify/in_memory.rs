use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::notify::{Message, MulticastOutcome, Notifier, SendError};

/// Recording notifier for tests and the demo binary. Tokens added with
/// `mark_unregistered` fail sends the way a stale device registration would.
pub struct InMemoryNotifier {
    sent: Mutex<Vec<(String, Message)>>,
    unregistered: Mutex<HashSet<String>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        InMemoryNotifier {
            sent: Mutex::new(Vec::new()),
            unregistered: Mutex::new(HashSet::new()),
        }
    }

    pub async fn mark_unregistered(&self, token: &str) {
        self.unregistered.lock().await.insert(token.to_string());
    }

    pub async fn sent(&self) -> Vec<(String, Message)> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, token: &str) -> Vec<Message> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(t, _)| t == token)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Default for InMemoryNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, token: &str, message: Message) -> Result<(), SendError> {
        if self.unregistered.lock().await.contains(token) {
            return Err(SendError::Unregistered);
        }
        self.sent.lock().await.push((token.to_string(), message));
        Ok(())
    }

    async fn send_multicast(&self, tokens: &[String], message: Message) -> MulticastOutcome {
        let mut outcome = MulticastOutcome::default();
        for token in tokens {
            match self.send(token, message.clone()).await {
                Ok(()) => outcome.success_count += 1,
                Err(e) => outcome.failures.push((token.clone(), e)),
            }
        }
        outcome
    }
}
