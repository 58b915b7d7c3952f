use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::TagbookError;

/// Fields recovered from a receipt image. Any subset may be present; the
/// draft pipeline promotes directly only when all three are.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReceiptFields {
    pub to: Option<String>,
    pub amount: Option<f64>,
    pub time_of_transaction: Option<DateTime<Utc>>,
}

impl ReceiptFields {
    pub fn is_complete(&self) -> bool {
        self.to.is_some() && self.amount.is_some() && self.time_of_transaction.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.to.is_none() && self.amount.is_none() && self.time_of_transaction.is_none()
    }
}

/// External OCR collaborator.
#[async_trait]
pub trait ReceiptExtractor: Send + Sync {
    async fn extract(&self, receipt_url: &str) -> Result<ReceiptFields, TagbookError>;
}

/// Stand-in wired when no OCR endpoint/key is configured; extraction then
/// always fails gracefully into the draft error path.
pub struct DisabledExtractor;

#[async_trait]
impl ReceiptExtractor for DisabledExtractor {
    async fn extract(&self, _receipt_url: &str) -> Result<ReceiptFields, TagbookError> {
        Err(TagbookError::Extraction(
            "receipt extraction is not configured".to_string(),
        ))
    }
}

/// One observation of a long-running OCR operation.
pub enum PollStatus {
    Succeeded(String),
    Running,
    Failed,
}

/// Polls `poll` at a fixed interval up to `max_attempts` times and gives up
/// rather than waiting indefinitely. Timeout is treated as extraction
/// failure.
pub async fn poll_bounded<F, Fut>(
    mut poll: F,
    max_attempts: u32,
    interval: Duration,
) -> Result<String, TagbookError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus, TagbookError>>,
{
    for attempt in 0..max_attempts {
        tokio::time::sleep(interval).await;
        match poll().await? {
            PollStatus::Succeeded(text) => return Ok(text),
            PollStatus::Failed => {
                return Err(TagbookError::Extraction("analysis failed".to_string()));
            }
            PollStatus::Running => {
                warn!(attempt, "extraction still running");
            }
        }
    }
    Err(TagbookError::Extraction(format!(
        "no result after {max_attempts} attempts"
    )))
}

pub mod in_memory;
pub mod parse;
pub mod remote;
