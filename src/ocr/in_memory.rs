use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::TagbookError;

use super::{ReceiptExtractor, ReceiptFields};

/// Scripted extractor for tests. Results are consumed in order; running out
/// of script is reported as an extraction failure.
pub struct InMemoryExtractor {
    script: Mutex<VecDeque<Result<ReceiptFields, String>>>,
}

impl InMemoryExtractor {
    pub fn new() -> Self {
        InMemoryExtractor { script: Mutex::new(VecDeque::new()) }
    }

    pub async fn push_result(&self, fields: ReceiptFields) {
        self.script.lock().await.push_back(Ok(fields));
    }

    pub async fn push_failure(&self, message: &str) {
        self.script.lock().await.push_back(Err(message.to_string()));
    }
}

impl Default for InMemoryExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReceiptExtractor for InMemoryExtractor {
    async fn extract(&self, _receipt_url: &str) -> Result<ReceiptFields, TagbookError> {
        match self.script.lock().await.pop_front() {
            Some(Ok(fields)) => Ok(fields),
            Some(Err(message)) => Err(TagbookError::Extraction(message)),
            None => Err(TagbookError::Extraction("no scripted result".to_string())),
        }
    }
}
